//! Prints the dominant pitch over time for a WAV file.
//!
//! Usage:
//! ```bash
//! cargo run --example note_readout -- <INPUT_WAV> [--fft N] [--a4 HZ]
//! ```
//!
//! Each line is a frame timestamp, the phase-vocoder refined frequency of
//! the loudest bin, its power in dB, and the nearest note name.

use std::env;
use std::error::Error;

use hound::WavReader;
use wavespect::pitch::Tuning;
use wavespect::sample::SampleBuffer;
use wavespect::stft::StftEngine;
use wavespect::window::Window;

const USAGE: &str = "Usage: cargo run --example note_readout -- <INPUT_WAV> [--fft N] [--a4 HZ]";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let mut input = None;
    let mut fft_size = 4096usize;
    let mut a4 = 440.0f64;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fft" => {
                if let Some(v) = args.next() {
                    fft_size = v.parse().unwrap_or(fft_size);
                }
            }
            "--a4" => {
                if let Some(v) = args.next() {
                    a4 = v.parse().unwrap_or(a4);
                }
            }
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("{}", USAGE);
                    std::process::exit(1);
                }
            }
        }
    }
    let input = input.unwrap_or_else(|| {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    });

    let mut reader = WavReader::open(input)?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };
    let buffer = SampleBuffer::mono_mix(&samples, spec.sample_rate as f64, spec.channels as usize)?;

    let mut engine = StftEngine::new(fft_size, fft_size / 2, Window::BlackmanHarris)?;
    engine.analyze(&buffer)?;
    let tuning = Tuning::new(a4);

    for index in 0..engine.len() {
        let fragment = engine.fragment(index as i64);
        let peak = (0..fragment.len())
            .max_by(|&a, &b| {
                fragment
                    .magnitude(a)
                    .partial_cmp(&fragment.magnitude(b))
                    .expect("magnitudes are finite")
            })
            .unwrap_or(0);
        let (mag, freq) = engine.raw_magnitude_at(index as i64, peak);
        let power = 20.0 * (2.0 * mag).log10();
        let tm = index as f64 * engine.hop_size() as f64 / engine.rate();
        let name = tuning
            .note_name(freq as f64)
            .unwrap_or_else(|| "-".to_string());
        println!("{:8.3}s  {:9.2} Hz  {:7.1} dB  {}", tm, freq, power, name);
    }
    Ok(())
}
