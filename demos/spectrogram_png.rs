//! Generates a spectrogram PNG from a WAV file using wavespect.
//!
//! Usage:
//! ```bash
//! cargo run --example spectrogram_png -- <INPUT_WAV> <OUTPUT_PNG> \
//!     [--fft N] [--hop N] [--floor dB] [--palette NAME] [--log]
//! ```
//!
//! Multi-channel input is downmixed to mono. `--log` renders the
//! note-binned logarithmic layout instead of linear frequency.

use std::env;
use std::error::Error;

use hound::WavReader;
use image::{Rgba, RgbaImage};
use wavespect::sample::SampleBuffer;
use wavespect::stft::StftEngine;
use wavespect::visual::{Colormap, SpectrogramImageCache, Style};
use wavespect::window::Window;

const USAGE: &str = "Usage: cargo run --example spectrogram_png -- <INPUT_WAV> <OUTPUT_PNG> [--fft N] [--hop N] [--floor dB] [--palette NAME] [--log]";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let mut input = None;
    let mut output = None;
    let mut fft_size = 2048usize;
    let mut hop = 0usize;
    let mut floor_db = -50.0f32;
    let mut palette = Colormap::Spectral;
    let mut style = Style::Linear;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fft" => {
                if let Some(v) = args.next() {
                    fft_size = v.parse().unwrap_or(fft_size);
                }
            }
            "--hop" => {
                if let Some(v) = args.next() {
                    hop = v.parse().unwrap_or(hop);
                }
            }
            "--floor" => {
                if let Some(v) = args.next() {
                    floor_db = v.parse().unwrap_or(floor_db);
                }
            }
            "--palette" => {
                if let Some(v) = args.next() {
                    palette = Colormap::parse(&v);
                }
            }
            "--log" => style = Style::Logarithmic,
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else if output.is_none() {
                    output = Some(arg);
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
    let output = output.unwrap_or_else(|| {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    });
    if hop == 0 {
        hop = fft_size / 2;
    }

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

    let mut engine = StftEngine::new(fft_size, hop, Window::BlackmanHarris)?;
    engine.analyze(&buffer)?;

    let mut cache = SpectrogramImageCache::new();
    cache.set_style(style);
    cache.set_colormap(palette, true);
    cache.set_floor(floor_db);

    let width = engine.len();
    let height = match style {
        Style::Linear => fft_size / 2,
        Style::Logarithmic => wavespect::pitch::NOTE_ROWS,
    };
    let mut img = RgbaImage::new(width as u32, height as u32);
    for x in 0..width {
        let column = cache.bitmap(&engine, x).expect("index in range");
        for y in 0..height {
            img.put_pixel(x as u32, y as u32, Rgba(column.pixel(y).to_le_bytes()));
        }
    }
    img.save(&output)?;
    println!(
        "wrote {} ({}x{} pixels, {} frames of {} points)",
        output, width, height, width, fft_size
    );
    Ok(())
}
