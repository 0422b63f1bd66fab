use wavespect::sample::SampleBuffer;
use wavespect::stft::StftEngine;
use wavespect::window::Window;

fn sine(freq: f64, rate: f64, len: usize) -> SampleBuffer {
    let data = (0..len)
        .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate).sin() as f32)
        .collect();
    SampleBuffer::new(data, rate).expect("valid buffer")
}

// One second of 440 Hz at 48 kHz, 4096-point frames advancing 2048 samples:
// ceil(48000 / 2048) = 24 fragments of 2048 bins each.
#[test]
fn one_second_sine_produces_expected_fragments() {
    let mut engine = StftEngine::new(4096, 2048, Window::BlackmanHarris).expect("valid config");
    let buffer = sine(440.0, 48000.0, 48000);
    engine.analyze(&buffer).expect("analysis succeeds");
    assert_eq!(engine.len(), 24);
    assert_eq!(engine.fragment(0).len(), 2048);
    assert!((engine.duration() - 1.0).abs() < 1e-9);
}

// The frame's peak bin must be where the tone lives: 440 Hz with a bin
// width of 48000/4096 = 11.72 Hz falls between bins 37 and 38.
#[test]
fn peak_bin_matches_tone_frequency() {
    let mut engine = StftEngine::new(4096, 2048, Window::BlackmanHarris).expect("valid config");
    let buffer = sine(440.0, 48000.0, 48000);
    engine.analyze(&buffer).expect("analysis succeeds");
    let fragment = engine.fragment_at(0.5);
    let peak = (0..fragment.len())
        .max_by(|&a, &b| {
            fragment
                .magnitude(a)
                .partial_cmp(&fragment.magnitude(b))
                .unwrap()
        })
        .unwrap();
    assert!((37..=38).contains(&peak), "peak at bin {}", peak);

    let (power, freq) = engine.magnitude_at(0.5, peak);
    assert!((freq - 440.0).abs() < 1.0, "refined {} Hz", freq);
    // A full-scale sine through a Blackman-Harris window lands well above
    // a -50 dB display floor but below 0 dBFS.
    assert!(power > -15.0 && power < 0.0, "power {} dB", power);
}

// Phase-vocoder refinement recovers the tone frequency from neighbouring
// bins as well, not just the peak.
#[test]
fn refinement_is_consistent_across_the_main_lobe() {
    let mut engine = StftEngine::new(4096, 1024, Window::BlackmanHarris).expect("valid config");
    let buffer = sine(440.0, 48000.0, 48000);
    engine.analyze(&buffer).expect("analysis succeeds");
    for bin in 36..=39 {
        let (_, freq) = engine.raw_magnitude_at(10, bin);
        assert!((freq - 440.0).abs() < 2.0, "bin {}: {} Hz", bin, freq);
    }
}

// Frames near the buffer edges read through mirrored indexing and must not
// distort the analysis; every frame of a steady tone peaks at the same bin.
#[test]
fn edge_frames_use_mirrored_samples() {
    let rate = 8000.0;
    let mut engine = StftEngine::new(1024, 512, Window::BlackmanHarris).expect("valid config");
    let buffer = sine(1000.0, rate, 4096);
    engine.analyze(&buffer).expect("analysis succeeds");
    let expected = (1000.0 / (rate / 1024.0)).round() as usize;
    for index in 0..engine.len() {
        let fragment = engine.fragment(index as i64);
        let peak = (0..fragment.len())
            .max_by(|&a, &b| {
                fragment
                    .magnitude(a)
                    .partial_cmp(&fragment.magnitude(b))
                    .unwrap()
            })
            .unwrap();
        assert!(
            (peak as i64 - expected as i64).abs() <= 1,
            "frame {}: peak {} expected {}",
            index,
            peak,
            expected
        );
    }
}

// Narrower windows leak more energy into neighbouring bins; the
// Blackman-Harris sidelobes must sit far below the rectangular ones.
#[test]
fn window_choice_controls_leakage() {
    let rate = 8192.0;
    // 300 Hz is off-center for 1024-point bins (width 8 Hz), maximizing
    // leakage.
    let far_bin = 200;
    let mut leak = Vec::new();
    for window in [Window::Rectangular, Window::BlackmanHarris] {
        let mut engine = StftEngine::new(1024, 512, window).expect("valid config");
        let buffer = sine(300.0, rate, 8192);
        engine.analyze(&buffer).expect("analysis succeeds");
        leak.push(engine.fragment(8).magnitude(far_bin));
    }
    assert!(
        leak[1] < leak[0] / 10.0,
        "rectangular {} vs blackman-harris {}",
        leak[0],
        leak[1]
    );
}

// Re-analysis with a different buffer replaces the fragment list and the
// time mapping follows the new rate.
#[test]
fn reanalysis_switches_buffers_cleanly() {
    let mut engine = StftEngine::new(512, 256, Window::BlackmanHarris).expect("valid config");
    let first = sine(440.0, 48000.0, 4800);
    engine.analyze(&first).expect("analysis succeeds");
    assert_eq!(engine.len(), 4800usize.div_ceil(256));
    assert_eq!(engine.rate(), 48000.0);

    let second = sine(220.0, 8000.0, 800);
    engine.analyze(&second).expect("analysis succeeds");
    assert_eq!(engine.len(), 800usize.div_ceil(256));
    assert_eq!(engine.rate(), 8000.0);
    assert_eq!(engine.frame_index(0.1), (0.1f64 * 8000.0) as i64 / 256);
}
