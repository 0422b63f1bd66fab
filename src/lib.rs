//! # wavespect - STFT analysis and spectrogram rendering for Rust
//!
//! An audio analysis library built around a Short-Time Fourier Transform
//! engine with phase-vocoder frequency refinement, plus a lazy image cache
//! that rasterizes analysis frames into spectrogram columns.
//!
//! ## Features
//!
//! - **Sample buffers** with mirrored out-of-range indexing and selectable
//!   interpolation (none, linear, cosine, cubic)
//! - **Window functions**: rectangular, exact Blackman, Blackman-Harris,
//!   Gaussian
//! - **STFT analysis** over power-of-two frames with configurable hop
//! - **Phase-vocoder refinement** of per-bin frequency estimates past the
//!   coarse bin resolution
//! - **Spectrogram rendering** in linear-frequency or note-binned
//!   logarithmic layout, through `colorous` palettes
//! - **Pitch utilities**: tunable A4 reference, note naming with cent
//!   offsets
//!
//! ## Cargo Features
//!
//! - `internal-tests`: property-based internals testing (proptest)
//!
//! ## Examples
//!
//! Run the examples with:
//! ```bash
//! cargo run --example spectrogram_png
//! cargo run --example note_readout
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use wavespect::sample::SampleBuffer;
//! use wavespect::stft::StftEngine;
//! use wavespect::window::Window;
//!
//! let rate = 8000.0;
//! let data: Vec<f32> = (0..8000)
//!     .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / rate).sin() as f32)
//!     .collect();
//! let buffer = SampleBuffer::new(data, rate).unwrap();
//! let mut engine = StftEngine::new(1024, 512, Window::BlackmanHarris).unwrap();
//! engine.analyze(&buffer).unwrap();
//! let (power_db, freq_hz) = engine.magnitude_at(0.5, 56);
//! assert!((freq_hz - 440.0).abs() < 2.0);
//! assert!(power_db > -20.0);
//! ```

/// Scalar numeric traits and the complex type used by the transform
/// backend.
pub mod num;

/// Fast Fourier Transform backend
///
/// Iterative radix-2 implementation with a cached twiddle-factor planner.
pub mod fft;

/// Window functions
///
/// Rectangular, exact Blackman, Blackman-Harris, and Gaussian envelopes.
pub mod window;

/// Sample buffers
///
/// Mono sample storage with mirrored indexing, interpolation, and
/// resampling.
pub mod sample;

/// Short-Time Fourier Transform engine
///
/// Frame-by-frame analysis with phase-vocoder frequency refinement.
pub mod stft;

/// Pitch math
///
/// Tunable A4 reference, cent offsets, and note naming.
pub mod pitch;

/// Spectrogram rendering
///
/// Palette lookup and the lazy column-image cache.
pub mod visual;

pub use fft::{FftError, FftImpl, FftPlanner, ScalarFftImpl};
pub use num::{Complex, Complex32, Complex64, Float};
pub use pitch::Tuning;
pub use sample::{Interpolation, SampleBuffer, SampleError};
pub use stft::{Fragment, StftEngine, StftError};
pub use visual::{Colormap, ColumnImage, SpectrogramImageCache, Style};
