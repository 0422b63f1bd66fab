//! Short-Time Fourier Transform analysis engine.
//!
//! [`StftEngine`] turns a [`SampleBuffer`] into an ordered sequence of
//! overlapping windowed-FFT frames ("fragments", each a half-spectrum of
//! `fft_size/2` complex bins) and answers magnitude/frequency queries
//! against them. Frequency estimates are refined past the coarse bin
//! resolution with the phase-vocoder technique: the phase advance between
//! overlapping frames, minus the advance expected for an on-bin signal,
//! yields a sub-bin frequency correction.

use core::f32::consts::PI;
use core::fmt;
use std::time::Instant;

use log::info;

use crate::fft::{Complex32, FftError, FftImpl, ScalarFftImpl};
use crate::sample::SampleBuffer;
use crate::window::Window;

/// Configuration and backend errors. Query-range misses are reported with
/// sentinel values instead (see [`StftEngine::fragment`] and
/// [`StftEngine::raw_magnitude_at`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StftError {
    /// FFT size was zero or not a power of two.
    InvalidFftSize,
    /// The transform backend failed.
    Fft(FftError),
}

impl fmt::Display for StftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StftError::InvalidFftSize => {
                write!(f, "fft size must be a non-zero power of two")
            }
            StftError::Fft(e) => write!(f, "transform backend error: {}", e),
        }
    }
}

impl std::error::Error for StftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StftError::Fft(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FftError> for StftError {
    fn from(e: FftError) -> Self {
        StftError::Fft(e)
    }
}

/// One analysis frame: the non-negative-frequency half of a scaled forward
/// transform. The upper half is discarded because the input is real-valued,
/// making it redundant.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    bins: Vec<Complex32>,
}

impl Fragment {
    fn zeroed(len: usize) -> Self {
        Self {
            bins: vec![Complex32::zero(); len],
        }
    }

    /// Number of frequency bins (`fft_size / 2`).
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[Complex32] {
        &self.bins
    }

    /// Linear magnitude of `bin`, zero when out of range.
    pub fn magnitude(&self, bin: usize) -> f32 {
        match self.bins.get(bin) {
            Some(c) => (c.re * c.re + c.im * c.im).sqrt(),
            None => 0.0,
        }
    }
}

/// STFT analysis engine.
///
/// Lifecycle: construct (validates configuration, precomputes the window
/// table, allocates the transform plan and scratch frame), then
/// [`analyze`](Self::analyze) once per buffer. Re-analyzing fully replaces
/// the previous fragments and bumps the epoch counter that image caches use
/// to notice staleness. All backend resources are owned and released on
/// drop.
pub struct StftEngine {
    fft_size: usize,
    hop_size: usize,
    window: Window,
    coeffs: Vec<f32>,
    rate: f64,
    samples: usize,
    fragments: Vec<Fragment>,
    empty: Fragment,
    backend: ScalarFftImpl<f32>,
    frame: Vec<Complex32>,
    epoch: u64,
}

impl StftEngine {
    /// Create an engine for `fft_size`-point frames advancing `hop_size`
    /// samples per frame. A zero `hop_size` defaults to `fft_size`
    /// (no overlap).
    pub fn new(fft_size: usize, hop_size: usize, window: Window) -> Result<Self, StftError> {
        if fft_size == 0 || !fft_size.is_power_of_two() {
            return Err(StftError::InvalidFftSize);
        }
        let hop_size = if hop_size == 0 { fft_size } else { hop_size };
        let coeffs = window.table(fft_size);
        info!(
            "initialized stft engine: fft_size={} hop_size={} window={:?}",
            fft_size, hop_size, window
        );
        Ok(Self {
            fft_size,
            hop_size,
            window,
            coeffs,
            rate: 0.0,
            samples: 0,
            fragments: Vec::new(),
            empty: Fragment::zeroed(fft_size / 2),
            backend: ScalarFftImpl::default(),
            frame: vec![Complex32::zero(); fft_size],
            epoch: 0,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Sample rate of the most recently analyzed buffer (0 before any
    /// analysis).
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Sample count of the most recently analyzed buffer.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Duration in seconds of the most recently analyzed buffer.
    pub fn duration(&self) -> f64 {
        if self.rate > 0.0 {
            self.samples as f64 / self.rate
        } else {
            0.0
        }
    }

    /// Number of analysis fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Generation counter, bumped by every [`analyze`](Self::analyze).
    /// Derived caches compare it to notice that their contents are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Analyze one buffer, replacing any previous fragments.
    ///
    /// Frame `b` covers the window starting at sample
    /// `-fft_size/2 + b*hop_size`, so it is centered on the hop boundary;
    /// out-of-range reads go through the buffer's mirrored indexing. Each
    /// windowed frame is transformed, scaled by `1/fft_size`, and truncated
    /// to the lower half-spectrum.
    pub fn analyze(&mut self, buffer: &SampleBuffer) -> Result<(), StftError> {
        self.rate = buffer.rate();
        self.samples = buffer.len();
        self.fragments.clear();

        let buckets = buffer.len().div_ceil(self.hop_size);
        self.fragments.reserve(buckets);
        let scale = 1.0 / self.fft_size as f32;
        let half = self.fft_size / 2;

        let t0 = Instant::now();
        let mut start = -(self.fft_size as i64) / 2;
        for _ in 0..buckets {
            for (i, (slot, &w)) in self.frame.iter_mut().zip(&self.coeffs).enumerate() {
                *slot = Complex32::new(w * buffer.sample(start + i as i64), 0.0);
            }
            start += self.hop_size as i64;
            self.backend.fft(&mut self.frame)?;
            let bins = self.frame[..half]
                .iter()
                .map(|c| Complex32::new(c.re * scale, c.im * scale))
                .collect();
            self.fragments.push(Fragment { bins });
        }
        self.epoch += 1;
        info!(
            "analyzed {} frames of {} points in {} ms",
            buckets,
            self.fft_size,
            t0.elapsed().as_millis()
        );
        Ok(())
    }

    /// Fragment at `index`, or the canonical all-zero fragment when `index`
    /// is out of range (including `-1`, which the phase-vocoder path hits
    /// for the first frame). Never panics.
    pub fn fragment(&self, index: i64) -> &Fragment {
        if index >= 0 && (index as usize) < self.fragments.len() {
            &self.fragments[index as usize]
        } else {
            &self.empty
        }
    }

    /// Fragment covering time `tm` (seconds).
    pub fn fragment_at(&self, tm: f64) -> &Fragment {
        self.fragment(self.frame_index(tm))
    }

    /// Frame index covering time `tm`.
    pub fn frame_index(&self, tm: f64) -> i64 {
        (tm * self.rate) as i64 / self.hop_size as i64
    }

    /// Linear magnitude and phase-vocoder refined frequency (Hz) of `bin`
    /// in frame `index`.
    ///
    /// Returns `(-inf, -inf)` when `bin` is outside the half-spectrum. An
    /// out-of-range `index` (notably `-1` as the predecessor of frame 0)
    /// resolves to the all-zero fragment so the phase difference degrades
    /// gracefully instead of being a caller-side special case.
    pub fn raw_magnitude_at(&self, index: i64, bin: usize) -> (f32, f32) {
        let f1 = self.fragment(index);
        if bin >= f1.len() {
            return (f32::NEG_INFINITY, f32::NEG_INFINITY);
        }
        let re = f1.bins[bin].re;
        let im = f1.bins[bin].im;
        let phase = im.atan2(re);
        let f0 = self.fragment(index - 1);
        let p0 = f0.bins[bin].im.atan2(f0.bins[bin].re);

        let oversamp = self.fft_size as f32 / self.hop_size as f32;
        let expect = bin as f32 * 2.0 * PI * self.hop_size as f32 / self.fft_size as f32;
        let mut delta = phase - p0 - expect;
        // Wrap the residual into (-pi, pi] with the integer-quotient rule.
        let mut qpd = (delta / PI) as i32;
        if qpd >= 0 {
            qpd += qpd & 1;
        } else {
            qpd -= qpd & 1;
        }
        delta -= PI * qpd as f32;
        let correction = delta * oversamp / (2.0 * PI);
        let freq = (self.rate as f32 / self.fft_size as f32) * (bin as f32 + correction);

        let mag = (re * re + im * im).sqrt();
        (mag, freq)
    }

    /// Power (dB) and refined frequency (Hz) of `bin` at time `tm`.
    ///
    /// The factor 2 inside the log compensates for the discarded
    /// negative-frequency half of the spectrum. The out-of-range sentinel
    /// passes through unchanged rather than going through the log, which
    /// would turn it into NaN.
    pub fn magnitude_at(&self, tm: f64, bin: usize) -> (f32, f32) {
        let index = (tm * self.rate) as i64 / self.hop_size as i64;
        let (mag, freq) = self.raw_magnitude_at(index, bin);
        if !mag.is_finite() {
            return (mag, freq);
        }
        let power = 20.0 * (2.0 * mag).log10();
        (power, freq)
    }
}
