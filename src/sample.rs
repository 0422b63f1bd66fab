//! Owned sample buffers with mirrored out-of-range indexing and
//! interpolated fractional-time lookup.
//!
//! A [`SampleBuffer`] is one channel of decoded audio at a fixed rate. The
//! analysis engine reads it through [`SampleBuffer::sample`], whose odd
//! (negate-and-reflect) extension keeps FFT windows continuous across the
//! buffer edges.

use core::fmt;

use log::debug;

/// Fractional parts below this are treated as exact sample positions, so
/// [`SampleBuffer::at`] returns the raw sample without interpolating.
const FRACTION_EPSILON: f64 = 1e-6;

/// Minimum number of channels accepted when deinterleaving.
const MIN_CHANNELS: usize = 1;

/// Errors from buffer construction and resampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// The sample rate was non-positive or non-finite.
    InvalidRate,
    /// The channel count was zero.
    InvalidChannels,
    /// The interleaved input length was not a multiple of the channel count.
    MisalignedChannels,
    /// The requested channel index was beyond the channel count.
    ChannelOutOfRange,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::InvalidRate => write!(f, "sample rate must be finite and positive"),
            SampleError::InvalidChannels => {
                write!(f, "channel count must be at least {}", MIN_CHANNELS)
            }
            SampleError::MisalignedChannels => {
                write!(f, "input length is not a multiple of the channel count")
            }
            SampleError::ChannelOutOfRange => write!(f, "channel index beyond channel count"),
        }
    }
}

impl std::error::Error for SampleError {}

/// Interpolation mode used by [`SampleBuffer::at`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Nearest preceding sample, no interpolation.
    #[default]
    None,
    Linear,
    Cosine,
    /// Catmull-Rom style cubic over a 4-point stencil; falls back to cosine
    /// where the stencil would leave the buffer.
    Cubic,
}

/// One channel of audio: a fixed-length, fixed-rate sequence of f32 samples.
///
/// Length in seconds is always derived from `data.len() / rate`; it is never
/// stored separately, so it cannot drift.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    data: Vec<f32>,
    rate: f64,
    interp: Interpolation,
}

impl SampleBuffer {
    pub fn new(data: Vec<f32>, rate: f64) -> Result<Self, SampleError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SampleError::InvalidRate);
        }
        Ok(Self {
            data,
            rate,
            interp: Interpolation::default(),
        })
    }

    /// Buffer filled with a constant value; handy for tests and silence.
    pub fn constant(len: usize, rate: f64, value: f32) -> Result<Self, SampleError> {
        Self::new(vec![value; len], rate)
    }

    /// Extract channel `chan` from interleaved multi-channel data.
    pub fn from_interleaved(
        data: &[f32],
        rate: f64,
        channels: usize,
        chan: usize,
    ) -> Result<Self, SampleError> {
        if channels < MIN_CHANNELS {
            return Err(SampleError::InvalidChannels);
        }
        if data.len() % channels != 0 {
            return Err(SampleError::MisalignedChannels);
        }
        if chan >= channels {
            return Err(SampleError::ChannelOutOfRange);
        }
        let samples = data.iter().skip(chan).step_by(channels).copied().collect();
        Self::new(samples, rate)
    }

    /// Average all channels of interleaved data down to one buffer.
    pub fn mono_mix(data: &[f32], rate: f64, channels: usize) -> Result<Self, SampleError> {
        if channels < MIN_CHANNELS {
            return Err(SampleError::InvalidChannels);
        }
        if data.len() % channels != 0 {
            return Err(SampleError::MisalignedChannels);
        }
        let frames = data.len() / channels;
        let mut samples = Vec::with_capacity(frames);
        for frame in data.chunks_exact(channels) {
            samples.push(frame.iter().sum::<f32>() / channels as f32);
        }
        Self::new(samples, rate)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Length in seconds, derived from sample count and rate.
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.rate
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn set_interpolation(&mut self, interp: Interpolation) {
        self.interp = interp;
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    /// Sample at `index` with odd mirroring outside `[0, len)`: negative
    /// indices negate-and-reflect around 0, indices past the end
    /// negate-and-reflect around `len - 1`.
    pub fn sample(&self, index: i64) -> f32 {
        let len = self.data.len() as i64;
        if len == 0 {
            return 0.0;
        }
        // A single sample has no mirror axis; every reflection lands on it.
        if len == 1 {
            return self.data[0];
        }
        if index < 0 {
            -self.sample(-index)
        } else if index >= len {
            -self.sample(2 * len - 2 - index)
        } else {
            self.data[index as usize]
        }
    }

    /// Interpolated value at time `tm` (seconds). Zero outside
    /// `[0, duration)`.
    pub fn at(&self, tm: f64) -> f32 {
        if self.data.is_empty() || tm < 0.0 || tm >= self.duration() {
            return 0.0;
        }
        let n = tm * self.rate;
        let f = n - n.floor();
        let x = n as usize;

        let mut interp = self.interp;
        if f < FRACTION_EPSILON {
            interp = Interpolation::None;
        }
        if interp == Interpolation::Cubic && (x < 1 || x + 2 >= self.data.len()) {
            interp = Interpolation::Cosine;
        }

        match interp {
            Interpolation::None => self.data[x],
            Interpolation::Linear => self.interp_linear(x, f),
            Interpolation::Cosine => self.interp_cosine(x, f),
            Interpolation::Cubic => self.interp_cubic(x, f),
        }
    }

    /// Largest absolute sample value over `[s0, s1)`, clamped to the buffer.
    pub fn peak(&self, s0: usize, s1: usize) -> f32 {
        let end = s1.min(self.data.len());
        self.data[s0.min(end)..end]
            .iter()
            .fold(0.0f32, |acc, &v| acc.max(v.abs()))
    }

    /// Rate-convert into a new buffer by sampling `at()` at the new rate.
    pub fn resample(&self, rate: f64) -> Result<SampleBuffer, SampleError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SampleError::InvalidRate);
        }
        let len = (self.duration() * rate) as usize;
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            data.push(self.at(i as f64 / rate));
        }
        debug!(
            "resampled {} samples @ {} Hz -> {} samples @ {} Hz",
            self.data.len(),
            self.rate,
            data.len(),
            rate
        );
        Ok(Self {
            data,
            rate,
            interp: self.interp,
        })
    }

    fn interp_linear(&self, x: usize, f: f64) -> f32 {
        let y1 = self.sample(x as i64) as f64;
        let y2 = self.sample(x as i64 + 1) as f64;
        (y1 * (1.0 - f) + y2 * f) as f32
    }

    fn interp_cosine(&self, x: usize, f: f64) -> f32 {
        let y1 = self.sample(x as i64) as f64;
        let y2 = self.sample(x as i64 + 1) as f64;
        let mu = (1.0 - (f * core::f64::consts::PI).cos()) / 2.0;
        (y1 * (1.0 - mu) + y2 * mu) as f32
    }

    fn interp_cubic(&self, x: usize, f: f64) -> f32 {
        let y0 = self.data[x - 1] as f64;
        let y1 = self.data[x] as f64;
        let y2 = self.data[x + 1] as f64;
        let y3 = self.data[x + 2] as f64;
        // y1 + f/2 * (y2 - y0 + f*(2y0 - 5y1 + 4y2 - y3 + f*(3(y1-y2) + y3 - y0)))
        (y1 + 0.5
            * f
            * (y2 - y0
                + f * (2.0 * y0 - 5.0 * y1 + 4.0 * y2 - y3 + f * (3.0 * (y1 - y2) + y3 - y0))))
            as f32
    }
}
