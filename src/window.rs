//! Analysis window functions.
//!
//! Envelopes multiplied onto a frame before transforming to reduce spectral
//! leakage. Coefficients follow the standard definitions over `N - 1` so the
//! envelope reaches its endpoints at the frame edges; see
//! <https://en.wikipedia.org/wiki/Window_function>.

use core::f32::consts::PI;

/// Width parameter of the Gaussian window relative to the half-frame.
const GAUSSIAN_SIGMA: f32 = 0.4;

/// Supported window functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Window {
    Rectangular,
    Blackman,
    #[default]
    BlackmanHarris,
    Gaussian,
}

impl Window {
    /// Parse a window name as used in configuration; unknown names fall back
    /// to Blackman-Harris, the reference analysis window.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "rectangular" | "rect" => Window::Rectangular,
            "blackman" => Window::Blackman,
            "gaussian" => Window::Gaussian,
            _ => Window::BlackmanHarris,
        }
    }

    /// Envelope coefficient at position `n` of a window of length `len`.
    pub fn coefficient(self, n: usize, len: usize) -> f32 {
        if len <= 1 {
            return 1.0;
        }
        let n = n as f32;
        let last = (len - 1) as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Blackman => {
                // "Exact Blackman": a0 = 7938/18608, a1 = 9240/18608,
                // a2 = 1430/18608.
                let a0 = 7938.0 / 18608.0;
                let a1 = 9240.0 / 18608.0;
                let a2 = 1430.0 / 18608.0;
                a0 - a1 * (2.0 * PI * n / last).cos() + a2 * (4.0 * PI * n / last).cos()
            }
            Window::BlackmanHarris => {
                let a0 = 0.35875;
                let a1 = 0.48829;
                let a2 = 0.14128;
                let a3 = 0.01168;
                let k = PI * n / last;
                a0 - a1 * (2.0 * k).cos() + a2 * (4.0 * k).cos() - a3 * (6.0 * k).cos()
            }
            Window::Gaussian => {
                let half = last / 2.0;
                let arg = (n - half) / (GAUSSIAN_SIGMA * half);
                (-0.5 * arg * arg).exp()
            }
        }
    }

    /// Precompute the full coefficient table so analysis loops can simply
    /// multiply.
    pub fn table(self, len: usize) -> Vec<f32> {
        (0..len).map(|n| self.coefficient(n, len)).collect()
    }
}
