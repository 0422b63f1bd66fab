//! Transform backend: iterative radix-2 Cooley–Tukey FFT with a cached
//! twiddle-factor planner.
//!
//! The analysis engine only ever transforms power-of-two frames, so this
//! backend supports exactly that and reports anything else as an error
//! instead of falling back to a slower general-length algorithm. Plans and
//! scratch storage are owned by the caller ([`ScalarFftImpl`] plus whatever
//! frame buffer it is applied to) and released by drop.

use core::cell::RefCell;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

pub use crate::num::{Complex, Complex32, Complex64, Float};

/// Errors reported by the transform backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    /// The input slice was empty.
    EmptyInput,
    /// The input length was not a power of two.
    NonPowerOfTwo,
    /// Paired buffers had different lengths.
    MismatchedLengths,
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::EmptyInput => write!(f, "input slice is empty"),
            FftError::NonPowerOfTwo => write!(f, "input length must be a power of two"),
            FftError::MismatchedLengths => write!(f, "input and output lengths differ"),
        }
    }
}

impl std::error::Error for FftError {}

/// Caches per-stage twiddle tables so repeated transforms of the same size
/// reuse them.
///
/// The table for stage size `len` holds `len/2` factors `exp(-2πi k / len)`
/// for `k = 0..len/2`, stored contiguously so butterfly loops can index them
/// without striding through a full length-`n` table.
pub struct FftPlanner<T: Float> {
    cache: HashMap<usize, Arc<[Complex<T>]>>,
}

impl<T: Float> Default for FftPlanner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FftPlanner<T> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Twiddle table for stage size `len` (`len/2` entries).
    pub fn get_twiddles(&mut self, len: usize) -> Arc<[Complex<T>]> {
        if let Some(table) = self.cache.get(&len) {
            return Arc::clone(table);
        }
        let half = len / 2;
        let angle = -T::from_f32(2.0) * T::pi() / T::from_f32(len as f32);
        let (sin_step, cos_step) = angle.sin_cos();

        // Recurrence instead of per-entry sin_cos; the accumulated error over
        // a single stage table is far below f32 resolution.
        let mut table: Vec<Complex<T>> = Vec::with_capacity(half);
        let mut w_re = T::one();
        let mut w_im = T::zero();
        for _ in 0..half {
            table.push(Complex::new(w_re, w_im));
            let tmp = w_re;
            w_re = w_re.mul_add(cos_step, -(w_im * sin_step));
            w_im = w_im.mul_add(cos_step, tmp * sin_step);
        }
        let table: Arc<[Complex<T>]> = Arc::from(table);
        self.cache.insert(len, Arc::clone(&table));
        table
    }
}

/// In-place forward and inverse transforms.
pub trait FftImpl<T: Float> {
    fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError>;
    fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError>;

    fn fft_out_of_place(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != output.len() {
            return Err(FftError::MismatchedLengths);
        }
        output.copy_from_slice(input);
        self.fft(output)
    }

    fn ifft_out_of_place(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != output.len() {
            return Err(FftError::MismatchedLengths);
        }
        output.copy_from_slice(input);
        self.ifft(output)
    }
}

/// Scalar radix-2 implementation holding its planner behind a `RefCell` so a
/// shared reference can transform (the planner memoizes twiddles on first
/// use).
pub struct ScalarFftImpl<T: Float> {
    planner: RefCell<FftPlanner<T>>,
}

impl<T: Float> Default for ScalarFftImpl<T> {
    fn default() -> Self {
        Self {
            planner: RefCell::new(FftPlanner::new()),
        }
    }
}

impl<T: Float> ScalarFftImpl<T> {
    pub fn with_planner(planner: FftPlanner<T>) -> Self {
        Self {
            planner: RefCell::new(planner),
        }
    }
}

fn bit_reverse_permute<T: Float>(data: &mut [Complex<T>]) {
    let n = data.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }
}

impl<T: Float> FftImpl<T> for ScalarFftImpl<T> {
    fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        if !n.is_power_of_two() {
            return Err(FftError::NonPowerOfTwo);
        }
        if n == 1 {
            return Ok(());
        }
        bit_reverse_permute(input);
        let mut planner = self.planner.borrow_mut();
        let mut len = 2;
        while len <= n {
            let twiddles = planner.get_twiddles(len);
            let half = len / 2;
            for base in (0..n).step_by(len) {
                for k in 0..half {
                    let a = input[base + k];
                    let b = input[base + k + half] * twiddles[k];
                    input[base + k] = a + b;
                    input[base + k + half] = a - b;
                }
            }
            len <<= 1;
        }
        Ok(())
    }

    fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        for c in input.iter_mut() {
            *c = c.conj();
        }
        self.fft(input)?;
        let scale = T::one() / T::from_f32(n as f32);
        for c in input.iter_mut() {
            *c = Complex::new(c.re * scale, -(c.im * scale));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnitudes(data: &[Complex32]) -> Vec<f32> {
        data.iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect()
    }

    #[test]
    fn impulse_transforms_to_flat_spectrum() {
        let mut data = vec![Complex32::zero(); 8];
        data[0] = Complex32::new(1.0, 0.0);
        let fft = ScalarFftImpl::<f32>::default();
        fft.fft(&mut data).unwrap();
        for c in &data {
            assert!((c.re - 1.0).abs() < 1e-6);
            assert!(c.im.abs() < 1e-6);
        }
    }

    #[test]
    fn cosine_peaks_at_mirror_bins() {
        let n = 16;
        let mut data: Vec<Complex32> = (0..n)
            .map(|i| {
                Complex32::new(
                    (2.0 * core::f32::consts::PI * 3.0 * i as f32 / n as f32).cos(),
                    0.0,
                )
            })
            .collect();
        let fft = ScalarFftImpl::<f32>::default();
        fft.fft(&mut data).unwrap();
        let mags = magnitudes(&data);
        for (i, m) in mags.iter().enumerate() {
            if i == 3 || i == n - 3 {
                assert!((m - n as f32 / 2.0).abs() < 1e-3, "bin {}: {}", i, m);
            } else {
                assert!(*m < 1e-3, "bin {}: {}", i, m);
            }
        }
    }

    #[test]
    fn roundtrip_recovers_input() {
        let mut data: Vec<Complex32> = (0..32)
            .map(|i| Complex32::new((i as f32 * 0.37).sin(), (i as f32 * 0.11).cos()))
            .collect();
        let orig = data.clone();
        let fft = ScalarFftImpl::<f32>::default();
        fft.fft(&mut data).unwrap();
        fft.ifft(&mut data).unwrap();
        for (a, b) in data.iter().zip(orig.iter()) {
            assert!((a.re - b.re).abs() < 1e-5);
            assert!((a.im - b.im).abs() < 1e-5);
        }
    }

    #[test]
    fn real_input_has_hermitian_symmetry() {
        let n = 8;
        let mut data: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new(i as f32 + 1.0, 0.0))
            .collect();
        let fft = ScalarFftImpl::<f32>::default();
        fft.fft(&mut data).unwrap();
        for k in 1..n / 2 {
            assert!((data[k].re - data[n - k].re).abs() < 1e-4);
            assert!((data[k].im + data[n - k].im).abs() < 1e-4);
        }
    }

    #[test]
    fn rejects_empty_and_non_power_of_two() {
        let fft = ScalarFftImpl::<f32>::default();
        let mut empty: Vec<Complex32> = vec![];
        assert_eq!(fft.fft(&mut empty), Err(FftError::EmptyInput));
        let mut three = vec![Complex32::zero(); 3];
        assert_eq!(fft.fft(&mut three), Err(FftError::NonPowerOfTwo));
    }

    #[test]
    fn out_of_place_leaves_input_untouched() {
        let input: Vec<Complex32> = (0..4).map(|i| Complex32::new(i as f32, 0.0)).collect();
        let mut output = vec![Complex32::zero(); 4];
        let fft = ScalarFftImpl::<f32>::default();
        fft.fft_out_of_place(&input, &mut output).unwrap();
        assert_eq!(input[2].re, 2.0);
        let mut short = vec![Complex32::zero(); 3];
        assert_eq!(
            fft.fft_out_of_place(&input, &mut short),
            Err(FftError::MismatchedLengths)
        );
    }

    #[test]
    fn planner_reuses_twiddle_tables() {
        let mut planner = FftPlanner::<f32>::new();
        let a = planner.get_twiddles(1024);
        let b = planner.get_twiddles(1024);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 512);
        assert!((a[0].re - 1.0).abs() < 1e-6);
    }
}
