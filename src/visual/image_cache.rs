//! Lazy cache of rendered spectrogram columns.
//!
//! Each analysis fragment rasterizes to a one-pixel-wide RGBA column on
//! first request and is cached until something invalidates it. The cache
//! never borrows the engine; queries pass it in, and the engine's epoch
//! counter tells the cache when its contents went stale. Any parameter
//! change (style, palette, floor, tuning) drops every cached column.

use log::debug;

use crate::pitch::{Tuning, CENTS_PER_ROW, NOTE_ROWS};
use crate::stft::StftEngine;
use crate::visual::colormap::Colormap;

/// Default noise floor in dB; magnitudes at or below it render transparent.
pub const DEFAULT_FLOOR_DB: f32 = -50.0;

/// Vertical layout of a rendered column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Style {
    /// One row per frequency bin, linear in frequency.
    #[default]
    Linear,
    /// [`NOTE_ROWS`] rows of [`CENTS_PER_ROW`]-cent pitch buckets.
    Logarithmic,
}

/// A one-pixel-wide RGBA column. Row 0 is the top (highest frequency or
/// pitch); a zero pixel is fully transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnImage {
    pixels: Vec<u32>,
}

impl ColumnImage {
    pub fn height(&self) -> usize {
        self.pixels.len()
    }

    /// Packed-RGBA pixels, top to bottom.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at row `y`, transparent when out of range.
    pub fn pixel(&self, y: usize) -> u32 {
        self.pixels.get(y).copied().unwrap_or(0)
    }
}

/// Lazy per-fragment spectrogram rasterizer.
pub struct SpectrogramImageCache {
    style: Style,
    colormap: Colormap,
    invert: bool,
    floor_db: f32,
    tuning: Tuning,
    epoch: u64,
    columns: Vec<Option<ColumnImage>>,
}

impl Default for SpectrogramImageCache {
    fn default() -> Self {
        Self {
            style: Style::Linear,
            colormap: Colormap::Spectral,
            invert: true,
            floor_db: DEFAULT_FLOOR_DB,
            tuning: Tuning::default(),
            epoch: 0,
            columns: Vec::new(),
        }
    }
}

impl SpectrogramImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    pub fn inverted(&self) -> bool {
        self.invert
    }

    pub fn floor(&self) -> f32 {
        self.floor_db
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
        self.clear();
    }

    /// Select the palette and whether its intensity axis is flipped.
    pub fn set_colormap(&mut self, colormap: Colormap, invert: bool) {
        self.colormap = colormap;
        self.invert = invert;
        self.clear();
    }

    /// Set the noise floor in dB. Must be negative: it is both the
    /// transparency cutoff and the normalization divisor.
    pub fn set_floor(&mut self, floor_db: f32) {
        debug_assert!(floor_db < 0.0);
        self.floor_db = floor_db;
        self.clear();
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.clear();
    }

    /// Drop every cached column.
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Rendered column for fragment `index`, rasterizing on first request.
    /// `None` when `index` is out of range.
    pub fn bitmap(&mut self, engine: &StftEngine, index: usize) -> Option<&ColumnImage> {
        self.revalidate(engine);
        if index >= self.columns.len() {
            return None;
        }
        if self.columns[index].is_none() {
            let column = match self.style {
                Style::Linear => self.plot_linear(engine, index),
                Style::Logarithmic => self.plot_logarithmic(engine, index),
            };
            self.columns[index] = Some(column);
        }
        self.columns[index].as_ref()
    }

    /// Rendered column for the fragment covering time `tm` (seconds).
    pub fn at(&mut self, engine: &StftEngine, tm: f64) -> Option<&ColumnImage> {
        let index = engine.frame_index(tm);
        if index < 0 {
            return None;
        }
        self.bitmap(engine, index as usize)
    }

    /// Number of columns currently rasterized.
    pub fn cached(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    fn revalidate(&mut self, engine: &StftEngine) {
        if self.epoch != engine.epoch() || self.columns.len() != engine.len() {
            debug!(
                "spectrogram cache stale (epoch {} -> {}), dropping {} columns",
                self.epoch,
                engine.epoch(),
                self.cached()
            );
            self.columns.clear();
            self.columns.resize(engine.len(), None);
            self.epoch = engine.epoch();
        }
    }

    /// Normalized intensity of a dB magnitude against the floor, or `None`
    /// when it should render transparent.
    fn intensity(&self, db: f32) -> Option<f32> {
        let t = (db - self.floor_db).max(0.0) / -self.floor_db;
        if t > 0.0 {
            Some(if self.invert { 1.0 - t } else { t })
        } else {
            None
        }
    }

    fn plot_linear(&self, engine: &StftEngine, index: usize) -> ColumnImage {
        let fragment = engine.fragment(index as i64);
        let height = engine.fft_size() / 2;
        let mut pixels = vec![0u32; height];
        for bin in 0..height {
            let db = 20.0 * (2.0 * fragment.magnitude(bin)).log10();
            if let Some(t) = self.intensity(db) {
                pixels[height - 1 - bin] = self.colormap.rgba(t);
            }
        }
        ColumnImage { pixels }
    }

    fn plot_logarithmic(&self, engine: &StftEngine, index: usize) -> ColumnImage {
        // Accumulate bin magnitudes into pitch buckets, then convert the
        // bucket totals to dB with the same pipeline as the linear style.
        let mut buckets = vec![0f32; NOTE_ROWS];
        for bin in 0..engine.fft_size() / 2 {
            let (mag, freq) = engine.raw_magnitude_at(index as i64, bin);
            let Some(cents) = self.tuning.raster_cents(freq as f64) else {
                continue;
            };
            let row = (cents / CENTS_PER_ROW).max(0.0) as usize;
            if row >= NOTE_ROWS {
                continue;
            }
            buckets[row] += mag;
        }
        let mut pixels = vec![0u32; NOTE_ROWS];
        for (row, &mag) in buckets.iter().enumerate() {
            let db = 20.0 * (2.0 * mag).log10();
            if let Some(t) = self.intensity(db) {
                pixels[NOTE_ROWS - 1 - row] = self.colormap.rgba(t);
            }
        }
        ColumnImage { pixels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleBuffer;
    use crate::window::Window;

    fn engine_with_sine(freq: f64) -> StftEngine {
        let rate = 8000.0;
        let data = (0..4096)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate).sin() as f32)
            .collect();
        let buf = SampleBuffer::new(data, rate).unwrap();
        let mut e = StftEngine::new(512, 256, Window::BlackmanHarris).unwrap();
        e.analyze(&buf).unwrap();
        e
    }

    #[test]
    fn linear_columns_have_half_spectrum_height() {
        let e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        let col = cache.bitmap(&e, 3).unwrap();
        assert_eq!(col.height(), 256);
    }

    #[test]
    fn logarithmic_columns_have_note_row_height() {
        let e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        cache.set_style(Style::Logarithmic);
        let col = cache.bitmap(&e, 3).unwrap();
        assert_eq!(col.height(), NOTE_ROWS);
    }

    #[test]
    fn tone_paints_its_bin_and_leaves_silence_transparent() {
        let e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        let col = cache.bitmap(&e, 4).unwrap();
        // 500 Hz at 8000 Hz over 512 points sits in bin 32; row 0 is the
        // top, so the bin maps to row 256 - 1 - 32.
        assert_ne!(col.pixel(256 - 1 - 32), 0);
        // The top of the spectrum is far from the tone and below the floor.
        assert_eq!(col.pixel(0), 0);
    }

    #[test]
    fn out_of_range_index_is_none() {
        let e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        assert!(cache.bitmap(&e, e.len()).is_none());
        assert!(cache.at(&e, -1.0).is_none());
        assert!(cache.at(&e, 0.1).is_some());
    }

    #[test]
    fn columns_are_rasterized_lazily_and_cached() {
        let e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        assert_eq!(cache.cached(), 0);
        cache.bitmap(&e, 2);
        cache.bitmap(&e, 2);
        cache.bitmap(&e, 5);
        assert_eq!(cache.cached(), 2);
    }

    #[test]
    fn parameter_changes_invalidate_everything() {
        let e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        let before = cache.bitmap(&e, 4).unwrap().clone();
        cache.set_floor(-20.0);
        assert_eq!(cache.cached(), 0);
        let after = cache.bitmap(&e, 4).unwrap();
        // A tighter floor renormalizes the tone's intensity.
        assert_ne!(before, *after);
        cache.set_colormap(Colormap::Viridis, false);
        assert_eq!(cache.cached(), 0);
        cache.set_tuning(Tuning::new(432.0));
        assert_eq!(cache.cached(), 0);
        cache.set_style(Style::Logarithmic);
        assert_eq!(cache.cached(), 0);
    }

    #[test]
    fn reanalysis_drops_stale_columns() {
        let mut e = engine_with_sine(500.0);
        let mut cache = SpectrogramImageCache::new();
        cache.bitmap(&e, 0);
        assert_eq!(cache.cached(), 1);
        let buf = SampleBuffer::constant(1024, 8000.0, 0.0).unwrap();
        e.analyze(&buf).unwrap();
        let col = cache.bitmap(&e, 0).unwrap();
        // Silence renders fully transparent.
        assert!(col.pixels().iter().all(|&p| p == 0));
        assert_eq!(cache.cached(), 1);
        assert!(cache.bitmap(&e, 10).is_none());
    }

    #[test]
    fn logarithmic_tone_lands_in_its_pitch_row() {
        let e = engine_with_sine(440.0);
        let mut cache = SpectrogramImageCache::new();
        cache.set_style(Style::Logarithmic);
        let col = cache.bitmap(&e, 4).unwrap();
        // 440 Hz above the raster anchor (A4/16 * 2^(-9/12) ~ 16.35 Hz):
        // 1200 * log2(440 / 16.35) ~ 5699 cents, row ~284 from the bottom.
        let t = Tuning::default();
        let row = (t.raster_cents(440.0).unwrap() / CENTS_PER_ROW) as usize;
        let y = NOTE_ROWS - 1 - row;
        let lit = (y.saturating_sub(1)..=y + 1).any(|y| col.pixel(y) != 0);
        assert!(lit, "no pixel near row {}", y);
    }
}
