//! Spectrogram rendering: palette lookup and the lazy column-image cache.

pub mod colormap;
pub mod image_cache;

pub use colormap::Colormap;
pub use image_cache::{ColumnImage, SpectrogramImageCache, Style};
