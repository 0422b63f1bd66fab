//! Color palettes for magnitude-to-pixel mapping, backed by `colorous`.

/// Supported palettes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Diverging palette, the reference spectrogram look.
    #[default]
    Spectral,
    Viridis,
    Inferno,
    Plasma,
    Magma,
    Gray,
}

impl Colormap {
    /// Parse a palette name as used in configuration; unknown names fall
    /// back to Spectral.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "viridis" => Colormap::Viridis,
            "inferno" => Colormap::Inferno,
            "plasma" => Colormap::Plasma,
            "magma" => Colormap::Magma,
            "gray" | "grey" => Colormap::Gray,
            _ => Colormap::Spectral,
        }
    }

    fn gradient(self) -> colorous::Gradient {
        match self {
            Colormap::Spectral => colorous::SPECTRAL,
            Colormap::Viridis => colorous::VIRIDIS,
            Colormap::Inferno => colorous::INFERNO,
            Colormap::Plasma => colorous::PLASMA,
            Colormap::Magma => colorous::MAGMA,
            Colormap::Gray => colorous::GREYS,
        }
    }

    /// Opaque packed-RGBA pixel for normalized intensity `t`, clamped to
    /// `[0, 1]`. Byte order is R, G, B, A from the low byte up.
    pub fn rgba(self, t: f32) -> u32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let c = self.gradient().eval_continuous(t as f64);
        u32::from_le_bytes([c.r, c.g, c.b, 0xff])
    }
}
