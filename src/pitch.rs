//! Musical pitch math anchored to a tunable A4 reference.
//!
//! The reference is an explicit value threaded through construction rather
//! than process-wide state, so analyses with different tunings can coexist.

/// 12-TET ratio between C and the A below it: `2^(-9/12)`.
const C_TO_A_RATIO: f64 = 0.5946;

/// Cent width of one note-display row (5 divisions per semitone).
pub const CENTS_PER_ROW: f64 = 20.0;

/// Number of rows in the note-binned display range.
pub const NOTE_ROWS: usize = 640;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Tuning reference for note naming and note-binned rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    a4: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self { a4: 440.0 }
    }
}

impl Tuning {
    pub fn new(a4: f64) -> Self {
        Self { a4 }
    }

    pub fn a4(&self) -> f64 {
        self.a4
    }

    /// Anchor used when naming notes: C below `A4/32`.
    pub fn naming_anchor(&self) -> f64 {
        (self.a4 / 32.0) * C_TO_A_RATIO
    }

    /// Anchor used by the note-binned raster: C below `A4/16`.
    pub fn raster_anchor(&self) -> f64 {
        (self.a4 / 16.0) * C_TO_A_RATIO
    }

    /// Cents of `freq` above the raster anchor. `None` when `freq` is not a
    /// positive finite frequency (e.g. the DC bin, or a query sentinel).
    pub fn raster_cents(&self, freq: f64) -> Option<f64> {
        if !freq.is_finite() || freq <= 0.0 {
            return None;
        }
        Some(1200.0 * (freq / self.raster_anchor()).log2())
    }

    /// Human-readable note for a frequency: `"A4 (+3 cents) [810]"`. The
    /// bracketed value is the display bin (10 per semitone). Frequencies
    /// below the anchor render as `"C-1 (-N cents) [bin]"`; non-positive or
    /// non-finite frequencies yield `None`.
    pub fn note_name(&self, freq: f64) -> Option<String> {
        if !freq.is_finite() || freq <= 0.0 {
            return None;
        }
        let cents_from_anchor = (1200.0 * (freq / self.naming_anchor()).log2()) as i64;
        let mut semitones = cents_from_anchor / 100;
        let mut cents = cents_from_anchor % 100;
        if cents > 50 {
            semitones += 1;
            cents = -(100 - cents);
        }
        let octave = semitones / 12 - 1;
        let note = semitones % 12;
        let display_bin = (24 + octave * 12 + note) * 10 + cents / 10;
        if cents_from_anchor < 0 {
            Some(format!(
                "C-1 ({:+} cents) [{}]",
                cents_from_anchor, display_bin
            ))
        } else {
            Some(format!(
                "{}{} ({:+} cents) [{}]",
                NOTE_NAMES[note as usize], octave, cents, display_bin
            ))
        }
    }
}
