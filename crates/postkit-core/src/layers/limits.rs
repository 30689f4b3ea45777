//! Editable ranges for layer geometry and text size.

use super::{MAX_DIMENSION, MAX_FONT_SIZE, MAX_POSITION, MIN_DIMENSION, MIN_FONT_SIZE};

/// Bounds every layer edit is clamped to. Built from the editor config; the
/// default carries the built-in ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerLimits {
    pub max_position: f64,
    pub min_dimension: f64,
    pub max_dimension: f64,
    pub min_font_size: f64,
    pub max_font_size: f64,
}

impl Default for LayerLimits {
    fn default() -> Self {
        Self {
            max_position: MAX_POSITION,
            min_dimension: MIN_DIMENSION,
            max_dimension: MAX_DIMENSION,
            min_font_size: MIN_FONT_SIZE,
            max_font_size: MAX_FONT_SIZE,
        }
    }
}

// An inverted range collapses onto its lower bound instead of panicking.
impl LayerLimits {
    /// Clamp a coordinate to `0..=max_position`.
    pub fn position(&self, value: f64) -> f64 {
        value.clamp(0.0, self.max_position.max(0.0))
    }

    /// Clamp a width or height to the resizable range.
    pub fn dimension(&self, value: f64) -> f64 {
        value.clamp(self.min_dimension, self.max_dimension.max(self.min_dimension))
    }

    pub fn font_size(&self, value: f64) -> f64 {
        value.clamp(self.min_font_size, self.max_font_size.max(self.min_font_size))
    }
}
