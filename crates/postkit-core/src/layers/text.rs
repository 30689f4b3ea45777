//! Text layer.

use super::LayerLimits;
use crate::color::HexColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Smallest font size offered by the properties panel.
pub const MIN_FONT_SIZE: f64 = 10.0;
/// Largest font size offered by the properties panel.
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Minimum rendered width of a text box, so empty text stays clickable.
const MIN_TEXT_WIDTH: f64 = 40.0;
/// Average glyph advance relative to the font size, used for bounds
/// before a real layout exists.
const APPROX_CHAR_WIDTH: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;

/// A block of editable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub content: String,
    pub font_size: f64,
    pub color: HexColor,
    #[serde(default)]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl TextLayer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: 20.0,
            color: HexColor::rgb(15, 23, 42),
            bold: false,
            width: None,
        }
    }

    /// Builder form of [`set_font_size`](Self::set_font_size) with the
    /// default range.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.set_font_size(font_size, &LayerLimits::default());
        self
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set the font size, clamped to `limits`.
    pub fn set_font_size(&mut self, font_size: f64, limits: &LayerLimits) {
        self.font_size = limits.font_size(font_size);
    }

    /// Estimated box size. Uses the explicit width when set; height grows
    /// with the number of lines.
    pub fn approximate_size(&self) -> Size {
        let lines = self.content.lines().count().max(1);
        let longest = self
            .content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let width = self
            .width
            .unwrap_or(longest as f64 * self.font_size * APPROX_CHAR_WIDTH)
            .max(MIN_TEXT_WIDTH);
        let height = lines as f64 * self.font_size * LINE_HEIGHT;
        Size::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_clamped() {
        let text = TextLayer::new("a").with_font_size(200.0);
        assert_eq!(text.font_size, MAX_FONT_SIZE);
        let text = TextLayer::new("a").with_font_size(1.0);
        assert_eq!(text.font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn test_font_size_follows_limits() {
        let mut text = TextLayer::new("a");
        let limits = LayerLimits {
            max_font_size: 100.0,
            ..Default::default()
        };
        text.set_font_size(90.0, &limits);
        assert_eq!(text.font_size, 90.0);
        text.set_font_size(150.0, &limits);
        assert_eq!(text.font_size, 100.0);
    }

    #[test]
    fn test_approximate_size() {
        let text = TextLayer::new("Hello\nWorld!").with_font_size(20.0);
        let size = text.approximate_size();
        assert!((size.width - 72.0).abs() < 1e-9);
        assert!((size.height - 48.0).abs() < 1e-9);

        let empty = TextLayer::new("");
        assert_eq!(empty.approximate_size().width, MIN_TEXT_WIDTH);
    }
}
