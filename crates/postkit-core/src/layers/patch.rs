//! Typed partial updates, one per layer variant.
//!
//! Each patch only carries the fields its variant has, so a font size can
//! never be written to a shape.

use super::{BackgroundLayer, ImageLayer, LayerLimits, ShapeKind, ShapeLayer, TextLayer};
use crate::color::HexColor;

/// A partial update addressed to one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerPatch {
    /// Move any layer. Coordinates are clamped to the canvas extent.
    Position { x: f64, y: f64 },
    Background(BackgroundPatch),
    Text(TextPatch),
    Image(ImagePatch),
    Shape(ShapePatch),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundPatch {
    pub color: Option<HexColor>,
}

impl BackgroundPatch {
    pub(super) fn apply(&self, layer: &mut BackgroundLayer) {
        if let Some(color) = self.color {
            layer.color = color;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPatch {
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<HexColor>,
    pub bold: Option<bool>,
    /// `Some(None)` clears an explicit width.
    pub width: Option<Option<f64>>,
}

impl TextPatch {
    pub(super) fn apply(&self, layer: &mut TextLayer, limits: &LayerLimits) {
        if let Some(content) = &self.content {
            layer.content.clone_from(content);
        }
        if let Some(size) = self.font_size {
            layer.set_font_size(size, limits);
        }
        if let Some(color) = self.color {
            layer.color = color;
        }
        if let Some(bold) = self.bold {
            layer.bold = bold;
        }
        if let Some(width) = self.width {
            layer.width = width.map(|w| limits.dimension(w));
        }
    }
}

/// Size edits for an image. Replacing the source goes through the canvas so
/// resource ownership is honored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ImagePatch {
    pub(super) fn apply(&self, layer: &mut ImageLayer, limits: &LayerLimits) {
        if let Some(width) = self.width {
            layer.width = limits.dimension(width);
        }
        if let Some(height) = self.height {
            layer.height = limits.dimension(height);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub shape: Option<ShapeKind>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<HexColor>,
}

impl ShapePatch {
    pub(super) fn apply(&self, layer: &mut ShapeLayer, limits: &LayerLimits) {
        if let Some(shape) = self.shape {
            layer.shape = shape;
        }
        if let Some(width) = self.width {
            layer.width = limits.dimension(width);
        }
        if let Some(height) = self.height {
            layer.height = limits.dimension(height);
        }
        if let Some(color) = self.color {
            layer.color = color;
        }
    }
}
