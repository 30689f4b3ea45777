//! Layer definitions for the template canvas.

mod image;
mod limits;
mod patch;
mod shape;
mod text;

pub use image::{ImageLayer, ImageSource, PLACEHOLDER_IMAGE_URL};
pub use limits::LayerLimits;
pub use patch::{BackgroundPatch, ImagePatch, LayerPatch, ShapePatch, TextPatch};
pub use shape::{RECTANGLE_CORNER_RADIUS, ShapeKind, ShapeLayer};
pub use text::{MAX_FONT_SIZE, MIN_FONT_SIZE, TextLayer};

use crate::color::HexColor;
use crate::resources::ResourceHandle;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Smallest width/height an image or shape can be resized to.
pub const MIN_DIMENSION: f64 = 20.0;
/// Largest width/height an image or shape can be resized to.
pub const MAX_DIMENSION: f64 = 2000.0;
/// Layer positions are clamped to `0..=MAX_POSITION` on both axes.
pub const MAX_POSITION: f64 = 2000.0;

/// Unique identifier for layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The canvas fill underneath every other layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundLayer {
    pub color: HexColor,
}

/// Variant-specific layer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Background(BackgroundLayer),
    Text(TextLayer),
    Image(ImageLayer),
    Shape(ShapeLayer),
}

/// Discriminant of a [`LayerKind`], for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Background,
    Text,
    Image,
    Shape,
}

impl LayerType {
    pub fn name(self) -> &'static str {
        match self {
            LayerType::Background => "background",
            LayerType::Text => "text",
            LayerType::Image => "image",
            LayerType::Shape => "shape",
        }
    }
}

/// One drawable element of a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    /// Position in canvas-space units.
    pub x: f64,
    pub y: f64,
    /// Paint order, ascending. Dense and unique within a canvas.
    pub z: u32,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Create a layer with a fresh id. `z` is assigned by the canvas.
    pub fn new(position: Point, kind: LayerKind) -> Self {
        Self {
            id: LayerId::new(),
            x: position.x,
            y: position.y,
            z: 0,
            kind,
        }
    }

    pub fn background(color: HexColor) -> Self {
        Self::new(Point::ZERO, LayerKind::Background(BackgroundLayer { color }))
    }

    pub fn text(position: Point, text: TextLayer) -> Self {
        Self::new(position, LayerKind::Text(text))
    }

    pub fn image(position: Point, image: ImageLayer) -> Self {
        Self::new(position, LayerKind::Image(image))
    }

    pub fn shape(position: Point, shape: ShapeLayer) -> Self {
        Self::new(position, LayerKind::Shape(shape))
    }

    pub fn layer_type(&self) -> LayerType {
        match self.kind {
            LayerKind::Background(_) => LayerType::Background,
            LayerKind::Text(_) => LayerType::Text,
            LayerKind::Image(_) => LayerType::Image,
            LayerKind::Shape(_) => LayerType::Shape,
        }
    }

    pub fn is_background(&self) -> bool {
        matches!(self.kind, LayerKind::Background(_))
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Width and height of resizable layers (images and shapes).
    pub fn size(&self) -> Option<Size> {
        match &self.kind {
            LayerKind::Image(image) => Some(Size::new(image.width, image.height)),
            LayerKind::Shape(shape) => Some(Size::new(shape.width, shape.height)),
            LayerKind::Background(_) | LayerKind::Text(_) => None,
        }
    }

    /// Set the size of a resizable layer, clamped to `limits`.
    /// Returns false for layers that cannot be resized.
    pub fn set_size(&mut self, size: Size, limits: &LayerLimits) -> bool {
        let width = limits.dimension(size.width);
        let height = limits.dimension(size.height);
        match &mut self.kind {
            LayerKind::Image(image) => {
                image.width = width;
                image.height = height;
                true
            }
            LayerKind::Shape(shape) => {
                shape.width = width;
                shape.height = height;
                true
            }
            LayerKind::Background(_) | LayerKind::Text(_) => false,
        }
    }

    pub fn is_resizable(&self) -> bool {
        self.size().is_some()
    }

    /// Bounding box in canvas space. The background has none: it is not a
    /// pointer target.
    pub fn bounds(&self) -> Option<Rect> {
        let size = match &self.kind {
            LayerKind::Background(_) => return None,
            LayerKind::Text(text) => text.approximate_size(),
            LayerKind::Image(image) => Size::new(image.width, image.height),
            LayerKind::Shape(shape) => Size::new(shape.width, shape.height),
        };
        Some(Rect::from_origin_size(self.position(), size))
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds().is_some_and(|b| b.contains(point))
    }

    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.kind {
            LayerKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextLayer> {
        match &mut self.kind {
            LayerKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Local resource an image layer points at, owned or not.
    pub fn resource_handle(&self) -> Option<ResourceHandle> {
        self.as_image().and_then(|image| image.source.local_handle())
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageLayer> {
        match &mut self.kind {
            LayerKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Merge a typed patch into this layer, clamping to `limits`.
    /// Returns false when the patch targets a different variant. The
    /// background is pinned at the origin and rejects position patches.
    pub fn apply(&mut self, patch: &LayerPatch, limits: &LayerLimits) -> bool {
        match (patch, &mut self.kind) {
            (LayerPatch::Position { .. }, LayerKind::Background(_)) => false,
            (LayerPatch::Position { x, y }, _) => {
                self.x = limits.position(*x);
                self.y = limits.position(*y);
                true
            }
            (LayerPatch::Background(p), LayerKind::Background(bg)) => {
                p.apply(bg);
                true
            }
            (LayerPatch::Text(p), LayerKind::Text(text)) => {
                p.apply(text, limits);
                true
            }
            (LayerPatch::Image(p), LayerKind::Image(image)) => {
                p.apply(image, limits);
                true
            }
            (LayerPatch::Shape(p), LayerKind::Shape(shape)) => {
                p.apply(shape, limits);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_json_shape() {
        let layer = Layer::text(Point::new(60.0, 80.0), TextLayer::new("Hello").with_font_size(40.0));
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "Hello");
        assert_eq!(json["fontSize"], 40.0);
        assert_eq!(json["x"], 60.0);

        let back: Layer = serde_json::from_value(json).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn test_background_has_no_bounds() {
        let bg = Layer::background(HexColor::white());
        assert!(bg.bounds().is_none());
        assert!(!bg.hit_test(Point::new(1.0, 1.0)));
        assert!(!bg.is_resizable());
    }

    #[test]
    fn test_set_size_clamps() {
        let mut layer = Layer::shape(Point::ZERO, ShapeLayer::new(ShapeKind::Rectangle));
        let limits = LayerLimits::default();
        assert!(layer.set_size(Size::new(5000.0, 1.0), &limits));
        assert_eq!(layer.size(), Some(Size::new(MAX_DIMENSION, MIN_DIMENSION)));

        let mut text = Layer::text(Point::ZERO, TextLayer::new("x"));
        assert!(!text.set_size(Size::new(100.0, 100.0), &limits));
    }

    #[test]
    fn test_set_size_uses_given_limits() {
        let mut layer = Layer::image(Point::ZERO, ImageLayer::placeholder());
        let limits = LayerLimits {
            max_dimension: 3000.0,
            ..Default::default()
        };
        assert!(layer.set_size(Size::new(2500.0, 2500.0), &limits));
        assert_eq!(layer.size(), Some(Size::new(2500.0, 2500.0)));
    }

    #[test]
    fn test_patch_wrong_variant_is_rejected() {
        let mut shape = Layer::shape(Point::ZERO, ShapeLayer::new(ShapeKind::Ellipse));
        let before = shape.clone();
        let patch = LayerPatch::Text(TextPatch {
            font_size: Some(30.0),
            ..Default::default()
        });
        assert!(!shape.apply(&patch, &LayerLimits::default()));
        assert_eq!(shape, before);
    }

    #[test]
    fn test_position_patch_clamps() {
        let mut layer = Layer::text(Point::ZERO, TextLayer::new("x"));
        assert!(layer.apply(&LayerPatch::Position { x: -10.0, y: 9000.0 }, &LayerLimits::default()));
        assert_eq!(layer.position(), Point::new(0.0, MAX_POSITION));
    }

    #[test]
    fn test_background_rejects_position_patch() {
        let mut bg = Layer::background(HexColor::white());
        let patch = LayerPatch::Position { x: 50.0, y: 50.0 };
        assert!(!bg.apply(&patch, &LayerLimits::default()));
        assert_eq!(bg.position(), Point::ZERO);
    }
}
