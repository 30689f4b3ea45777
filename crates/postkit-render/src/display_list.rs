//! Paint-ordered visual tree of a canvas.

use kurbo::{Point, Rect, Size};
use postkit_core::canvas::Canvas;
use postkit_core::color::HexColor;
use postkit_core::layers::{ImageLayer, ImageSource, Layer, LayerKind, ShapeKind, ShapeLayer};
use std::sync::Arc;

/// Fill used where an image cannot be shown.
pub const PLACEHOLDER_COLOR: HexColor = HexColor::rgb(226, 232, 240);

/// Corner radius for pictures, in canvas units.
pub const IMAGE_CORNER_RADIUS: f64 = 8.0;

/// Decoded straight-alpha RGBA8 pixels of an image resource.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl DecodedImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self {
            width,
            height,
            rgba: Arc::new(decoded.into_vec()),
        })
    }
}

/// One drawing instruction, in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Fill {
        rect: Rect,
        color: HexColor,
    },
    RoundedRect {
        rect: Rect,
        radius: f64,
        color: HexColor,
    },
    Ellipse {
        rect: Rect,
        color: HexColor,
    },
    /// Picture scaled to cover `rect`.
    Image {
        rect: Rect,
        image: DecodedImage,
    },
    Placeholder {
        rect: Rect,
    },
    Text {
        origin: Point,
        content: String,
        font_size: f64,
        color: HexColor,
        bold: bool,
        max_width: Option<f64>,
    },
}

/// The visual tree handed to a rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    pub size: Size,
    pub items: Vec<DisplayItem>,
}

impl DisplayList {
    /// Walk the layers in paint order. Does not mutate the canvas.
    pub fn build(canvas: &Canvas, base_size: Size) -> Self {
        let page = Rect::from_origin_size(Point::ZERO, base_size);
        let mut items = vec![DisplayItem::Fill {
            rect: page,
            color: HexColor::white(),
        }];
        for layer in canvas.layers_ordered() {
            if let Some(item) = layer_item(canvas, layer, page) {
                items.push(item);
            }
        }
        Self {
            size: base_size,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn layer_item(canvas: &Canvas, layer: &Layer, page: Rect) -> Option<DisplayItem> {
    let origin = layer.position();
    match &layer.kind {
        LayerKind::Background(bg) => Some(DisplayItem::Fill {
            rect: page,
            color: bg.color,
        }),
        LayerKind::Text(text) => {
            if text.content.is_empty() {
                return None;
            }
            Some(DisplayItem::Text {
                origin,
                content: text.content.clone(),
                font_size: text.font_size,
                color: text.color,
                bold: text.bold,
                max_width: text.width,
            })
        }
        LayerKind::Shape(shape) => Some(shape_item(origin, shape)),
        LayerKind::Image(image) => Some(image_item(canvas, origin, image)),
    }
}

fn shape_item(origin: Point, shape: &ShapeLayer) -> DisplayItem {
    let rect = Rect::from_origin_size(origin, Size::new(shape.width, shape.height));
    match shape.shape {
        ShapeKind::Rectangle => DisplayItem::RoundedRect {
            rect,
            radius: shape.corner_radius(),
            color: shape.color,
        },
        ShapeKind::Ellipse => DisplayItem::Ellipse {
            rect,
            color: shape.color,
        },
    }
}

fn image_item(canvas: &Canvas, origin: Point, image: &ImageLayer) -> DisplayItem {
    let rect = Rect::from_origin_size(origin, Size::new(image.width, image.height));
    let placeholder = DisplayItem::Placeholder { rect };
    match &image.source {
        ImageSource::Local { handle, .. } => {
            let Some(resource) = canvas.resources().get(*handle) else {
                log::debug!("Resource {} no longer held, drawing placeholder", handle);
                return placeholder;
            };
            match DecodedImage::decode(&resource.bytes) {
                Ok(decoded) => DisplayItem::Image {
                    rect,
                    image: decoded,
                },
                Err(e) => {
                    log::warn!("Failed to decode image {}: {}", handle, e);
                    placeholder
                }
            }
        }
        ImageSource::Remote(url) => {
            log::debug!("Remote image {} is not fetched for export", url);
            placeholder
        }
        ImageSource::Unset => placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postkit_core::layers::{LayerPatch, TextPatch};

    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, 1, 1);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[10, 20, 30, 255]).unwrap();
        }
        bytes
    }

    #[test]
    fn test_paint_order() {
        let mut canvas = Canvas::new();
        canvas.add_shape(ShapeKind::Ellipse);
        canvas.add_text(None);
        let list = DisplayList::build(&canvas, Size::new(820.0, 820.0));

        assert_eq!(list.len(), 4);
        assert!(matches!(list.items[0], DisplayItem::Fill { color, .. } if color == HexColor::white()));
        assert!(matches!(list.items[1], DisplayItem::Fill { .. }));
        assert!(matches!(list.items[2], DisplayItem::Ellipse { .. }));
        assert!(matches!(list.items[3], DisplayItem::Text { .. }));
    }

    #[test]
    fn test_rectangle_uses_corner_radius() {
        let mut canvas = Canvas::new();
        canvas.add_shape(ShapeKind::Rectangle);
        let list = DisplayList::build(&canvas, Size::new(820.0, 820.0));
        assert!(matches!(list.items[2], DisplayItem::RoundedRect { radius, .. } if radius == 12.0));
    }

    #[test]
    fn test_images_decode_or_fall_back() {
        let mut canvas = Canvas::new();
        canvas.add_image(None);
        canvas.add_image(Some(tiny_png()));
        canvas.add_image(Some(b"garbage".to_vec()));
        let list = DisplayList::build(&canvas, Size::new(820.0, 820.0));

        assert!(matches!(list.items[2], DisplayItem::Placeholder { .. }));
        match &list.items[3] {
            DisplayItem::Image { image, .. } => {
                assert_eq!((image.width, image.height), (1, 1));
                assert_eq!(image.rgba.as_slice(), &[10, 20, 30, 255]);
            }
            other => panic!("expected image, got {:?}", other),
        }
        assert!(matches!(list.items[4], DisplayItem::Placeholder { .. }));
    }

    #[test]
    fn test_released_resource_renders_placeholder() {
        let mut canvas = Canvas::new();
        let id = canvas.add_image(Some(tiny_png()));
        let with_image = canvas.document.snapshot();
        canvas.delete(id);
        canvas.restore(&with_image);
        let list = DisplayList::build(&canvas, Size::new(820.0, 820.0));
        assert!(matches!(list.items[2], DisplayItem::Placeholder { .. }));
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let mut canvas = Canvas::new();
        let id = canvas.add_text(None);
        canvas.update(
            id,
            &LayerPatch::Text(TextPatch {
                content: Some(String::new()),
                ..Default::default()
            }),
        );
        let list = DisplayList::build(&canvas, Size::new(820.0, 820.0));
        assert_eq!(list.len(), 2);
    }
}
