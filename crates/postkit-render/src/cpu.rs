//! CPU rasterizer built on `vello_cpu`.

use crate::display_list::{DecodedImage, DisplayItem, DisplayList, IMAGE_CORNER_RADIUS, PLACEHOLDER_COLOR};
use crate::rasterizer::{Rasterizer, RenderError, RenderResult, RgbaImage};
use kurbo::{Affine, BezPath, Ellipse, PathEl, Point, Rect, RoundedRect, Shape as KurboShape};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use postkit_core::color::HexColor;
use std::sync::Arc;

const PATH_TOLERANCE: f64 = 0.1;

/// A font registered for text layout and glyph drawing.
struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Software rasterizer.
///
/// Text runs need glyph outlines, so they are only drawn once a font has
/// been supplied with [`CpuRasterizer::with_font`]. Without one they are
/// skipped.
pub struct CpuRasterizer {
    font_cx: FontContext,
    layout_cx: LayoutContext<[u8; 4]>,
    font: Option<LoadedFont>,
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self {
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            font: None,
        }
    }

    /// Register a TrueType/OpenType font used for every text run.
    pub fn with_font(mut self, bytes: Vec<u8>) -> RenderResult<Self> {
        let families = self
            .font_cx
            .collection
            .register_fonts(parley::fontique::Blob::new(Arc::new(bytes.clone())), None);
        let family = families
            .first()
            .and_then(|(id, _)| self.font_cx.collection.family_name(*id))
            .map(str::to_string)
            .ok_or_else(|| RenderError::Decode("no font faces found".to_string()))?;
        log::debug!("Registered font family {}", family);
        self.font = Some(LoadedFont {
            family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        });
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn draw_item(&mut self, ctx: &mut vello_cpu::RenderContext, item: &DisplayItem, base: Affine) {
        ctx.set_transform(affine_to_cpu(base));
        match item {
            DisplayItem::Fill { rect, color } => {
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_rect(&rect_to_cpu(*rect));
            }
            DisplayItem::RoundedRect {
                rect,
                radius,
                color,
            } => {
                ctx.set_paint(color_to_cpu(*color));
                let path = RoundedRect::from_rect(*rect, *radius).to_path(PATH_TOLERANCE);
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
            DisplayItem::Ellipse { rect, color } => {
                ctx.set_paint(color_to_cpu(*color));
                let path = Ellipse::from_rect(*rect).to_path(PATH_TOLERANCE);
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
            DisplayItem::Placeholder { rect } => {
                ctx.set_paint(color_to_cpu(PLACEHOLDER_COLOR));
                let path = RoundedRect::from_rect(*rect, IMAGE_CORNER_RADIUS).to_path(PATH_TOLERANCE);
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
            DisplayItem::Image { rect, image } => draw_image(ctx, *rect, image, base),
            DisplayItem::Text {
                origin,
                content,
                font_size,
                color,
                bold,
                max_width,
            } => {
                let transform = base * Affine::translate(origin.to_vec2());
                self.draw_text(ctx, transform, content, *font_size, *color, *bold, *max_width);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        transform: Affine,
        content: &str,
        font_size: f64,
        color: HexColor,
        bold: bool,
        max_width: Option<f64>,
    ) {
        let Some(font) = &self.font else {
            log::debug!("No font loaded, skipping text run {:?}", content);
            return;
        };

        let weight = if bold {
            parley::FontWeight::BOLD
        } else {
            parley::FontWeight::NORMAL
        };
        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, content, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size as f32));
        builder.push_default(StyleProperty::Brush(color.to_array()));
        builder.push_default(StyleProperty::FontWeight(weight));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Named(font.family.clone().into()),
        )));
        let mut layout = builder.build(content);
        layout.break_all_lines(max_width.map(|w| w as f32));
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        ctx.set_transform(affine_to_cpu(transform));
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run_size = glyph_run.run().font_size();
                let [r, g, b, a] = glyph_run.style().brush;
                let glyphs: Vec<vello_cpu::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello_cpu::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.glyph_run(&font.data)
                    .font_size(run_size)
                    .fill_glyphs(glyphs.into_iter());
            }
        }
    }
}

impl Rasterizer for CpuRasterizer {
    fn rasterize(&mut self, list: &DisplayList, scale: f64) -> RenderResult<RgbaImage> {
        let width = pixel_dimension(list.size.width * scale)?;
        let height = pixel_dimension(list.size.height * scale)?;

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        let base = Affine::scale(scale);
        for item in &list.items {
            self.draw_item(&mut ctx, item, base);
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);

        let mut data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_in_place(&mut data);
        Ok(RgbaImage {
            width: u32::from(width),
            height: u32::from(height),
            data,
        })
    }
}

/// Draw a picture so it covers `rect`, cropping the overflow evenly.
fn draw_image(ctx: &mut vello_cpu::RenderContext, rect: Rect, image: &DecodedImage, base: Affine) {
    if image.width == 0 || image.height == 0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return;
    }
    let Some(pixmap) = pixmap_from_straight_rgba(&image.rgba, image.width, image.height) else {
        log::warn!("Image too large for the rasterizer: {}x{}", image.width, image.height);
        return;
    };

    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let scale = (rect.width() / iw).max(rect.height() / ih);
    let crop = Rect::from_center_size(
        Point::new(iw / 2.0, ih / 2.0),
        (rect.width() / scale, rect.height() / scale),
    );
    let transform = base
        * Affine::translate(rect.origin().to_vec2())
        * Affine::scale(scale)
        * Affine::translate(-crop.origin().to_vec2());

    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    let path = RoundedRect::from_rect(crop, IMAGE_CORNER_RADIUS / scale).to_path(PATH_TOLERANCE);
    ctx.fill_path(&bezpath_to_cpu(&path));
}

fn pixel_dimension(value: f64) -> RenderResult<u16> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > f64::from(u16::MAX) {
        return Err(RenderError::InvalidSize(format!("{} pixels", value)));
    }
    Ok(rounded as u16)
}

fn pixmap_from_straight_rgba(rgba: &[u8], width: u32, height: u32) -> Option<vello_cpu::Pixmap> {
    let w: u16 = width.try_into().ok()?;
    let h: u16 = height.try_into().ok()?;
    if rgba.len() != (width as usize) * (height as usize) * 4 {
        return None;
    }
    let pixels = rgba
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array(premultiply([px[0], px[1], px[2], px[3]]))
        })
        .collect();
    Some(vello_cpu::Pixmap::from_parts(pixels, w, h))
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { ((u16::from(c) * a16 + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn unpremultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn color_to_cpu(color: HexColor) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let point = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point(p)),
            PathEl::LineTo(p) => out.line_to(point(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point(p1), point(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(point(p1), point(p2), point(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn solid(color: HexColor) -> DisplayList {
        DisplayList {
            size: Size::new(100.0, 100.0),
            items: vec![DisplayItem::Fill {
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                color,
            }],
        }
    }

    #[test]
    fn test_solid_fill() {
        let mut rasterizer = CpuRasterizer::new();
        let image = rasterizer.rasterize(&solid(HexColor::rgb(255, 0, 0)), 0.5).unwrap();
        assert_eq!((image.width, image.height), (50, 50));
        assert_eq!(image.pixel(25, 25), Some([255, 0, 0, 255]));
        assert_eq!(image.data.len(), 50 * 50 * 4);
    }

    #[test]
    fn test_items_paint_in_order() {
        let mut list = solid(HexColor::white());
        list.items.push(DisplayItem::Fill {
            rect: Rect::new(0.0, 0.0, 50.0, 100.0),
            color: HexColor::rgb(0, 0, 255),
        });
        let image = CpuRasterizer::new().rasterize(&list, 1.0).unwrap();
        assert_eq!(image.pixel(10, 50), Some([0, 0, 255, 255]));
        assert_eq!(image.pixel(90, 50), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_text_without_font_is_skipped() {
        let mut list = solid(HexColor::white());
        list.items.push(DisplayItem::Text {
            origin: Point::new(10.0, 10.0),
            content: "Hello".to_string(),
            font_size: 40.0,
            color: HexColor::black(),
            bold: true,
            max_width: None,
        });
        let mut rasterizer = CpuRasterizer::new();
        assert!(!rasterizer.has_font());
        let image = rasterizer.rasterize(&list, 1.0).unwrap();
        assert!(image.data.chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_image_covers_rect() {
        let green: Vec<u8> = [0u8, 200, 0, 255].repeat(4 * 2);
        let mut list = solid(HexColor::white());
        list.items.push(DisplayItem::Image {
            rect: Rect::new(20.0, 20.0, 80.0, 80.0),
            image: DecodedImage {
                width: 4,
                height: 2,
                rgba: Arc::new(green),
            },
        });
        let image = CpuRasterizer::new().rasterize(&list, 1.0).unwrap();

        let [r, g, b, a] = image.pixel(50, 50).unwrap();
        assert!(r <= 2 && b <= 2 && a == 255);
        assert!(g.abs_diff(200) <= 2);
        assert_eq!(image.pixel(5, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_pixmap_rejects_mismatched_buffer() {
        assert!(pixmap_from_straight_rgba(&[0; 12], 2, 2).is_none());
        let pixmap = pixmap_from_straight_rgba(&[255; 16], 2, 2).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (2, 2));
    }

    #[test]
    fn test_invalid_size() {
        let mut rasterizer = CpuRasterizer::new();
        let result = rasterizer.rasterize(&solid(HexColor::white()), 0.0);
        assert!(matches!(result, Err(RenderError::InvalidSize(_))));
        let result = rasterizer.rasterize(&solid(HexColor::white()), 1000.0);
        assert!(matches!(result, Err(RenderError::InvalidSize(_))));
    }

    #[test]
    fn test_invalid_font() {
        let result = CpuRasterizer::new().with_font(b"not a font".to_vec());
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }

    #[test]
    fn test_premultiply_roundtrip() {
        let mut px = premultiply([200, 100, 50, 128]).to_vec();
        unpremultiply_in_place(&mut px);
        for (got, want) in px.iter().zip([200u8, 100, 50, 128]) {
            assert!((i16::from(*got) - i16::from(want)).abs() <= 2);
        }
    }
}
