//! PNG export of a canvas.

use crate::display_list::DisplayList;
use crate::rasterizer::{Rasterizer, RenderError, RenderResult, RgbaImage};
use postkit_core::canvas::Canvas;
use postkit_core::config::EditorConfig;

/// A rendered design ready to be written or downloaded.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// File name for an export taken at `timestamp_millis`.
pub fn export_file_name(timestamp_millis: u64) -> String {
    format!("design-{}.png", timestamp_millis)
}

/// Encode straight-alpha RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let expected = (image.width as usize) * (image.height as usize) * 4;
    if image.data.len() != expected {
        return Err(RenderError::Encode(format!(
            "buffer holds {} bytes, expected {}",
            image.data.len(),
            expected
        )));
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        writer
            .write_image_data(&image.data)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
    }
    Ok(png_data)
}

/// Render the canvas at its base size times `config.export_scale`.
///
/// The on-screen zoom has no effect on the output and the canvas is left
/// untouched.
pub fn export_png<R: Rasterizer + ?Sized>(
    canvas: &Canvas,
    rasterizer: &mut R,
    config: &EditorConfig,
    timestamp_millis: u64,
) -> RenderResult<ExportArtifact> {
    let list = DisplayList::build(canvas, config.canvas_size());
    let image = rasterizer.rasterize(&list, config.export_scale)?;
    let png = encode_png(&image)?;
    log::info!(
        "Exported {}x{} design ({} bytes)",
        image.width,
        image.height,
        png.len()
    );
    Ok(ExportArtifact {
        file_name: export_file_name(timestamp_millis),
        png,
        width: image.width,
        height: image.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuRasterizer;
    use postkit_core::layers::ShapeKind;

    fn decode(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_file_name() {
        assert_eq!(export_file_name(1700000000000), "design-1700000000000.png");
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let image = RgbaImage {
            width: 2,
            height: 2,
            data: vec![0; 4],
        };
        assert!(matches!(encode_png(&image), Err(RenderError::Encode(_))));
    }

    #[test]
    fn test_export_at_double_scale() {
        let mut canvas = Canvas::new();
        canvas.add_shape(ShapeKind::Rectangle);
        let config = EditorConfig::default();
        let artifact = export_png(&canvas, &mut CpuRasterizer::new(), &config, 42).unwrap();

        assert_eq!(artifact.file_name, "design-42.png");
        assert_eq!((artifact.width, artifact.height), (1640, 1640));
        let (info, pixels) = decode(&artifact.png);
        assert_eq!((info.width, info.height), (1640, 1640));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        // White background in the corner.
        assert_eq!(&pixels[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_zoom_does_not_affect_export() {
        let mut canvas = Canvas::new();
        let config = EditorConfig {
            export_scale: 0.25,
            ..EditorConfig::default()
        };
        let before = canvas.document.snapshot();
        let normal = export_png(&canvas, &mut CpuRasterizer::new(), &config, 1).unwrap();
        canvas.viewport.set_zoom(200);
        let zoomed = export_png(&canvas, &mut CpuRasterizer::new(), &config, 1).unwrap();

        assert_eq!((normal.width, normal.height), (205, 205));
        assert_eq!((zoomed.width, zoomed.height), (205, 205));
        assert_eq!(normal.png, zoomed.png);
        assert_eq!(canvas.document.snapshot(), before);
    }
}
