//! Postkit Render Library
//!
//! Turns a canvas into a display list and rasterizes it for export.
//! The default rasterizer runs on the CPU through `vello_cpu`.

mod cpu;
mod display_list;
mod export;
mod rasterizer;

pub use cpu::CpuRasterizer;
pub use display_list::{DecodedImage, DisplayItem, DisplayList, PLACEHOLDER_COLOR};
pub use export::{ExportArtifact, encode_png, export_file_name, export_png};
pub use rasterizer::{Rasterizer, RenderError, RenderResult, RgbaImage};
