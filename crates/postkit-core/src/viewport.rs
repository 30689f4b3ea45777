//! Viewport transform between screen space and canvas space.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom level that displays the canvas at its natural size.
pub const DEFAULT_ZOOM_PERCENT: u32 = 100;
pub const MIN_ZOOM_PERCENT: u32 = 25;
pub const MAX_ZOOM_PERCENT: u32 = 200;
pub const ZOOM_STEP_PERCENT: u32 = 10;

/// The on-screen placement of the canvas.
///
/// `origin` is the screen position of the canvas's top-left corner. It is
/// supplied by the host whenever layout changes, so conversions never have
/// to query the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub origin: Point,
    pub zoom_percent: u32,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub zoom_step: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            zoom_percent: DEFAULT_ZOOM_PERCENT,
            min_zoom: MIN_ZOOM_PERCENT,
            max_zoom: MAX_ZOOM_PERCENT,
            zoom_step: ZOOM_STEP_PERCENT,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewport with custom zoom limits, e.g. from the editor configuration.
    pub fn with_limits(min_zoom: u32, max_zoom: u32, zoom_step: u32) -> Self {
        let min_zoom = min_zoom.max(1);
        let max_zoom = max_zoom.max(min_zoom);
        Self {
            zoom_percent: DEFAULT_ZOOM_PERCENT.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            zoom_step: zoom_step.max(1),
            ..Self::default()
        }
    }

    /// Scale factor (1.0 at 100%).
    pub fn scale(&self) -> f64 {
        f64::from(self.zoom_percent) / 100.0
    }

    /// Canvas-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale(self.scale())
    }

    /// Screen-to-canvas transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.origin.to_vec2())
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    /// Convert a screen-space distance to canvas units.
    pub fn screen_to_canvas_vec(&self, delta: Vec2) -> Vec2 {
        delta / self.scale()
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Set zoom, clamped to the allowed range.
    pub fn set_zoom(&mut self, percent: u32) {
        self.zoom_percent = percent.clamp(self.min_zoom, self.max_zoom);
    }

    /// Zoom in by one step. Returns false when already at the maximum.
    pub fn zoom_in(&mut self) -> bool {
        let before = self.zoom_percent;
        self.set_zoom(before.saturating_add(self.zoom_step));
        self.zoom_percent != before
    }

    /// Zoom out by one step. Returns false when already at the minimum.
    pub fn zoom_out(&mut self) -> bool {
        let before = self.zoom_percent;
        self.set_zoom(before.saturating_sub(self.zoom_step));
        self.zoom_percent != before
    }

    pub fn reset(&mut self) {
        self.set_zoom(DEFAULT_ZOOM_PERCENT);
    }
}
