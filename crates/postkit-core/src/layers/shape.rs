//! Shape layer.

use crate::color::HexColor;
use serde::{Deserialize, Serialize};

/// Corner radius used when painting rectangles.
pub const RECTANGLE_CORNER_RADIUS: f64 = 12.0;

/// Geometric form of a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[serde(alias = "rect")]
    Rectangle,
    #[serde(alias = "circle")]
    Ellipse,
}

/// A filled rectangle or ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeLayer {
    pub shape: ShapeKind,
    pub width: f64,
    pub height: f64,
    pub color: HexColor,
}

impl ShapeLayer {
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            width: 260.0,
            height: 120.0,
            color: HexColor::rgb(241, 245, 249),
        }
    }

    pub fn corner_radius(&self) -> f64 {
        match self.shape {
            ShapeKind::Rectangle => RECTANGLE_CORNER_RADIUS,
            ShapeKind::Ellipse => self.width.min(self.height) / 2.0,
        }
    }
}
