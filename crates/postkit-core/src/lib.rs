//! Postkit Core Library
//!
//! Layer model, pointer interaction, history and persistence for the
//! postkit template editor.

pub mod canvas;
pub mod color;
pub mod config;
pub mod history;
pub mod input;
pub mod interaction;
pub mod layers;
pub mod resources;
pub mod storage;
pub mod viewport;

pub use canvas::{Canvas, CanvasDocument, DocumentError, ReorderDirection, default_layers};
pub use color::HexColor;
pub use config::{ConfigError, EditorConfig};
pub use history::History;
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{GestureEnd, GestureKind, InteractionEngine, InteractionState, PressTarget};
pub use layers::{Layer, LayerId, LayerKind, LayerLimits, LayerPatch, LayerType};
pub use resources::{ImageResource, ResourceHandle, ResourcePool};
pub use viewport::Viewport;
