//! Pointer-driven drag and resize of layers.
//!
//! All pointer positions arrive in screen space and are mapped through the
//! canvas viewport. The drag offset is captured fresh at every press so no
//! error accumulates across gestures.

use crate::canvas::Canvas;
use crate::input::{MouseButton, PointerEvent};
use crate::layers::LayerId;
use kurbo::{Point, Rect, Size, Vec2};

/// Side length of the square resize handle at a layer's bottom-right corner,
/// in canvas units.
pub const RESIZE_HANDLE_SIZE: f64 = 16.0;

/// Current gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    Dragging {
        id: LayerId,
        /// Pointer position relative to the layer origin, in canvas units.
        offset: Vec2,
        /// Layer position at press.
        origin: Point,
    },
    Resizing {
        id: LayerId,
        start_size: Size,
        /// Pointer position at press, in canvas units.
        start_pointer: Point,
    },
}

/// What a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    ResizeHandle(LayerId),
    Layer(LayerId),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize,
}

/// Result of releasing the pointer after a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEnd {
    pub id: LayerId,
    pub kind: GestureKind,
    /// Whether the layer geometry differs from what it was at press.
    pub changed: bool,
}

/// Drag/resize state machine. Gesture geometry is rounded to whole units
/// and clamped to the canvas limits.
#[derive(Debug, Clone)]
pub struct InteractionEngine {
    state: InteractionState,
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionEngine {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Feed a host pointer event. Only the primary button starts gestures.
    pub fn handle_pointer(&mut self, canvas: &mut Canvas, event: PointerEvent) -> Option<GestureEnd> {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                self.pointer_down(canvas, position);
                None
            }
            PointerEvent::Move { position } => {
                self.pointer_move(canvas, position);
                None
            }
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.pointer_up(canvas),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => None,
        }
    }

    /// Resize handle of the selected layer, in canvas space.
    pub fn resize_handle(canvas: &Canvas) -> Option<(LayerId, Rect)> {
        let layer = canvas.selected_layer().filter(|l| l.is_resizable())?;
        let corner = layer.bounds()?;
        let rect = Rect::from_center_size(
            Point::new(corner.x1, corner.y1),
            Size::new(RESIZE_HANDLE_SIZE, RESIZE_HANDLE_SIZE),
        );
        Some((layer.id, rect))
    }

    /// Start a gesture. The resize handle of the selected layer wins over
    /// layer bodies; a press on empty canvas clears the selection.
    pub fn pointer_down(&mut self, canvas: &mut Canvas, screen_point: Point) -> PressTarget {
        let point = canvas.viewport.screen_to_canvas(screen_point);

        if let Some((id, handle)) = Self::resize_handle(canvas) {
            if handle.contains(point) {
                if let Some(start_size) = canvas.get(id).and_then(|l| l.size()) {
                    self.state = InteractionState::Resizing {
                        id,
                        start_size,
                        start_pointer: point,
                    };
                    return PressTarget::ResizeHandle(id);
                }
            }
        }

        match canvas.hit_test(point).and_then(|id| canvas.get(id)) {
            Some(layer) => {
                let id = layer.id;
                let origin = layer.position();
                canvas.select(id);
                self.state = InteractionState::Dragging {
                    id,
                    offset: point - origin,
                    origin,
                };
                PressTarget::Layer(id)
            }
            None => {
                canvas.clear_selection();
                self.state = InteractionState::Idle;
                PressTarget::Empty
            }
        }
    }

    /// Apply the active gesture at the new pointer position. Returns whether
    /// any geometry was written.
    pub fn pointer_move(&mut self, canvas: &mut Canvas, screen_point: Point) -> bool {
        let point = canvas.viewport.screen_to_canvas(screen_point);
        let limits = *canvas.limits();
        let applied = match self.state {
            InteractionState::Idle => return false,
            InteractionState::Dragging { id, offset, .. } => {
                let target = point - offset;
                let position = Point::new(
                    limits.position(target.x.round()),
                    limits.position(target.y.round()),
                );
                canvas.set_position(id, position)
            }
            InteractionState::Resizing {
                id,
                start_size,
                start_pointer,
            } => {
                let delta = point - start_pointer;
                let size = Size::new(
                    limits.dimension((start_size.width + delta.x).round()),
                    limits.dimension((start_size.height + delta.y).round()),
                );
                canvas.set_size(id, size)
            }
        };
        if !applied {
            log::debug!("Gesture target vanished, returning to idle");
            self.state = InteractionState::Idle;
        }
        applied
    }

    /// Finish the gesture and report whether it changed anything.
    pub fn pointer_up(&mut self, canvas: &Canvas) -> Option<GestureEnd> {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        match state {
            InteractionState::Idle => None,
            InteractionState::Dragging { id, origin, .. } => {
                let layer = canvas.get(id)?;
                Some(GestureEnd {
                    id,
                    kind: GestureKind::Drag,
                    changed: layer.position() != origin,
                })
            }
            InteractionState::Resizing { id, start_size, .. } => {
                let layer = canvas.get(id)?;
                Some(GestureEnd {
                    id,
                    kind: GestureKind::Resize,
                    changed: layer.size() != Some(start_size),
                })
            }
        }
    }

    /// Abort the gesture and put the layer back where it was at press.
    /// Returns false when idle.
    pub fn cancel(&mut self, canvas: &mut Canvas) -> bool {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        match state {
            InteractionState::Idle => false,
            InteractionState::Dragging { id, origin, .. } => {
                canvas.set_position(id, origin);
                true
            }
            InteractionState::Resizing { id, start_size, .. } => {
                canvas.set_size(id, start_size);
                true
            }
        }
    }

    /// Drop any gesture without touching the canvas, e.g. after the layer
    /// collection was replaced by undo.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{LayerLimits, ShapeKind};

    fn press(engine: &mut InteractionEngine, canvas: &mut Canvas, x: f64, y: f64) -> PressTarget {
        engine.pointer_down(canvas, Point::new(x, y))
    }

    #[test]
    fn test_drag_at_zoom() {
        let mut canvas = Canvas::new();
        let id = canvas.add_shape(ShapeKind::Rectangle);
        canvas.clear_selection();
        canvas.viewport.set_zoom(50);
        let mut engine = InteractionEngine::default();

        // Layer at (100,220) renders at screen (50,110) when zoomed to 50%.
        assert_eq!(press(&mut engine, &mut canvas, 60.0, 120.0), PressTarget::Layer(id));
        assert_eq!(canvas.selection(), Some(id));

        engine.pointer_move(&mut canvas, Point::new(110.0, 170.0));
        assert_eq!(canvas.get(id).unwrap().position(), Point::new(200.0, 320.0));

        let end = engine.pointer_up(&canvas).unwrap();
        assert!(end.changed);
        assert_eq!(end.kind, GestureKind::Drag);
        assert!(engine.is_idle());
    }

    #[test]
    fn test_drag_clamps_to_extent() {
        let mut canvas = Canvas::new();
        let id = canvas.add_text(None);
        let mut engine = InteractionEngine::default();
        press(&mut engine, &mut canvas, 85.0, 85.0);
        engine.pointer_move(&mut canvas, Point::new(-500.0, 9000.0));
        assert_eq!(canvas.get(id).unwrap().position(), Point::new(0.0, 2000.0));
    }

    #[test]
    fn test_drag_rounds_position() {
        let mut canvas = Canvas::new();
        let id = canvas.add_text(None);
        let mut engine = InteractionEngine::default();
        press(&mut engine, &mut canvas, 85.0, 85.0);
        engine.pointer_move(&mut canvas, Point::new(90.4, 95.6));
        assert_eq!(canvas.get(id).unwrap().position(), Point::new(85.0, 91.0));
    }

    #[test]
    fn test_click_without_move_is_not_a_change() {
        let mut canvas = Canvas::new();
        canvas.add_text(None);
        let mut engine = InteractionEngine::default();
        press(&mut engine, &mut canvas, 85.0, 85.0);
        let end = engine.pointer_up(&canvas).unwrap();
        assert!(!end.changed);
    }

    #[test]
    fn test_resize_clamps() {
        let mut canvas = Canvas::new();
        let id = canvas.add_image(None);
        let mut engine = InteractionEngine::default();

        // Image at (120,180) sized 260x160: handle centred on (380,340).
        assert_eq!(press(&mut engine, &mut canvas, 381.0, 339.0), PressTarget::ResizeHandle(id));
        engine.pointer_move(&mut canvas, Point::new(381.0 + 4740.0, 339.0));
        assert_eq!(canvas.get(id).unwrap().size(), Some(Size::new(2000.0, 160.0)));

        engine.pointer_move(&mut canvas, Point::new(0.0, 0.0));
        assert_eq!(canvas.get(id).unwrap().size(), Some(Size::new(20.0, 20.0)));

        let end = engine.pointer_up(&canvas).unwrap();
        assert_eq!(end.kind, GestureKind::Resize);
        assert!(end.changed);
    }

    #[test]
    fn test_resize_follows_canvas_limits() {
        let mut canvas = Canvas::new().with_limits(LayerLimits {
            max_dimension: 3000.0,
            ..Default::default()
        });
        let id = canvas.add_image(None);
        let mut engine = InteractionEngine::default();

        press(&mut engine, &mut canvas, 381.0, 339.0);
        engine.pointer_move(&mut canvas, Point::new(381.0 + 2240.0, 339.0 + 2340.0));
        assert_eq!(canvas.get(id).unwrap().size(), Some(Size::new(2500.0, 2500.0)));
        engine.pointer_move(&mut canvas, Point::new(9000.0, 339.0));
        assert_eq!(canvas.get(id).unwrap().size(), Some(Size::new(3000.0, 160.0)));
    }

    #[test]
    fn test_handle_only_for_selected_resizable_layer() {
        let mut canvas = Canvas::new();
        canvas.add_text(None);
        assert!(InteractionEngine::resize_handle(&canvas).is_none());
        canvas.add_shape(ShapeKind::Ellipse);
        assert!(InteractionEngine::resize_handle(&canvas).is_some());
        canvas.clear_selection();
        assert!(InteractionEngine::resize_handle(&canvas).is_none());
    }

    #[test]
    fn test_press_on_empty_clears_selection() {
        let mut canvas = Canvas::new();
        canvas.add_text(None);
        let mut engine = InteractionEngine::default();
        assert_eq!(press(&mut engine, &mut canvas, 700.0, 700.0), PressTarget::Empty);
        assert_eq!(canvas.selection(), None);
        assert!(engine.is_idle());
        assert!(engine.pointer_up(&canvas).is_none());
    }

    #[test]
    fn test_cancel_restores_geometry() {
        let mut canvas = Canvas::new();
        let id = canvas.add_shape(ShapeKind::Rectangle);
        let mut engine = InteractionEngine::default();
        press(&mut engine, &mut canvas, 110.0, 230.0);
        engine.pointer_move(&mut canvas, Point::new(300.0, 300.0));
        assert!(engine.cancel(&mut canvas));
        assert_eq!(canvas.get(id).unwrap().position(), Point::new(100.0, 220.0));
        assert!(!engine.cancel(&mut canvas));
    }

    #[test]
    fn test_gesture_on_deleted_layer_resets() {
        let mut canvas = Canvas::new();
        let id = canvas.add_shape(ShapeKind::Rectangle);
        let mut engine = InteractionEngine::default();
        press(&mut engine, &mut canvas, 110.0, 230.0);
        canvas.delete(id);
        assert!(!engine.pointer_move(&mut canvas, Point::new(200.0, 200.0)));
        assert!(engine.is_idle());
    }
}
