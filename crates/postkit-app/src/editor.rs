//! Editor session: one mounted template editor.
//!
//! The session owns the canvas and wires the command surface, pointer
//! gestures, history and persistence together. Every discrete mutation
//! produces exactly one history checkpoint and marks the autosave dirty.

use crate::commands::{Command, CommandOutcome};
use crate::error::{EditorError, EditorResult};
use crate::notices::{Notice, NoticeBoard, NoticeLevel, SessionEvent};
use crate::shortcuts::ShortcutRegistry;
use kurbo::Size;
use postkit_core::canvas::{Canvas, CanvasDocument, ReorderDirection, default_layers};
use postkit_core::color::HexColor;
use postkit_core::config::EditorConfig;
use postkit_core::history::History;
use postkit_core::input::{KeyEvent, PointerEvent};
use postkit_core::interaction::{GestureEnd, InteractionEngine, InteractionState};
use postkit_core::layers::{
    BackgroundPatch, ImagePatch, Layer, LayerId, LayerKind, LayerPatch, ShapePatch, TextPatch,
};
use postkit_core::storage::{AutoSaveManager, Storage};
use postkit_render::{CpuRasterizer, ExportArtifact, Rasterizer, export_png};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Base text used by quick generate when the canvas has no text layer.
pub const QUICK_GENERATE_FALLBACK: &str = "New Product";

/// Palette suggested alongside generated promo copy.
pub const QUICK_PALETTE: [HexColor; 3] = [
    HexColor::rgb(0xfe, 0xf3, 0xc7),
    HexColor::rgb(0xfd, 0xba, 0x74),
    HexColor::rgb(0xfb, 0x92, 0x3c),
];

/// Milliseconds since the Unix epoch, used for artifact keys and export names.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// In-place text editing. Keystrokes update the layer live; the edit is
/// checkpointed once when it ends.
#[derive(Debug, Clone, Copy)]
struct TextEdit {
    id: LayerId,
}

pub struct EditorSession<S: Storage + ?Sized> {
    config: EditorConfig,
    canvas: Canvas,
    history: History,
    engine: InteractionEngine,
    autosave: AutoSaveManager<S>,
    shortcuts: ShortcutRegistry,
    notices: NoticeBoard,
    rasterizer: Box<dyn Rasterizer>,
    template_id: Option<String>,
    text_edit: Option<TextEdit>,
}

impl<S: Storage + ?Sized> EditorSession<S> {
    /// Open the editor. The autosave slot is restored when it holds a valid
    /// composition, otherwise the default composition is used.
    pub fn mount(
        config: EditorConfig,
        storage: Arc<S>,
        template_id: Option<String>,
        now: Instant,
    ) -> Self {
        let mut autosave = AutoSaveManager::new(storage).with_interval(config.autosave_interval());
        let document = match autosave.restore().map(CanvasDocument::from_layers) {
            Some(Ok(document)) => {
                log::info!("Restored {} layers from autosave", document.len());
                document
            }
            Some(Err(e)) => {
                log::warn!("Discarding autosave: {}", e);
                default_document()
            }
            None => default_document(),
        };

        let mut canvas = Canvas::with_document(document).with_limits(config.layer_limits());
        canvas.viewport = config.viewport();

        let mut history = History::new(config.history_depth);
        history.reset(canvas.document.layers());
        autosave.start(now);

        let session = Self {
            engine: InteractionEngine::new(),
            shortcuts: ShortcutRegistry::new(config.escape_cancels_gesture),
            notices: NoticeBoard::new(config.notice_ttl()),
            rasterizer: Box::new(CpuRasterizer::new()),
            config,
            canvas,
            history,
            autosave,
            template_id,
            text_edit: None,
        };
        log::info!("Mounted editor: {}", session.title());
        session
    }

    /// Use a different rasterizer for export, e.g. one with a font loaded.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Tear the editor down, releasing every resource still held by image
    /// layers. Returns the number released.
    pub fn unmount(mut self) -> usize {
        self.end_text_edit();
        self.engine.reset();
        let released = self.canvas.release_all_resources();
        log::info!("Unmounted editor, released {} resources", released);
        released
    }

    pub fn title(&self) -> String {
        match &self.template_id {
            Some(id) => format!("Template {}", id),
            None => "New Design".to_string(),
        }
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn layers(&self) -> &[Layer] {
        self.canvas.document.layers()
    }

    pub fn selection(&self) -> Option<LayerId> {
        self.canvas.selection()
    }

    pub fn select(&mut self, id: Option<LayerId>) -> bool {
        match id {
            Some(id) => self.canvas.select(id),
            None => {
                self.canvas.clear_selection();
                true
            }
        }
    }

    pub fn zoom_percent(&self) -> u32 {
        self.canvas.viewport.zoom_percent
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.engine.state()
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.active()
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    pub fn autosave(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    /// Advance timers: autosave when due, expire notices and release
    /// delayed events.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        self.autosave.maybe_save(now, self.canvas.document.layers());
        self.notices.tick(now)
    }

    /// Run a command. Failures of save and export are also posted as error
    /// notices and leave the composition untouched.
    pub fn execute(&mut self, command: Command, now: Instant) -> EditorResult<CommandOutcome> {
        log::debug!("Executing {}", command.name());
        if command.needs_selection() && self.canvas.selection().is_none() {
            log::debug!("{} ignored without a selection", command.name());
            return Ok(CommandOutcome::Unchanged);
        }
        if !matches!(command, Command::CancelGesture) {
            self.end_text_edit();
        }

        let outcome = match command {
            Command::AddText => {
                self.canvas.add_text(None);
                self.commit()
            }
            Command::AddImage(bytes) => {
                self.canvas.add_image(bytes);
                self.commit()
            }
            Command::AddShape(kind) => {
                self.canvas.add_shape(kind);
                self.commit()
            }
            Command::DuplicateSelected => {
                let duplicated = self
                    .canvas
                    .selection()
                    .and_then(|id| self.canvas.duplicate(id));
                self.commit_if(duplicated.is_some())
            }
            Command::DeleteSelected => {
                let deleted = self
                    .canvas
                    .selection()
                    .is_some_and(|id| self.canvas.delete(id));
                self.commit_if(deleted)
            }
            Command::BringForward => self.reorder_selected(ReorderDirection::Forward),
            Command::SendBackward => self.reorder_selected(ReorderDirection::Backward),
            Command::Undo => {
                let snapshot = self.history.undo().map(<[Layer]>::to_vec);
                self.restore_snapshot(snapshot)
            }
            Command::Redo => {
                let snapshot = self.history.redo().map(<[Layer]>::to_vec);
                self.restore_snapshot(snapshot)
            }
            Command::ZoomIn => changed(self.canvas.viewport.zoom_in()),
            Command::ZoomOut => changed(self.canvas.viewport.zoom_out()),
            Command::Save => return self.save(now).map(CommandOutcome::Saved),
            Command::Export => return self.export(now).map(CommandOutcome::Exported),
            Command::QuickGenerate => CommandOutcome::Palette(self.quick_generate()),
            Command::CancelGesture => {
                let cancelled = self.config.escape_cancels_gesture && self.engine.cancel(&mut self.canvas);
                changed(cancelled)
            }
        };
        Ok(outcome)
    }

    /// Route a key press through the shortcut registry. Nothing is routed
    /// while a text layer is being edited in place.
    pub fn handle_key(
        &mut self,
        event: &KeyEvent,
        now: Instant,
    ) -> Option<EditorResult<CommandOutcome>> {
        if self.text_edit.is_some() {
            return None;
        }
        let command = self.shortcuts.resolve(event)?;
        Some(self.execute(command, now))
    }

    /// Feed a pointer event to the drag/resize engine. A finished gesture
    /// that moved or resized its layer is checkpointed once.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<GestureEnd> {
        if matches!(event, PointerEvent::Down { .. }) {
            self.end_text_edit();
        }
        let end = self.engine.handle_pointer(&mut self.canvas, event)?;
        if end.changed {
            self.commit();
        }
        Some(end)
    }

    /// Start editing a text layer in place and select it.
    pub fn begin_text_edit(&mut self, id: LayerId) -> bool {
        if self.canvas.get(id).and_then(Layer::as_text).is_none() {
            return false;
        }
        self.end_text_edit();
        self.canvas.select(id);
        self.text_edit = Some(TextEdit { id });
        true
    }

    pub fn is_editing_text(&self) -> bool {
        self.text_edit.is_some()
    }

    /// Reconcile the edited content on each keystroke. No checkpoint.
    pub fn edit_text(&mut self, content: &str) -> bool {
        let Some(TextEdit { id }) = self.text_edit else {
            return false;
        };
        let patch = LayerPatch::Text(TextPatch {
            content: Some(content.to_string()),
            ..Default::default()
        });
        let updated = self.canvas.update(id, &patch);
        if updated {
            self.autosave.mark_dirty();
        }
        updated
    }

    /// Finish in-place editing (blur). Checkpoints if the content changed.
    pub fn end_text_edit(&mut self) -> bool {
        if self.text_edit.take().is_none() {
            return false;
        }
        let checkpointed = self.history.checkpoint_if_changed(self.canvas.document.layers());
        if checkpointed {
            self.release_unreachable();
        }
        checkpointed
    }

    /// Apply a properties-panel edit as one undoable step. Values are
    /// clamped to the configured limits.
    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) -> bool {
        if !self.canvas.update(id, &patch) {
            return false;
        }
        let checkpointed = self.history.checkpoint_if_changed(self.canvas.document.layers());
        if checkpointed {
            self.release_unreachable();
            self.autosave.mark_dirty();
        }
        checkpointed
    }

    pub fn set_text_content(&mut self, id: LayerId, content: &str) -> bool {
        self.update_layer(
            id,
            LayerPatch::Text(TextPatch {
                content: Some(content.to_string()),
                ..Default::default()
            }),
        )
    }

    pub fn set_font_size(&mut self, id: LayerId, font_size: f64) -> bool {
        self.update_layer(
            id,
            LayerPatch::Text(TextPatch {
                font_size: Some(font_size),
                ..Default::default()
            }),
        )
    }

    /// Fill color for text, shape or background layers.
    pub fn set_color(&mut self, id: LayerId, color: HexColor) -> bool {
        let patch = match self.canvas.layer_kind(id) {
            Some(LayerKind::Text(_)) => LayerPatch::Text(TextPatch {
                color: Some(color),
                ..Default::default()
            }),
            Some(LayerKind::Shape(_)) => LayerPatch::Shape(ShapePatch {
                color: Some(color),
                ..Default::default()
            }),
            Some(LayerKind::Background(_)) => LayerPatch::Background(BackgroundPatch {
                color: Some(color),
            }),
            Some(LayerKind::Image(_)) | None => return false,
        };
        self.update_layer(id, patch)
    }

    /// Numeric width/height for an image or shape.
    pub fn set_size(&mut self, id: LayerId, size: Size) -> bool {
        let patch = match self.canvas.layer_kind(id) {
            Some(LayerKind::Image(_)) => LayerPatch::Image(ImagePatch {
                width: Some(size.width),
                height: Some(size.height),
            }),
            Some(LayerKind::Shape(_)) => LayerPatch::Shape(ShapePatch {
                width: Some(size.width),
                height: Some(size.height),
                ..Default::default()
            }),
            _ => return false,
        };
        self.update_layer(id, patch)
    }

    /// Swap an image layer's picture for new bytes.
    pub fn replace_image(&mut self, id: LayerId, bytes: Vec<u8>) -> bool {
        self.end_text_edit();
        let replaced = self.canvas.replace_image(id, bytes);
        if replaced {
            self.commit();
        }
        replaced
    }

    fn commit(&mut self) -> CommandOutcome {
        self.history.checkpoint(self.canvas.document.layers());
        self.release_unreachable();
        self.autosave.mark_dirty();
        CommandOutcome::Changed
    }

    /// A checkpoint may drop redo entries or evict the oldest undo entry.
    /// Resources only those snapshots pointed at are released here.
    fn release_unreachable(&mut self) -> usize {
        let retained = self.history.referenced_handles();
        self.canvas.release_unreferenced(&retained)
    }

    fn commit_if(&mut self, changed: bool) -> CommandOutcome {
        if changed {
            self.commit()
        } else {
            CommandOutcome::Unchanged
        }
    }

    fn reorder_selected(&mut self, direction: ReorderDirection) -> CommandOutcome {
        let moved = self
            .canvas
            .selection()
            .is_some_and(|id| self.canvas.reorder(id, direction));
        self.commit_if(moved)
    }

    fn restore_snapshot(&mut self, snapshot: Option<Vec<Layer>>) -> CommandOutcome {
        let Some(layers) = snapshot else {
            return CommandOutcome::Unchanged;
        };
        self.engine.reset();
        if !self.canvas.restore(&layers) {
            return CommandOutcome::Unchanged;
        }
        self.release_unreachable();
        self.autosave.mark_dirty();
        CommandOutcome::Changed
    }

    fn quick_generate(&mut self) -> [HexColor; 3] {
        let base = self
            .canvas
            .document
            .first_text()
            .map(|t| t.content.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| QUICK_GENERATE_FALLBACK.to_string());
        let title = format!("{} - Special Promo", base);
        let caption = format!("Don't miss {} with a limited-time discount. Click now!", base);
        self.canvas.add_text(Some(&title));
        self.canvas.add_text(Some(&caption));
        self.commit();
        QUICK_PALETTE
    }

    fn save(&mut self, now: Instant) -> EditorResult<String> {
        let result = self.autosave.save_artifact(
            self.template_id.as_deref(),
            self.canvas.document.layers(),
            unix_millis(),
        );
        match result {
            Ok(key) => {
                self.notices
                    .post(NoticeLevel::Success, "Template saved successfully", now);
                self.notices
                    .schedule(SessionEvent::LeaveEditor, now + self.config.leave_delay());
                Ok(key)
            }
            Err(e) => {
                self.notices
                    .post(NoticeLevel::Error, format!("Save failed: {}", e), now);
                Err(EditorError::from(e))
            }
        }
    }

    fn export(&mut self, now: Instant) -> EditorResult<ExportArtifact> {
        match export_png(&self.canvas, self.rasterizer.as_mut(), &self.config, unix_millis()) {
            Ok(artifact) => {
                self.notices
                    .post(NoticeLevel::Info, format!("Exported {}", artifact.file_name), now);
                Ok(artifact)
            }
            Err(e) => {
                self.notices
                    .post(NoticeLevel::Error, format!("Export failed: {}", e), now);
                Err(EditorError::from(e))
            }
        }
    }
}

fn changed(value: bool) -> CommandOutcome {
    if value {
        CommandOutcome::Changed
    } else {
        CommandOutcome::Unchanged
    }
}

fn default_document() -> CanvasDocument {
    CanvasDocument::from_layers(default_layers()).unwrap_or_default()
}
