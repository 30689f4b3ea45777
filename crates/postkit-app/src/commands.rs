//! Discrete editor actions triggered by the toolbar or keyboard.

use postkit_core::color::HexColor;
use postkit_core::layers::ShapeKind;
use postkit_render::ExportArtifact;

/// An action the command surface can dispatch to an editor session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a text layer with default content.
    AddText,
    /// Add an image layer, owning the bytes when given.
    AddImage(Option<Vec<u8>>),
    AddShape(ShapeKind),
    DuplicateSelected,
    DeleteSelected,
    BringForward,
    SendBackward,
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    /// Persist the composition as a named artifact.
    Save,
    /// Render the composition to PNG.
    Export,
    /// Add a promo headline and caption based on the first text layer.
    QuickGenerate,
    /// Abort an in-progress drag or resize.
    CancelGesture,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddText => "Add text",
            Command::AddImage(_) => "Add image",
            Command::AddShape(ShapeKind::Rectangle) => "Add rectangle",
            Command::AddShape(ShapeKind::Ellipse) => "Add ellipse",
            Command::DuplicateSelected => "Duplicate",
            Command::DeleteSelected => "Delete",
            Command::BringForward => "Bring forward",
            Command::SendBackward => "Send backward",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::ZoomIn => "Zoom in",
            Command::ZoomOut => "Zoom out",
            Command::Save => "Save",
            Command::Export => "Export PNG",
            Command::QuickGenerate => "Quick generate",
            Command::CancelGesture => "Cancel gesture",
        }
    }

    /// Commands that act on the selected layer and do nothing without one.
    pub fn needs_selection(&self) -> bool {
        matches!(
            self,
            Command::DuplicateSelected
                | Command::DeleteSelected
                | Command::BringForward
                | Command::SendBackward
        )
    }
}

/// What executing a command produced.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// Nothing changed, e.g. undo at the initial state.
    Unchanged,
    Changed,
    /// Saved under the given artifact key.
    Saved(String),
    Exported(ExportArtifact),
    /// Suggested palette from a quick generate.
    Palette([HexColor; 3]),
}

impl CommandOutcome {
    pub fn is_changed(&self) -> bool {
        !matches!(self, CommandOutcome::Unchanged)
    }
}
