//! Keyboard shortcut registry and documentation.

use crate::commands::Command;
use postkit_core::input::KeyEvent;

/// A keyboard shortcut definition. `ctrl` matches either Ctrl or Cmd.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    pub command: Command,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        command: Command,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            command,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        self.key.eq_ignore_ascii_case(&event.key)
            && self.ctrl == event.modifiers.command()
            && self.shift == event.modifiers.shift
    }
}

/// Registry of keyboard shortcuts.
#[derive(Debug, Clone)]
pub struct ShortcutRegistry {
    shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ShortcutRegistry {
    /// Build the registry. Escape is only bound when `escape_cancels` is set.
    pub fn new(escape_cancels: bool) -> Self {
        let mut shortcuts = Self::all();
        if !escape_cancels {
            shortcuts.retain(|s| s.command != Command::CancelGesture);
        }
        Self { shortcuts }
    }

    /// Every shortcut the editor knows.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo", Command::Undo),
            Shortcut::new("Z", true, true, "Redo", Command::Redo),
            Shortcut::new("Y", true, false, "Redo", Command::Redo),
            Shortcut::new("D", true, false, "Duplicate selected layer", Command::DuplicateSelected),
            Shortcut::new("Delete", false, false, "Delete selected layer", Command::DeleteSelected),
            Shortcut::new("Backspace", false, false, "Delete selected layer", Command::DeleteSelected),
            Shortcut::new("=", true, false, "Zoom in", Command::ZoomIn),
            Shortcut::new("+", true, true, "Zoom in", Command::ZoomIn),
            Shortcut::new("-", true, false, "Zoom out", Command::ZoomOut),
            Shortcut::new("S", true, false, "Save template", Command::Save),
            Shortcut::new("E", true, false, "Export to PNG", Command::Export),
            Shortcut::new("Escape", false, false, "Cancel drag or resize", Command::CancelGesture),
        ]
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Command bound to a key press, if any.
    pub fn resolve(&self, event: &KeyEvent) -> Option<Command> {
        self.shortcuts
            .iter()
            .find(|s| s.matches(event))
            .map(|s| s.command.clone())
    }

    /// Print the active shortcuts to console.
    pub fn print_all(&self) {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in &self.shortcuts {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}
