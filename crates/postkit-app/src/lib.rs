//! Postkit Application
//!
//! The editor session that hosts drive: command surface, keyboard
//! shortcuts, pointer gestures, notices and the mount/unmount lifecycle.

mod commands;
mod editor;
mod error;
mod notices;
mod shortcuts;

pub use commands::{Command, CommandOutcome};
pub use editor::{EditorSession, QUICK_GENERATE_FALLBACK, QUICK_PALETTE, unix_millis};
pub use error::{EditorError, EditorResult};
pub use notices::{Notice, NoticeBoard, NoticeLevel, SessionEvent};
pub use shortcuts::{Shortcut, ShortcutRegistry};
