//! Per-window context objects.
//!
//! Each window owns an explicit context struct instead of sharing global
//! mutable state, so the controllers are testable without a rendering
//! surface: the note editor window, the manager (list) window, and the
//! settings window.

pub mod manager;
pub mod note;
pub mod settings;

pub use manager::{ManagerWindow, ViewMode};
pub use note::NoteWindow;
pub use settings::SettingsWindow;
