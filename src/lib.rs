//! StickyNotes core - window-controller logic for a desktop sticky-notes app.
//!
//! This library owns everything between the rendering surface and the note
//! store: the note/settings data model, the SQLite-backed store, the
//! debounced autosave coordinator, and the per-window context objects
//! (note editor, manager list, settings).
//!
//! The rendering surface and rich-text engine are external collaborators:
//! they feed edit/color/geometry events in, poll the event loop, and get a
//! title notification back when a content save lands.

pub mod autosave;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod store;
pub mod windows;

pub use autosave::{AutosaveCoordinator, Clock, MonotonicClock, SaveObserver};
pub use error::{ResultExt, StoreError, StoreResult};
pub use model::{derive_title, Note, NoteColor, NoteId, NoteUpdate, Setting};
pub use session::restore_open_notes;
pub use store::{NoteStore, SqliteStore};
pub use windows::{ManagerWindow, NoteWindow, SettingsWindow, ViewMode};
