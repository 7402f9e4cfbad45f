//! Session restoration.
//!
//! Notes carry an `is_open` flag; on launch, every note that was open when
//! the app last quit gets its window back. A note that fails to open is
//! logged and skipped so one bad row never blocks startup.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::StoreResult;
use crate::store::NoteStore;
use crate::windows::NoteWindow;

/// Reopen the notes left open in the previous session.
pub fn restore_open_notes<S: NoteStore>(store: &Arc<S>) -> StoreResult<Vec<NoteWindow<S>>> {
    let notes = store.open_notes()?;
    let mut windows = Vec::with_capacity(notes.len());

    for note in &notes {
        match NoteWindow::open(store.clone(), &note.id) {
            Ok(window) => windows.push(window),
            Err(e) => {
                error!(note_id = %note.id, error = %e, "Failed to restore note window");
            }
        }
    }

    info!(restored = windows.len(), total = notes.len(), "Session restored");
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoteUpdate;
    use crate::store::SqliteStore;
    use tempfile::tempdir;

    #[test]
    fn restores_only_open_notes() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path()).unwrap());

        let open = store.create(None).unwrap();
        let closed = store.create(None).unwrap();
        store.write(&closed.id, NoteUpdate::closed()).unwrap();

        let windows = restore_open_notes(&store).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].note().id, open.id);
    }

    #[test]
    fn empty_store_restores_nothing() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
        assert!(restore_open_notes(&store).unwrap().is_empty());
    }
}
