//! Manager window context: the note list dashboard.
//!
//! Holds the cached note list, the search query, and the grid/list view
//! mode. Filtering matches case-insensitively against the title and the
//! plain-text projection of the content.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::StoreResult;
use crate::model::{strip_markup, Note, NoteColor, NoteId};
use crate::store::NoteStore;

/// Layout of the note list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// Context for the manager window.
pub struct ManagerWindow<S: NoteStore> {
    store: Arc<S>,
    notes: Vec<Note>,
    view_mode: ViewMode,
    query: String,
}

impl<S: NoteStore> ManagerWindow<S> {
    /// Build the manager context and load the note list.
    pub fn open(store: Arc<S>) -> StoreResult<Self> {
        let notes = store.list()?;
        info!(note_count = notes.len(), "Manager window opened");
        Ok(Self {
            store,
            notes,
            view_mode: ViewMode::default(),
            query: String::new(),
        })
    }

    /// Reload the note list from the store. Called on window focus and
    /// after create/delete.
    pub fn refresh(&mut self) -> StoreResult<()> {
        self.notes = self.store.list()?;
        Ok(())
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Notes matching the current search query, in store order (most
    /// recently updated first). An empty query matches everything.
    pub fn filtered(&self) -> Vec<&Note> {
        let query = self.query.trim().to_lowercase();
        self.notes
            .iter()
            .filter(|note| {
                if query.is_empty() {
                    return true;
                }
                let title = note.display_title().to_lowercase();
                if title.contains(&query) {
                    return true;
                }
                strip_markup(&note.content).to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Count label for the footer, e.g. "1 note" / "3 notes".
    pub fn count_label(&self) -> String {
        let count = self.filtered().len();
        if count == 1 {
            "1 note".to_string()
        } else {
            format!("{} notes", count)
        }
    }

    /// Create a note and refresh the list. Returns the new note so the
    /// caller can open its window.
    pub fn create_note(&mut self, color: Option<NoteColor>) -> StoreResult<Note> {
        let note = self.store.create(color)?;
        self.refresh()?;
        Ok(note)
    }

    /// Delete a note and refresh the list. The caller is responsible for
    /// closing the note's window first.
    pub fn delete_note(&mut self, id: &NoteId) -> StoreResult<()> {
        self.store.delete(id)?;
        self.refresh()
    }
}

/// Human-readable age label for a note card: "Just now", "5m ago",
/// "3h ago", "2d ago", then a short date.
pub fn relative_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes();
    if mins < 1 {
        return "Just now".to_string();
    }
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    then.format("%b %-d").to_string()
}
