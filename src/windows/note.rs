//! Note editor window context.
//!
//! Owns the in-memory note (the source of truth between saves), the current
//! display title, and the autosave coordinator. The rendering surface calls
//! in on editor/window events and polls from its event loop; everything
//! else is handled here.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::autosave::{AutosaveCoordinator, Clock, MonotonicClock, SaveObserver};
use crate::error::{ResultExt, StoreResult};
use crate::model::{Note, NoteColor, NoteId, NoteUpdate};
use crate::store::NoteStore;

/// Updates the cached chrome title when a content save lands.
struct TitleSlot(Arc<Mutex<String>>);

impl SaveObserver for TitleSlot {
    fn title_saved(&mut self, _id: &NoteId, title: &str) {
        *self.0.lock() = title.to_string();
    }
}

/// Context for one open note window.
pub struct NoteWindow<S: NoteStore, C: Clock = MonotonicClock> {
    store: Arc<S>,
    note: Note,
    coordinator: AutosaveCoordinator<C>,
    display_title: Arc<Mutex<String>>,
}

impl<S: NoteStore> NoteWindow<S> {
    /// Load the note from the store and build its window context.
    pub fn open(store: Arc<S>, id: &NoteId) -> StoreResult<Self> {
        Self::open_with_clock(store, id, MonotonicClock)
    }
}

impl<S: NoteStore, C: Clock> NoteWindow<S, C> {
    pub fn open_with_clock(store: Arc<S>, id: &NoteId, clock: C) -> StoreResult<Self> {
        let note = store.read(id)?;
        let display_title = Arc::new(Mutex::new(note.display_title().to_string()));

        let mut coordinator = AutosaveCoordinator::with_clock(clock);
        coordinator.subscribe(Box::new(TitleSlot(display_title.clone())));

        info!(note_id = %note.id, color = note.color.as_str(), "Note window opened");

        Ok(Self {
            store,
            note,
            coordinator,
            display_title,
        })
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    /// Title currently shown in the window chrome. Reflects the last
    /// successful content save, seeded from the stored title on open.
    pub fn display_title(&self) -> String {
        self.display_title.lock().clone()
    }

    /// The editor reported new content. Saved after a quiet period.
    pub fn content_edited(&mut self, content: impl Into<String>) {
        self.note.content = content.into();
        self.coordinator.note_edited();
    }

    /// Apply a color locally right away and persist it immediately; a color
    /// change is a single deliberate click, not a burst.
    pub fn set_color(&mut self, color: NoteColor) {
        self.note.color = color;
        self.coordinator.color_changed(self.store.as_ref(), &self.note);
    }

    /// The window moved or resized. Geometry saves are debounced because
    /// these events fire continuously during a drag.
    pub fn moved_resized(&mut self, pos_x: i32, pos_y: i32, width: i32, height: i32) {
        self.note.pos_x = pos_x;
        self.note.pos_y = pos_y;
        self.note.width = width;
        self.note.height = height;
        self.coordinator.geometry_changed();
    }

    /// Drive pending debounce timers. Call from the event loop.
    pub fn poll(&mut self) {
        self.coordinator.poll(self.store.as_ref(), &self.note);
    }

    /// Close the window: flush unsaved content synchronously, drop the
    /// geometry timer, and mark the note closed so it is not restored on
    /// next launch. The close itself never fails; every write here is
    /// best-effort.
    pub fn close(mut self) {
        self.coordinator.flush_content(self.store.as_ref(), &self.note);
        self.coordinator.cancel_geometry();
        self.store.write(&self.note.id, NoteUpdate::closed()).log_err();
        debug!(note_id = %self.note.id, "Note window closed");
    }
}
