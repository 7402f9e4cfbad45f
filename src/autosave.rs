//! Debounced autosave coordination between an in-memory note and the store.
//!
//! Each mutable attribute class of a note is synchronized independently:
//!
//! - **content + title**: trailing-edge debounce, 500 ms. A burst of edits
//!   coalesces into one write carrying the state as of the last edit.
//! - **color**: no debounce. A color change is a single deliberate click and
//!   writes immediately.
//! - **geometry**: trailing-edge debounce, 1000 ms, because move/resize
//!   events fire continuously during a drag.
//!
//! Writes are best-effort: a failed write is logged and dropped, with no
//! retry and no user-facing error. The in-memory note stays the source of
//! truth until the next successful write.
//!
//! The coordinator never touches wall time directly; it reads an injected
//! [`Clock`], so tests drive the debounce with a manual clock instead of
//! sleeping.

use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::model::{derive_title, Note, NoteId, NoteUpdate};
use crate::store::NoteStore;

/// Trailing debounce for the content + title class.
pub const CONTENT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Trailing debounce for the geometry class.
pub const GEOMETRY_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Monotonic time source for debounce deadlines.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// System monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Attribute classes that are debounced and written independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeClass {
    Content,
    Color,
    Geometry,
}

/// Per-class save state.
///
/// `Idle -> Pending` on an edit (a newer edit replaces the deadline),
/// `Pending -> Idle` on cancel, `Pending -> Writing -> Idle` on expiry. The
/// event thread is single-threaded and cooperative, so `Writing` is entered
/// and left within one [`AutosaveCoordinator::poll`] call; it exists so an
/// edit observed mid-write lands in a fresh `Pending` rather than being
/// folded into the in-flight write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveState {
    Idle,
    Pending { deadline: Instant },
    Writing,
}

impl SaveState {
    fn is_due(&self, now: Instant) -> bool {
        matches!(self, SaveState::Pending { deadline } if now >= *deadline)
    }
}

/// Observer notified after a successful content write, carrying the newly
/// persisted title so the rendering surface can update window chrome.
pub trait SaveObserver {
    fn title_saved(&mut self, id: &NoteId, title: &str);
}

/// Owns the debounce timers and in-flight save state for one note.
///
/// The coordinator holds no reference to the note or the store; both are
/// passed in at the call sites, so the document snapshot is read at the
/// instant a timer fires, not at the start of the debounce window.
pub struct AutosaveCoordinator<C: Clock = MonotonicClock> {
    clock: C,
    content: SaveState,
    geometry: SaveState,
    observers: Vec<Box<dyn SaveObserver>>,
}

impl AutosaveCoordinator<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for AutosaveCoordinator<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> AutosaveCoordinator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            content: SaveState::Idle,
            geometry: SaveState::Idle,
            observers: Vec::new(),
        }
    }

    /// Subscribe to successful content saves.
    pub fn subscribe(&mut self, observer: Box<dyn SaveObserver>) {
        self.observers.push(observer);
    }

    /// Record a content edit: (re)start the content debounce window.
    /// Callable arbitrarily often; no side effect until expiry.
    pub fn note_edited(&mut self) {
        self.content = SaveState::Pending {
            deadline: self.clock.now() + CONTENT_DEBOUNCE,
        };
    }

    /// Record a window move/resize: (re)start the geometry debounce window.
    pub fn geometry_changed(&mut self) {
        self.geometry = SaveState::Pending {
            deadline: self.clock.now() + GEOMETRY_DEBOUNCE,
        };
    }

    /// Write a color change immediately. Color changes are single
    /// deliberate clicks; they bypass the debounce entirely and do not
    /// interact with the content or geometry timers.
    pub fn color_changed<S: NoteStore + ?Sized>(&mut self, store: &S, note: &Note) {
        if let Err(e) = store.write(&note.id, NoteUpdate::color(note.color)) {
            error!(note_id = %note.id, error = %e, "Failed to save note color");
        } else {
            debug!(note_id = %note.id, color = note.color.as_str(), "Note color saved");
        }
    }

    /// Fire any timers whose debounce window has closed, reading `note` as
    /// the current snapshot. Call from the event loop.
    pub fn poll<S: NoteStore + ?Sized>(&mut self, store: &S, note: &Note) {
        let now = self.clock.now();
        if self.content.is_due(now) {
            self.write_content(store, note);
        }
        if self.geometry.is_due(now) {
            self.write_geometry(store, note);
        }
    }

    /// Cancel the pending content timer (if any) and write immediately.
    /// Used when the note is about to close, so no edit is lost. The write
    /// happens regardless of whether a timer was pending.
    pub fn flush_content<S: NoteStore + ?Sized>(&mut self, store: &S, note: &Note) {
        self.write_content(store, note);
    }

    /// Drop the pending geometry timer without writing. Geometry is
    /// best-effort on close; only content must be flushed.
    pub fn cancel_geometry(&mut self) {
        self.geometry = SaveState::Idle;
    }

    /// Whether a debounce window is currently open for the given class.
    pub fn is_pending(&self, class: AttributeClass) -> bool {
        let state = match class {
            AttributeClass::Content => &self.content,
            AttributeClass::Geometry => &self.geometry,
            // Color has no timer.
            AttributeClass::Color => return false,
        };
        matches!(state, SaveState::Pending { .. })
    }

    fn write_content<S: NoteStore + ?Sized>(&mut self, store: &S, note: &Note) {
        self.content = SaveState::Writing;
        let title = derive_title(&note.content);
        match store.write(&note.id, NoteUpdate::content(note.content.clone(), title.clone())) {
            Ok(_) => {
                debug!(note_id = %note.id, title = %title, "Note content saved");
                for observer in &mut self.observers {
                    observer.title_saved(&note.id, &title);
                }
            }
            Err(e) => {
                error!(note_id = %note.id, error = %e, "Failed to save note content");
            }
        }
        self.content = SaveState::Idle;
    }

    fn write_geometry<S: NoteStore + ?Sized>(&mut self, store: &S, note: &Note) {
        self.geometry = SaveState::Writing;
        let update = NoteUpdate::geometry(note.pos_x, note.pos_y, note.width, note.height);
        if let Err(e) = store.write(&note.id, update) {
            error!(note_id = %note.id, error = %e, "Failed to save note geometry");
        } else {
            debug!(note_id = %note.id, "Note geometry saved");
        }
        self.geometry = SaveState::Idle;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::model::{NoteColor, Setting, UNTITLED};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Store double that records every write and can be told to fail.
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(NoteId, NoteUpdate)>>,
        fail: Mutex<bool>,
    }

    impl RecordingStore {
        fn writes(&self) -> Vec<(NoteId, NoteUpdate)> {
            self.writes.lock().clone()
        }

        fn set_failing(&self, fail: bool) {
            *self.fail.lock() = fail;
        }
    }

    impl NoteStore for RecordingStore {
        fn read(&self, _id: &NoteId) -> StoreResult<Note> {
            Err(StoreError::Rejected("not supported".into()))
        }

        fn write(&self, id: &NoteId, update: NoteUpdate) -> StoreResult<Note> {
            if *self.fail.lock() {
                return Err(StoreError::Unavailable("store offline".into()));
            }
            self.writes.lock().push((id.clone(), update));
            let mut note = Note::new(NoteColor::Yellow);
            note.id = id.clone();
            Ok(note)
        }

        fn list(&self) -> StoreResult<Vec<Note>> {
            Ok(Vec::new())
        }

        fn open_notes(&self) -> StoreResult<Vec<Note>> {
            Ok(Vec::new())
        }

        fn create(&self, _color: Option<NoteColor>) -> StoreResult<Note> {
            Err(StoreError::Rejected("not supported".into()))
        }

        fn delete(&self, _id: &NoteId) -> StoreResult<()> {
            Ok(())
        }

        fn setting(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        fn set_setting(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Ok(())
        }

        fn all_settings(&self) -> StoreResult<Vec<Setting>> {
            Ok(Vec::new())
        }
    }

    struct RecordedTitles(Arc<Mutex<Vec<String>>>);

    impl SaveObserver for RecordedTitles {
        fn title_saved(&mut self, _id: &NoteId, title: &str) {
            self.0.lock().push(title.to_string());
        }
    }

    fn setup() -> (ManualClock, AutosaveCoordinator<ManualClock>, RecordingStore, Note) {
        let clock = ManualClock::start();
        let coordinator = AutosaveCoordinator::with_clock(clock.clone());
        let store = RecordingStore::default();
        let note = Note::new(NoteColor::Yellow);
        (clock, coordinator, store, note)
    }

    #[test]
    fn burst_of_edits_coalesces_into_one_write_with_last_state() {
        let (clock, mut coordinator, store, mut note) = setup();

        note.content = "first".into();
        coordinator.note_edited();
        clock.advance(Duration::from_millis(300));
        coordinator.poll(&store, &note);

        note.content = "second".into();
        coordinator.note_edited();
        clock.advance(Duration::from_millis(300));
        coordinator.poll(&store, &note);

        note.content = "third".into();
        coordinator.note_edited();

        // Nothing written while edits keep arriving inside the window
        assert!(store.writes().is_empty());

        clock.advance(CONTENT_DEBOUNCE);
        coordinator.poll(&store, &note);

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.content.as_deref(), Some("third"));
        assert_eq!(writes[0].1.title.as_deref(), Some("third"));
    }

    #[test]
    fn single_edit_fires_at_expiry_not_before() {
        let (clock, mut coordinator, store, mut note) = setup();
        note.content = "hello".into();
        coordinator.note_edited();

        clock.advance(CONTENT_DEBOUNCE - Duration::from_millis(1));
        coordinator.poll(&store, &note);
        assert!(store.writes().is_empty());

        clock.advance(Duration::from_millis(1));
        coordinator.poll(&store, &note);
        assert_eq!(store.writes().len(), 1);

        // Expired timer does not refire
        clock.advance(CONTENT_DEBOUNCE);
        coordinator.poll(&store, &note);
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn color_writes_immediately_regardless_of_pending_timers() {
        let (_clock, mut coordinator, store, mut note) = setup();
        coordinator.note_edited();
        coordinator.geometry_changed();

        note.color = NoteColor::Green;
        coordinator.color_changed(&store, &note);

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.color, Some(NoteColor::Green));
        assert!(writes[0].1.content.is_none());

        // Both timers are still pending, untouched by the color write
        assert!(coordinator.is_pending(AttributeClass::Content));
        assert!(coordinator.is_pending(AttributeClass::Geometry));
    }

    #[test]
    fn flush_cancels_pending_timer_and_writes_once() {
        let (clock, mut coordinator, store, mut note) = setup();
        note.content = "unsaved".into();
        coordinator.note_edited();

        coordinator.flush_content(&store, &note);
        assert_eq!(store.writes().len(), 1);
        assert!(!coordinator.is_pending(AttributeClass::Content));

        // The cancelled timer must not fire again later
        clock.advance(CONTENT_DEBOUNCE * 2);
        coordinator.poll(&store, &note);
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn failed_write_is_swallowed_and_next_edit_schedules_normally() {
        let (clock, mut coordinator, store, mut note) = setup();
        store.set_failing(true);

        note.content = "doomed".into();
        coordinator.note_edited();
        clock.advance(CONTENT_DEBOUNCE);
        coordinator.poll(&store, &note);

        // Failure dropped; nothing recorded, in-memory note untouched
        assert!(store.writes().is_empty());
        assert_eq!(note.content, "doomed");
        assert!(!coordinator.is_pending(AttributeClass::Content));

        store.set_failing(false);
        note.content = "recovered".into();
        coordinator.note_edited();
        clock.advance(CONTENT_DEBOUNCE);
        coordinator.poll(&store, &note);

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.content.as_deref(), Some("recovered"));
    }

    #[test]
    fn content_and_geometry_timers_are_independent() {
        let (clock, mut coordinator, store, mut note) = setup();
        note.content = "text".into();
        coordinator.note_edited();
        clock.advance(Duration::from_millis(300));

        // A geometry change must not reset the content window
        coordinator.geometry_changed();
        clock.advance(Duration::from_millis(200));
        coordinator.poll(&store, &note);

        let writes = store.writes();
        assert_eq!(writes.len(), 1, "content fired on its own schedule");
        assert!(writes[0].1.content.is_some());
        assert!(coordinator.is_pending(AttributeClass::Geometry));

        clock.advance(GEOMETRY_DEBOUNCE);
        coordinator.poll(&store, &note);
        let writes = store.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].1.pos_x, Some(note.pos_x));
        assert_eq!(writes[1].1.height, Some(note.height));
        assert!(writes[1].1.content.is_none());
    }

    #[test]
    fn geometry_cancel_drops_the_timer_without_writing() {
        let (clock, mut coordinator, store, note) = setup();
        coordinator.geometry_changed();
        coordinator.cancel_geometry();

        clock.advance(GEOMETRY_DEBOUNCE * 2);
        coordinator.poll(&store, &note);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn observer_receives_derived_title_on_success_only() {
        let (clock, mut coordinator, store, mut note) = setup();
        let titles = Arc::new(Mutex::new(Vec::new()));
        coordinator.subscribe(Box::new(RecordedTitles(titles.clone())));

        store.set_failing(true);
        note.content = "Hello world\nmore text".into();
        coordinator.note_edited();
        clock.advance(CONTENT_DEBOUNCE);
        coordinator.poll(&store, &note);
        assert!(titles.lock().is_empty(), "no notification on failure");

        store.set_failing(false);
        coordinator.note_edited();
        clock.advance(CONTENT_DEBOUNCE);
        coordinator.poll(&store, &note);
        assert_eq!(titles.lock().as_slice(), ["Hello world"]);
    }

    #[test]
    fn flush_of_empty_note_saves_untitled() {
        let (_clock, mut coordinator, store, note) = setup();
        let titles = Arc::new(Mutex::new(Vec::new()));
        coordinator.subscribe(Box::new(RecordedTitles(titles.clone())));

        coordinator.flush_content(&store, &note);
        assert_eq!(titles.lock().as_slice(), [UNTITLED]);
    }
}
