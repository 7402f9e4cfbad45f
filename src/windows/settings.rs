//! Settings window context.
//!
//! Typed view over the key/value settings store. Every setter writes
//! through immediately (save-on-change, like the other windows) and keeps
//! the local copy even if the write fails, so the UI never snaps back.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::error::{ResultExt, StoreResult};
use crate::store::NoteStore;

pub const KEY_BACKEND: &str = "backend";
pub const KEY_UI_SCALE: &str = "ui_scale";
pub const KEY_DB_PATH: &str = "db_path";
pub const KEY_COLOR_PALETTE: &str = "color_palette";

pub const DEFAULT_BACKEND: &str = "sqlite";
pub const DEFAULT_UI_SCALE: f32 = 1.0;
pub const DEFAULT_COLOR_PALETTE: &str = "classic";

/// Context for the settings window.
pub struct SettingsWindow<S: NoteStore> {
    store: Arc<S>,
    values: HashMap<String, String>,
}

impl<S: NoteStore> SettingsWindow<S> {
    /// Load all settings into the context.
    pub fn open(store: Arc<S>) -> StoreResult<Self> {
        let values = store
            .all_settings()?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect::<HashMap<_, _>>();
        info!(setting_count = values.len(), "Settings window opened");
        Ok(Self { store, values })
    }

    pub fn backend(&self) -> &str {
        self.values
            .get(KEY_BACKEND)
            .map(String::as_str)
            .unwrap_or(DEFAULT_BACKEND)
    }

    /// UI scale factor. Falls back to the default when missing or
    /// unparseable.
    pub fn ui_scale(&self) -> f32 {
        self.values
            .get(KEY_UI_SCALE)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_UI_SCALE)
    }

    /// Custom database location, if the user picked one.
    pub fn db_path(&self) -> Option<&str> {
        self.values.get(KEY_DB_PATH).map(String::as_str)
    }

    pub fn color_palette(&self) -> &str {
        self.values
            .get(KEY_COLOR_PALETTE)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR_PALETTE)
    }

    pub fn set_backend(&mut self, backend: &str) {
        self.set(KEY_BACKEND, backend);
    }

    pub fn set_ui_scale(&mut self, scale: f32) {
        self.set(KEY_UI_SCALE, &format!("{:.1}", scale));
    }

    pub fn set_db_path(&mut self, path: &str) {
        self.set(KEY_DB_PATH, path);
    }

    pub fn set_color_palette(&mut self, palette: &str) {
        self.set(KEY_COLOR_PALETTE, palette);
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        // Best-effort write-through; the local value stands either way.
        self.store.set_setting(key, value).log_err();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::tempdir;

    fn open_settings() -> (
        tempfile::TempDir,
        Arc<SqliteStore>,
        SettingsWindow<SqliteStore>,
    ) {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
        let settings = SettingsWindow::open(store.clone()).unwrap();
        (dir, store, settings)
    }

    #[test]
    fn defaults_apply_when_store_is_empty() {
        let (_dir, _store, settings) = open_settings();
        assert_eq!(settings.backend(), DEFAULT_BACKEND);
        assert_eq!(settings.ui_scale(), DEFAULT_UI_SCALE);
        assert_eq!(settings.db_path(), None);
        assert_eq!(settings.color_palette(), DEFAULT_COLOR_PALETTE);
    }

    #[test]
    fn setters_write_through_and_reload() {
        let (_dir, store, mut settings) = open_settings();
        settings.set_ui_scale(1.25);
        settings.set_color_palette("pastel");
        settings.set_db_path("/tmp/notes.sqlite");

        // Visible immediately
        assert_eq!(settings.ui_scale(), 1.2, "scale rounds to one decimal");
        assert_eq!(settings.color_palette(), "pastel");

        // And persisted for the next session
        let reloaded = SettingsWindow::open(store).unwrap();
        assert_eq!(reloaded.ui_scale(), 1.2);
        assert_eq!(reloaded.color_palette(), "pastel");
        assert_eq!(reloaded.db_path(), Some("/tmp/notes.sqlite"));
    }

    #[test]
    fn garbage_scale_falls_back_to_default() {
        let (_dir, store, _settings) = open_settings();
        store.set_setting(KEY_UI_SCALE, "huge").unwrap();
        let settings = SettingsWindow::open(store).unwrap();
        assert_eq!(settings.ui_scale(), DEFAULT_UI_SCALE);
    }
}
