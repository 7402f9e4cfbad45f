//! Note store collaborator.
//!
//! [`NoteStore`] is the interface the window controllers and the autosave
//! coordinator write through. [`SqliteStore`] is the local implementation:
//! one SQLite database holding notes and key/value settings.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, types::ToSql, Connection};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::model::{Note, NoteColor, NoteId, NoteUpdate, Setting};

/// Store collaborator interface: the autosave write path plus the CRUD and
/// settings surface the manager and settings windows need.
///
/// `write` applies a partial update: only the fields present in the payload
/// are modified, and `updated_at` is bumped on every note write.
pub trait NoteStore {
    fn read(&self, id: &NoteId) -> StoreResult<Note>;
    fn write(&self, id: &NoteId, update: NoteUpdate) -> StoreResult<Note>;

    /// All notes, most recently updated first.
    fn list(&self) -> StoreResult<Vec<Note>>;

    /// Notes whose windows were open when the app last quit.
    fn open_notes(&self) -> StoreResult<Vec<Note>>;

    fn create(&self, color: Option<NoteColor>) -> StoreResult<Note>;
    fn delete(&self, id: &NoteId) -> StoreResult<()>;

    fn setting(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> StoreResult<()>;
    fn all_settings(&self) -> StoreResult<Vec<Setting>>;
}

/// SQLite-backed note store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database in the given data directory and run
    /// the schema setup.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
        let db_path = data_dir.join("stickynotes.sqlite");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;

        // WAL mode for better write performance
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout = 5000;",
        )
        .context("Failed to set database pragmas")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL DEFAULT 'yellow',
                pos_x INTEGER NOT NULL DEFAULT 120,
                pos_y INTEGER NOT NULL DEFAULT 120,
                width INTEGER NOT NULL DEFAULT 320,
                height INTEGER NOT NULL DEFAULT 320,
                is_open INTEGER NOT NULL DEFAULT 1,
                pinned INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_updated_at ON notes(updated_at DESC);
            CREATE INDEX IF NOT EXISTS idx_notes_is_open ON notes(is_open);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to create tables")?;

        info!(db_path = %db_path.display(), "Note store initialized");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_note(conn: &Connection, id: &NoteId) -> StoreResult<Note> {
        let note = conn.query_row(
            "SELECT id, title, content, color, pos_x, pos_y, width, height,
                    is_open, pinned, created_at, updated_at
             FROM notes WHERE id = ?1",
            params![id.as_str()],
            row_to_note,
        )?;
        Ok(note)
    }

    fn query_notes(conn: &Connection, sql: &str) -> StoreResult<Vec<Note>> {
        let mut stmt = conn.prepare(sql).map_err(StoreError::from)?;
        let notes = stmt
            .query_map([], row_to_note)
            .map_err(StoreError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }
}

impl NoteStore for SqliteStore {
    fn read(&self, id: &NoteId) -> StoreResult<Note> {
        let conn = self.conn.lock();
        Self::query_note(&conn, id)
    }

    fn write(&self, id: &NoteId, update: NoteUpdate) -> StoreResult<Note> {
        let conn = self.conn.lock();

        if update.is_empty() {
            return Self::query_note(&conn, id);
        }

        let mut set_clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref title) = update.title {
            set_clauses.push("title = ?");
            values.push(Box::new(title.clone()));
        }
        if let Some(ref content) = update.content {
            set_clauses.push("content = ?");
            values.push(Box::new(content.clone()));
        }
        if let Some(color) = update.color {
            set_clauses.push("color = ?");
            values.push(Box::new(color.as_str()));
        }
        if let Some(pos_x) = update.pos_x {
            set_clauses.push("pos_x = ?");
            values.push(Box::new(pos_x));
        }
        if let Some(pos_y) = update.pos_y {
            set_clauses.push("pos_y = ?");
            values.push(Box::new(pos_y));
        }
        if let Some(width) = update.width {
            set_clauses.push("width = ?");
            values.push(Box::new(width));
        }
        if let Some(height) = update.height {
            set_clauses.push("height = ?");
            values.push(Box::new(height));
        }
        if let Some(is_open) = update.is_open {
            set_clauses.push("is_open = ?");
            values.push(Box::new(is_open as i32));
        }
        if let Some(pinned) = update.pinned {
            set_clauses.push("pinned = ?");
            values.push(Box::new(pinned as i32));
        }

        set_clauses.push("updated_at = ?");
        values.push(Box::new(Utc::now().to_rfc3339()));

        let sql = format!("UPDATE notes SET {} WHERE id = ?", set_clauses.join(", "));
        values.push(Box::new(id.as_str().to_string()));

        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let changed = conn
            .execute(&sql, param_refs.as_slice())
            .map_err(StoreError::from)?;

        if changed == 0 {
            return Err(StoreError::Rejected(format!("unknown note id {}", id)));
        }

        debug!(note_id = %id, "Note updated");
        Self::query_note(&conn, id)
    }

    fn list(&self) -> StoreResult<Vec<Note>> {
        let conn = self.conn.lock();
        Self::query_notes(
            &conn,
            "SELECT id, title, content, color, pos_x, pos_y, width, height,
                    is_open, pinned, created_at, updated_at
             FROM notes ORDER BY updated_at DESC",
        )
    }

    fn open_notes(&self) -> StoreResult<Vec<Note>> {
        let conn = self.conn.lock();
        Self::query_notes(
            &conn,
            "SELECT id, title, content, color, pos_x, pos_y, width, height,
                    is_open, pinned, created_at, updated_at
             FROM notes WHERE is_open = 1 ORDER BY updated_at DESC",
        )
    }

    fn create(&self, color: Option<NoteColor>) -> StoreResult<Note> {
        let note = Note::new(color.unwrap_or_default());
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO notes (id, color, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                note.id.as_str(),
                note.color.as_str(),
                note.created_at.to_rfc3339(),
                note.updated_at.to_rfc3339(),
            ],
        )
        .map_err(StoreError::from)?;

        info!(note_id = %note.id, color = note.color.as_str(), "Note created");
        Self::query_note(&conn, &note.id)
    }

    fn delete(&self, id: &NoteId) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM notes WHERE id = ?1", params![id.as_str()])
            .map_err(StoreError::from)?;
        info!(note_id = %id, "Note deleted");
        Ok(())
    }

    fn setting(&self, key: &str) -> StoreResult<Option<String>> {
        use rusqlite::OptionalExtension;
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(StoreError::from)?;
        debug!(key, "Setting saved");
        Ok(())
    }

    fn all_settings(&self) -> StoreResult<Vec<Setting>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key, value FROM settings ORDER BY key")
            .map_err(StoreError::from)?;
        let settings = stmt
            .query_map([], |row| {
                Ok(Setting {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })
            .map_err(StoreError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(settings)
    }
}

/// Convert a database row to a Note.
fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
    let id_str: String = row.get(0)?;
    let color_str: String = row.get(3)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(Note {
        id: NoteId::parse(&id_str).unwrap_or_default(),
        title: row.get(1)?,
        content: row.get(2)?,
        color: NoteColor::parse_or_default(&color_str),
        pos_x: row.get(4)?,
        pos_y: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        is_open: row.get::<_, i32>(8)? != 0,
        pinned: row.get::<_, i32>(9)? != 0,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
