//! Note data model and plain-text projection.
//!
//! Note content is an opaque serialized rich-text blob owned by the editor
//! collaborator. This module only projects it to plain text for titles,
//! previews, and search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of a derived title, in characters.
pub const TITLE_MAX_CHARS: usize = 60;

/// Title shown when a note has no text yet.
pub const UNTITLED: &str = "Untitled";

/// Stable identifier for a note. Backed by a UUID v4, stable for the
/// lifetime of the window that opened the note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an id string. Returns `None` when it is not a valid UUID.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(|u| Self(u.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sticky note colors available in the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    Gray,
}

impl NoteColor {
    pub const ALL: [NoteColor; 6] = [
        NoteColor::Yellow,
        NoteColor::Blue,
        NoteColor::Green,
        NoteColor::Pink,
        NoteColor::Purple,
        NoteColor::Gray,
    ];

    /// Lowercase string key used for persistence and CSS class names.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteColor::Yellow => "yellow",
            NoteColor::Blue => "blue",
            NoteColor::Green => "green",
            NoteColor::Pink => "pink",
            NoteColor::Purple => "purple",
            NoteColor::Gray => "gray",
        }
    }

    /// Parse a persisted color key, falling back to the default for
    /// unknown values so an old database never blocks a note from opening.
    pub fn parse_or_default(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .unwrap_or_default()
    }
}

/// A sticky note as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Serialized rich-text content. Opaque to this crate.
    pub content: String,
    pub color: NoteColor,
    pub pos_x: i32,
    pub pos_y: i32,
    pub width: i32,
    pub height: i32,
    /// Whether the note's window should be restored on next launch.
    pub is_open: bool,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// A fresh note with default geometry, ready to be inserted.
    pub fn new(color: NoteColor) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::new(),
            title: String::new(),
            content: String::new(),
            color,
            pos_x: 120,
            pos_y: 120,
            width: 320,
            height: 320,
            is_open: true,
            pinned: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Title for window chrome: the stored title, or the placeholder.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

/// Partial update payload for a note. Only the fields that are `Some` are
/// written; `None` fields are omitted from the serialized bridge payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl NoteUpdate {
    /// Content attribute class: the serialized content plus the title
    /// derived from it.
    pub fn content(content: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Color attribute class.
    pub fn color(color: NoteColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    /// Geometry attribute class: window position and size.
    pub fn geometry(pos_x: i32, pos_y: i32, width: i32, height: i32) -> Self {
        Self {
            pos_x: Some(pos_x),
            pos_y: Some(pos_y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Marks the note's window as closed so it is not restored on launch.
    pub fn closed() -> Self {
        Self {
            is_open: Some(false),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.color.is_none()
            && self.pos_x.is_none()
            && self.pos_y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.is_open.is_none()
            && self.pinned.is_none()
    }
}

/// A key/value setting entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Project serialized rich text to plain text.
///
/// Tags are dropped; closing block tags and `<br>` become newlines so the
/// first visual line stays the first line of the projection. Common
/// entities are decoded. Plain text passes through unchanged.
pub fn strip_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }
        // Consume the tag.
        let rest = &content[i..];
        let Some(end) = rest.find('>') else {
            // Unterminated tag: treat the rest as text.
            out.push(c);
            continue;
        };
        let tag = rest[1..end].trim().to_ascii_lowercase();
        let name = tag
            .trim_start_matches('/')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or("");
        let is_break = matches!(
            name,
            "p" | "div" | "br" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        );
        if is_break && (tag.starts_with('/') || name == "br") && !out.ends_with('\n') {
            out.push('\n');
        }
        // Skip past the '>'.
        while let Some(&(j, _)) = chars.peek() {
            if j <= i + end {
                chars.next();
            } else {
                break;
            }
        }
    }

    decode_entities(&out)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Derive a display title from serialized content: the first line of the
/// plain-text projection, trimmed and capped at [`TITLE_MAX_CHARS`]
/// characters, falling back to [`UNTITLED`] when empty.
pub fn derive_title(content: &str) -> String {
    let text = strip_markup(content);
    let first_line = text.lines().next().unwrap_or("").trim();
    let title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}
