//! Note, label and revision records exchanged with the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque note identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque revision identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// Rich text
    Text,
    /// Image attachment
    Image,
    /// Any other binary attachment
    File,
}

/// Note metadata as held by the store. Content is kept separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Identifier
    pub note_id: NoteId,
    /// Parent in the note tree, `None` for a root
    pub parent_note_id: Option<NoteId>,
    /// Display title
    pub title: String,
    /// Note kind
    #[serde(rename = "type")]
    pub note_type: NoteType,
    /// MIME type of the content
    pub mime: String,
    /// Whether the note lives in the protected area
    pub is_protected: bool,
    /// Creation time
    pub date_created: DateTime<Utc>,
    /// Last modification time
    pub date_modified: DateTime<Utc>,
}

/// Request to create a note.
#[derive(Debug, Clone)]
pub struct NewNote {
    /// Parent to create under
    pub parent_note_id: Option<NoteId>,
    /// Display title
    pub title: String,
    /// Note kind
    pub note_type: NoteType,
    /// MIME type of the content
    pub mime: String,
    /// Initial content
    pub content: Vec<u8>,
    /// Whether to place the note in the protected area
    pub is_protected: bool,
}

/// Name/value attribute attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Label value
    pub value: String,
}

impl Label {
    /// Create a label.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Frozen copy of a note's state, taken before its content is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision {
    /// Note the snapshot belongs to
    pub note_id: NoteId,
    /// Title at snapshot time
    pub title: String,
    /// Type at snapshot time
    pub note_type: NoteType,
    /// MIME type at snapshot time
    pub mime: String,
    /// Content at snapshot time
    pub content: Vec<u8>,
    /// Protection at snapshot time
    pub is_protected: bool,
    /// Note creation time
    pub date_note_created: DateTime<Utc>,
    /// Note modification time at snapshot time
    pub date_note_modified: DateTime<Utc>,
}

impl NewRevision {
    /// Capture a note and its current content.
    pub fn capture(note: &Note, content: Vec<u8>) -> Self {
        Self {
            note_id: note.note_id.clone(),
            title: note.title.clone(),
            note_type: note.note_type,
            mime: note.mime.clone(),
            content,
            is_protected: note.is_protected,
            date_note_created: note.date_created,
            date_note_modified: note.date_modified,
        }
    }
}

/// A stored revision.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Identifier
    pub revision_id: RevisionId,
    /// Snapshot contents
    pub snapshot: NewRevision,
    /// When the snapshot was stored
    pub date_created: DateTime<Utc>,
}
