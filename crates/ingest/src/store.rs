//! Collaborators the ingestor persists through.
//!
//! All of them are synchronous and must be shareable across threads.

use crate::{Label, NewNote, NewRevision, Note, NoteId, Result, RevisionId};

/// Note, content and label persistence.
pub trait NoteRepository: Send + Sync {
    /// Fetch a note, `None` when it does not exist.
    fn get_note(&self, note_id: &NoteId) -> Result<Option<Note>>;

    /// Create a note together with its initial content.
    fn create_note(&self, new_note: NewNote) -> Result<Note>;

    /// Persist changed note metadata.
    fn update_note(&self, note: &Note) -> Result<()>;

    /// Current content of a note.
    fn get_content(&self, note_id: &NoteId) -> Result<Vec<u8>>;

    /// Replace the content of a note.
    fn set_content(&self, note_id: &NoteId, content: Vec<u8>) -> Result<()>;

    /// Attach a label, keeping existing labels of the same name.
    fn add_label(&self, note_id: &NoteId, name: &str, value: &str) -> Result<()>;

    /// Attach a label, replacing existing labels of the same name.
    fn set_label(&self, note_id: &NoteId, name: &str, value: &str) -> Result<()>;

    /// All labels on a note.
    fn labels(&self, note_id: &NoteId) -> Result<Vec<Label>>;
}

/// Revision history.
pub trait RevisionService: Send + Sync {
    /// Store a snapshot taken before a content overwrite.
    fn save_revision(&self, revision: NewRevision) -> Result<RevisionId>;

    /// Align the protection flag of every revision of `note` with the note.
    fn protect_revisions(&self, note: &Note) -> Result<()>;
}

/// Protected session state.
pub trait ProtectedSession: Send + Sync {
    /// Whether protected notes can currently be written.
    fn is_available(&self) -> bool;
}

/// Turns a user-supplied filename into a safe display name.
pub trait FilenameSanitizer: Send + Sync {
    /// Sanitize `name`. Must be deterministic and free of I/O.
    fn sanitize(&self, name: &str) -> String;
}
