//! In-process store implementing every persistence collaborator.
//!
//! Useful for tests and for embedding the ingestor without a database.

use crate::{
    IngestError, Label, NewNote, NewRevision, Note, NoteId, NoteRepository, ProtectedSession, Result, Revision,
    RevisionId, RevisionService,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    notes: HashMap<NoteId, Note>,
    contents: HashMap<NoteId, Vec<u8>>,
    labels: HashMap<NoteId, Vec<Label>>,
    revisions: Vec<Revision>,
}

/// Thread-safe in-memory notes, contents, labels and revisions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    session_available: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store with no protected session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or close the protected session.
    pub fn set_session_available(&self, available: bool) {
        self.session_available.store(available, Ordering::Relaxed);
    }

    /// All revisions of a note, oldest first.
    pub fn revisions(&self, note_id: &NoteId) -> Result<Vec<Revision>> {
        Ok(self
            .read()?
            .revisions
            .iter()
            .filter(|r| &r.snapshot.note_id == note_id)
            .cloned()
            .collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| IngestError::store("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| IngestError::store("memory store lock poisoned"))
    }
}

fn ensure_exists(tables: &Tables, note_id: &NoteId) -> Result<()> {
    if tables.notes.contains_key(note_id) {
        Ok(())
    } else {
        Err(IngestError::NoteNotFound(note_id.clone()))
    }
}

impl NoteRepository for MemoryStore {
    fn get_note(&self, note_id: &NoteId) -> Result<Option<Note>> {
        Ok(self.read()?.notes.get(note_id).cloned())
    }

    fn create_note(&self, new_note: NewNote) -> Result<Note> {
        let mut tables = self.write()?;
        if let Some(parent) = &new_note.parent_note_id {
            ensure_exists(&tables, parent)?;
        }

        let now = Utc::now();
        let note = Note {
            note_id: NoteId::generate(),
            parent_note_id: new_note.parent_note_id,
            title: new_note.title,
            note_type: new_note.note_type,
            mime: new_note.mime,
            is_protected: new_note.is_protected,
            date_created: now,
            date_modified: now,
        };

        tables.contents.insert(note.note_id.clone(), new_note.content);
        tables.notes.insert(note.note_id.clone(), note.clone());
        Ok(note)
    }

    fn update_note(&self, note: &Note) -> Result<()> {
        let mut tables = self.write()?;
        ensure_exists(&tables, &note.note_id)?;
        tables.notes.insert(note.note_id.clone(), note.clone());
        Ok(())
    }

    fn get_content(&self, note_id: &NoteId) -> Result<Vec<u8>> {
        let tables = self.read()?;
        ensure_exists(&tables, note_id)?;
        Ok(tables.contents.get(note_id).cloned().unwrap_or_default())
    }

    fn set_content(&self, note_id: &NoteId, content: Vec<u8>) -> Result<()> {
        let mut tables = self.write()?;
        let note = tables
            .notes
            .get_mut(note_id)
            .ok_or_else(|| IngestError::NoteNotFound(note_id.clone()))?;
        note.date_modified = Utc::now();
        tables.contents.insert(note_id.clone(), content);
        Ok(())
    }

    fn add_label(&self, note_id: &NoteId, name: &str, value: &str) -> Result<()> {
        let mut tables = self.write()?;
        ensure_exists(&tables, note_id)?;
        tables.labels.entry(note_id.clone()).or_default().push(Label::new(name, value));
        Ok(())
    }

    fn set_label(&self, note_id: &NoteId, name: &str, value: &str) -> Result<()> {
        let mut tables = self.write()?;
        ensure_exists(&tables, note_id)?;
        let labels = tables.labels.entry(note_id.clone()).or_default();
        labels.retain(|label| label.name != name);
        labels.push(Label::new(name, value));
        Ok(())
    }

    fn labels(&self, note_id: &NoteId) -> Result<Vec<Label>> {
        let tables = self.read()?;
        ensure_exists(&tables, note_id)?;
        Ok(tables.labels.get(note_id).cloned().unwrap_or_default())
    }
}

impl RevisionService for MemoryStore {
    fn save_revision(&self, revision: NewRevision) -> Result<RevisionId> {
        let mut tables = self.write()?;
        ensure_exists(&tables, &revision.note_id)?;

        let revision_id = RevisionId::generate();
        tables.revisions.push(Revision {
            revision_id: revision_id.clone(),
            snapshot: revision,
            date_created: Utc::now(),
        });
        Ok(revision_id)
    }

    fn protect_revisions(&self, note: &Note) -> Result<()> {
        let mut tables = self.write()?;
        for revision in tables.revisions.iter_mut().filter(|r| r.snapshot.note_id == note.note_id) {
            revision.snapshot.is_protected = note.is_protected;
        }
        Ok(())
    }
}

impl ProtectedSession for MemoryStore {
    fn is_available(&self) -> bool {
        self.session_available.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteType;

    fn new_note(parent: Option<NoteId>, title: &str) -> NewNote {
        NewNote {
            parent_note_id: parent,
            title: title.to_string(),
            note_type: NoteType::Text,
            mime: "text/html".to_string(),
            content: b"<p>hello</p>".to_vec(),
            is_protected: false,
        }
    }

    #[test]
    fn test_create_and_fetch() {
        let store = MemoryStore::new();
        let root = store.create_note(new_note(None, "root")).unwrap();

        let fetched = store.get_note(&root.note_id).unwrap().unwrap();
        assert_eq!(fetched, root);
        assert_eq!(store.get_content(&root.note_id).unwrap(), b"<p>hello</p>");
    }

    #[test]
    fn test_create_under_missing_parent_fails() {
        let store = MemoryStore::new();
        let result = store.create_note(new_note(Some(NoteId::from("ghost")), "child"));
        assert!(matches!(result, Err(IngestError::NoteNotFound(_))));
    }

    #[test]
    fn test_set_label_replaces_add_label_appends() {
        let store = MemoryStore::new();
        let note = store.create_note(new_note(None, "n")).unwrap();

        store.add_label(&note.note_id, "tag", "a").unwrap();
        store.add_label(&note.note_id, "tag", "b").unwrap();
        assert_eq!(store.labels(&note.note_id).unwrap().len(), 2);

        store.set_label(&note.note_id, "tag", "c").unwrap();
        assert_eq!(store.labels(&note.note_id).unwrap(), vec![Label::new("tag", "c")]);
    }

    #[test]
    fn test_protect_revisions_follows_note() {
        let store = MemoryStore::new();
        let mut note = store.create_note(new_note(None, "n")).unwrap();
        store.save_revision(NewRevision::capture(&note, vec![1])).unwrap();

        note.is_protected = true;
        store.protect_revisions(&note).unwrap();

        let revisions = store.revisions(&note.note_id).unwrap();
        assert_eq!(revisions.len(), 1);
        assert!(revisions[0].snapshot.is_protected);
    }

    #[test]
    fn test_session_flag() {
        let store = MemoryStore::new();
        assert!(!store.is_available());
        store.set_session_available(true);
        assert!(store.is_available());
    }
}
