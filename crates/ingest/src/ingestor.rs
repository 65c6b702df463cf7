//! Create and replace image notes from raw uploads.

use crate::sanitize::DefaultSanitizer;
use crate::{
    FilenameSanitizer, IngestError, NewNote, NewRevision, Note, NoteId, NoteRepository, NoteType, ProtectedSession,
    Result, RevisionId, RevisionService,
};
use notepix_core::config::ImagesConfig;
use notepix_image::{ImageProcessor, ProcessedImage};
use serde::Serialize;
use std::sync::Arc;

/// Label holding the name the file was uploaded under.
pub const ORIGINAL_FILE_NAME_LABEL: &str = "originalFileName";
/// Label holding the stored size in bytes.
pub const FILE_SIZE_LABEL: &str = "fileSize";
/// Names longer than this are replaced when trimming is on.
pub const MAX_UNTRIMMED_NAME_CHARS: usize = 40;
/// Replacement for trimmed or fully sanitized-away names.
pub const FALLBACK_FILE_NAME: &str = "image";

/// Upload to store as a new note.
#[derive(Debug, Clone)]
pub struct CreateImage {
    /// Note to create the image under
    pub parent_note_id: NoteId,
    /// Raw upload
    pub data: Vec<u8>,
    /// Name the file was uploaded under
    pub original_name: String,
    /// Whether to run the shrink pipeline
    pub shrink: bool,
    /// Replace overly long names with a generic one
    pub trim_filename: bool,
}

impl CreateImage {
    /// Request with shrinking on and trimming off.
    pub fn new(parent_note_id: NoteId, data: Vec<u8>, original_name: impl Into<String>) -> Self {
        Self {
            parent_note_id,
            data,
            original_name: original_name.into(),
            shrink: true,
            trim_filename: false,
        }
    }

    /// Set whether to shrink.
    pub fn shrink(mut self, shrink: bool) -> Self {
        self.shrink = shrink;
        self
    }

    /// Set whether to trim long names.
    pub fn trim_filename(mut self, trim: bool) -> Self {
        self.trim_filename = trim;
        self
    }
}

/// Result of [`ImageIngestor::save_image`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedImage {
    /// Sanitized display name
    pub file_name: String,
    /// The created note
    pub note: Note,
    /// Identifier of the created note
    pub note_id: NoteId,
    /// Relative access path, `api/images/{noteId}/{fileName}`
    pub url: String,
}

/// Result of [`ImageIngestor::update_image`].
#[derive(Debug, Clone)]
pub struct UpdatedImage {
    /// The note after the update
    pub note: Note,
    /// Revision holding the replaced content
    pub revision_id: RevisionId,
}

/// Relative URL under which an image note is served.
pub fn image_url(note_id: &NoteId, file_name: &str) -> String {
    format!("api/images/{}/{}", note_id, file_name)
}

/// Entry point for storing uploaded images as notes.
#[derive(Clone)]
pub struct ImageIngestor {
    processor: ImageProcessor,
    notes: Arc<dyn NoteRepository>,
    revisions: Arc<dyn RevisionService>,
    session: Arc<dyn ProtectedSession>,
    sanitizer: Arc<dyn FilenameSanitizer>,
    always_trim: bool,
}

impl std::fmt::Debug for ImageIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageIngestor")
            .field("processor", &self.processor)
            .field("always_trim", &self.always_trim)
            .finish_non_exhaustive()
    }
}

impl ImageIngestor {
    /// Create an ingestor using [`DefaultSanitizer`].
    pub fn new(
        processor: ImageProcessor,
        notes: Arc<dyn NoteRepository>,
        revisions: Arc<dyn RevisionService>,
        session: Arc<dyn ProtectedSession>,
    ) -> Self {
        Self {
            processor,
            notes,
            revisions,
            session,
            sanitizer: Arc::new(DefaultSanitizer),
            always_trim: false,
        }
    }

    /// Create an ingestor from the `[images]` configuration section.
    ///
    /// `trim_long_filenames` turns trimming on for every upload.
    pub fn from_config(
        config: &ImagesConfig,
        notes: Arc<dyn NoteRepository>,
        revisions: Arc<dyn RevisionService>,
        session: Arc<dyn ProtectedSession>,
    ) -> Result<Self> {
        let processor = ImageProcessor::from_config(config)?;
        let mut ingestor = Self::new(processor, notes, revisions, session);
        ingestor.always_trim = config.trim_long_filenames;
        Ok(ingestor)
    }

    /// Replace the filename sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn FilenameSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Store an upload as a new image note under `request.parent_note_id`.
    pub fn save_image(&self, request: CreateImage) -> Result<SavedImage> {
        let CreateImage {
            parent_note_id,
            data,
            original_name,
            shrink,
            trim_filename,
        } = request;

        let processed = self.processor.process(data, &original_name, shrink)?;
        let file_name = self.display_name(&original_name, trim_filename || self.always_trim);
        let parent = self.fetch_note(&parent_note_id)?;

        let is_protected = parent.is_protected && self.session.is_available();
        let file_size = processed.data.len();
        let mime = processed.mime_type().to_string();

        let note = self.notes.create_note(NewNote {
            parent_note_id: Some(parent_note_id),
            title: file_name.clone(),
            note_type: NoteType::Image,
            mime,
            content: processed.data,
            is_protected,
        })?;

        self.notes
            .add_label(&note.note_id, ORIGINAL_FILE_NAME_LABEL, &original_name)?;
        self.notes
            .add_label(&note.note_id, FILE_SIZE_LABEL, &file_size.to_string())?;

        tracing::info!(
            note_id = %note.note_id,
            file_name = %file_name,
            mime = %note.mime,
            bytes = file_size,
            protected = is_protected,
            "Saved image note"
        );

        Ok(SavedImage {
            url: image_url(&note.note_id, &file_name),
            note_id: note.note_id.clone(),
            file_name,
            note,
        })
    }

    /// Replace an existing note's content with a new upload.
    ///
    /// The note's current state is stored as a revision before anything on
    /// the note changes.
    pub fn update_image(&self, note_id: &NoteId, data: Vec<u8>, original_name: &str) -> Result<UpdatedImage> {
        let mut note = self.fetch_note(note_id)?;
        let processed = self.processor.process(data, original_name, true)?;

        let previous = self.notes.get_content(note_id)?;
        let revision_id = self.revisions.save_revision(NewRevision::capture(&note, previous))?;

        let ProcessedImage { data, format, .. } = processed;
        let file_size = data.len();
        note.mime = format.mime_type().to_string();
        self.notes.update_note(&note)?;
        self.notes.set_content(note_id, data)?;

        self.notes
            .set_label(note_id, ORIGINAL_FILE_NAME_LABEL, original_name)?;
        self.notes
            .set_label(note_id, FILE_SIZE_LABEL, &file_size.to_string())?;

        let note = self.fetch_note(note_id)?;
        self.revisions.protect_revisions(&note)?;

        tracing::info!(
            note_id = %note_id,
            revision_id = %revision_id,
            mime = %note.mime,
            bytes = file_size,
            "Replaced image note content"
        );

        Ok(UpdatedImage { note, revision_id })
    }

    fn fetch_note(&self, note_id: &NoteId) -> Result<Note> {
        self.notes
            .get_note(note_id)?
            .ok_or_else(|| IngestError::NoteNotFound(note_id.clone()))
    }

    fn display_name(&self, original_name: &str, trim: bool) -> String {
        let name = if trim && original_name.chars().count() > MAX_UNTRIMMED_NAME_CHARS {
            FALLBACK_FILE_NAME
        } else {
            original_name
        };

        let sanitized = self.sanitizer.sanitize(name);
        if sanitized.is_empty() {
            FALLBACK_FILE_NAME.to_string()
        } else {
            sanitized
        }
    }
}
