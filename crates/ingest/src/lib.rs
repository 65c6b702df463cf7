//! Image attachment ingestion for a note store.
//!
//! [`ImageIngestor`] runs uploads through the image processor and persists
//! the result through the collaborator traits in [`store`]:
//!
//! - **create**: a new `image` note under a parent, labelled with the
//!   original file name and stored size
//! - **replace**: snapshot the existing note into a revision, then swap in
//!   the new content
//!
//! [`MemoryStore`] implements every collaborator in process.

#![warn(missing_docs)]

mod error;
mod ingestor;
mod memory;
mod model;
mod sanitize;
pub mod store;

pub use error::{IngestError, Result};
pub use ingestor::{
    image_url, CreateImage, ImageIngestor, SavedImage, UpdatedImage, FALLBACK_FILE_NAME, FILE_SIZE_LABEL,
    MAX_UNTRIMMED_NAME_CHARS, ORIGINAL_FILE_NAME_LABEL,
};
pub use memory::MemoryStore;
pub use model::{Label, NewNote, NewRevision, Note, NoteId, NoteType, Revision, RevisionId};
pub use sanitize::{DefaultSanitizer, MAX_FILENAME_BYTES};
pub use store::{FilenameSanitizer, NoteRepository, ProtectedSession, RevisionService};
