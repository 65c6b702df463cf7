//! Error types for image ingestion

use crate::NoteId;
use notepix_image::ImageError;
use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while ingesting an upload
#[derive(Error, Debug)]
pub enum IngestError {
    /// The upload could not be processed
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The target or parent note does not exist
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    /// A persistence collaborator failed
    #[error("Store error: {0}")]
    Store(String),
}

impl IngestError {
    /// Build a store error from any displayable cause.
    pub fn store(cause: impl std::fmt::Display) -> Self {
        IngestError::Store(cause.to_string())
    }
}
