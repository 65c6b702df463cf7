//! Error types for the image crate.

use crate::ImageFormat;
use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
///
/// Only [`ImageError::UnknownFormat`] and decode failures abort ingestion.
/// Optimizer errors are recovered inside the shrink pipeline.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Format was recognized but the resizer has no decoder for it
    #[error("No decoder available for {0} images")]
    Undecodable(ImageFormat),

    /// Decoding failed
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// An optimizer step failed
    #[error("Optimization failed: {0}")]
    Optimize(String),

    /// Palette quantization could not reach the minimum requested quality
    #[error("Quantized quality {achieved:.2} is below the minimum {minimum:.2}")]
    QualityTooLow {
        /// Estimated quality of the quantized image
        achieved: f32,
        /// Configured minimum quality
        minimum: f32,
    },

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// External optimizer tool error
    #[error(transparent)]
    Tool(#[from] notepix_core::Error),
}
