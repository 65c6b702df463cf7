//! Image handling for note attachments.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Resizing to a bounding box with alpha flattening
//! - Format-specific optimization through pluggable compressors
//! - The shrink pipeline that never returns a larger file than it was given
//! - Header-only metadata extraction

#![warn(missing_docs)]

mod alpha;
mod config;
mod detect;
mod error;
mod metadata;
pub mod optimize;
mod processor;
mod resize;
mod shrink;

#[cfg(test)]
mod test_helpers;

pub use alpha::{flatten_alpha, has_alpha_channel, WHITE};
pub use config::{GifOptions, OptimizeConfig, PngQuality, ResizeConfig};
pub use detect::{detect_format, ImageFormat};
pub use error::{ImageError, Result};
pub use metadata::{extract_metadata, ImageMetadata};
pub use optimize::{optimize, optimizer_for, NativeOptimizer, Optimizer, ToolchainOptimizer};
pub use processor::{ImageProcessor, ProcessedImage};
pub use resize::{can_decode, fit_within, resize, DECODABLE_FORMATS, INTERMEDIATE_JPEG_QUALITY};
pub use shrink::{ShrinkOutcome, ShrinkPipeline, Shrunk};
