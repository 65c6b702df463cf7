//! Top-level entry point: sniff, guard, shrink, re-sniff.

use crate::optimize::{optimizer_for, Optimizer};
use crate::resize::can_decode;
use crate::shrink::{ShrinkOutcome, ShrinkPipeline};
use crate::{detect_format, ImageFormat, OptimizeConfig, ResizeConfig, Result};
use notepix_core::config::ImagesConfig;
use std::sync::Arc;

/// Final bytes of an upload plus the format they actually are.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Bytes to store
    pub data: Vec<u8>,
    /// Format sniffed from `data`
    pub format: ImageFormat,
    /// Size of the upload in bytes
    pub original_size: usize,
    /// Shrink result, `None` when shrinking was not requested or not possible
    pub shrink: Option<ShrinkOutcome>,
}

impl ProcessedImage {
    /// MIME type to store alongside the bytes.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Bytes saved relative to the upload.
    pub fn bytes_saved(&self) -> usize {
        self.original_size.saturating_sub(self.data.len())
    }
}

/// Sniffs uploads and runs the shrink pipeline where it can.
///
/// Cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    pipeline: ShrinkPipeline,
}

impl ImageProcessor {
    /// Build a processor from explicit stage configs.
    pub fn new(optimizer: Arc<dyn Optimizer>, resize: ResizeConfig, optimize: OptimizeConfig) -> Self {
        Self {
            pipeline: ShrinkPipeline::new(optimizer, resize, optimize),
        }
    }

    /// Build a processor from the `[images]` configuration section.
    pub fn from_config(config: &ImagesConfig) -> Result<Self> {
        Ok(Self::new(
            optimizer_for(config.optimizer),
            ResizeConfig::try_from(config)?,
            OptimizeConfig::try_from(config)?,
        ))
    }

    /// The underlying shrink pipeline.
    pub fn pipeline(&self) -> &ShrinkPipeline {
        &self.pipeline
    }

    /// Process one upload.
    ///
    /// Shrinking is silently skipped for formats the resizer cannot decode.
    /// The returned format is always sniffed from the returned bytes, which
    /// may differ from the upload's format after re-encoding.
    pub fn process(&self, data: Vec<u8>, original_name: &str, shrink: bool) -> Result<ProcessedImage> {
        let original_size = data.len();
        let input_format = detect_format(&data)?;

        let shrink = shrink && {
            let decodable = can_decode(input_format);
            if !decodable {
                tracing::debug!(
                    file = original_name,
                    format = %input_format,
                    "No decoder for format, storing upload as-is"
                );
            }
            decodable
        };

        let (data, outcome) = if shrink {
            let shrunk = self.pipeline.shrink(data, original_name)?;
            (shrunk.data, Some(shrunk.outcome))
        } else {
            (data, None)
        };

        let format = detect_format(&data)?;

        tracing::info!(
            file = original_name,
            input_format = %input_format,
            output_format = %format,
            original_bytes = original_size,
            final_bytes = data.len(),
            outcome = outcome.map_or("skipped", |o| o.as_str()),
            "Processed image"
        );

        Ok(ProcessedImage {
            data,
            format,
            original_size,
            shrink: outcome,
        })
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(
            optimizer_for(Default::default()),
            ResizeConfig::default(),
            OptimizeConfig::default(),
        )
    }
}
