//! Resize → optimize → size check, with fallbacks.
//!
//! ```text
//! raw ──resize──▶ resized ──optimize──▶ optimized ──compare──▶ final
//!                    │                      ▲                     │
//!                    └── optimizer error ───┘        not smaller ─┴─▶ raw
//! ```
//!
//! A resize failure propagates. Anything that goes wrong afterwards only
//! moves the result back to an earlier buffer, so the returned bytes are
//! never larger than the upload. Optimizer output that is empty or no longer
//! sniffs as an image counts as an optimizer error.

use crate::optimize::{optimize, Optimizer};
use crate::resize::resize;
use crate::{detect_format, ImageError, OptimizeConfig, ResizeConfig, Result};
use serde::Serialize;
use std::sync::Arc;

/// Which buffer the pipeline settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkOutcome {
    /// Resized and optimized bytes were smaller than the upload
    Optimized,
    /// The optimizer failed; resized bytes were smaller than the upload
    Resized,
    /// Nothing beat the upload, which is returned verbatim
    Original,
}

impl ShrinkOutcome {
    /// Stable lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShrinkOutcome::Optimized => "optimized",
            ShrinkOutcome::Resized => "resized",
            ShrinkOutcome::Original => "original",
        }
    }
}

/// Output of [`ShrinkPipeline::shrink`].
#[derive(Debug, Clone)]
pub struct Shrunk {
    /// Final bytes
    pub data: Vec<u8>,
    /// How they were obtained
    pub outcome: ShrinkOutcome,
}

/// Resizer and optimizer composed with the never-grow fallback chain.
#[derive(Clone)]
pub struct ShrinkPipeline {
    optimizer: Arc<dyn Optimizer>,
    resize: ResizeConfig,
    optimize: OptimizeConfig,
}

impl std::fmt::Debug for ShrinkPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShrinkPipeline")
            .field("optimizer", &self.optimizer.name())
            .field("resize", &self.resize)
            .field("optimize", &self.optimize)
            .finish()
    }
}

impl ShrinkPipeline {
    /// Compose a pipeline from an optimizer and both stage configs.
    pub fn new(optimizer: Arc<dyn Optimizer>, resize: ResizeConfig, optimize: OptimizeConfig) -> Self {
        Self {
            optimizer,
            resize,
            optimize,
        }
    }

    /// Resize configuration in use.
    pub fn resize_config(&self) -> &ResizeConfig {
        &self.resize
    }

    /// Optimize configuration in use.
    pub fn optimize_config(&self) -> &OptimizeConfig {
        &self.optimize
    }

    /// Shrink `raw`, returning it unchanged when that is the smallest option.
    ///
    /// `name` is only used in log messages.
    pub fn shrink(&self, raw: Vec<u8>, name: &str) -> Result<Shrunk> {
        let resized = resize(&raw, &self.resize)?;

        let optimized = optimize(self.optimizer.as_ref(), &resized, &self.optimize).and_then(check_output);
        let (candidate, outcome) = match optimized {
            Ok(optimized) => (optimized, ShrinkOutcome::Optimized),
            Err(err) => {
                tracing::error!(
                    file = name,
                    optimizer = self.optimizer.name(),
                    error = %err,
                    "Failed to optimize image, keeping resized version"
                );
                (resized, ShrinkOutcome::Resized)
            }
        };

        if candidate.len() >= raw.len() {
            tracing::warn!(
                file = name,
                original_bytes = raw.len(),
                candidate_bytes = candidate.len(),
                "Shrinking did not reduce size, keeping original"
            );
            return Ok(Shrunk {
                data: raw,
                outcome: ShrinkOutcome::Original,
            });
        }

        tracing::debug!(
            file = name,
            original_bytes = raw.len(),
            final_bytes = candidate.len(),
            outcome = outcome.as_str(),
            "Image shrunk"
        );
        Ok(Shrunk {
            data: candidate,
            outcome,
        })
    }
}

/// Optimizers are external code; make sure they handed back an image.
fn check_output(data: Vec<u8>) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(ImageError::Optimize("optimizer produced no output".to_string()));
    }
    match detect_format(&data) {
        Ok(_) => Ok(data),
        Err(_) => Err(ImageError::Optimize(format!(
            "optimizer produced {} bytes of unrecognized data",
            data.len()
        ))),
    }
}
