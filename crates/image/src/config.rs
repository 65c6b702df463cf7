//! Per-call parameters for the resizer and the optimizer.
//!
//! Both are plain values built once from [`ImagesConfig`] and passed down, so
//! pipeline stages never read a global option store.

use crate::{ImageError, Result};
use notepix_core::config::ImagesConfig;
use serde::{Deserialize, Serialize};

/// Bounding box for the resizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeConfig {
    /// Longest allowed edge in pixels
    pub max_dimension: u32,
}

impl ResizeConfig {
    /// Create a resize config, rejecting a zero bounding box.
    pub fn new(max_dimension: u32) -> Result<Self> {
        if max_dimension == 0 {
            return Err(ImageError::InvalidConfig("max_dimension must be positive".into()));
        }
        Ok(Self { max_dimension })
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { max_dimension: 1200 }
    }
}

/// PNG quantization quality as a `[min, max]` range of fractions.
///
/// The default tops out at 0.7 so quantization always trades some fidelity
/// for size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PngQuality {
    /// Below this estimated quality the result is rejected
    pub min: f32,
    /// Target quality, drives the palette size
    pub max: f32,
}

impl PngQuality {
    /// Create a range, rejecting values outside `[0, 1]` or `min > max`.
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(ImageError::InvalidConfig(format!(
                "png quality range [{}, {}] must be ordered within [0, 1]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Palette size used to reach the `max` quality.
    pub fn palette_size(&self) -> usize {
        ((256.0 * self.max).round() as usize).clamp(2, 256)
    }
}

impl Default for PngQuality {
    fn default() -> Self {
        Self { min: 0.0, max: 0.7 }
    }
}

/// GIF compressor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifOptions {
    /// Lossiness level, 0-100
    pub lossy: u8,
    /// Optimization effort, 1-3
    pub optimization_level: u8,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            lossy: 80,
            optimization_level: 3,
        }
    }
}

/// Parameters for all three compressors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// JPEG quality, 0-100
    pub jpeg_quality: u8,
    /// PNG quantization range
    pub png_quality: PngQuality,
    /// GIF lossy settings
    pub gif: GifOptions,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            png_quality: PngQuality::default(),
            gif: GifOptions::default(),
        }
    }
}

impl TryFrom<&ImagesConfig> for ResizeConfig {
    type Error = ImageError;

    fn try_from(config: &ImagesConfig) -> Result<Self> {
        ResizeConfig::new(config.max_dimension)
    }
}

impl TryFrom<&ImagesConfig> for OptimizeConfig {
    type Error = ImageError;

    fn try_from(config: &ImagesConfig) -> Result<Self> {
        let [min, max] = config.png_quality;
        Ok(Self {
            jpeg_quality: config.jpeg_quality.min(100),
            png_quality: PngQuality::new(min, max)?,
            gif: GifOptions {
                lossy: config.gif_lossy.min(100),
                optimization_level: config.gif_optimization_level.clamp(1, 3),
            },
        })
    }
}
