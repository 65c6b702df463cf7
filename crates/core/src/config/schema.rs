//! Configuration schema definitions
//!
//! Mirrors the TOML layout:
//!
//! ```toml
//! [images]
//! max_dimension = 1200
//! jpeg_quality = 75
//! png_quality = [0.0, 0.7]
//! gif_lossy = 80
//! gif_optimization_level = 3
//! optimizer = "native"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which optimizer implementation runs after resizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// Pure Rust re-encoding and palette quantization
    #[default]
    Native,
    /// External mozjpeg / pngquant / gifsicle binaries
    Toolchain,
}

/// Image ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Longest allowed edge in pixels after resizing
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// JPEG quality used by the optimizer (10-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// PNG quantization quality range as `[min, max]` fractions
    #[serde(default = "default_png_quality")]
    pub png_quality: [f32; 2],

    /// GIF lossiness level (0-100)
    #[serde(default = "default_gif_lossy")]
    pub gif_lossy: u8,

    /// GIF optimization effort (1-3)
    #[serde(default = "default_gif_optimization_level")]
    pub gif_optimization_level: u8,

    /// Optimizer implementation
    #[serde(default)]
    pub optimizer: OptimizerKind,

    /// Replace file names longer than 40 characters with `image`
    #[serde(default)]
    pub trim_long_filenames: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            png_quality: default_png_quality(),
            gif_lossy: default_gif_lossy(),
            gif_optimization_level: default_gif_optimization_level(),
            optimizer: OptimizerKind::default(),
            trim_long_filenames: false,
        }
    }
}

/// JPEG quality substituted when the configured one is out of range
pub const FALLBACK_JPEG_QUALITY: u8 = 75;

fn default_max_dimension() -> u32 {
    1200
}

fn default_jpeg_quality() -> u8 {
    FALLBACK_JPEG_QUALITY
}

fn default_png_quality() -> [f32; 2] {
    [0.0, 0.7]
}

fn default_gif_lossy() -> u8 {
    80
}

fn default_gif_optimization_level() -> u8 {
    3
}

/// Logging output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
