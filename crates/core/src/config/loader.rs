//! Configuration file loading and validation

use super::schema::{ConfigSchema, FALLBACK_JPEG_QUALITY};
use crate::error::{Error, Result, ResultExt};
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults.
    ///
    /// An explicit path must exist. Without one, the standard locations are
    /// searched and defaults are used when none is present.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        let mut config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config = Self {
            schema: toml::from_str(content)?,
            path: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load with defaults only (no file)
    pub fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Check invariants the image pipeline relies on.
    ///
    /// A JPEG quality outside 10..=100 is not fatal: it is replaced with
    /// [`FALLBACK_JPEG_QUALITY`].
    pub fn validate(&mut self) -> Result<()> {
        let images = &mut self.schema.images;

        if images.max_dimension == 0 {
            return Err(Error::config_invalid("images.max_dimension must be positive"));
        }

        if !(10..=100).contains(&images.jpeg_quality) {
            tracing::warn!(
                configured = images.jpeg_quality,
                fallback = FALLBACK_JPEG_QUALITY,
                "images.jpeg_quality out of range, using fallback"
            );
            images.jpeg_quality = FALLBACK_JPEG_QUALITY;
        }

        let [min, max] = images.png_quality;
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(Error::config_invalid(format!(
                "images.png_quality must be an ordered range within [0, 1], got [{}, {}]",
                min, max
            )));
        }

        if images.gif_lossy > 100 {
            return Err(Error::config_invalid("images.gif_lossy must be at most 100"));
        }

        if !(1..=3).contains(&images.gif_optimization_level) {
            return Err(Error::config_invalid(
                "images.gif_optimization_level must be between 1 and 3",
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.schema)
            .map_err(|e| Error::config(format!("Failed to render configuration: {}", e)))
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [".notepix.toml", "notepix.toml", ".config/notepix.toml"];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path))
}
