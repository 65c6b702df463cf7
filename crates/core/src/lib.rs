//! Core utilities for notepix
//!
//! This crate provides shared functionality used by the image pipeline, the
//! ingestion layer and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with validation
//! - **Process execution**: stdin/stdout filters for external optimizers
//!
//! # Example
//!
//! ```rust,no_run
//! use notepix_core::config::Config;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! println!("max dimension: {}", config.schema.images.max_dimension);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;

pub use error::{Error, ErrorCode, Result, ResultExt};
