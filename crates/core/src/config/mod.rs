//! Configuration loading and schema definitions
//!
//! Values are read once at startup and handed to the pipeline as plain
//! parameters.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
