//! Parsing and validation of `strata.toml` run configuration files.
//!
//! This crate reads the run configuration file and produces a strongly-typed
//! [`RunConfig`] describing simulation limits and waveform output.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
