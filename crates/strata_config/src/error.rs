//! Configuration errors.

use std::path::PathBuf;

/// Why a `strata.toml` could not be turned into a [`RunConfig`](crate::RunConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that was looked up.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid TOML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A key that the other settings make mandatory is absent.
    #[error("`{0}` is required")]
    Missing(&'static str),

    /// A key holds a value outside its accepted range.
    #[error("`{key}` {reason}")]
    Invalid {
        /// Dotted key, e.g. `simulation.max_deltas`.
        key: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}
