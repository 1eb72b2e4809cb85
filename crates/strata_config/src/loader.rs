//! Reading and checking `strata.toml`.

use crate::error::ConfigError;
use crate::types::RunConfig;
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Loads `<project_dir>/strata.toml`.
pub fn load_config(project_dir: &Path) -> Result<RunConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<RunConfig, ConfigError> {
    let config: RunConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    if config.simulation.max_deltas == 0 {
        return Err(ConfigError::Invalid {
            key: "simulation.max_deltas",
            reason: "must be positive".to_string(),
        });
    }
    let waveform = &config.waveform;
    if waveform.enabled && waveform.path.is_none() {
        return Err(ConfigError::Missing("waveform.path"));
    }
    if waveform.scope.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "waveform.scope",
            reason: "must name a module scope".to_string(),
        });
    }
    Ok(())
}
