//! Application configuration file
//!
//! The file is a single JSON object: `{"version": "<string>"}`.
//! It is read once at startup and never reloaded.

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the configuration file (relative to the working directory)
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loaded application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Configuration {
    /// Version string echoed by the greeting endpoint
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Configuration {
    /// Decode a configuration document
    ///
    /// A `null` document decodes to the default configuration.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(serde_json::from_slice::<Option<Self>>(data)?.unwrap_or_default())
    }
}

/// Read and decode the configuration file at `path`
///
/// # Errors
/// * `ConfigError::Read` - the file is missing or unreadable
/// * `ConfigError::Parse` - the contents are not a valid configuration document
pub fn load_configuration(path: impl AsRef<Path>) -> Result<Configuration, ConfigError> {
    let path = path.as_ref();

    let data = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Configuration::from_json(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
