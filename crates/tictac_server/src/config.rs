//! # Server Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) yields a working development server.
//!
//! ```toml
//! ping_interval_ms = 100
//! search_limit = 20
//! id_attempts = 3
//! display_name_suffix_len = 12
//! caller_keys = ["frontend-key"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    DEFAULT_DISPLAY_NAME_SUFFIX_LEN, DEFAULT_ID_ATTEMPTS, DEFAULT_PING_INTERVAL_MS,
    DEFAULT_SEARCH_LIMIT,
};

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Broker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Liveness ping period in milliseconds.
    pub ping_interval_ms: u64,
    /// Maximum lobby search results.
    pub search_limit: usize,
    /// Fresh ids tried before an allocation fails.
    pub id_attempts: u32,
    /// Length of the random suffix of generated display names.
    pub display_name_suffix_len: usize,
    /// Caller keys allowed to subscribe. Empty allows everyone.
    pub caller_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            id_attempts: DEFAULT_ID_ATTEMPTS,
            display_name_suffix_len: DEFAULT_DISPLAY_NAME_SUFFIX_LEN,
            caller_keys: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML, `Invalid` for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`ServerConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ping_interval_ms == 0 {
            return Err(ConfigError::Invalid("ping_interval_ms must be positive".into()));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::Invalid("search_limit must be positive".into()));
        }
        if self.id_attempts == 0 {
            return Err(ConfigError::Invalid("id_attempts must be positive".into()));
        }
        Ok(())
    }

    /// Liveness ping period.
    #[inline]
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}
