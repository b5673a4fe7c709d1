use crate::error::{ErrorClass, ErrorOrigin, MapperError};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse mapper config: {message}")]
    Parse { message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for MapperError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Config, err.to_string())
    }
}

///
/// MapperConfig
///
/// Mapping policy shared by the metadata resolver, name resolver,
/// reference resolver and codec. Every key is optional in TOML.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Translate field and collection names to the wire case.
    pub translate_case: bool,

    /// Populate creation, last-change and last-access fields.
    pub auto_values: bool,

    /// Re-read persisted state to decide whether an object with an id is new.
    pub verify_new: bool,

    /// Write unmapped types as opaque binary envelopes.
    pub object_serialization: bool,

    /// Nesting limit for a single marshall call.
    pub max_depth: usize,

    /// strftime format for text auto-value fields without their own format.
    pub timestamp_format: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            translate_case: true,
            auto_values: true,
            verify_new: false,
            object_serialization: false,
            max_depth: 64,
            timestamp_format: "%Y-%m-%dT%H:%M:%S".to_string(),
        }
    }
}

impl MapperConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "max_depth must be at least 1".into(),
            ));
        }
        if self.timestamp_format.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "timestamp_format must not be empty".into(),
            ));
        }
        if !is_valid_timestamp_format(&self.timestamp_format) {
            return Err(ConfigError::InvalidValue(format!(
                "timestamp_format '{}' is not a valid strftime format",
                self.timestamp_format
            )));
        }

        Ok(())
    }
}

/// Whether `format` parses as a strftime format string.
#[must_use]
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

///
/// TESTS
///
