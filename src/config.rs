//! Engine configuration
//!
//! Defaults for the primary key property, the include depth limit and the
//! log level. Loaded from JSON; every field is optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clause::DEFAULT_MAX_INCLUDE_DEPTH;
use crate::model::{ModelRegistry, DEFAULT_PRIMARY_KEY};
use crate::observability::{Logger, Severity};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO",
            ConfigError::Parse(_) => "CONFIG_PARSE",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
        }
    }
}

/// Clause engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Primary key used when a model does not declare one (default: "id")
    #[serde(default = "default_primary_key")]
    pub default_primary_key: String,

    /// Maximum nesting of include scopes (default: 32)
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,

    /// Minimum log severity (default: "warn")
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

fn default_max_include_depth() -> usize {
    DEFAULT_MAX_INCLUDE_DEPTH
}

fn default_log_level() -> Severity {
    Severity::Warn
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_primary_key: default_primary_key(),
            max_include_depth: default_max_include_depth(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_primary_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_primary_key",
                message: "must not be empty".to_string(),
            });
        }
        if self.max_include_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_include_depth",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Empty model registry using the configured default primary key
    pub fn model_registry(&self) -> ModelRegistry {
        ModelRegistry::with_default_primary_key(self.default_primary_key.clone())
    }

    /// Install the configured log level process-wide
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}
