//! Configuration System
//!
//! Process-level configuration (defaults for new resources, logging) merged
//! from defaults, the global config file, an explicit file and `TREEHASH_*`
//! environment variables. Per-resource configuration is resolved once when a
//! resource is created and stored next to it; it never changes afterwards.

use crate::hash::HashKind;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Name of the per-resource configuration file
pub const RESOURCE_CONFIG_FILE: &str = "resource.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreehashConfig {
    /// Defaults applied to resources created by this process
    #[serde(default)]
    pub resource: ResourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resource configuration, immutable once the resource exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Digest strategy
    #[serde(default)]
    pub hash_kind: HashKind,
}

impl ResourceConfig {
    pub fn new(hash_kind: HashKind) -> Self {
        Self { hash_kind }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["json", "text"];
const LOG_OUTPUTS: &[&str] = &["stdout", "stderr", "file", "both"];

impl TreehashConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let logging = &self.logging;

        if !LOG_LEVELS.contains(&logging.level.as_str()) {
            errors.push(ValidationError::Logging(format!(
                "Invalid level '{}'",
                logging.level
            )));
        }
        if !LOG_FORMATS.contains(&logging.format.as_str()) {
            errors.push(ValidationError::Logging(format!(
                "Invalid format '{}'",
                logging.format
            )));
        }
        if !LOG_OUTPUTS.contains(&logging.output.as_str()) {
            errors.push(ValidationError::Logging(format!(
                "Invalid output '{}'",
                logging.output
            )));
        }
        for (module, level) in &logging.modules {
            if !LOG_LEVELS.contains(&level.as_str()) {
                errors.push(ValidationError::Logging(format!(
                    "Invalid level '{}' for module '{}'",
                    level, module
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
