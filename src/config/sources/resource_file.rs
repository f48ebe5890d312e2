//! Resource config file source: <resource>/resource.toml

use crate::config::{ResourceConfig, RESOURCE_CONFIG_FILE};
use crate::error::ApiError;
use config::Config;
use config::ConfigError;
use config::File;
use config::FileFormat;
use std::path::Path;

/// Read the resource configuration. The file must exist; nothing overrides it.
pub fn load(resource_dir: &Path) -> Result<ResourceConfig, ConfigError> {
    let path = resource_dir.join(RESOURCE_CONFIG_FILE);
    Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(true))
        .build()?
        .try_deserialize()
}

/// Write the resource configuration as TOML.
pub fn write(resource_dir: &Path, config: &ResourceConfig) -> Result<(), ApiError> {
    let contents = toml::to_string(config)
        .map_err(|e| ApiError::ConfigError(format!("Failed to encode resource config: {}", e)))?;
    std::fs::create_dir_all(resource_dir).map_err(|e| {
        ApiError::ConfigError(format!("Failed to create resource directory: {}", e))
    })?;
    std::fs::write(resource_dir.join(RESOURCE_CONFIG_FILE), contents)
        .map_err(|e| ApiError::ConfigError(format!("Failed to write resource config: {}", e)))
}
