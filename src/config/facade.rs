//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::sources::resource_file;
use super::{ResourceConfig, TreehashConfig};
use crate::error::ApiError;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, the global file and environment.
    pub fn load() -> Result<TreehashConfig, ConfigError> {
        MergeService::load(None)
    }

    /// Load configuration with an explicit file layered above the global one.
    pub fn load_from_file(path: &Path) -> Result<TreehashConfig, ConfigError> {
        MergeService::load(Some(path))
    }

    /// Create default configuration.
    pub fn default() -> TreehashConfig {
        TreehashConfig::default()
    }

    /// Read the configuration stored with a resource.
    pub fn load_resource(resource_dir: &Path) -> Result<ResourceConfig, ConfigError> {
        resource_file::load(resource_dir)
    }

    /// Store the configuration of a newly created resource.
    pub fn write_resource(resource_dir: &Path, config: &ResourceConfig) -> Result<(), ApiError> {
        resource_file::write(resource_dir, config)
    }
}
