//! Merge service: layers every source in precedence order.

use super::merge_policy;
use crate::config::sources::{environment, global_file};
use crate::config::TreehashConfig;
use config::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

pub struct MergeService;

impl MergeService {
    /// Precedence (lowest to highest): defaults, global file, explicit file, environment.
    pub fn load(explicit: Option<&Path>) -> Result<TreehashConfig, ConfigError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;

        if let Some(path) = explicit {
            debug!(config_path = %path.display(), "Adding explicit config file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }
}
