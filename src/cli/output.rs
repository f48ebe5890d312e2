//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ConfigError(msg) if msg.contains(crate::config::RESOURCE_CONFIG_FILE) => {
            format!("Not a treehash resource: {}", msg)
        }
        _ => e.to_string(),
    }
}
