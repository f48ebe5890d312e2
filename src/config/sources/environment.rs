//! Environment variable source: TREEHASH_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses the TREEHASH prefix and __ as separator for prefix and nested keys,
/// e.g. TREEHASH__RESOURCE__HASH_KIND=postorder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("TREEHASH")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
