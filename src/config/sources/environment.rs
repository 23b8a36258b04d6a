//! Environment source: `TREEDB__SECTION__KEY=value`, e.g. `TREEDB__SCAN__BLOCK_SIZE=65536`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TREEDB";

/// Add the environment source to builder. It overrides every file source.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    ))
}
