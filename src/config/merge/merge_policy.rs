//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources override earlier ones key by key: defaults, then the global
//! file (or the file given with `--config`), then the environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("scan.block_size", crate::tree::hasher::DEFAULT_BLOCK_SIZE as i64)?
        .set_default("scan.on_unreadable", "skip")?
        .set_default("logging.output", "stderr")
}
