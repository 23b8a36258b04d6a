//! Single entry point for loading configuration.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file};
use super::TreedbConfig;
use crate::error::ApiError;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, the global file and the environment.
    pub fn load() -> Result<TreedbConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load configuration with `path` in place of the global file.
    ///
    /// The file must exist.
    pub fn load_from_file(path: &Path) -> Result<TreedbConfig, ConfigError> {
        let builder = builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load and validate, as the command line does.
    pub fn load_validated(explicit: Option<&Path>) -> Result<TreedbConfig, ApiError> {
        let config = match explicit {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
        .map_err(|e| ApiError::ConfigError(format!("Failed to load config: {}", e)))?;

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }

    /// Path of the global config file, if a config home can be determined.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
