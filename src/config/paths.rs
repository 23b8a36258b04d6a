//! XDG path resolution for the configuration home and the registry.

use super::APP_NAME;
use crate::error::ApiError;
use std::path::PathBuf;

/// `$XDG_CONFIG_HOME` when set to an absolute path, otherwise the platform
/// config directory.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        let dir = PathBuf::from(dir);
        if dir.is_absolute() {
            return Ok(dir);
        }
    }
    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Cannot determine the configuration directory: neither XDG_CONFIG_HOME nor HOME is set"
                    .to_string(),
            )
        })
}

/// `<config home>/treedb`
pub fn app_config_dir() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_NAME))
}

/// `<config home>/treedb/repositories`
pub fn default_registry_root() -> Result<PathBuf, ApiError> {
    Ok(app_config_dir()?.join("repositories"))
}
