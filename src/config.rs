//! Configuration System
//!
//! Layered configuration: built-in defaults, then the global file
//! (`$XDG_CONFIG_HOME/treedb/config.toml`), then `TREEDB__SECTION__KEY`
//! environment variables. The loaded value is immutable and handed to the
//! walker, the writer and the orchestrator.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::tree::hasher::DEFAULT_BLOCK_SIZE;
use crate::tree::walker::{WalkerConfig, DEFAULT_IGNORE};
use crate::types::{OnUnreadable, State};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;

/// XDG path helpers
pub mod xdg {
    pub use super::paths::*;
}

/// Name of the per-user configuration directory.
pub const APP_NAME: &str = "treedb";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreedbConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub treat: TreatConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where repositories are registered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Defaults to `$XDG_CONFIG_HOME/treedb/repositories`
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl RegistryConfig {
    pub fn resolve_root(&self) -> Result<PathBuf, ApiError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => paths::default_registry_root(),
        }
    }
}

/// Filesystem walk settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory names pruned at any depth
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Read size used when hashing files
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default)]
    pub on_unreadable: OnUnreadable,
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            block_size: default_block_size(),
            on_unreadable: OnUnreadable::default(),
        }
    }
}

impl ScanConfig {
    pub fn walker_config(&self, compute_checksum: bool) -> WalkerConfig {
        WalkerConfig {
            ignore_names: self.ignore.clone(),
            compute_checksum,
            block_size: self.block_size,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.block_size == 0 {
            return Err("block_size must be greater than zero".to_string());
        }
        for name in &self.ignore {
            if name.is_empty() || name.contains('/') {
                return Err(format!("Invalid ignore entry '{}': must be a plain directory name", name));
            }
        }
        Ok(())
    }
}

/// Status file names, one per state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_good_file")]
    pub good: String,
    #[serde(default = "default_different_file")]
    pub different: String,
    #[serde(default = "default_new_file")]
    pub new: String,
    #[serde(default = "default_missing_file")]
    pub missing: String,
    #[serde(default = "default_moved_file")]
    pub moved: String,
}

fn default_good_file() -> String {
    "good.txt".to_string()
}

fn default_different_file() -> String {
    "different.txt".to_string()
}

fn default_new_file() -> String {
    "new.txt".to_string()
}

fn default_missing_file() -> String {
    "missing.txt".to_string()
}

fn default_moved_file() -> String {
    "moved.txt".to_string()
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            good: default_good_file(),
            different: default_different_file(),
            new: default_new_file(),
            missing: default_missing_file(),
            moved: default_moved_file(),
        }
    }
}

impl StatusConfig {
    pub fn file_name(&self, state: State) -> &str {
        match state {
            State::Ok => &self.good,
            State::Different => &self.different,
            State::MissingOnDb => &self.new,
            State::MissingInFs => &self.missing,
            State::Moved => &self.moved,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for state in State::ALL {
            let name = self.file_name(state);
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(format!("Invalid status file name '{}' for {}", name, state));
            }
            if !seen.insert(name) {
                return Err(format!("Status file name '{}' is used twice", name));
            }
        }
        Ok(())
    }
}

/// Review settings for `treat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreatConfig {
    /// Program started on the staging directory, e.g. `nemo` or `xdg-open`
    #[serde(default)]
    pub file_browser: Option<String>,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Scan(String),
    Status(String),
    Treat(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Scan(msg) => write!(f, "Scan: {}", msg),
            ValidationError::Status(msg) => write!(f, "Status: {}", msg),
            ValidationError::Treat(msg) => write!(f, "Treat: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TreedbConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.scan.validate() {
            errors.push(ValidationError::Scan(e));
        }
        if let Err(e) = self.status.validate() {
            errors.push(ValidationError::Status(e));
        }
        if let Some(browser) = &self.treat.file_browser {
            if browser.trim().is_empty() {
                errors.push(ValidationError::Treat("file_browser cannot be empty".to_string()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TreedbConfig::default();
        assert_eq!(config.scan.ignore, vec![".git", "Other", "tmp", "VIDEO"]);
        assert_eq!(config.scan.block_size, 4096);
        assert_eq!(config.scan.on_unreadable, OnUnreadable::Skip);
        assert_eq!(config.status.file_name(State::MissingOnDb), "new.txt");
        assert!(config.treat.file_browser.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TreedbConfig::default();
        config.scan.block_size = 0;
        config.status.moved = "good.txt".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let mut config = TreedbConfig::default();
        config.scan.ignore.push("a/b".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_walker_config_from_scan() {
        let scan = ScanConfig {
            ignore: vec!["cache".to_string()],
            block_size: 512,
            on_unreadable: OnUnreadable::Abort,
        };
        let walker = scan.walker_config(false);
        assert_eq!(walker.ignore_names, vec!["cache"]);
        assert_eq!(walker.block_size, 512);
        assert!(!walker.compute_checksum);
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("test_config.toml");

        std::fs::write(
            &config_file,
            r#"
[registry]
root = "/srv/treedb"

[scan]
ignore = [".git", "node_modules"]
block_size = 65536
on_unreadable = "abort"

[status]
new = "added.txt"

[treat]
file_browser = "nemo"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&config_file).unwrap();
        assert_eq!(config.registry.root, Some(PathBuf::from("/srv/treedb")));
        assert_eq!(config.scan.ignore, vec![".git", "node_modules"]);
        assert_eq!(config.scan.block_size, 65536);
        assert_eq!(config.scan.on_unreadable, OnUnreadable::Abort);
        assert_eq!(config.status.new, "added.txt");
        assert_eq!(config.status.good, "good.txt");
        assert_eq!(config.treat.file_browser.as_deref(), Some("nemo"));
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ConfigLoader::load_from_file(&temp_dir.path().join("nope.toml")).is_err());
    }
}
