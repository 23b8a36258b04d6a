//! Shared test utilities for integration tests
//!
//! Provides XDG environment isolation and small tree-building helpers.

use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use treedb::config::{RegistryConfig, TreedbConfig};
use treedb::database::Database;

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    home: Option<String>,
    xdg_config_home: Option<String>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            home: std::env::var("HOME").ok(),
            xdg_config_home: std::env::var("XDG_CONFIG_HOME").ok(),
        }
    }

    fn restore(self) {
        if let Some(orig) = self.home {
            std::env::set_var("HOME", orig);
        } else {
            std::env::remove_var("HOME");
        }

        if let Some(orig) = self.xdg_config_home {
            std::env::set_var("XDG_CONFIG_HOME", orig);
        } else {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }
}

/// Run `f` with XDG_CONFIG_HOME and HOME pointing into `test_dir`.
///
/// Serialized with a global mutex; the original environment is restored
/// afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().to_str().unwrap());

    let result = f();

    env_state.restore();

    result
}

/// Write `content` at `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Database file at `path` holding exactly `content`.
pub fn database_with(path: &Path, content: &str) -> Database {
    std::fs::write(path, content).unwrap();
    Database::new(path.to_path_buf())
}

/// Default configuration with the registry below `root`.
pub fn config_with_registry(root: &Path) -> TreedbConfig {
    TreedbConfig {
        registry: RegistryConfig {
            root: Some(root.to_path_buf()),
        },
        ..TreedbConfig::default()
    }
}
