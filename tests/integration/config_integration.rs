//! Configuration loading: global file under XDG_CONFIG_HOME, explicit file, environment.

use std::fs;
use tempfile::TempDir;
use treedb::config::{ConfigLoader, TreedbConfig};
use treedb::error::ApiError;
use treedb::types::{OnUnreadable, State};
use treedb::workspace::WorkspaceContext;

use crate::integration::with_xdg_env;

fn write_global_config(test_dir: &TempDir, content: &str) {
    let dir = test_dir.path().join("treedb");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

#[test]
fn test_defaults_without_config_file() {
    let test_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&test_dir, || ConfigLoader::load().unwrap());
    assert_eq!(config.scan.ignore, vec![".git", "Other", "tmp", "VIDEO"]);
    assert_eq!(config.scan.on_unreadable, OnUnreadable::Skip);
    assert_eq!(config.logging.output, "stderr");
    assert!(config.registry.root.is_none());
}

#[test]
fn test_global_config_file() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(
        &test_dir,
        r#"
[scan]
ignore = ["cache"]
on_unreadable = "abort"

[status]
new = "added.txt"

[treat]
file_browser = "nemo"
"#,
    );

    let config = with_xdg_env(&test_dir, || {
        assert_eq!(
            ConfigLoader::xdg_config_path().unwrap(),
            test_dir.path().join("treedb").join("config.toml")
        );
        ConfigLoader::load_validated(None).unwrap()
    });
    assert_eq!(config.scan.ignore, vec!["cache"]);
    assert_eq!(config.scan.on_unreadable, OnUnreadable::Abort);
    assert_eq!(config.status.file_name(State::MissingOnDb), "added.txt");
    assert_eq!(config.status.file_name(State::Ok), "good.txt");
    assert_eq!(config.treat.file_browser.as_deref(), Some("nemo"));
}

#[test]
fn test_environment_overrides_file() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[scan]\nblock_size = 1024\n");

    let config = with_xdg_env(&test_dir, || {
        std::env::set_var("TREEDB__SCAN__BLOCK_SIZE", "65536");
        let config = ConfigLoader::load();
        std::env::remove_var("TREEDB__SCAN__BLOCK_SIZE");
        config.unwrap()
    });
    assert_eq!(config.scan.block_size, 65536);
}

#[test]
fn test_explicit_file_replaces_global_file() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[scan]\nblock_size = 1024\n");
    let explicit = test_dir.path().join("other.toml");
    fs::write(&explicit, "[scan]\nignore = [\"build\"]\n").unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load_validated(Some(&explicit)).unwrap());
    assert_eq!(config.scan.ignore, vec!["build"]);
    assert_eq!(config.scan.block_size, 4096);
}

#[test]
fn test_invalid_config_is_rejected() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[scan]\nblock_size = 0\n\n[status]\nnew = \"good.txt\"\n");

    let err = with_xdg_env(&test_dir, || ConfigLoader::load_validated(None).unwrap_err());
    match err {
        ApiError::ConfigError(msg) => {
            assert!(msg.contains("block_size"));
            assert!(msg.contains("used twice"));
        }
        other => panic!("unexpected error: {}", other),
    }

    let missing = test_dir.path().join("missing.toml");
    assert!(with_xdg_env(&test_dir, || ConfigLoader::load_validated(Some(&missing))).is_err());
}

#[test]
fn test_default_registry_root_follows_xdg() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    fs::create_dir_all(&workspace).unwrap();

    let ctx = with_xdg_env(&test_dir, || {
        WorkspaceContext::new(&workspace, TreedbConfig::default()).unwrap()
    });
    assert_eq!(
        ctx.registry().root(),
        test_dir.path().join("treedb").join("repositories")
    );
}
