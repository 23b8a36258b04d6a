//! Repository registry
//!
//! Layout below the registry root:
//!
//! ```text
//! <root>/<repo>/db.txt         database
//! <root>/<repo>/copies.toml    [copies] master = "/abs/path", backup = "/mnt/usb/photos"
//! <root>/<repo>/<copy>/        status files of one copy
//! ```

use crate::database::Database;
use crate::error::{ApiError, StorageError};
use crate::tree::path::canonicalize_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DATABASE_FILE: &str = "db.txt";
pub const COPIES_FILE: &str = "copies.toml";
/// Copy name of the directory that owns the database.
pub const MASTER: &str = "master";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CopiesFile {
    #[serde(default)]
    copies: BTreeMap<String, PathBuf>,
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let reserved = name == DATABASE_FILE || name == COPIES_FILE;
    if name.is_empty() || name.starts_with('.') || name.contains('/') || name.contains('\\') || reserved {
        return Err(ApiError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A registered repository: one database and its copies.
#[derive(Debug, Clone)]
pub struct Repository {
    name: String,
    dir: PathBuf,
    copies: BTreeMap<String, PathBuf>,
}

impl Repository {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry directory of this repository.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.join(DATABASE_FILE)
    }

    pub fn database(&self) -> Database {
        Database::new(self.database_path())
    }

    pub fn copies(&self) -> &BTreeMap<String, PathBuf> {
        &self.copies
    }

    pub fn copy_path(&self, copy: &str) -> Result<&Path, ApiError> {
        self.copies
            .get(copy)
            .map(PathBuf::as_path)
            .ok_or_else(|| ApiError::CopyNotFound {
                repo: self.name.clone(),
                copy: copy.to_string(),
            })
    }

    pub fn master_path(&self) -> Result<&Path, ApiError> {
        self.copy_path(MASTER)
    }

    /// Directory holding the status files of `copy`.
    pub fn status_dir(&self, copy: &str) -> PathBuf {
        self.dir.join(copy)
    }

    /// Name of the copy registered at `dir`, which must be canonical.
    pub fn copy_for_path(&self, dir: &Path) -> Option<&str> {
        self.copies
            .iter()
            .find(|(_, path)| path.as_path() == dir)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_master(&self, dir: &Path) -> bool {
        self.copy_for_path(dir) == Some(MASTER)
    }

    fn save_copies(&self) -> Result<(), ApiError> {
        let file = CopiesFile {
            copies: self.copies.clone(),
        };
        let content = toml::to_string_pretty(&file)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize copies: {}", e)))?;
        let path = self.dir.join(COPIES_FILE);
        std::fs::write(&path, content).map_err(|e| StorageError::io(&path, e))?;
        Ok(())
    }
}

/// Registry of repositories below one root directory.
#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repo_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Register `master_dir` as the master copy of `name`.
    ///
    /// Fails with `DatabaseExists` when the repository already has a database
    /// and `force` is not set. The database itself is written by the caller.
    pub fn create(&self, name: &str, master_dir: &Path, force: bool) -> Result<Repository, ApiError> {
        validate_name(name)?;
        let master_dir = canonicalize_path(master_dir)?;
        let dir = self.repo_dir(name);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let database_path = dir.join(DATABASE_FILE);
        if database_path.exists() && !force {
            return Err(ApiError::DatabaseExists(database_path));
        }

        let mut copies = if dir.join(COPIES_FILE).exists() {
            warn!(repository = name, "Copies file already exists, updating it");
            self.read_copies(&dir)?
        } else {
            BTreeMap::new()
        };
        copies.insert(MASTER.to_string(), master_dir);

        let repository = Repository {
            name: name.to_string(),
            dir,
            copies,
        };
        repository.save_copies()?;
        let status_dir = repository.status_dir(MASTER);
        std::fs::create_dir_all(&status_dir).map_err(|e| StorageError::io(&status_dir, e))?;

        info!(repository = name, "Repository registered");
        Ok(repository)
    }

    /// Register `dir` as copy `copy` of an existing repository.
    pub fn add_copy(&self, repo: &str, copy: &str, dir: &Path, force: bool) -> Result<Repository, ApiError> {
        validate_name(copy)?;
        if copy == MASTER {
            return Err(ApiError::InvalidName(copy.to_string()));
        }
        let dir = canonicalize_path(dir)?;
        let mut repository = self.open(repo)?;
        if !repository.database().exists() {
            return Err(ApiError::RepositoryNotFound(format!(
                "{} (database {} is missing)",
                repo,
                repository.database_path().display()
            )));
        }

        if repository.copies.contains_key(copy) && !force {
            return Err(ApiError::CopyExists {
                repo: repo.to_string(),
                copy: copy.to_string(),
            });
        }
        if let Some(existing) = repository.copy_for_path(&dir) {
            if existing != copy {
                if !force {
                    return Err(ApiError::CopyExists {
                        repo: repo.to_string(),
                        copy: existing.to_string(),
                    });
                }
                warn!(repository = repo, copy = existing, "Directory already registered under another name");
            }
        }

        repository.copies.insert(copy.to_string(), dir);
        repository.save_copies()?;
        let status_dir = repository.status_dir(copy);
        std::fs::create_dir_all(&status_dir).map_err(|e| StorageError::io(&status_dir, e))?;

        info!(repository = repo, copy, "Copy registered");
        Ok(repository)
    }

    fn read_copies(&self, dir: &Path) -> Result<BTreeMap<String, PathBuf>, ApiError> {
        let path = dir.join(COPIES_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| StorageError::io(&path, e))?;
        let file: CopiesFile = toml::from_str(&content).map_err(|e| {
            ApiError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(file.copies)
    }

    pub fn open(&self, name: &str) -> Result<Repository, ApiError> {
        validate_name(name)?;
        let dir = self.repo_dir(name);
        if !dir.join(COPIES_FILE).is_file() {
            return Err(ApiError::RepositoryNotFound(name.to_string()));
        }
        let copies = self.read_copies(&dir)?;
        Ok(Repository {
            name: name.to_string(),
            dir,
            copies,
        })
    }

    /// Names of all registered repositories, sorted.
    pub fn list(&self) -> Result<Vec<String>, ApiError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| StorageError::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.root, e))?;
            let path = entry.path();
            if !path.join(COPIES_FILE).is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(name = ?name, "Skipping repository with non UTF-8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Find the repository and copy name registered at `dir`.
    pub fn find_by_path(&self, dir: &Path) -> Result<(Repository, String), ApiError> {
        let dir = canonicalize_path(dir)?;
        for name in self.list()? {
            let repository = match self.open(&name) {
                Ok(repository) => repository,
                Err(e) => {
                    warn!(repository = %name, error = %e, "Skipping unreadable repository");
                    continue;
                }
            };
            if let Some(copy) = repository.copy_for_path(&dir) {
                let copy = copy.to_string();
                return Ok((repository, copy));
            }
        }
        Err(ApiError::NoRepositoryForPath(dir))
    }

    pub fn resolve_database_path(&self, repo: &str) -> Result<PathBuf, ApiError> {
        Ok(self.open(repo)?.database_path())
    }

    pub fn resolve_copy_path(&self, repo: &str, copy: &str) -> Result<PathBuf, ApiError> {
        Ok(self.open(repo)?.copy_path(copy)?.to_path_buf())
    }

    pub fn is_master(&self, repo: &str, path: &Path) -> Result<bool, ApiError> {
        let path = canonicalize_path(path)?;
        Ok(self.open(repo)?.is_master(&path))
    }
}
