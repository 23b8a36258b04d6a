//! Error types for the treedb reconciliation system.

use std::path::PathBuf;
use thiserror::Error;

/// Which of the two merged sources an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Filesystem,
    Database,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Filesystem => write!(f, "filesystem"),
            Source::Database => write!(f, "database"),
        }
    }
}

/// Errors raised while reading, walking, comparing or writing records
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Malformed database line {line}: {reason} ({content:?})")]
    MalformedLine {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Unreadable file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{side} records out of path order: {previous:?} is followed by {current:?}")]
    OrderViolation {
        side: Source,
        previous: String,
        current: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    /// Per-entry errors that a pass may skip instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StorageError::UnreadableFile { .. })
    }
}

/// Command-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Repository '{repo}' has no copy named '{copy}'")]
    CopyNotFound { repo: String, copy: String },

    #[error("Repository '{repo}' already has a copy named '{copy}'. Use --force to replace it.")]
    CopyExists { repo: String, copy: String },

    #[error("Invalid name '{0}': use a plain name without '/' or a leading '.'")]
    InvalidName(String),

    #[error("No repository has {0} among its copies. Run `treedb init` first.")]
    NoRepositoryForPath(PathBuf),

    #[error("Database file {0} already exists. Use --force to recreate it.")]
    DatabaseExists(PathBuf),

    #[error("Database {0} is empty and so is the tree; check the repository setup.")]
    EmptyDatabase(PathBuf),

    #[error("{0} is not the master copy; only the master can update the database.")]
    NotMaster(PathBuf),

    #[error("Status files are missing in {0}. Run `treedb status` first.")]
    StatusMissing(PathBuf),

    #[error("Stale classification for {path}: {reason}")]
    StaleClassification { path: String, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Review failed: {0}")]
    ReviewFailed(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
