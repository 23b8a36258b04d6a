//! Filesystem walker for traversing directory structures
//!
//! Yields one [`WalkEvent::Entry`] per regular file in path order, with a
//! [`WalkEvent::EndOfDirectory`] marker after the files of each directory.
//! The iterator ending (`None`) is the end of the stream.

use crate::database::codec;
use crate::error::StorageError;
use crate::tree::{hasher, path};
use crate::types::Record;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names pruned at any depth unless configured otherwise.
pub const DEFAULT_IGNORE: &[&str] = &[".git", "Other", "tmp", "VIDEO"];

/// Item produced by [`Walk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A regular file
    Entry(Record),
    /// All files of one directory have been yielded. Carries no data.
    EndOfDirectory,
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Directory names removed before descending (exact match)
    pub ignore_names: Vec<String>,
    /// Whether to hash file contents
    pub compute_checksum: bool,
    /// Read size used when hashing
    pub block_size: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            ignore_names: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            compute_checksum: true,
            block_size: hasher::DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a walker with default configuration
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        Self::with_config(root, WalkerConfig::default())
    }

    /// Create a walker with custom configuration
    ///
    /// Fails with `PathNotFound` when `root` is not an existing directory.
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Result<Self, StorageError> {
        if !root.is_dir() {
            return Err(StorageError::PathNotFound(root));
        }
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a lazy walk of the tree
    pub fn walk(&self) -> Walk {
        // Files before directories, each group sorted bytewise by name.
        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(files_first)
            .into_iter();

        Walk {
            root: self.root.clone(),
            config: self.config.clone(),
            inner,
            group_open: false,
            finished: false,
        }
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Lazy traversal returned by [`Walker::walk`]
pub struct Walk {
    root: PathBuf,
    config: WalkerConfig,
    inner: walkdir::IntoIter,
    /// Files of a directory are being yielded and its marker is still owed.
    group_open: bool,
    finished: bool,
}

impl Walk {
    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.config.ignore_names.iter().any(|ignored| *ignored == name)
    }

    fn file_record(&self, entry: &DirEntry) -> Result<Option<Record>, StorageError> {
        let full_path = entry.path();
        let Some(relative) = path::relative_path(&self.root, full_path) else {
            warn!(path = %full_path.display(), "Skipping file with non UTF-8 name");
            return Ok(None);
        };
        if !codec::is_representable(&relative) {
            warn!(path = %relative, "Skipping file whose name cannot be stored in the database");
            return Ok(None);
        }

        // Follows symlinks: a link to a file is recorded with the target's content.
        let metadata =
            std::fs::metadata(full_path).map_err(|e| StorageError::unreadable(full_path, e))?;
        if !metadata.is_file() {
            debug!(path = %relative, "Skipping non-regular file");
            return Ok(None);
        }

        let checksum = if self.config.compute_checksum {
            Some(hasher::compute_file_checksum(
                full_path,
                self.config.block_size,
            )?)
        } else {
            None
        };

        Ok(Some(Record::new(relative, checksum, metadata.len())))
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEvent, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let entry = match self.inner.next() {
                None => {
                    self.finished = true;
                    if std::mem::take(&mut self.group_open) {
                        return Some(Ok(WalkEvent::EndOfDirectory));
                    }
                    return None;
                }
                Some(Err(e)) => {
                    let failed = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let source = e.into_io_error().unwrap_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected")
                    });
                    return Some(Err(StorageError::unreadable(failed, source)));
                }
                Some(Ok(entry)) => entry,
            };

            if entry.depth() == 0 {
                self.group_open = true;
                continue;
            }

            if entry.file_type().is_dir() {
                if self.is_ignored(&entry) {
                    debug!(path = %entry.path().display(), "Pruning ignored directory");
                    self.inner.skip_current_dir();
                    continue;
                }
                // A new directory starts: the previous one has no files left.
                if std::mem::replace(&mut self.group_open, true) {
                    return Some(Ok(WalkEvent::EndOfDirectory));
                }
                continue;
            }

            match self.file_record(&entry) {
                Ok(Some(record)) => return Some(Ok(WalkEvent::Entry(record))),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl std::iter::FusedIterator for Walk {}
