//! Flat-text database of file records
//!
//! One database file per repository. Reading is streaming; writing goes
//! through [`writer::DatabaseWriter`] only.

use crate::error::StorageError;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub mod codec;
pub mod writer;

pub use codec::RecordReader;
pub use writer::{rewrite, DatabaseWriter, Rewrite, RewriteAction, RewritePolicy, RewriteSummary};

/// Handle to a database file.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Stream the records in file order.
    pub fn records(&self) -> Result<RecordReader<BufReader<File>>, StorageError> {
        RecordReader::open(&self.path)
    }

    /// Number of records, for progress reporting.
    pub fn len(&self) -> Result<usize, StorageError> {
        codec::length(&self.path)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// All recorded paths, as an immutable set for verification.
    pub fn paths(&self) -> Result<BTreeSet<String>, StorageError> {
        self.records()?
            .map(|record| record.map(|r| r.path))
            .collect()
    }

    pub fn writer(&self) -> DatabaseWriter {
        DatabaseWriter::new(self.path.clone())
    }
}
