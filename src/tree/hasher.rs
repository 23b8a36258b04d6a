//! Content checksums for files using MD5
//!
//! The database format stores an `md5sum` per file. Files are hashed by
//! streaming fixed-size blocks so that large trees never load a whole file
//! into memory.

use crate::error::StorageError;
use crate::tree::path;
use crate::types::Checksum;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Default read block size.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Compute the checksum of in-memory content
pub fn compute_content_checksum(content: &[u8]) -> Checksum {
    Checksum::from(md5::compute(content))
}

/// Compute the checksum of a file by streaming `block_size` reads.
///
/// Any failure to open or read is reported as `UnreadableFile`: the file may
/// have vanished since it was listed.
pub fn compute_file_checksum(file_path: &Path, block_size: usize) -> Result<Checksum, StorageError> {
    let mut file = File::open(file_path).map_err(|e| StorageError::unreadable(file_path, e))?;
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; block_size.max(1)];

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(StorageError::unreadable(file_path, e)),
        };
        context.consume(&buffer[..read]);
    }

    Ok(Checksum::from(context.compute()))
}

/// Source of checksums for record paths, used when a pass ran without
/// checksums and a later stage needs them.
pub trait ChecksumProvider {
    fn checksum(&self, relative_path: &str) -> Result<Checksum, StorageError>;
}

impl<F> ChecksumProvider for F
where
    F: Fn(&str) -> Result<Checksum, StorageError>,
{
    fn checksum(&self, relative_path: &str) -> Result<Checksum, StorageError> {
        self(relative_path)
    }
}

/// Hashes files below a tree root on demand.
#[derive(Debug, Clone)]
pub struct TreeHasher {
    root: PathBuf,
    block_size: usize,
}

impl TreeHasher {
    pub fn new(root: PathBuf, block_size: usize) -> Self {
        Self { root, block_size }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChecksumProvider for TreeHasher {
    fn checksum(&self, relative_path: &str) -> Result<Checksum, StorageError> {
        let file_path = path::to_native(&self.root, relative_path);
        tracing::debug!(path = relative_path, "Computing checksum on demand");
        compute_file_checksum(&file_path, self.block_size)
    }
}
