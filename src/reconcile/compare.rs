//! Merge-compare engine
//!
//! Walks the filesystem stream and the database stream in lock-step. Both
//! are sorted by path order, so the earlier of the two current paths is
//! known to be missing from the other side.

use crate::error::{Source, StorageError};
use crate::tree::path::path_order;
use crate::tree::walker::WalkEvent;
use crate::types::{ClassifiedEntry, DiffKey, Record};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::trace;

/// One side of the merge with its ordering assertion.
struct Cursor<I> {
    source: Source,
    inner: I,
    head: Option<Record>,
    exhausted: bool,
    previous: Option<String>,
}

impl<I> Cursor<I> {
    fn new(source: Source, inner: I) -> Self {
        Self {
            source,
            inner,
            head: None,
            exhausted: false,
            previous: None,
        }
    }

    fn check_order(&mut self, record: &Record) -> Result<(), StorageError> {
        if let Some(previous) = &self.previous {
            if path_order(previous, &record.path) != Ordering::Less {
                return Err(StorageError::OrderViolation {
                    side: self.source,
                    previous: previous.clone(),
                    current: record.path.clone(),
                });
            }
        }
        self.previous = Some(record.path.clone());
        Ok(())
    }

    fn accept(&mut self, pulled: Option<Record>) -> Result<(), StorageError> {
        match pulled {
            Some(record) => {
                self.check_order(&record)?;
                self.head = Some(record);
            }
            None => self.exhausted = true,
        }
        Ok(())
    }
}

impl<I> Cursor<I>
where
    I: Iterator<Item = Result<WalkEvent, StorageError>>,
{
    /// Make sure `head` holds the next file record, skipping directory markers.
    fn fill_fs(&mut self) -> Result<(), StorageError> {
        if self.head.is_some() || self.exhausted {
            return Ok(());
        }
        let pulled = loop {
            match self.inner.next().transpose()? {
                Some(WalkEvent::EndOfDirectory) => continue,
                Some(WalkEvent::Entry(record)) => break Some(record),
                None => break None,
            }
        };
        self.accept(pulled)
    }
}

/// Merge-compare iterator returned by [`compare`].
///
/// Yields one entry per distinct path across both sources. The first error
/// ends the stream.
pub struct Compare<F, D> {
    fs: Cursor<F>,
    db: Cursor<D>,
    compute_checksum: bool,
    failed: bool,
}

/// Classify `fs` against `db`.
///
/// Checksums are compared only when `compute_checksum` is set; sizes are
/// always compared.
pub fn compare<F, D>(fs: F, db: D, compute_checksum: bool) -> Compare<F, D>
where
    F: Iterator<Item = Result<WalkEvent, StorageError>>,
    D: Iterator<Item = Result<Record, StorageError>>,
{
    Compare {
        fs: Cursor::new(Source::Filesystem, fs),
        db: Cursor::new(Source::Database, db),
        compute_checksum,
        failed: false,
    }
}

impl<F, D> Compare<F, D>
where
    F: Iterator<Item = Result<WalkEvent, StorageError>>,
    D: Iterator<Item = Result<Record, StorageError>>,
{
    fn fill_db(&mut self) -> Result<(), StorageError> {
        if self.db.head.is_some() || self.db.exhausted {
            return Ok(());
        }
        let pulled = self.db.inner.next().transpose()?;
        self.db.accept(pulled)
    }

    fn diff(&self, fs: &Record, db: &Record) -> BTreeSet<DiffKey> {
        let mut keys = BTreeSet::new();
        if self.compute_checksum && fs.checksum != db.checksum {
            keys.insert(DiffKey::Checksum);
        }
        if fs.size != db.size {
            keys.insert(DiffKey::Size);
        }
        keys
    }

    fn step(&mut self) -> Result<Option<ClassifiedEntry>, StorageError> {
        self.fs.fill_fs()?;
        self.fill_db()?;

        let entry = match (self.fs.head.take(), self.db.head.take()) {
            (None, None) => return Ok(None),
            (Some(fs), None) => ClassifiedEntry::missing_on_db(fs),
            (None, Some(db)) => ClassifiedEntry::missing_in_fs(db),
            (Some(fs), Some(db)) => match path_order(&fs.path, &db.path) {
                Ordering::Equal => {
                    let keys = self.diff(&fs, &db);
                    if keys.is_empty() {
                        ClassifiedEntry::ok(fs, db)
                    } else {
                        ClassifiedEntry::different(fs, db, keys)
                    }
                }
                Ordering::Less => {
                    self.db.head = Some(db);
                    ClassifiedEntry::missing_on_db(fs)
                }
                Ordering::Greater => {
                    self.fs.head = Some(fs);
                    ClassifiedEntry::missing_in_fs(db)
                }
            },
        };

        trace!(path = entry.path(), state = %entry.state, "Classified entry");
        Ok(Some(entry))
    }
}

impl<F, D> Iterator for Compare<F, D>
where
    F: Iterator<Item = Result<WalkEvent, StorageError>>,
    D: Iterator<Item = Result<Record, StorageError>>,
{
    type Item = Result<ClassifiedEntry, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
