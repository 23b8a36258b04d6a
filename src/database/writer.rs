//! Database rewrite: classification output in, new snapshot out.
//!
//! [`rewrite`] turns a classified pass into the records of the next database
//! according to a [`RewritePolicy`]; [`DatabaseWriter::persist`] writes them
//! to a temporary file next to the database and renames it into place.

use crate::database::codec;
use crate::error::StorageError;
use crate::tree::hasher::ChecksumProvider;
use crate::tree::path::path_order;
use crate::types::{ClassifiedEntry, OnUnreadable, Record, State};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// What happens to entries of one state during a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteAction {
    /// Keep the database record verbatim.
    KeepDatabase,
    /// Take the filesystem attributes, computing the checksum if the pass skipped it.
    TakeFilesystem,
    /// Leave the entry out of the new snapshot.
    Drop,
}

/// Per-state rewrite actions.
#[derive(Debug, Clone)]
pub struct RewritePolicy {
    pub ok: RewriteAction,
    pub different: RewriteAction,
    pub missing_on_db: RewriteAction,
    pub missing_in_fs: RewriteAction,
    pub moved: RewriteAction,
    pub on_unreadable: OnUnreadable,
}

impl Default for RewritePolicy {
    fn default() -> Self {
        Self {
            ok: RewriteAction::KeepDatabase,
            different: RewriteAction::TakeFilesystem,
            missing_on_db: RewriteAction::TakeFilesystem,
            missing_in_fs: RewriteAction::Drop,
            moved: RewriteAction::TakeFilesystem,
            on_unreadable: OnUnreadable::Skip,
        }
    }
}

impl RewritePolicy {
    pub fn action(&self, state: State) -> RewriteAction {
        match state {
            State::Ok => self.ok,
            State::Different => self.different,
            State::MissingOnDb => self.missing_on_db,
            State::MissingInFs => self.missing_in_fs,
            State::Moved => self.moved,
        }
    }
}

/// Counts reported after an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub untouched: usize,
    pub removed: usize,
    pub updated: usize,
    pub added: usize,
    pub moved: usize,
}

impl RewriteSummary {
    fn count(&mut self, state: State, kept: bool) {
        match (state, kept) {
            (State::Ok, true) => self.untouched += 1,
            (State::Different, true) => self.updated += 1,
            (State::MissingOnDb, true) => self.added += 1,
            (State::Moved, true) => self.moved += 1,
            _ => self.removed += 1,
        }
    }
}

/// Next database snapshot, sorted by path order.
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub records: Vec<Record>,
    pub summary: RewriteSummary,
}

/// Apply `policy` to classified entries.
///
/// Checksums missing from filesystem records are computed through
/// `checksums`; files that vanished meanwhile follow `policy.on_unreadable`.
pub fn rewrite<I, P>(entries: I, policy: &RewritePolicy, checksums: &P) -> Result<Rewrite, StorageError>
where
    I: IntoIterator<Item = Result<ClassifiedEntry, StorageError>>,
    P: ChecksumProvider + ?Sized,
{
    let mut records = Vec::new();
    let mut summary = RewriteSummary::default();

    for entry in entries {
        let entry = entry?;
        let state = entry.state;
        let record = match policy.action(state) {
            RewriteAction::Drop => None,
            RewriteAction::KeepDatabase => entry.db_record.or(entry.fs_record),
            RewriteAction::TakeFilesystem => match entry.fs_record {
                Some(record) => with_checksum(record, checksums, policy.on_unreadable)?,
                None => entry.db_record,
            },
        };

        match record {
            Some(record) => {
                debug!(path = %record.path, state = %state, "Keeping record");
                summary.count(state, true);
                records.push(record.without_provenance());
            }
            None => {
                debug!(state = %state, "Dropping record");
                summary.count(state, false);
            }
        }
    }

    records.sort_by(|a, b| path_order(&a.path, &b.path));
    Ok(Rewrite { records, summary })
}

fn with_checksum<P>(
    mut record: Record,
    checksums: &P,
    on_unreadable: OnUnreadable,
) -> Result<Option<Record>, StorageError>
where
    P: ChecksumProvider + ?Sized,
{
    if record.checksum.is_some() {
        return Ok(Some(record));
    }
    match checksums.checksum(&record.path) {
        Ok(checksum) => {
            record.checksum = Some(checksum);
            Ok(Some(record))
        }
        Err(e) if e.is_recoverable() && on_unreadable == OnUnreadable::Skip => {
            warn!(path = %record.path, error = %e, "Leaving unreadable file out of the database");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Atomic writer for one database file.
#[derive(Debug, Clone)]
pub struct DatabaseWriter {
    path: PathBuf,
}

impl DatabaseWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `records` to a temporary file in the database directory and
    /// rename it over the database. On error the temporary file is removed
    /// and the previous database is untouched.
    pub fn persist(&self, records: &[Record]) -> Result<usize, StorageError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

        let temp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
        let mut writer = BufWriter::new(temp);
        let count = codec::write_records(&mut writer, records)?;
        let temp = writer
            .into_inner()
            .map_err(|e| StorageError::io(&self.path, e.into_error()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(&self.path, e))?;
        temp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;

        info!(database = %self.path.display(), records = count, "Database written");
        Ok(count)
    }
}
