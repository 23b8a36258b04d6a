//! Rename detection
//!
//! A file that disappeared from one path and appeared at another with the
//! same content is reported once, as `Moved`, at its new path.

use crate::error::StorageError;
use crate::tree::hasher::ChecksumProvider;
use crate::tree::path::path_order;
use crate::types::{Checksum, ClassifiedEntry, State};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Pair up new and missing entries with equal checksums.
///
/// `Ok` and `Different` entries pass through unchanged. New entries without a
/// checksum get one through `checksums`; if the file cannot be read the
/// entry stays new. Missing entries with no recorded checksum never match.
/// When several missing entries share a checksum, the first one in path
/// order is paired. The result is sorted by each entry's path.
pub fn detect_moves<I, P>(entries: I, checksums: &P) -> Result<Vec<ClassifiedEntry>, StorageError>
where
    I: IntoIterator<Item = Result<ClassifiedEntry, StorageError>>,
    P: ChecksumProvider + ?Sized,
{
    let mut output = Vec::new();
    let mut new_entries = Vec::new();
    let mut missing: Vec<Option<ClassifiedEntry>> = Vec::new();

    for entry in entries {
        let entry = entry?;
        match entry.state {
            State::MissingOnDb => new_entries.push(entry),
            State::MissingInFs => missing.push(Some(entry)),
            _ => output.push(entry),
        }
    }

    // Missing entries arrive in path order, so each bucket is too.
    let mut by_checksum: BTreeMap<Checksum, Vec<usize>> = BTreeMap::new();
    for (idx, entry) in missing.iter().enumerate() {
        let recorded = entry
            .as_ref()
            .and_then(|e| e.db_record.as_ref())
            .and_then(|r| r.checksum);
        if let Some(checksum) = recorded {
            by_checksum.entry(checksum).or_default().push(idx);
        }
    }

    for mut entry in new_entries {
        if by_checksum.is_empty() {
            output.push(entry);
            continue;
        }
        let Some(fs_record) = entry.fs_record.as_mut() else {
            output.push(entry);
            continue;
        };

        let checksum = match fs_record.checksum {
            Some(checksum) => checksum,
            None => match checksums.checksum(&fs_record.path) {
                Ok(checksum) => {
                    fs_record.checksum = Some(checksum);
                    checksum
                }
                Err(e) => {
                    warn!(path = %fs_record.path, error = %e, "Cannot hash new file; move detection skipped");
                    output.push(entry);
                    continue;
                }
            },
        };

        let Some(bucket) = by_checksum.get_mut(&checksum) else {
            output.push(entry);
            continue;
        };
        if bucket.len() > 1 {
            let candidates: Vec<&str> = bucket
                .iter()
                .filter_map(|idx| missing[*idx].as_ref().map(|e| e.path()))
                .collect();
            warn!(
                path = %fs_record.path,
                candidates = ?candidates,
                "Ambiguous move; pairing with the first candidate in path order"
            );
        }
        let idx = bucket.remove(0);
        if bucket.is_empty() {
            by_checksum.remove(&checksum);
        }

        match (entry.fs_record.take(), missing[idx].take().and_then(|m| m.db_record)) {
            (Some(fs), Some(db)) => {
                debug!(path = %fs.path, moved_from = %db.path, "Detected move");
                output.push(ClassifiedEntry::moved(fs, db));
            }
            (fs, _) => {
                entry.fs_record = fs;
                output.push(entry);
            }
        }
    }

    output.extend(missing.into_iter().flatten());
    output.sort_by(|a, b| path_order(a.path(), b.path()));
    Ok(output)
}
