//! Reconciliation of a tree against its database
//!
//! A pass drives the walker and the database reader through the
//! merge-compare engine, then optionally pairs renames and rewrites the
//! database.

use crate::config::ScanConfig;
use crate::database::{self, Database, RewritePolicy, RewriteSummary};
use crate::error::StorageError;
use crate::tree::hasher::TreeHasher;
use crate::tree::walker::{Walker, WalkEvent};
use crate::types::{ClassifiedEntry, OnUnreadable, State};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod compare;
pub mod moves;

pub use compare::{compare, Compare};
pub use moves::detect_moves;

const PROGRESS_INTERVAL: usize = 10_000;

/// Applies the unreadable-file policy to a walk.
pub struct SkipUnreadable<I> {
    inner: I,
    policy: OnUnreadable,
}

pub fn skip_unreadable<I>(inner: I, policy: OnUnreadable) -> SkipUnreadable<I> {
    SkipUnreadable { inner, policy }
}

impl<I> Iterator for SkipUnreadable<I>
where
    I: Iterator<Item = Result<WalkEvent, StorageError>>,
{
    type Item = Result<WalkEvent, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Err(e) if e.is_recoverable() && self.policy == OnUnreadable::Skip => {
                    warn!(error = %e, "Skipping unreadable file");
                }
                other => return Some(other),
            }
        }
    }
}

/// Logs progress against the expected number of records.
struct Progress<I> {
    inner: I,
    seen: usize,
    expected: usize,
}

impl<I: Iterator> Iterator for Progress<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.seen += 1;
        if self.seen % PROGRESS_INTERVAL == 0 {
            info!(processed = self.seen, database_records = self.expected, "Reconciliation progress");
        }
        Some(item)
    }
}

/// Number of entries per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateCounts(BTreeMap<State, usize>);

impl StateCounts {
    pub fn from_entries(entries: &[ClassifiedEntry]) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            counts.add(entry.state);
        }
        counts
    }

    pub fn add(&mut self, state: State) {
        *self.0.entry(state).or_insert(0) += 1;
    }

    pub fn get(&self, state: State) -> usize {
        self.0.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

/// Classified entries of one pass, sorted by path order.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub entries: Vec<ClassifiedEntry>,
    pub counts: StateCounts,
}

impl Classification {
    pub fn new(entries: Vec<ClassifiedEntry>) -> Self {
        let counts = StateCounts::from_entries(&entries);
        Self { entries, counts }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn of_state(&self, state: State) -> impl Iterator<Item = &ClassifiedEntry> {
        self.entries.iter().filter(move |e| e.state == state)
    }
}

/// One tree root paired with one database.
#[derive(Debug, Clone)]
pub struct Reconciler {
    root: PathBuf,
    database: Database,
    scan: ScanConfig,
}

impl Reconciler {
    pub fn new(root: PathBuf, database: Database, scan: ScanConfig) -> Self {
        Self {
            root,
            database,
            scan,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// On-demand hashing for entries classified without checksums.
    pub fn hasher(&self) -> TreeHasher {
        TreeHasher::new(self.root.clone(), self.scan.block_size)
    }

    /// Lazy classification stream, without rename detection.
    pub fn entries(
        &self,
        compute_checksum: bool,
    ) -> Result<impl Iterator<Item = Result<ClassifiedEntry, StorageError>>, StorageError> {
        let walker = Walker::with_config(self.root.clone(), self.scan.walker_config(compute_checksum))?;
        let records = self.database.records()?;
        let expected = self.database.len()?;
        info!(
            root = %self.root.display(),
            database = %self.database.path().display(),
            database_records = expected,
            checksum = compute_checksum,
            "Starting reconciliation pass"
        );

        let fs = skip_unreadable(walker.walk(), self.scan.on_unreadable);
        Ok(Progress {
            inner: compare(fs, records, compute_checksum),
            seen: 0,
            expected,
        })
    }

    /// Full classification with renames paired.
    pub fn classify(&self, compute_checksum: bool) -> Result<Classification, StorageError> {
        let entries = detect_moves(self.entries(compute_checksum)?, &self.hasher())?;
        let classification = Classification::new(entries);
        info!(entries = classification.entries.len(), "Reconciliation pass complete");
        Ok(classification)
    }

    /// Rewrite the database from a fresh pass and persist it.
    pub fn update(&self, compute_checksum: bool) -> Result<RewriteSummary, StorageError> {
        let classification = self.classify(compute_checksum)?;
        let policy = RewritePolicy {
            on_unreadable: self.scan.on_unreadable,
            ..RewritePolicy::default()
        };
        let result = database::rewrite(
            classification.entries.into_iter().map(Ok),
            &policy,
            &self.hasher(),
        )?;
        self.database.writer().persist(&result.records)?;
        Ok(result.summary)
    }
}
