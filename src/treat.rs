//! Treatment of classified entries between a local copy and the master.
//!
//! Entries of one state are checked against both trees, staged as links for
//! review, checked again and then applied. The table of actions:
//!
//! | state     | link kept                  | link removed                       |
//! |-----------|----------------------------|------------------------------------|
//! | missing   | copy master to local       | delete from master with `--delete` |
//! | new       | copy local to master       | delete from local with `--delete`  |
//! | different | copy the kept side across  | skip                               |
//! | moved     | rename on master           | rename back on local               |
//!
//! On the master copy itself the review is read-only, except for new files
//! with `--delete`, whose removed links delete them from the master.

pub mod review;
pub mod staging;

pub use review::{Review, ReviewDecision, TerminalReview};
pub use staging::{Side, StagedEntry, StagingArea};

use crate::error::{ApiError, StorageError};
use crate::status::StatusEntry;
use crate::tree::path::to_native;
use crate::types::State;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A change applied to one of the trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TreatAction {
    CopyToLocal,
    CopyToMaster,
    DeleteFromMaster,
    DeleteFromLocal,
    RenameOnMaster { from: String },
    RenameOnLocal { to: String },
}

impl std::fmt::Display for TreatAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreatAction::CopyToLocal => write!(f, "copied to local"),
            TreatAction::CopyToMaster => write!(f, "copied to master"),
            TreatAction::DeleteFromMaster => write!(f, "deleted from master"),
            TreatAction::DeleteFromLocal => write!(f, "deleted from local"),
            TreatAction::RenameOnMaster { from } => write!(f, "renamed on master from {}", from),
            TreatAction::RenameOnLocal { to } => write!(f, "renamed on local to {}", to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAction {
    pub path: String,
    #[serde(flatten)]
    pub action: TreatAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedAction {
    pub path: String,
    #[serde(flatten)]
    pub action: TreatAction,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleEntry {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatOutcome {
    /// No entry survived the consistency checks.
    Nothing,
    ReadOnly,
    Cancelled,
    Applied,
}

/// Result of treating one state.
#[derive(Debug, Clone, Serialize)]
pub struct TreatReport {
    pub state: State,
    pub outcome: TreatOutcome,
    pub staged: usize,
    pub skipped: usize,
    pub stale: Vec<StaleEntry>,
    pub applied: Vec<AppliedAction>,
    pub failed: Vec<FailedAction>,
}

impl TreatReport {
    fn new(state: State) -> Self {
        Self {
            state,
            outcome: TreatOutcome::Nothing,
            staged: 0,
            skipped: 0,
            stale: Vec::new(),
            applied: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn record_stale(&mut self, error: ApiError) -> Result<(), ApiError> {
        match error {
            ApiError::StaleClassification { path, reason } => {
                warn!(state = %self.state, path = %path, reason = %reason, "Dropping stale entry");
                self.stale.push(StaleEntry { path, reason });
                Ok(())
            }
            other => Err(other),
        }
    }
}

/// Applies reviewed entries between a local copy and the master.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    master: PathBuf,
    local: PathBuf,
    delete: bool,
}

impl Orchestrator {
    pub fn new(master: PathBuf, local: PathBuf, delete: bool) -> Self {
        Self {
            master,
            local,
            delete,
        }
    }

    pub fn is_master_copy(&self) -> bool {
        self.master == self.local
    }

    fn read_only(&self, state: State) -> bool {
        self.is_master_copy() && !(state == State::MissingOnDb && self.delete)
    }

    /// Check, stage, review and apply `entries` of `state`.
    pub fn treat<R>(&self, state: State, entries: Vec<StatusEntry>, reviewer: &mut R) -> Result<TreatReport, ApiError>
    where
        R: Review + ?Sized,
    {
        match state {
            State::Ok => {
                return Err(ApiError::InvalidState(
                    "good files need no treatment".to_string(),
                ))
            }
            State::MissingInFs if self.is_master_copy() => {
                return Err(ApiError::InvalidState(
                    "missing files cannot be treated on the master copy".to_string(),
                ))
            }
            _ => {}
        }

        let mut report = TreatReport::new(state);
        let mut valid = Vec::new();
        for entry in entries {
            match self.validate(&entry) {
                Ok(()) => valid.push(entry),
                Err(e) => report.record_stale(e)?,
            }
        }
        if valid.is_empty() {
            info!(state = %state, "Nothing to treat");
            return Ok(report);
        }

        let mut staging = StagingArea::create(state.label())?;
        for entry in valid {
            let targets = self.staging_targets(&entry);
            staging.stage(entry, &targets)?;
        }
        report.staged = staging.len();
        info!(state = %state, staged = report.staged, dir = %staging.dir().display(), "Entries staged for review");

        let read_only = self.read_only(state);
        let decision = reviewer.review(&staging, read_only)?;
        if read_only {
            report.outcome = TreatOutcome::ReadOnly;
            return Ok(report);
        }
        if decision == ReviewDecision::Quit {
            report.outcome = TreatOutcome::Cancelled;
            return Ok(report);
        }

        for staged in staging.entries() {
            let kept = staging.kept_sides(staged);
            let Some(action) = self.plan(&staged.entry, &kept) else {
                debug!(path = %staged.entry.path, "No action");
                report.skipped += 1;
                continue;
            };
            if let Err(e) = self.validate(&staged.entry) {
                report.record_stale(e)?;
                continue;
            }
            match self.apply(&staged.entry, &action) {
                Ok(()) => {
                    info!(path = %staged.entry.path, action = %action, "Applied");
                    report.applied.push(AppliedAction {
                        path: staged.entry.path.clone(),
                        action,
                    });
                }
                Err(e) => {
                    warn!(path = %staged.entry.path, action = %action, error = %e, "Action failed");
                    report.failed.push(FailedAction {
                        path: staged.entry.path.clone(),
                        action,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.outcome = TreatOutcome::Applied;
        Ok(report)
    }

    /// Existence checks; on the master copy only the local side is checked.
    pub fn validate(&self, entry: &StatusEntry) -> Result<(), ApiError> {
        let path = entry.path.as_str();
        let on_master = !self.is_master_copy();
        match entry.state {
            State::Ok => Err(ApiError::InvalidState(
                "good files need no treatment".to_string(),
            )),
            State::MissingInFs => {
                expect(&self.local, Side::Local, path, false, path)?;
                expect(&self.master, Side::Master, path, true, path)
            }
            State::MissingOnDb => {
                expect(&self.local, Side::Local, path, true, path)?;
                if on_master {
                    expect(&self.master, Side::Master, path, false, path)?;
                }
                Ok(())
            }
            State::Different => {
                expect(&self.local, Side::Local, path, true, path)?;
                expect(&self.master, Side::Master, path, true, path)
            }
            State::Moved => {
                let old = entry.moved_from.as_deref().ok_or_else(|| ApiError::StaleClassification {
                    path: path.to_string(),
                    reason: "moved entry without origin".to_string(),
                })?;
                expect(&self.local, Side::Local, path, true, path)?;
                expect(&self.local, Side::Local, old, false, path)?;
                if on_master {
                    expect(&self.master, Side::Master, old, true, path)?;
                    expect(&self.master, Side::Master, path, false, path)?;
                }
                Ok(())
            }
        }
    }

    fn staging_targets(&self, entry: &StatusEntry) -> Vec<(Side, PathBuf)> {
        let master = (Side::Master, to_native(&self.master, &entry.path));
        let local = (Side::Local, to_native(&self.local, &entry.path));
        match entry.state {
            State::MissingInFs => vec![master],
            State::Different if !self.is_master_copy() => vec![master, local],
            _ => vec![local],
        }
    }

    fn plan(&self, entry: &StatusEntry, kept: &[Side]) -> Option<TreatAction> {
        let is_kept = !kept.is_empty();
        match entry.state {
            State::MissingOnDb if self.is_master_copy() => (!is_kept).then_some(TreatAction::DeleteFromMaster),
            State::MissingInFs if is_kept => Some(TreatAction::CopyToLocal),
            State::MissingInFs => self.delete.then_some(TreatAction::DeleteFromMaster),
            State::MissingOnDb if is_kept => Some(TreatAction::CopyToMaster),
            State::MissingOnDb => self.delete.then_some(TreatAction::DeleteFromLocal),
            State::Different => match kept {
                [Side::Local] => Some(TreatAction::CopyToMaster),
                [Side::Master] => Some(TreatAction::CopyToLocal),
                _ => None,
            },
            State::Moved => {
                let old = entry.moved_from.clone()?;
                Some(if is_kept {
                    TreatAction::RenameOnMaster { from: old }
                } else {
                    TreatAction::RenameOnLocal { to: old }
                })
            }
            State::Ok => None,
        }
    }

    fn apply(&self, entry: &StatusEntry, action: &TreatAction) -> Result<(), StorageError> {
        let path = entry.path.as_str();
        match action {
            TreatAction::CopyToLocal => copy_file(&self.master, &self.local, path),
            TreatAction::CopyToMaster => copy_file(&self.local, &self.master, path),
            TreatAction::DeleteFromMaster => delete_file(&self.master, path),
            TreatAction::DeleteFromLocal => delete_file(&self.local, path),
            TreatAction::RenameOnMaster { from } => rename_file(&self.master, from, path),
            TreatAction::RenameOnLocal { to } => rename_file(&self.local, path, to),
        }
    }
}

fn expect(root: &Path, side: Side, path: &str, should_exist: bool, entry: &str) -> Result<(), ApiError> {
    let exists = to_native(root, path).symlink_metadata().is_ok();
    if exists == should_exist {
        return Ok(());
    }
    let reason = if should_exist {
        format!("{} is absent from {}", path, side.as_str())
    } else {
        format!("{} exists on {}", path, side.as_str())
    };
    Err(ApiError::StaleClassification {
        path: entry.to_string(),
        reason,
    })
}

fn create_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    Ok(())
}

fn copy_file(from_root: &Path, to_root: &Path, path: &str) -> Result<(), StorageError> {
    let from = to_native(from_root, path);
    let to = to_native(to_root, path);
    create_parent(&to)?;
    fs::copy(&from, &to).map_err(|e| StorageError::io(&from, e))?;
    Ok(())
}

/// Remove a file and its parent directory if that leaves it empty.
fn delete_file(root: &Path, path: &str) -> Result<(), StorageError> {
    let target = to_native(root, path);
    fs::remove_file(&target).map_err(|e| StorageError::io(&target, e))?;
    if let Some(parent) = target.parent() {
        if parent != root && fs::remove_dir(parent).is_ok() {
            debug!(dir = %parent.display(), "Removed empty directory");
        }
    }
    Ok(())
}

fn rename_file(root: &Path, from: &str, to: &str) -> Result<(), StorageError> {
    let source = to_native(root, from);
    let target = to_native(root, to);
    create_parent(&target)?;
    fs::rename(&source, &target).map_err(|e| StorageError::io(&source, e))
}
