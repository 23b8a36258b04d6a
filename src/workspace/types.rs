//! Result types of workspace commands; the CLI formats them as text or JSON.

use crate::database::RewriteSummary;
use crate::reconcile::StateCounts;
use crate::treat::TreatReport;
use crate::types::State;
use crate::verify::VerifyReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct InitResult {
    pub repository: String,
    pub copy: String,
    pub workspace_root: PathBuf,
    pub database: PathBuf,
    /// Records written; `None` when a copy was registered.
    pub records: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    pub repository: String,
    pub database: PathBuf,
    pub summary: RewriteSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub repository: String,
    pub copy: String,
    pub status_dir: PathBuf,
    pub counts: StateCounts,
    pub database_empty: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusShowResult {
    pub repository: String,
    pub copy: String,
    pub status_dir: PathBuf,
    /// Lines per status file, `None` when the file is absent.
    pub counts: BTreeMap<State, Option<usize>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub repository: String,
    pub copy: String,
    pub report: VerifyReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanResult {
    pub status_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreatResult {
    pub repository: String,
    pub copy: String,
    pub reports: Vec<TreatReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoResult {
    pub repository: String,
    pub copy: String,
    pub workspace_root: PathBuf,
    pub database: PathBuf,
    pub database_records: Option<usize>,
    pub copies: BTreeMap<String, PathBuf>,
    pub status_dir: PathBuf,
    pub status_counts: BTreeMap<State, Option<usize>>,
}
