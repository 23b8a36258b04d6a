//! Workspace command service: single entry point per CLI command.
//!
//! Owns the command workflows; the CLI parses, calls one method per command,
//! and formats the returned result.

use crate::config::TreedbConfig;
use crate::error::ApiError;
use crate::reconcile::{skip_unreadable, Reconciler};
use crate::repository::{Registry, Repository, MASTER};
use crate::status::StatusFiles;
use crate::tree::path::canonicalize_path;
use crate::tree::walker::{WalkEvent, Walker};
use crate::treat::{Orchestrator, Review};
use crate::types::State;
use crate::verify::Verifier;
use crate::workspace::types::{
    CleanResult, InfoResult, InitResult, StatusResult, StatusShowResult, TreatResult,
    UpdateResult, VerifyResult,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Order in which `treat all` visits the states.
pub const TREAT_ORDER: [State; 4] = [
    State::MissingOnDb,
    State::MissingInFs,
    State::Different,
    State::Moved,
];

/// Workspace directory plus the loaded configuration and registry.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    workspace_root: PathBuf,
    config: TreedbConfig,
    registry: Registry,
}

impl WorkspaceContext {
    pub fn new(workspace_root: &Path, config: TreedbConfig) -> Result<Self, ApiError> {
        let workspace_root = canonicalize_path(workspace_root)?;
        let registry = Registry::new(config.registry.resolve_root()?);
        Ok(Self {
            workspace_root,
            config,
            registry,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &TreedbConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Repository and copy name the workspace is registered under.
    fn resolve(&self) -> Result<(Repository, String), ApiError> {
        self.registry.find_by_path(&self.workspace_root)
    }

    fn status_files(&self, repository: &Repository, copy: &str) -> StatusFiles {
        StatusFiles::new(repository.status_dir(copy), self.config.status.clone())
    }

    fn reconciler(&self, repository: &Repository) -> Reconciler {
        Reconciler::new(
            self.workspace_root.clone(),
            repository.database(),
            self.config.scan.clone(),
        )
    }
}

/// Stateless workspace command service.
pub struct WorkspaceCommandService;

impl WorkspaceCommandService {
    /// Register the workspace as master of `name` and write its first database,
    /// or register it as copy `copy` of an existing repository.
    pub fn init(
        ctx: &WorkspaceContext,
        name: &str,
        copy: Option<&str>,
        force: bool,
    ) -> Result<InitResult, ApiError> {
        if let Some(copy) = copy {
            let repository = ctx.registry.add_copy(name, copy, &ctx.workspace_root, force)?;
            return Ok(InitResult {
                repository: repository.name().to_string(),
                copy: copy.to_string(),
                workspace_root: ctx.workspace_root.clone(),
                database: repository.database_path(),
                records: None,
            });
        }

        let repository = ctx.registry.create(name, &ctx.workspace_root, force)?;
        let walker = Walker::with_config(
            ctx.workspace_root.clone(),
            ctx.config.scan.walker_config(true),
        )?;
        let mut records = Vec::new();
        for event in skip_unreadable(walker.walk(), ctx.config.scan.on_unreadable) {
            if let WalkEvent::Entry(record) = event? {
                records.push(record);
            }
        }
        let written = repository.database().writer().persist(&records)?;
        info!(repository = name, records = written, "Initial database written");

        Ok(InitResult {
            repository: repository.name().to_string(),
            copy: MASTER.to_string(),
            workspace_root: ctx.workspace_root.clone(),
            database: repository.database_path(),
            records: Some(written),
        })
    }

    /// Rewrite the database from the master tree.
    pub fn update(ctx: &WorkspaceContext, compute_checksum: bool) -> Result<UpdateResult, ApiError> {
        let (repository, copy) = ctx.resolve()?;
        if copy != MASTER {
            return Err(ApiError::NotMaster(ctx.workspace_root.clone()));
        }
        let summary = ctx.reconciler(&repository).update(compute_checksum)?;
        Ok(UpdateResult {
            repository: repository.name().to_string(),
            database: repository.database_path(),
            summary,
        })
    }

    /// Classify the workspace against the database and write the status files.
    pub fn status(ctx: &WorkspaceContext, compute_checksum: bool) -> Result<StatusResult, ApiError> {
        let (repository, copy) = ctx.resolve()?;
        let database = repository.database();
        let database_empty = database.is_empty()?;
        let classification = ctx.reconciler(&repository).classify(compute_checksum)?;
        if classification.is_empty() {
            return Err(ApiError::EmptyDatabase(database.path().to_path_buf()));
        }
        if database_empty {
            warn!(database = %database.path().display(), "Database is empty, every file is new");
        }

        let status = ctx.status_files(&repository, &copy);
        status.write(&classification)?;
        Ok(StatusResult {
            repository: repository.name().to_string(),
            copy,
            status_dir: status.dir().to_path_buf(),
            counts: classification.counts,
            database_empty,
        })
    }

    pub fn status_show(ctx: &WorkspaceContext) -> Result<StatusShowResult, ApiError> {
        let (repository, copy) = ctx.resolve()?;
        let status = ctx.status_files(&repository, &copy);
        let counts = status.line_counts()?;
        Ok(StatusShowResult {
            repository: repository.name().to_string(),
            copy,
            status_dir: status.dir().to_path_buf(),
            counts,
        })
    }

    /// Re-check the recorded status files against the database and the tree.
    pub fn status_verify(ctx: &WorkspaceContext) -> Result<VerifyResult, ApiError> {
        let (repository, copy) = ctx.resolve()?;
        let status = ctx.status_files(&repository, &copy);
        if !status.exists() {
            return Err(ApiError::StatusMissing(status.dir().to_path_buf()));
        }
        let paths = repository.database().paths()?;
        let report = Verifier::new(&paths, &ctx.workspace_root).verify(&status)?;
        Ok(VerifyResult {
            repository: repository.name().to_string(),
            copy,
            report,
        })
    }

    pub fn status_clean(ctx: &WorkspaceContext) -> Result<CleanResult, ApiError> {
        let (repository, copy) = ctx.resolve()?;
        let status = ctx.status_files(&repository, &copy);
        status.clean()?;
        Ok(CleanResult {
            status_dir: status.dir().to_path_buf(),
        })
    }

    /// Treat the recorded entries of `state`, or of every treatable state.
    pub fn treat<R>(
        ctx: &WorkspaceContext,
        state: Option<State>,
        delete: bool,
        reviewer: &mut R,
    ) -> Result<TreatResult, ApiError>
    where
        R: Review + ?Sized,
    {
        let (repository, copy) = ctx.resolve()?;
        let master = repository.master_path()?.to_path_buf();
        let orchestrator = Orchestrator::new(master, ctx.workspace_root.clone(), delete);
        let status = ctx.status_files(&repository, &copy);

        let states: Vec<State> = match state {
            Some(state) => vec![state],
            None => TREAT_ORDER
                .iter()
                .copied()
                .filter(|state| {
                    let skip = *state == State::MissingInFs && orchestrator.is_master_copy();
                    if skip {
                        warn!("Missing files cannot be treated on the master copy, skipping them");
                    }
                    !skip
                })
                .collect(),
        };

        let mut reports = Vec::new();
        for state in states {
            let entries = status.read(state)?;
            reports.push(orchestrator.treat(state, entries, reviewer)?);
        }
        if reports.iter().any(|r| !r.applied.is_empty()) {
            info!("Trees changed, status files are out of date");
        }

        Ok(TreatResult {
            repository: repository.name().to_string(),
            copy,
            reports,
        })
    }

    pub fn info(ctx: &WorkspaceContext) -> Result<InfoResult, ApiError> {
        let (repository, copy) = ctx.resolve()?;
        let database = repository.database();
        let database_records = if database.exists() {
            Some(database.len()?)
        } else {
            None
        };
        let status = ctx.status_files(&repository, &copy);
        let status_counts = status.line_counts()?;

        Ok(InfoResult {
            repository: repository.name().to_string(),
            copy,
            workspace_root: ctx.workspace_root.clone(),
            database: database.path().to_path_buf(),
            database_records,
            copies: repository.copies().clone(),
            status_dir: status.dir().to_path_buf(),
            status_counts,
        })
    }
}
