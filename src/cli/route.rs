//! CLI route: single route table and run context. Dispatches to the workspace
//! service and presentation.

use crate::cli::command_name;
use crate::cli::parse::{Commands, OutputFormat, StatusCommands};
use crate::cli::presentation::{
    format_clean_result_text, format_info_result_text, format_init_result_text,
    format_status_result_text, format_status_show_text, format_treat_result_text,
    format_update_result_text, format_verify_result_text, to_json,
};
use crate::config::ConfigLoader;
use crate::error::ApiError;
use crate::treat::TerminalReview;
use crate::workspace::{WorkspaceCommandService, WorkspaceContext};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, configuration and output format.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace: WorkspaceContext,
    format: OutputFormat,
}

impl RunContext {
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_validated(config_path.as_deref())?;
        let workspace = WorkspaceContext::new(&workspace_root, config)?;
        debug!(
            workspace = %workspace.workspace_root().display(),
            registry = %workspace.registry().root().display(),
            "Run context ready"
        );
        Ok(Self { workspace, format })
    }

    pub fn workspace(&self) -> &WorkspaceContext {
        &self.workspace
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, "Command started");
        let result = self.execute_inner(command);
        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        let ctx = &self.workspace;
        match command {
            Commands::Init { name, copy, force } => {
                let result = WorkspaceCommandService::init(ctx, name, copy.as_deref(), *force)?;
                self.render(&result, format_init_result_text)
            }
            Commands::Update { checksum } => {
                let result = WorkspaceCommandService::update(ctx, *checksum)?;
                self.render(&result, format_update_result_text)
            }
            Commands::Status { command, checksum } => match command {
                None => {
                    let result = WorkspaceCommandService::status(ctx, *checksum)?;
                    self.render(&result, format_status_result_text)
                }
                Some(StatusCommands::Show) => {
                    let result = WorkspaceCommandService::status_show(ctx)?;
                    self.render(&result, format_status_show_text)
                }
                Some(StatusCommands::Verify) => {
                    let result = WorkspaceCommandService::status_verify(ctx)?;
                    self.render(&result, format_verify_result_text)
                }
                Some(StatusCommands::Clean) => {
                    let result = WorkspaceCommandService::status_clean(ctx)?;
                    self.render(&result, format_clean_result_text)
                }
            },
            Commands::Treat { target, delete } => {
                let mut reviewer = TerminalReview::new(ctx.config().treat.file_browser.clone());
                let result = WorkspaceCommandService::treat(ctx, target.state(), *delete, &mut reviewer)?;
                self.render(&result, format_treat_result_text)
            }
            Commands::Info => {
                let result = WorkspaceCommandService::info(ctx)?;
                self.render(&result, format_info_result_text)
            }
        }
    }

    fn render<T: Serialize>(&self, result: &T, text: fn(&T) -> String) -> Result<String, ApiError> {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Text => Ok(text(result)),
        }
    }
}
