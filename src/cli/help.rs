//! CLI command-name contract for logging.

use crate::cli::parse::{Commands, StatusCommands};

/// Command name string for log events (e.g. "status.verify", "treat").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { copy: None, .. } => "init",
        Commands::Init { copy: Some(_), .. } => "init.copy",
        Commands::Update { .. } => "update",
        Commands::Status { command, .. } => match command {
            None => "status",
            Some(StatusCommands::Show) => "status.show",
            Some(StatusCommands::Verify) => "status.verify",
            Some(StatusCommands::Clean) => "status.clean",
        },
        Commands::Treat { .. } => "treat",
        Commands::Info => "info",
    }
}
