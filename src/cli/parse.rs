//! CLI parse: clap types for treedb. No behavior; definitions only.

use crate::types::State;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// treedb - track a directory tree in a flat text database and reconcile its copies
#[derive(Parser)]
#[command(name = "treedb")]
#[command(about = "Track a directory tree in a text database and reconcile copies against it")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory (the copy to operate on)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable logging
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register the workspace as a repository master (writing its database) or as a copy
    Init {
        /// Repository name
        name: String,

        /// Register the workspace as this named copy of an existing repository
        #[arg(long)]
        copy: Option<String>,

        /// Overwrite an existing database or copy registration
        #[arg(long)]
        force: bool,
    },
    /// Rewrite the database from the master tree
    Update {
        /// Compare content checksums, not only sizes
        #[arg(long)]
        checksum: bool,
    },
    /// Classify the workspace against the database and write status files
    Status {
        #[command(subcommand)]
        command: Option<StatusCommands>,

        /// Compare content checksums, not only sizes
        #[arg(long)]
        checksum: bool,
    },
    /// Review and apply recorded differences between this copy and the master
    Treat {
        /// Which entries to treat
        #[arg(value_enum)]
        target: TreatTarget,

        /// Delete entries whose links were removed during review
        #[arg(long)]
        delete: bool,
    },
    /// Show repository, copy and status file information
    Info,
}

#[derive(Subcommand)]
pub enum StatusCommands {
    /// Count the entries of each status file
    Show,
    /// Re-check status files against the database and the tree
    Verify,
    /// Remove the status files
    Clean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreatTarget {
    New,
    Missing,
    Different,
    Moved,
    All,
}

impl TreatTarget {
    /// The single state to treat; `None` for all of them.
    pub fn state(&self) -> Option<State> {
        match self {
            TreatTarget::New => Some(State::MissingOnDb),
            TreatTarget::Missing => Some(State::MissingInFs),
            TreatTarget::Different => Some(State::Different),
            TreatTarget::Moved => Some(State::Moved),
            TreatTarget::All => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_subcommands() {
        let cli = Cli::try_parse_from(["treedb", "status", "--checksum"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status {
                command: None,
                checksum: true
            }
        ));

        let cli = Cli::try_parse_from(["treedb", "--format", "json", "status", "verify"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Status {
                command: Some(StatusCommands::Verify),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_treat_target() {
        let cli = Cli::try_parse_from(["treedb", "treat", "missing", "--delete"]).unwrap();
        match cli.command {
            Commands::Treat { target, delete } => {
                assert_eq!(target.state(), Some(State::MissingInFs));
                assert!(delete);
            }
            _ => panic!("expected treat"),
        }
        assert!(Cli::try_parse_from(["treedb", "treat", "good"]).is_err());
        assert_eq!(TreatTarget::All.state(), None);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["treedb", "-q", "-v", "info"]).is_err());
    }
}
