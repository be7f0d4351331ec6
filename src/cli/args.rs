//! Command-line argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::entity::{IdArgs, ListArgs, NewArgs};
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::rev::RevCommands;
use crate::cli::commands::status::StatusArgs;
use crate::cli::commands::team::TeamCommands;

/// PSV Tracker - revision and approval workflow for relief-valve records
#[derive(Debug, Parser)]
#[command(name = "psvt", version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,

    /// Log filter (trace, debug, info, warn, error, or a tracing directive)
    #[arg(long, global = true, env = "PSVT_LOG")]
    pub log_level: Option<String>,
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Table for lists, YAML for single records
    #[default]
    Auto,
    Table,
    Yaml,
    Json,
    Csv,
    /// IDs only, one per line
    Id,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a project in the current directory
    Init(InitArgs),
    /// Create a customer, plant, unit, area, PSV, scenario or sizing case
    New(NewArgs),
    /// List records
    List(ListArgs),
    /// Show one record with its revisions
    Show(IdArgs),
    /// Change a record's workflow status
    Status(StatusArgs),
    /// Advance a record to its next workflow stage
    Advance(IdArgs),
    /// List the statuses you may move a record to
    Transitions(IdArgs),
    /// Soft-delete a record (freezes it and everything beneath it)
    Deactivate(IdArgs),
    /// Undo a soft delete
    Activate(IdArgs),
    /// Revision management
    #[command(subcommand)]
    Rev(RevCommands),
    /// Team roster management
    #[command(subcommand)]
    Team(TeamCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}
