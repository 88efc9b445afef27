//! CLI definition for the branchboard command-line interface.

use std::path::PathBuf;

use branchboard::{Priority, Status};
use clap::{Args, Parser, Subcommand};

/// Branchboard - tasks by status and release version.
///
/// Tasks live in a grid: workflow status across, release versions down.
/// Every version lane is ordered manually, and the backlog lane always
/// comes last.
#[derive(Parser, Debug)]
#[command(name = "branchboard")]
#[command(version)]
#[command(about = "Task board organised by status and release version")]
#[command(
    long_about = "Branchboard keeps tasks in a grid of workflow status and release version.\n\n\
    Data is stored as YAML under the configured data directory.\n\n\
    Configuration (later overrides earlier):\n  \
    ~/.config/branchboard/config.yaml\n  \
    ./.branchboard/config.yaml\n  \
    BRANCHBOARD_* environment variables"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Data directory (overrides the configured one)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the board
    Board {
        #[command(flatten)]
        filter: FilterArgs,
        /// Collapse a lane (repeatable)
        #[arg(long, value_name = "VERSION")]
        collapse: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Manage versions
    Version {
        #[command(subcommand)]
        command: VersionCommand,
    },

    /// Print the effective configuration
    Config,
}

/// Board filters
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only show these statuses (repeatable)
    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<Status>,
    /// Only show these versions (repeatable)
    #[arg(long = "version", value_name = "VERSION")]
    pub versions: Vec<String>,
    /// Text to find in titles and descriptions
    #[arg(long, short)]
    pub query: Option<String>,
    /// Hide tasks below this priority
    #[arg(long, value_name = "PRIORITY")]
    pub min_priority: Option<Priority>,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Defaults to the configured default_status
        #[arg(long)]
        status: Option<Status>,
        /// Version key or label; defaults to the configured default_version
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },

    /// Change a task's fields
    Update {
        /// Task id or unique prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },

    /// Move a task to a cell, optionally before another task
    Move {
        /// Task id or unique prefix
        id: String,
        #[arg(long)]
        status: Status,
        #[arg(long)]
        version: String,
        /// Land before this task
        #[arg(long, value_name = "ID")]
        before: Option<String>,
    },

    /// Delete a task
    Rm {
        /// Task id or unique prefix
        id: String,
    },

    /// Show one task
    Show {
        /// Task id or unique prefix
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    List {
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum VersionCommand {
    /// List versions in board order
    List {
        /// Include deleted built-ins
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },

    /// Create a version at the end of the order
    Create {
        label: String,
        /// Use this key instead of a generated one
        #[arg(long)]
        key: Option<String>,
    },

    /// Rename a version
    Rename { version: String, label: String },

    /// Move a version one step up
    Up { version: String },

    /// Move a version one step down
    Down { version: String },

    /// Set the full version order
    Order {
        #[arg(required = true)]
        versions: Vec<String>,
    },

    /// Delete a version, moving its tasks elsewhere
    Delete {
        version: String,
        /// Where the tasks go
        #[arg(long, default_value = "backlog")]
        to: String,
    },
}
