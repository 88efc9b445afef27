//! Branchboard CLI library
//!
//! The binary is a thin wrapper: parse [`Cli`], load [`BoardConfig`], set up
//! logging, open the board and hand the subcommand to [`commands::run`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod logging;
pub mod render;

pub use cli::{Cli, Commands, FilterArgs, TaskCommand, VersionCommand};
pub use commands::Outcome;
pub use config::{BoardConfig, ConfigError};
