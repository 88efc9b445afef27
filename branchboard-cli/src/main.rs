//! Branchboard CLI - a task board organised by status and release version.
//!
//! Commands:
//! - `branchboard board`: Show the grid of versions and statuses
//! - `branchboard task add|update|move|rm|show|list`: Manage tasks
//! - `branchboard version list|create|rename|up|down|order|delete`: Manage versions
//! - `branchboard config`: Print the effective configuration
//!
//! Exit codes:
//! - 0: Success, or nothing to change
//! - 1: Error
//! - 2: The change was rejected and rolled back

use branchboard_cli::{commands, context, logging, BoardConfig, Cli, Commands, Outcome};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match BoardConfig::load() {
        Ok(config) => config.with_data_dir(cli.data_dir.clone()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(cli.debug, &config.log_level);

    let exit_code = match run(cli.command, &config).await {
        Ok(outcome) => {
            match &outcome {
                Outcome::Done(text) => println!("{}", text),
                Outcome::Unchanged(note) => eprintln!("{}", note),
                Outcome::Rejected => {}
            }
            outcome.exit_code()
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(command: Commands, config: &BoardConfig) -> anyhow::Result<Outcome> {
    if let Commands::Config = command {
        return commands::show_config(config);
    }
    let ctx = context::open_board(config).await?;
    commands::run(command, &ctx, config).await
}
