//! skubridge CLI - preview, queue and sync product records from the terminal

mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::bulk::run_bulk;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::logs::run_logs;
use crate::commands::populate::run_populate;
use crate::commands::preview::run_preview;
use crate::commands::push::run_push;
use crate::commands::queue::run_queue;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skubridge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Preview(args) => run_preview(&args, profile).await?,
        Commands::Queue { command } => run_queue(command, profile, &db_path).await?,
        Commands::Populate {
            pattern,
            clear,
            direction,
            mode,
        } => run_populate(&pattern, clear, direction, mode, profile, &db_path).await?,
        Commands::Bulk(args) => run_bulk(&args, profile, &db_path).await?,
        Commands::Push(args) => run_push(&args, profile, &db_path).await?,
        Commands::Logs { limit, json } => run_logs(limit, json, &db_path).await?,
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
