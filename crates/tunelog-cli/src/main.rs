//! Tunelog CLI - keep a daily Markdown log of what you listened to
//!
//! Meant to be run from cron or CI; every run is incremental and idempotent.

mod cli;
mod commands;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::load_service;
use crate::commands::show::run_show;
use crate::commands::sync::run_sync;
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
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tunelog=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Sync {
            date,
            dry_run,
            json,
        }) => run_sync(&load_service()?, date, dry_run, json).await?,
        Some(Commands::Show { date }) => run_show(&load_service()?, date).await?,
        Some(Commands::Auth { command }) => run_auth(command).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => run_sync(&load_service()?, None, false, false).await?,
    }

    Ok(())
}
