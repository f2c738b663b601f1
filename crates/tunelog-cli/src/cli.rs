use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tunelog")]
#[command(about = "Sync Spotify listening history into daily Markdown logs")]
#[command(version)]
pub struct Cli {
    /// Defaults to `sync` for today when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch recent plays and append new entries to the day document
    Sync {
        /// Day to sync (YYYY-MM-DD, reference timezone); defaults to today
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
        /// Print the merged document instead of writing it
        #[arg(long)]
        dry_run: bool,
        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stored day document
    Show {
        /// Day to show (YYYY-MM-DD); defaults to today
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Obtain a Spotify refresh token
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Print the Spotify consent URL
    Url {
        /// Redirect URI registered for the app (defaults to SPOTIFY_REDIRECT_URI)
        #[arg(long, value_name = "URI")]
        redirect_uri: Option<String>,
    },
    /// Exchange an authorization code for a refresh token
    Exchange {
        /// Code received on the redirect URI
        #[arg(long, value_name = "CODE")]
        code: String,
        /// Redirect URI used when the code was issued (defaults to SPOTIFY_REDIRECT_URI)
        #[arg(long, value_name = "URI")]
        redirect_uri: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
