//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod anime;
mod load;
mod pivot;
mod status;
mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "anime-harvest")]
#[command(about = "Checkpointed anime and watch-list harvester")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check for the verbose flag before the parser runs, so logging can be
/// initialised first.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest anime detail pages from the top-anime ranking (resumable)
    Anime,

    /// Harvest watch lists of users found in recent forum posts
    Users,

    /// Load the harvested CSV files into the database
    Load,

    /// Print the head of the user x title score matrix
    Pivot,

    /// Show harvest progress and database contents
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, _config) = load_settings_with_options(options).await?;
    tracing::debug!("Data directory: {}", settings.data_dir.display());

    match cli.command {
        Commands::Anime => anime::cmd_anime(&settings).await,
        Commands::Users => users::cmd_users(&settings).await,
        Commands::Load => load::cmd_load(&settings),
        Commands::Pivot => pivot::cmd_pivot(&settings),
        Commands::Status => status::cmd_status(&settings),
    }
}
