//! Reframe CLI — Plan vertical crop tracks for clips of a landscape video.
//!
//! Usage:
//!   reframe plan <DETECTIONS> --clips <CLIPS>   Build one crop plan per clip
//!   reframe validate <PLAN>                     Check a crop plan
//!   reframe info <PLAN>                         Show crop plan information
//!   reframe config [--save]                     Print (and save) the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reframe_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Face-tracking crop planner for vertical video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build crop plans from a recorded detection stream
    Plan(commands::plan::PlanArgs),

    /// Validate a crop plan
    Validate {
        /// Path to the plan file
        path: PathBuf,
    },

    /// Show crop plan information
    Info {
        /// Path to the plan file
        path: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Plan(args) => commands::plan::run(args, &config).await,
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Config { save } => commands::config::run(&config, save),
    }
}
