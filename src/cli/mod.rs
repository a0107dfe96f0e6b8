pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedmirror")]
#[command(about = "Mirror RSS headlines into a key-value drive", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/feedmirror/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync every configured feed, then keep syncing until interrupted
    Run {
        /// Override the refresh interval (e.g., "1h", "30m", "45s", "1d")
        #[arg(short, long)]
        interval: Option<String>,
    },
    /// Run a single sync cycle and exit
    Sync,
    /// Print the drive connection URL
    Info,
}
