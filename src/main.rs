use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedmirror::app::AppContext;
use feedmirror::cli::{commands, Cli, Commands};
use feedmirror::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let mut ctx = AppContext::new(&config)?;

    match cli.command {
        Commands::Run { interval } => {
            commands::run(&mut ctx, interval.as_deref()).await?;
        }
        Commands::Sync => {
            commands::sync_once(&mut ctx).await?;
        }
        Commands::Info => {
            commands::info(&mut ctx).await?;
        }
    }

    Ok(())
}
