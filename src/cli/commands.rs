use crate::app::{AppContext, MirrorError, Result};
use crate::config::{format_interval, parse_interval};

pub async fn run(ctx: &mut AppContext, interval: Option<&str>) -> Result<()> {
    if let Some(interval) = interval {
        ctx.sync_config.refresh_interval = parse_interval(interval).map_err(MirrorError::Config)?;
    }

    let keys = ctx.engine.initialize(&ctx.sync_config).await?;
    println!("Mirroring {} feeds to {}", ctx.sync_config.feeds.len(), keys.connection_url());
    println!(
        "Refreshing every {}",
        format_interval(ctx.sync_config.refresh_interval)
    );

    ctx.engine.start()?;
    wait_for_shutdown().await?;

    println!("Shutting down, waiting for the current cycle...");
    if let Some(handle) = ctx.engine.stop() {
        if let Err(e) = handle.await {
            tracing::error!("Sync loop join error: {}", e);
        }
    }

    Ok(())
}

pub async fn sync_once(ctx: &mut AppContext) -> Result<()> {
    ctx.engine.initialize(&ctx.sync_config).await?;

    if ctx.sync_config.feeds.is_empty() {
        println!("No feeds configured");
        return Ok(());
    }

    println!("Syncing {} feeds...", ctx.sync_config.feeds.len());
    let report = ctx.engine.run_cycle().await?;

    for source in &report.sources {
        match &source.outcome {
            Ok(summary) => {
                if summary.written > 0 {
                    println!("  {} updated entries from {}", summary.written, source.source);
                }
            }
            Err(failure) => {
                eprintln!("  Error syncing {}: {}", source.source, failure);
            }
        }
    }

    println!(
        "Sync complete: {} updated entries, {} errors",
        report.written(),
        report.failures()
    );
    Ok(())
}

pub async fn info(ctx: &mut AppContext) -> Result<()> {
    let keys = ctx.engine.initialize(&ctx.sync_config).await?;
    println!("{}", keys.connection_url());
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
