use std::sync::Arc;

use crate::app::error::{MirrorError, Result};
use crate::config::Config;
use crate::drive::{KeyValueDrive, MemoryDrive, SqliteDrive};
use crate::engine::{SyncConfig, SyncEngine};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::poller::{FeedPoller, RssPoller};

/// Wires the drive, the poller and the engine from a loaded [`Config`].
pub struct AppContext {
    pub engine: SyncEngine,
    pub sync_config: SyncConfig,
}

impl AppContext {
    pub fn new(config: &Config) -> Result<Self> {
        let drive: Arc<dyn KeyValueDrive> = Arc::new(SqliteDrive::new(&config.storage_path)?);
        Self::with_drive(config, drive)
    }

    /// Same wiring over a drive that lives only as long as the process.
    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::with_drive(config, Arc::new(MemoryDrive::new()))
    }

    fn with_drive(config: &Config, drive: Arc<dyn KeyValueDrive>) -> Result<Self> {
        let sync_config = config
            .sync_config()
            .map_err(|e| MirrorError::Config(e.to_string()))?;

        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        let poller: Arc<dyn FeedPoller> = Arc::new(RssPoller::new(fetcher));

        Ok(Self {
            engine: SyncEngine::new(drive, poller),
            sync_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_context_initializes() {
        let mut ctx = AppContext::in_memory(&Config::default()).unwrap();
        let keys = ctx.engine.initialize(&ctx.sync_config).await.unwrap();

        assert_eq!(ctx.engine.keys(), Some(&keys));
        // No sources configured: the cycle is empty but succeeds.
        let report = ctx.engine.run_cycle().await.unwrap();
        assert!(report.sources.is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_context_uses_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_path: dir.path().join("drive.db"),
            ..Config::default()
        };

        let mut ctx = AppContext::new(&config).unwrap();
        ctx.engine.initialize(&ctx.sync_config).await.unwrap();
        assert!(config.storage_path.exists());
    }
}
