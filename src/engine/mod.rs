//! Synchronization engine.
//!
//! A cycle walks the configured sources in order. Each source is polled, its
//! headlines are normalized into [`FeedEntry`] records and written through the
//! [`UpsertGuard`], one at a time. Any failure abandons the rest of that
//! source for the cycle and the next source proceeds; the following cycle is
//! the retry.
//!
//! Cycles are driven by a task owned by [`SyncEngine`]. The next cycle starts
//! `refresh_interval` after the previous one finished. [`SyncEngine::stop`]
//! only prevents future cycles; a cycle in progress runs to completion.

pub mod report;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::app::{MirrorError, Result};
use crate::config::format_interval;
use crate::domain::{logo_key, FeedEntry, Publisher, RawHeadline, FEED_PREFIX};
use crate::drive::{DriveKeys, DriveSchema, KeyValueDrive, OpenOptions, UpsertGuard};
use crate::poller::FeedPoller;

pub use report::{CycleReport, SourceFailure, SourceOutcome, SourceReport, SourceSummary};

/// Everything [`SyncEngine::initialize`] needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub drive_id: String,
    pub refresh_interval: Duration,
    pub feeds: Vec<String>,
    pub schema: DriveSchema,
    pub open_options: OpenOptions,
    pub timezone: Tz,
    /// SVG bytes published at `/images/<schema.name>.svg`.
    pub logo: Vec<u8>,
}

/// State shared between the engine and its loop task.
struct Syncer {
    /// Drive namespace every write of this engine goes to.
    namespace: String,
    guard: UpsertGuard,
    poller: Arc<dyn FeedPoller>,
    feeds: Vec<String>,
    refresh_interval: Duration,
    timezone: Tz,
}

struct Runner {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct SyncEngine {
    drive: Arc<dyn KeyValueDrive>,
    poller: Arc<dyn FeedPoller>,
    syncer: Option<Arc<Syncer>>,
    keys: Option<DriveKeys>,
    runner: Option<Runner>,
}

impl SyncEngine {
    pub fn new(drive: Arc<dyn KeyValueDrive>, poller: Arc<dyn FeedPoller>) -> Self {
        Self {
            drive,
            poller,
            syncer: None,
            keys: None,
            runner: None,
        }
    }

    /// Open the drive, publish the logo and return the drive identity.
    ///
    /// May succeed only once per engine.
    pub async fn initialize(&mut self, config: &SyncConfig) -> Result<DriveKeys> {
        if self.syncer.is_some() {
            return Err(MirrorError::InvalidState("engine is already initialized"));
        }

        let keys = self
            .drive
            .open(&config.drive_id, &config.schema, config.open_options)
            .await?;
        let guard = UpsertGuard::new(self.drive.clone());

        let logo = logo_key(&config.schema.name);
        if guard.ensure(&config.drive_id, &logo, &config.logo).await? {
            info!(key = %logo, "published logo");
        }

        info!(
            drive = %config.drive_id,
            url = %keys.connection_url(),
            "drive ready"
        );

        self.syncer = Some(Arc::new(Syncer {
            namespace: config.drive_id.clone(),
            guard,
            poller: self.poller.clone(),
            feeds: config.feeds.clone(),
            refresh_interval: config.refresh_interval,
            timezone: config.timezone,
        }));
        self.keys = Some(keys.clone());
        Ok(keys)
    }

    /// Identity of the opened drive, once initialized.
    pub fn keys(&self) -> Option<&DriveKeys> {
        self.keys.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.runner
            .as_ref()
            .is_some_and(|runner| !runner.handle.is_finished())
    }

    /// Run a first cycle right away, then one per `refresh_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let syncer = self
            .syncer
            .clone()
            .ok_or(MirrorError::InvalidState("start called before initialize"))?;

        if self.is_running() {
            return Err(MirrorError::InvalidState("engine is already running"));
        }

        info!(
            sources = syncer.feeds.len(),
            interval = %format_interval(syncer.refresh_interval),
            "starting sync loop"
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(syncer, stop_rx));
        self.runner = Some(Runner { stop_tx, handle });
        Ok(())
    }

    /// Cancel the pending timer.
    ///
    /// A cycle already in progress is not interrupted; the returned handle
    /// resolves once it has finished. No cycle starts after this returns.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let runner = self.runner.take()?;
        // The loop may already be gone, in which case there is nothing to cancel.
        let _ = runner.stop_tx.send(true);
        info!("sync loop stop requested");
        Some(runner.handle)
    }

    /// Run one cycle on the caller's task.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let syncer = self
            .syncer
            .as_ref()
            .ok_or(MirrorError::InvalidState("run_cycle called before initialize"))?;
        Ok(syncer.run_cycle().await)
    }
}

async fn run_loop(syncer: Arc<Syncer>, mut stop_rx: watch::Receiver<bool>) {
    loop {
        let stopped = *stop_rx.borrow();
        if stopped {
            break;
        }

        syncer.run_cycle().await;

        tokio::select! {
            _ = tokio::time::sleep(syncer.refresh_interval) => {}
            changed = stop_rx.changed() => {
                // The engine was dropped.
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("sync loop stopped");
}

impl Syncer {
    async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        for source in &self.feeds {
            let outcome = self.sync_source(source).await;
            match &outcome {
                Ok(summary) => info!(
                    source = %source,
                    seen = summary.seen,
                    written = summary.written,
                    "source synced"
                ),
                Err(failure) => error!(
                    source = %source,
                    kind = %failure.kind,
                    error = %failure.cause,
                    "source failed, skipping its remaining headlines this cycle"
                ),
            }
            report.sources.push(SourceReport {
                source: source.clone(),
                outcome,
            });
        }

        info!(
            sources = report.sources.len(),
            written = report.written(),
            failed = report.failures(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cycle complete"
        );
        report
    }

    async fn sync_source(&self, source: &str) -> SourceOutcome {
        let snapshot = self.poller.poll(source).await?;
        let mut summary = SourceSummary::default();

        for headline in &snapshot.headlines {
            summary.seen += 1;
            if self.upsert(headline, &snapshot.publisher).await? {
                summary.written += 1;
            }
        }

        Ok(summary)
    }

    async fn upsert(&self, headline: &RawHeadline, publisher: &Publisher) -> Result<bool> {
        let entry = FeedEntry::from_headline(headline, publisher, self.timezone)?;
        let key = entry.key(FEED_PREFIX);
        let written = self.guard.ensure(&self.namespace, &key, &entry.to_bytes()?).await?;

        if written {
            info!(key = %key, title = %entry.title, "updated feed entry");
        } else {
            debug!(key = %key, "feed entry unchanged");
        }
        Ok(written)
    }
}
