//! # feedmirror
//!
//! Mirrors RSS/Atom headlines into a key-value drive, writing each headline
//! once and rewriting it only when its stored bytes would change.
//!
//! ## Architecture
//!
//! ```text
//! SyncEngine → FeedPoller → FeedEntry → derive_key → UpsertGuard → KeyValueDrive
//! ```
//!
//! Entries live under `/feed/<slug>`, where the slug is derived from the
//! headline's publish timestamp and title. The drive also holds the feed logo
//! at `/images/<name>.svg`.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run one cycle over the configured feeds
//! feedmirror sync
//!
//! # Keep mirroring every 15 minutes
//! feedmirror run --interval 15m
//!
//! # Print the URL readers use to find the drive
//! feedmirror info
//! ```

/// Application context and error types.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// TOML configuration and interval helpers.
pub mod config;

/// Headlines, persisted entries and storage keys.
pub mod domain;

/// The key-value drive contract, its SQLite and in-memory implementations,
/// and the compare-then-write [`UpsertGuard`](drive::UpsertGuard).
pub mod drive;

/// Poll cycle orchestration and the self-rescheduling loop.
pub mod engine;

/// HTTP download of feed documents.
pub mod fetcher;

/// Fetch + parse of one source into a [`FeedSnapshot`](domain::FeedSnapshot).
pub mod poller;
