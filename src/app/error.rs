use thiserror::Error;

/// Coarse classification used by the per-source failure boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, HTTP status, feed parsing or record normalization.
    FetchOrParse,
    /// Encoding or persisting an entry.
    Write,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::FetchOrParse => write!(f, "fetch/parse"),
            FailureKind::Write => write!(f, "write"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Drive namespace {0:?} is not open")]
    DriveNotOpen(String),

    #[error("Drive lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Feed body exceeds {limit} bytes")]
    FeedTooLarge { limit: usize },

    #[error("Invalid published timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MirrorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MirrorError::Database(_)
            | MirrorError::DriveNotOpen(_)
            | MirrorError::LockPoisoned(_)
            | MirrorError::Migration(_)
            | MirrorError::Serialize(_)
            | MirrorError::Io(_) => FailureKind::Write,
            _ => FailureKind::FetchOrParse,
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
