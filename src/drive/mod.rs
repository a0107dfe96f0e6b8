pub mod guard;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::Result;

pub use guard::UpsertGuard;
pub use memory::MemoryDrive;
pub use sqlite::SqliteDrive;

/// URL scheme of the connection descriptor handed to readers.
pub const DRIVE_SCHEME: &str = "hyper";

/// Public metadata describing the mirrored feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSchema {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    /// Ask the substrate to advertise the drive to peers.
    pub announce: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { announce: true }
    }
}

/// Identity of an opened drive, stable across reopenings of a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveKeys {
    pub public_key: String,
    pub encryption_key: String,
}

impl DriveKeys {
    /// `hyper://<publicKey>#encryptionKey=<key>`
    pub fn connection_url(&self) -> String {
        format!(
            "{}://{}#encryptionKey={}",
            DRIVE_SCHEME, self.public_key, self.encryption_key
        )
    }
}

/// A set of puts committed together by [`KeyValueDrive::flush`].
///
/// Dropping a batch without flushing it discards the puts.
#[derive(Debug, Default)]
pub struct Batch {
    puts: Vec<(String, Vec<u8>)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.puts.push((key.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn into_puts(self) -> Vec<(String, Vec<u8>)> {
        self.puts
    }
}

/// Byte-addressable store the engine mirrors entries into.
///
/// One drive may hold several namespaces; every read and write names the
/// namespace it targets, which must have been opened first.
///
/// Implementations assume a single writer per namespace: the engine's
/// sequential loop is the only caller of [`flush`](KeyValueDrive::flush), so
/// a get followed by a flush cannot interleave with another write to the same
/// key. Supporting several writers would need a compare-and-swap at key level.
#[async_trait]
pub trait KeyValueDrive: Send + Sync {
    /// Open (or create) `namespace`.
    async fn open(
        &self,
        namespace: &str,
        schema: &DriveSchema,
        options: OpenOptions,
    ) -> Result<DriveKeys>;

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Commit every put of `batch` into `namespace` atomically.
    async fn flush(&self, namespace: &str, batch: Batch) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        let keys = DriveKeys {
            public_key: "abc".into(),
            encryption_key: "def".into(),
        };
        assert_eq!(keys.connection_url(), "hyper://abc#encryptionKey=def");
    }

    #[test]
    fn test_batch_collects_puts_in_order() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        batch.put("/a", b"1".to_vec());
        batch.put("/b", b"2".to_vec());
        assert_eq!(batch.len(), 2);

        let keys: Vec<String> = batch.into_puts().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["/a", "/b"]);
    }
}
