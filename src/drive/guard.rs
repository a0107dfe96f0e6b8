use std::sync::Arc;

use crate::app::Result;
use crate::drive::{Batch, KeyValueDrive};

/// Compare-then-write wrapper over a drive.
#[derive(Clone)]
pub struct UpsertGuard {
    drive: Arc<dyn KeyValueDrive>,
}

impl UpsertGuard {
    pub fn new(drive: Arc<dyn KeyValueDrive>) -> Self {
        Self { drive }
    }

    /// Write `content` at `key` in `namespace` unless the stored bytes are
    /// identical.
    ///
    /// Returns whether a write happened. Comparison is byte-for-byte, so a
    /// serialization that differs only in whitespace or field order still
    /// counts as a change.
    pub async fn ensure(&self, namespace: &str, key: &str, content: &[u8]) -> Result<bool> {
        let mut batch = Batch::new();

        if let Some(current) = self.drive.get(namespace, key).await? {
            if current == content {
                return Ok(false);
            }
        }

        batch.put(key, content.to_vec());
        self.drive.flush(namespace, batch).await?;
        Ok(true)
    }
}
