use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::app::{MirrorError, Result};
use crate::drive::{Batch, DriveKeys, DriveSchema, KeyValueDrive, OpenOptions};

#[derive(Default)]
struct Inner {
    schemas: HashMap<String, DriveSchema>,
    entries: BTreeMap<(String, String), Vec<u8>>,
}

impl Inner {
    fn ensure_open(&self, namespace: &str) -> Result<()> {
        if self.schemas.contains_key(namespace) {
            Ok(())
        } else {
            Err(MirrorError::DriveNotOpen(namespace.to_string()))
        }
    }
}

/// Process-local drive. Nothing survives the process.
#[derive(Default)]
pub struct MemoryDrive {
    inner: Mutex<Inner>,
    flushes: AtomicUsize,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed so far, across namespaces.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn schema(&self, namespace: &str) -> Option<DriveSchema> {
        self.lock()
            .ok()
            .and_then(|inner| inner.schemas.get(namespace).cloned())
    }

    /// Keys of `namespace` starting with `prefix`, in key order.
    pub fn keys(&self, namespace: &str, prefix: &str) -> Result<Vec<String>> {
        let inner = self.lock()?;
        inner.ensure_open(namespace)?;
        Ok(inner
            .entries
            .keys()
            .filter(|(ns, key)| ns == namespace && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| MirrorError::LockPoisoned("memory drive"))
    }

    fn derive(label: &str, namespace: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        hasher.update(namespace.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl KeyValueDrive for MemoryDrive {
    async fn open(
        &self,
        namespace: &str,
        schema: &DriveSchema,
        options: OpenOptions,
    ) -> Result<DriveKeys> {
        let mut inner = self.lock()?;
        inner.schemas.insert(namespace.to_string(), schema.clone());
        tracing::debug!(namespace, announce = options.announce, "opened memory drive");

        Ok(DriveKeys {
            public_key: Self::derive("public", namespace),
            encryption_key: Self::derive("encryption", namespace),
        })
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let inner = self.lock()?;
        inner.ensure_open(namespace)?;
        Ok(inner
            .entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn flush(&self, namespace: &str, batch: Batch) -> Result<()> {
        let mut inner = self.lock()?;
        inner.ensure_open(namespace)?;
        for (key, value) in batch.into_puts() {
            inner.entries.insert((namespace.to_string(), key), value);
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
