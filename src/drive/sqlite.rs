use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use sha2::{Digest, Sha256};

use crate::app::{MirrorError, Result};
use crate::drive::{Batch, DriveKeys, DriveSchema, KeyValueDrive, OpenOptions};

/// Durable drive backed by a single SQLite file.
pub struct SqliteDrive {
    conn: Mutex<Connection>,
    opened: Mutex<HashSet<String>>,
}

impl SqliteDrive {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let drive = Self {
            conn: Mutex::new(conn),
            opened: Mutex::new(HashSet::new()),
        };
        drive.run_migrations()?;
        Ok(drive)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            MirrorError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn opened(&self) -> Result<MutexGuard<'_, HashSet<String>>> {
        self.opened
            .lock()
            .map_err(|_| MirrorError::LockPoisoned("sqlite drive namespaces"))
    }

    fn ensure_open(&self, namespace: &str) -> Result<()> {
        if self.opened()?.contains(namespace) {
            Ok(())
        } else {
            Err(MirrorError::DriveNotOpen(namespace.to_string()))
        }
    }

    fn generate_keys() -> DriveKeys {
        let seed: [u8; 32] = rand::random();
        let encryption: [u8; 32] = rand::random();

        DriveKeys {
            public_key: hex::encode(Sha256::digest(seed)),
            encryption_key: hex::encode(encryption),
        }
    }
}

#[async_trait]
impl KeyValueDrive for SqliteDrive {
    async fn open(
        &self,
        namespace: &str,
        schema: &DriveSchema,
        options: OpenOptions,
    ) -> Result<DriveKeys> {
        let schema_json = serde_json::to_string(schema)?;

        let keys = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    "SELECT public_key, encryption_key, schema_json FROM drives WHERE namespace = ?1",
                    params![namespace],
                    |row| {
                        Ok((
                            DriveKeys {
                                public_key: row.get(0)?,
                                encryption_key: row.get(1)?,
                            },
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            let keys = match existing {
                Some((keys, stored_schema)) => {
                    if stored_schema != schema_json {
                        tx.execute(
                            "UPDATE drives SET schema_json = ?1 WHERE namespace = ?2",
                            params![schema_json, namespace],
                        )?;
                    }
                    keys
                }
                None => {
                    let keys = Self::generate_keys();
                    tx.execute(
                        "INSERT INTO drives (namespace, schema_json, public_key, encryption_key, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            namespace,
                            schema_json,
                            keys.public_key,
                            keys.encryption_key,
                            Utc::now().to_rfc3339()
                        ],
                    )?;
                    tracing::info!(namespace, "created drive");
                    keys
                }
            };

            tx.commit()?;
            keys
        };

        self.opened()?.insert(namespace.to_string());

        // Peer discovery is outside this crate; the flag is only recorded.
        tracing::debug!(namespace, announce = options.announce, "opened sqlite drive");
        Ok(keys)
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_open(namespace)?;
        let conn = self.conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        Ok(value)
    }

    async fn flush(&self, namespace: &str, batch: Batch) -> Result<()> {
        self.ensure_open(namespace)?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )?;
            for (key, value) in batch.into_puts() {
                stmt.execute(params![namespace, key, value, now])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str) -> DriveSchema {
        DriveSchema {
            name: name.into(),
            title: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let drive = SqliteDrive::in_memory().unwrap();
        drive.open("news", &schema("news"), OpenOptions::default()).await.unwrap();

        let mut batch = Batch::new();
        batch.put("/feed/a", b"hello".to_vec());
        drive.flush("news", batch).await.unwrap();

        assert_eq!(drive.get("news", "/feed/a").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(drive.get("news", "/feed/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_overwrites_existing_value() {
        let drive = SqliteDrive::in_memory().unwrap();
        drive.open("news", &schema("news"), OpenOptions::default()).await.unwrap();

        for value in [b"one".to_vec(), b"two".to_vec()] {
            let mut batch = Batch::new();
            batch.put("/feed/a", value);
            drive.flush("news", batch).await.unwrap();
        }

        assert_eq!(drive.get("news", "/feed/a").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_unopened_namespace_fails() {
        let drive = SqliteDrive::in_memory().unwrap();
        let err = drive.get("news", "/feed/a").await.unwrap_err();
        assert!(matches!(err, MirrorError::DriveNotOpen(_)));

        let err = drive.flush("news", Batch::new()).await.unwrap_err();
        assert!(matches!(err, MirrorError::DriveNotOpen(_)));
    }

    #[tokio::test]
    async fn test_keys_and_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drive.db");

        let first_keys = {
            let drive = SqliteDrive::new(&path).unwrap();
            let keys = drive
                .open("news", &schema("news"), OpenOptions::default())
                .await
                .unwrap();
            let mut batch = Batch::new();
            batch.put("/feed/a", b"kept".to_vec());
            drive.flush("news", batch).await.unwrap();
            keys
        };

        let drive = SqliteDrive::new(&path).unwrap();
        let keys = drive
            .open("news", &schema("renamed"), OpenOptions { announce: false })
            .await
            .unwrap();

        assert_eq!(keys, first_keys);
        assert_eq!(keys.public_key.len(), 64);
        assert_eq!(keys.encryption_key.len(), 64);
        assert_eq!(drive.get("news", "/feed/a").await.unwrap(), Some(b"kept".to_vec()));
    }

    #[tokio::test]
    async fn test_namespaces_have_distinct_keys_and_entries() {
        let drive = SqliteDrive::in_memory().unwrap();
        let a = drive.open("a", &schema("a"), OpenOptions::default()).await.unwrap();
        let b = drive.open("b", &schema("b"), OpenOptions::default()).await.unwrap();

        let mut batch = Batch::new();
        batch.put("/feed/x", b"from-a".to_vec());
        drive.flush("a", batch).await.unwrap();

        assert_ne!(a.public_key, b.public_key);
        assert_eq!(drive.get("a", "/feed/x").await.unwrap(), Some(b"from-a".to_vec()));
        assert_eq!(drive.get("b", "/feed/x").await.unwrap(), None);
    }
}
