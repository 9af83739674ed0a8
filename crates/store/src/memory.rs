use crate::{BatchEntry, Result, Table, TableError, BATCH_CHANNEL_CAPACITY};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

const TABLE_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedTable {
    schema_version: u32,
    entries: Vec<PersistedEntry>,
}

#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// In-memory reference implementation of [`Table`].
///
/// Backs tests and tooling. Entries are written while a corpus fixture is
/// assembled and only read afterwards, matching the immutable serving
/// corpus the engine expects.
#[derive(Default, Clone, Debug)]
pub struct MemoryTable {
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<Vec<u8>>, value: Vec<u8>) {
        self.entries
            .write()
            .expect("table lock poisoned")
            .insert(key.into(), value);
    }

    /// Encodes `record` with the storage codec and inserts it.
    pub fn insert_record<T: Serialize>(&self, key: impl Into<Vec<u8>>, record: &T) -> Result<()> {
        self.insert(key, crate::encode_record(record)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a table snapshot previously written by [`MemoryTable::save`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let persisted: PersistedTable = serde_json::from_slice(&bytes)?;
        if persisted.schema_version != TABLE_SCHEMA_VERSION {
            return Err(TableError::Storage(format!(
                "unsupported table schema_version {} (expected {TABLE_SCHEMA_VERSION})",
                persisted.schema_version
            )));
        }
        let table = Self::new();
        {
            let mut entries = table.entries.write().expect("table lock poisoned");
            for entry in persisted.entries {
                entries.insert(entry.key, entry.value);
            }
        }
        Ok(table)
    }

    /// Writes the table contents as a JSON snapshot.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let entries = {
            let entries = self.entries.read().expect("table lock poisoned");
            entries
                .iter()
                .map(|(key, value)| PersistedEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        };
        let persisted = PersistedTable {
            schema_version: TABLE_SCHEMA_VERSION,
            entries,
        };
        tokio::fs::write(path, serde_json::to_vec(&persisted)?).await?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.entries
            .read()
            .expect("table lock poisoned")
            .get(key)
            .cloned()
            .ok_or(TableError::NoSuchKey)
    }
}

#[async_trait]
impl Table for MemoryTable {
    async fn lookup(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.get(key)
    }

    async fn lookup_batch(&self, keys: Vec<Vec<u8>>) -> Result<mpsc::Receiver<BatchEntry>> {
        let results: Vec<BatchEntry> = keys
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                BatchEntry { key, value }
            })
            .collect();

        let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for entry in results {
                // A dropped receiver closes the channel; stop producing.
                if tx.send(entry).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn point_lookup_hits_and_misses() {
        let table = MemoryTable::new();
        table.insert(b"k1".to_vec(), b"v1".to_vec());

        assert_eq!(table.lookup(b"k1").await.unwrap(), b"v1");
        assert!(matches!(
            table.lookup(b"absent").await,
            Err(TableError::NoSuchKey)
        ));
    }

    #[tokio::test]
    async fn batch_preserves_request_order_and_tags_missing_keys() {
        let table = MemoryTable::new();
        table.insert(b"a".to_vec(), b"1".to_vec());
        table.insert(b"c".to_vec(), b"3".to_vec());

        let mut rx = table
            .lookup_batch(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()])
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.key, b"a");
        assert_eq!(first.value.unwrap(), b"1");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.key, b"b");
        assert!(matches!(second.value, Err(TableError::NoSuchKey)));

        let third = rx.recv().await.unwrap();
        assert_eq!(third.key, b"c");
        assert_eq!(third.value.unwrap(), b"3");

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_receiver_stops_the_producer() {
        let table = MemoryTable::new();
        let keys: Vec<Vec<u8>> = (0..256).map(|i| format!("k{i}").into_bytes()).collect();
        for key in &keys {
            table.insert(key.clone(), b"v".to_vec());
        }

        let mut rx = table.lookup_batch(keys).await.unwrap();
        let _ = rx.recv().await.unwrap();
        drop(rx);
        // Nothing to assert beyond "no hang": the producer's next send
        // fails once the receiver is gone.
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn snapshot_roundtrip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tables").join("corpus.json");

        let table = MemoryTable::new();
        table.insert(b"edgeSets:t1".to_vec(), b"{}".to_vec());
        table.insert(b"decor:t2".to_vec(), b"{}".to_vec());
        table.save(&path).await?;

        let loaded = MemoryTable::load(&path).await?;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.lookup(b"edgeSets:t1").await?, b"{}");
        Ok(())
    }

    #[tokio::test]
    async fn load_rejects_unknown_schema_version() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("corpus.json");
        tokio::fs::write(&path, br#"{"schema_version":99,"entries":[]}"#).await?;

        let err = MemoryTable::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("schema_version"));
        Ok(())
    }
}
