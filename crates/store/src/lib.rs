//! Key-value lookup contract consumed by the serving engine.
//!
//! A [`Table`] is a read-only byte table with point and batch lookups.
//! Batch results arrive over a bounded channel, one entry per requested
//! key in request order, each independently tagged with its own error.
//! Dropping the receiver closes the channel, which stops the producer at
//! its next send; early-return paths therefore release the batch without
//! any extra bookkeeping.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

mod error;
mod memory;

pub use error::{Result, TableError};
pub use memory::MemoryTable;

/// Capacity of batch result channels. Small enough that a dropped
/// receiver stops the producer promptly, large enough to keep lookups
/// ahead of the consumer.
pub const BATCH_CHANNEL_CAPACITY: usize = 16;

/// One per-key outcome of a batch lookup.
#[derive(Debug)]
pub struct BatchEntry {
    pub key: Vec<u8>,
    pub value: Result<Vec<u8>>,
}

/// A read-only byte table addressed by byte keys.
#[async_trait]
pub trait Table: Send + Sync {
    /// Point lookup. Returns [`TableError::NoSuchKey`] when the key has
    /// no value.
    async fn lookup(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Batch lookup. Yields one [`BatchEntry`] per requested key, in
    /// request order. A missing key yields an entry whose value is
    /// [`TableError::NoSuchKey`]; the batch itself keeps going.
    async fn lookup_batch(&self, keys: Vec<Vec<u8>>) -> Result<mpsc::Receiver<BatchEntry>>;
}

/// Looks up `key` and decodes the stored JSON record.
pub async fn lookup_record<T: DeserializeOwned>(table: &dyn Table, key: &[u8]) -> Result<T> {
    let bytes = table.lookup(key).await?;
    decode_record(&bytes)
}

/// Decodes a stored JSON record.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes a record in the table storage codec.
pub fn encode_record<T: serde::Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}
