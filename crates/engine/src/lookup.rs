use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use xref_serving::{
    CrossReferencesPage, EdgePage, FileDecorations, PagedCrossReferences, PagedEdgeSet,
};
use xref_store::{lookup_record, BatchEntry, Table, TableError, BATCH_CHANNEL_CAPACITY};

// Key prefixes of the combined table. Literal and stable: they are the
// contract between the offline pipeline and this engine.
pub const EDGE_SETS_PREFIX: &str = "edgeSets:";
pub const EDGE_PAGES_PREFIX: &str = "edgePages:";
pub const DECORATIONS_PREFIX: &str = "decor:";
pub const CROSS_REFERENCES_PREFIX: &str = "xrefs:";
pub const CROSS_REFERENCES_PAGES_PREFIX: &str = "xrefPages:";

pub fn edge_set_key(ticket: &str) -> Vec<u8> {
    format!("{EDGE_SETS_PREFIX}{ticket}").into_bytes()
}

pub fn edge_page_key(key: &str) -> Vec<u8> {
    format!("{EDGE_PAGES_PREFIX}{key}").into_bytes()
}

pub fn decorations_key(ticket: &str) -> Vec<u8> {
    format!("{DECORATIONS_PREFIX}{ticket}").into_bytes()
}

pub fn cross_references_key(ticket: &str) -> Vec<u8> {
    format!("{CROSS_REFERENCES_PREFIX}{ticket}").into_bytes()
}

pub fn cross_references_page_key(key: &str) -> Vec<u8> {
    format!("{CROSS_REFERENCES_PAGES_PREFIX}{key}").into_bytes()
}

/// One per-ticket outcome of a batch edge-set lookup.
#[derive(Debug)]
pub struct EdgeSetResult {
    pub ticket: String,
    pub result: Result<PagedEdgeSet, TableError>,
}

/// The five lookups the engine performs, independent of whether the
/// records live in one combined keyspace or five per-kind tables.
#[async_trait]
pub trait LookupTables: Send + Sync {
    /// Batch lookup of edge-set records, one result per ticket in
    /// stream order. Dropping the receiver releases the batch.
    async fn paged_edge_sets(
        &self,
        tickets: &[String],
    ) -> Result<mpsc::Receiver<EdgeSetResult>, TableError>;

    async fn edge_page(&self, key: &str) -> Result<EdgePage, TableError>;

    async fn file_decorations(&self, ticket: &str) -> Result<FileDecorations, TableError>;

    async fn cross_references(&self, ticket: &str) -> Result<PagedCrossReferences, TableError>;

    async fn cross_references_page(&self, key: &str) -> Result<CrossReferencesPage, TableError>;
}

/// Decodes a raw batch stream into edge-set results. `prefix_len` bytes
/// are stripped from each key to recover the ticket.
async fn stream_edge_sets(
    table: &dyn Table,
    keys: Vec<Vec<u8>>,
    prefix_len: usize,
) -> Result<mpsc::Receiver<EdgeSetResult>, TableError> {
    let mut raw = table.lookup_batch(keys).await?;
    let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        while let Some(entry) = raw.recv().await {
            let BatchEntry { key, value } = entry;
            let ticket =
                String::from_utf8_lossy(&key[prefix_len.min(key.len())..]).into_owned();
            let result = match value {
                Ok(bytes) => xref_store::decode_record::<PagedEdgeSet>(&bytes),
                Err(TableError::NoSuchKey) => {
                    log::warn!("could not locate edges with key {ticket:?}");
                    Err(TableError::NoSuchKey)
                }
                Err(err) => Err(err),
            };
            if tx.send(EdgeSetResult { ticket, result }).await.is_err() {
                // Receiver dropped; the batch is abandoned.
                break;
            }
        }
    });
    Ok(rx)
}

/// Five per-kind tables; tickets and page keys are the raw storage keys.
#[derive(Clone)]
pub struct SplitTables {
    pub edge_sets: Arc<dyn Table>,
    pub edge_pages: Arc<dyn Table>,
    pub decorations: Arc<dyn Table>,
    pub cross_references: Arc<dyn Table>,
    pub cross_reference_pages: Arc<dyn Table>,
}

#[async_trait]
impl LookupTables for SplitTables {
    async fn paged_edge_sets(
        &self,
        tickets: &[String],
    ) -> Result<mpsc::Receiver<EdgeSetResult>, TableError> {
        let keys = tickets
            .iter()
            .map(|ticket| ticket.as_bytes().to_vec())
            .collect();
        stream_edge_sets(self.edge_sets.as_ref(), keys, 0).await
    }

    async fn edge_page(&self, key: &str) -> Result<EdgePage, TableError> {
        lookup_record(self.edge_pages.as_ref(), key.as_bytes()).await
    }

    async fn file_decorations(&self, ticket: &str) -> Result<FileDecorations, TableError> {
        lookup_record(self.decorations.as_ref(), ticket.as_bytes()).await
    }

    async fn cross_references(&self, ticket: &str) -> Result<PagedCrossReferences, TableError> {
        lookup_record(self.cross_references.as_ref(), ticket.as_bytes()).await
    }

    async fn cross_references_page(&self, key: &str) -> Result<CrossReferencesPage, TableError> {
        lookup_record(self.cross_reference_pages.as_ref(), key.as_bytes()).await
    }
}

/// One table holding every record kind behind the literal key prefixes.
#[derive(Clone)]
pub struct CombinedTable {
    table: Arc<dyn Table>,
}

impl CombinedTable {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl LookupTables for CombinedTable {
    async fn paged_edge_sets(
        &self,
        tickets: &[String],
    ) -> Result<mpsc::Receiver<EdgeSetResult>, TableError> {
        let keys = tickets.iter().map(|ticket| edge_set_key(ticket)).collect();
        stream_edge_sets(self.table.as_ref(), keys, EDGE_SETS_PREFIX.len()).await
    }

    async fn edge_page(&self, key: &str) -> Result<EdgePage, TableError> {
        lookup_record(self.table.as_ref(), &edge_page_key(key)).await
    }

    async fn file_decorations(&self, ticket: &str) -> Result<FileDecorations, TableError> {
        lookup_record(self.table.as_ref(), &decorations_key(ticket)).await
    }

    async fn cross_references(&self, ticket: &str) -> Result<PagedCrossReferences, TableError> {
        lookup_record(self.table.as_ref(), &cross_references_key(ticket)).await
    }

    async fn cross_references_page(&self, key: &str) -> Result<CrossReferencesPage, TableError> {
        lookup_record(self.table.as_ref(), &cross_references_page_key(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_keys_carry_their_prefixes() {
        assert_eq!(edge_set_key("kythe://c#n"), b"edgeSets:kythe://c#n");
        assert_eq!(edge_page_key("p1"), b"edgePages:p1");
        assert_eq!(decorations_key("t"), b"decor:t");
        assert_eq!(cross_references_key("t"), b"xrefs:t");
        assert_eq!(cross_references_page_key("p"), b"xrefPages:p");
    }
}
