//! Shared corpus fixtures for the engine's integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use xref_engine::{
    cross_references_key, cross_references_page_key, decorations_key, edge_page_key, edge_set_key,
    ServingTable, SplitTables,
};
use xref_protocol::{EdgesReply, Fact, Point, Span};
use xref_serving::{
    CrossReferencesGroup, CrossReferencesPage, Decoration, Edge, EdgeGroup, EdgePage,
    ExpandedAnchor, File, FileDecorations, Node, PageIndex, PagedCrossReferences, PagedEdgeSet,
    RawAnchor,
};
use xref_store::{BatchEntry, MemoryTable, Result as TableResult, Table};

pub const REF: &str = "/kythe/edge/ref";
pub const DEF: &str = "/kythe/edge/defines";
pub const DEF_BINDING: &str = "/kythe/edge/defines/binding";
pub const DOCUMENTS: &str = "/kythe/edge/documents";
pub const CHILD_OF: &str = "/kythe/edge/childof";
pub const REV_CALLABLE_AS: &str = "%/kythe/edge/callableas";

pub fn ticket(signature: &str) -> String {
    format!("kythe://test#{signature}")
}

pub fn file_ticket(path: &str) -> String {
    format!("kythe://test?path={path}")
}

pub fn node(signature: &str) -> Node {
    Node::new(ticket(signature))
}

pub fn node_with_facts(signature: &str, facts: &[(&str, &str)]) -> Node {
    Node {
        ticket: ticket(signature),
        fact: facts
            .iter()
            .map(|(name, value)| Fact {
                name: name.to_string(),
                value: value.as_bytes().to_vec(),
            })
            .collect(),
    }
}

pub fn edge(target_signature: &str, ordinal: u32) -> Edge {
    Edge {
        target: node(target_signature),
        ordinal,
    }
}

pub fn edge_to(target: Node, ordinal: u32) -> Edge {
    Edge { target, ordinal }
}

pub fn group(kind: &str, edges: Vec<Edge>) -> EdgeGroup {
    EdgeGroup {
        kind: kind.to_string(),
        edge: edges,
    }
}

pub fn page_index(key: &str, kind: &str, count: u32) -> PageIndex {
    PageIndex {
        page_key: key.to_string(),
        edge_kind: kind.to_string(),
        edge_count: count,
    }
}

/// Builds a `PagedEdgeSet` with a consistent `total_edges`.
pub fn edge_set(source: Node, groups: Vec<EdgeGroup>, pages: Vec<PageIndex>) -> PagedEdgeSet {
    let total_edges = groups.iter().map(|g| g.edge.len() as u32).sum::<u32>()
        + pages.iter().map(|p| p.edge_count).sum::<u32>();
    PagedEdgeSet {
        source,
        group: groups,
        page_index: pages,
        total_edges,
    }
}

pub fn anchor(signature: &str, parent_path: &str, start: i32, end: i32, text: &str) -> ExpandedAnchor {
    ExpandedAnchor {
        ticket: ticket(signature),
        kind: String::new(),
        parent: file_ticket(parent_path),
        text: text.to_string(),
        span: Span {
            start: Point::at_offset(start),
            end: Point::at_offset(end),
        },
        snippet: String::new(),
        snippet_span: Span::default(),
    }
}

pub fn xref_group(kind: &str, anchors: Vec<ExpandedAnchor>) -> CrossReferencesGroup {
    CrossReferencesGroup {
        kind: kind.to_string(),
        anchor: anchors,
    }
}

pub fn decoration(anchor_signature: &str, start: i32, end: i32, target: Node, kind: &str) -> Decoration {
    Decoration {
        anchor: RawAnchor {
            ticket: ticket(anchor_signature),
            start_offset: start,
            end_offset: end,
        },
        target,
        kind: kind.to_string(),
    }
}

pub fn file_decorations(text: &[u8], decorations: Vec<Decoration>) -> FileDecorations {
    FileDecorations {
        file: File {
            text: text.to_vec(),
            encoding: "UTF-8".to_string(),
        },
        decoration: decorations,
    }
}

/// A corpus under assembly; materializes as a combined or a split
/// serving table over in-memory storage.
#[derive(Default, Clone)]
pub struct Corpus {
    edge_sets: Vec<PagedEdgeSet>,
    edge_pages: Vec<(String, EdgePage)>,
    decorations: Vec<(String, FileDecorations)>,
    cross_references: Vec<PagedCrossReferences>,
    cross_reference_pages: Vec<CrossReferencesPage>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge_set(&mut self, record: PagedEdgeSet) -> &mut Self {
        self.edge_sets.push(record);
        self
    }

    pub fn add_edge_page(&mut self, key: &str, source: &Node, kind: &str, edges: Vec<Edge>) -> &mut Self {
        self.edge_pages.push((
            key.to_string(),
            EdgePage {
                source_ticket: source.ticket.clone(),
                edges_group: EdgeGroup {
                    kind: kind.to_string(),
                    edge: edges,
                },
            },
        ));
        self
    }

    pub fn add_decorations(&mut self, file: &str, record: FileDecorations) -> &mut Self {
        self.decorations.push((file_ticket(file), record));
        self
    }

    pub fn add_cross_references(&mut self, record: PagedCrossReferences) -> &mut Self {
        self.cross_references.push(record);
        self
    }

    pub fn add_cross_reference_page(
        &mut self,
        key: &str,
        source: &str,
        group: CrossReferencesGroup,
    ) -> &mut Self {
        self.cross_reference_pages.push(CrossReferencesPage {
            page_key: key.to_string(),
            source_ticket: ticket(source),
            group,
        });
        self
    }

    /// Materializes the combined single-keyspace table.
    pub fn combined_table(&self) -> MemoryTable {
        let table = MemoryTable::new();
        for record in &self.edge_sets {
            table
                .insert_record(edge_set_key(&record.source.ticket), record)
                .expect("encode edge set");
        }
        for (key, record) in &self.edge_pages {
            table
                .insert_record(edge_page_key(key), record)
                .expect("encode edge page");
        }
        for (ticket, record) in &self.decorations {
            table
                .insert_record(decorations_key(ticket), record)
                .expect("encode decorations");
        }
        for record in &self.cross_references {
            table
                .insert_record(cross_references_key(&record.source_ticket), record)
                .expect("encode cross-references");
        }
        for record in &self.cross_reference_pages {
            table
                .insert_record(cross_references_page_key(&record.page_key), record)
                .expect("encode cross-references page");
        }
        table
    }

    pub fn combined(&self) -> ServingTable {
        ServingTable::with_combined(Arc::new(self.combined_table()))
    }

    /// Materializes five per-kind tables keyed by raw tickets and page
    /// keys.
    pub fn split(&self) -> ServingTable {
        let edge_sets = MemoryTable::new();
        for record in &self.edge_sets {
            edge_sets
                .insert_record(record.source.ticket.as_bytes(), record)
                .expect("encode edge set");
        }
        let edge_pages = MemoryTable::new();
        for (key, record) in &self.edge_pages {
            edge_pages
                .insert_record(key.as_bytes(), record)
                .expect("encode edge page");
        }
        let decorations = MemoryTable::new();
        for (ticket, record) in &self.decorations {
            decorations
                .insert_record(ticket.as_bytes(), record)
                .expect("encode decorations");
        }
        let cross_references = MemoryTable::new();
        for record in &self.cross_references {
            cross_references
                .insert_record(record.source_ticket.as_bytes(), record)
                .expect("encode cross-references");
        }
        let cross_reference_pages = MemoryTable::new();
        for record in &self.cross_reference_pages {
            cross_reference_pages
                .insert_record(record.page_key.as_bytes(), record)
                .expect("encode cross-references page");
        }
        ServingTable::with_split(SplitTables {
            edge_sets: Arc::new(edge_sets),
            edge_pages: Arc::new(edge_pages),
            decorations: Arc::new(decorations),
            cross_references: Arc::new(cross_references),
            cross_reference_pages: Arc::new(cross_reference_pages),
        })
    }

    /// Combined serving table that records every key the store is asked
    /// for.
    pub fn recording(&self) -> (ServingTable, RecordingTable) {
        let recorder = RecordingTable::new(self.combined_table());
        let serving = ServingTable::with_combined(Arc::new(recorder.clone()));
        (serving, recorder)
    }
}

/// Table wrapper that logs every requested key.
#[derive(Clone)]
pub struct RecordingTable {
    inner: MemoryTable,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingTable {
    pub fn new(inner: MemoryTable) -> Self {
        Self {
            inner,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }

    pub fn clear(&self) {
        self.log.lock().expect("log lock").clear();
    }

    fn record(&self, key: &[u8]) {
        self.log
            .lock()
            .expect("log lock")
            .push(String::from_utf8_lossy(key).into_owned());
    }
}

#[async_trait]
impl Table for RecordingTable {
    async fn lookup(&self, key: &[u8]) -> TableResult<Vec<u8>> {
        self.record(key);
        self.inner.lookup(key).await
    }

    async fn lookup_batch(&self, keys: Vec<Vec<u8>>) -> TableResult<mpsc::Receiver<BatchEntry>> {
        for key in &keys {
            self.record(key);
        }
        self.inner.lookup_batch(keys).await
    }
}

/// Flattens an edges reply into `(source, target, ordinal)` rows in
/// emission order.
pub fn flat_edges(reply: &EdgesReply) -> Vec<(String, String, u32)> {
    let mut rows = Vec::new();
    for edge_set in &reply.edge_set {
        for group in &edge_set.group {
            for edge in &group.edge {
                rows.push((
                    edge_set.source_ticket.clone(),
                    edge.target_ticket.clone(),
                    edge.ordinal,
                ));
            }
        }
    }
    rows
}
