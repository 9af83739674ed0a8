//! Records of the pre-computed serving corpus.
//!
//! The offline indexing pipeline writes these records into a key-value
//! store; the serving engine reads them and never mutates them. Edge sets
//! and cross-reference sets are pre-paginated: "popular" entries are
//! stored inline and overflow lives in detachable pages fetched on demand.

use serde::{Deserialize, Serialize};
use xref_protocol::{Fact, Span};

/// A stored node: its ticket plus every known fact.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub ticket: String,
    pub fact: Vec<Fact>,
}

impl Node {
    pub fn new(ticket: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            fact: Vec::new(),
        }
    }
}

/// One outgoing edge, carrying its fully materialized target node so fact
/// projection needs no second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub target: Node,
    #[serde(default)]
    pub ordinal: u32,
}

/// An ordered run of edges sharing one kind.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeGroup {
    pub kind: String,
    pub edge: Vec<Edge>,
}

/// Directory entry for a detached [`EdgePage`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageIndex {
    pub page_key: String,
    pub edge_kind: String,
    pub edge_count: u32,
}

/// The complete edge record of one source ticket.
///
/// `total_edges` equals the inline edge count plus the sum of
/// `page_index[..].edge_count`; the offline pipeline maintains that
/// invariant.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagedEdgeSet {
    pub source: Node,
    pub group: Vec<EdgeGroup>,
    pub page_index: Vec<PageIndex>,
    pub total_edges: u32,
}

/// An overflow page holding a single edge group of one kind.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgePage {
    pub source_ticket: String,
    pub edges_group: EdgeGroup,
}

/// Stored text and encoding of one file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub text: Vec<u8>,
    pub encoding: String,
}

/// The stored byte span of an anchor node inside its file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAnchor {
    pub ticket: String,
    pub start_offset: i32,
    pub end_offset: i32,
}

/// A (span, target, kind) tuple rendering one reference in a code view.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decoration {
    pub anchor: RawAnchor,
    pub target: Node,
    pub kind: String,
}

/// All decorations of one file, ordered by anchor start offset.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDecorations {
    pub file: File,
    pub decoration: Vec<Decoration>,
}

/// An anchor with every span pre-resolved by the offline pipeline.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandedAnchor {
    pub ticket: String,
    pub kind: String,
    /// Ticket of the file containing the anchor.
    pub parent: String,
    pub text: String,
    pub span: Span,
    pub snippet: String,
    pub snippet_span: Span,
}

/// An ordered run of cross-reference anchors sharing one edge kind.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferencesGroup {
    pub kind: String,
    pub anchor: Vec<ExpandedAnchor>,
}

/// Directory entry for a detached [`CrossReferencesPage`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferencesPageIndex {
    pub page_key: String,
    pub kind: String,
    pub count: u32,
}

/// The complete cross-reference record of one node ticket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagedCrossReferences {
    pub source_ticket: String,
    /// Set when the corpus holds no complete definition for the node;
    /// definition groups of an incomplete set classify as declarations.
    pub incomplete: bool,
    pub group: Vec<CrossReferencesGroup>,
    pub page_index: Vec<CrossReferencesPageIndex>,
}

/// An overflow page holding a single cross-reference group.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferencesPage {
    pub page_key: String,
    pub source_ticket: String,
    pub group: CrossReferencesGroup,
}

/// Continuation cursor carried inside the opaque page token.
///
/// `index` counts items already emitted; `secondary_token`, when
/// non-empty, is an inner edges-page token for the related-nodes tail of
/// a cross-references request.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageToken {
    pub index: i32,
    pub secondary_token: String,
}
