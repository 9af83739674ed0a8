//! Request and reply types for the cross-reference service.
//!
//! These are the wire-adjacent types a code-navigation front end exchanges
//! with the serving engine: node facts, edge sets, file decorations, and
//! cross-reference sets. Serving-side storage records live in
//! `xref-serving`; this crate only carries the query surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A position inside a file, expressed both as a byte offset and as a
/// line/column pair so clients can use whichever form they render.
///
/// `line_number` is 1-based; `column_offset` is the byte offset within the
/// line. A zeroed point refers to the start of the file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub byte_offset: i32,
    pub line_number: i32,
    pub column_offset: i32,
}

/// A half-open `[start, end)` region of a file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    pub start: Point,
    pub end: Point,
}

/// A single named fact attached to a node (e.g. `/kythe/node/kind`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    #[serde(default)]
    pub value: Vec<u8>,
}

/// A node plus the facts that survived the caller's fact-name filters,
/// sorted lexicographically by fact name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub ticket: String,
    pub fact: Vec<Fact>,
}

/// How a request location addresses a file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// The entire file named by the ticket.
    #[default]
    File,
    /// The `[start, end)` region of the file named by the ticket.
    Span,
}

/// A file location, either the whole file or a span within it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub ticket: String,
    pub kind: LocationKind,
    pub start: Option<Point>,
    pub end: Option<Point>,
}

/// Span-containment policy for decoration filtering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Only anchors entirely inside the requested span.
    #[default]
    WithinSpan,
    /// Anchors that surround the requested span.
    AroundSpan,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesRequest {
    pub ticket: Vec<String>,
    /// Fact-name filter patterns; empty means all facts.
    pub filter: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesReply {
    pub node: Vec<NodeInfo>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgesRequest {
    pub ticket: Vec<String>,
    /// Edge-kind allowlist; empty means all kinds.
    pub kind: Vec<String>,
    /// Fact-name filter patterns; empty suppresses the `node` projection.
    pub filter: Vec<String>,
    pub page_size: i32,
    pub page_token: String,
}

/// One edge in a reply group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSetEdge {
    pub target_ticket: String,
    #[serde(default)]
    pub ordinal: u32,
}

/// All returned edges of one kind out of a single source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSetGroup {
    pub kind: String,
    pub edge: Vec<EdgeSetEdge>,
}

/// The returned edge groups of one source ticket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSet {
    pub source_ticket: String,
    pub group: Vec<EdgeSetGroup>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgesReply {
    pub edge_set: Vec<EdgeSet>,
    /// Fact projections for sources and targets, deduplicated by ticket.
    pub node: Vec<NodeInfo>,
    /// Continuation token; empty when the reply is the last page.
    pub next_page_token: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationsRequest {
    pub location: Option<Location>,
    pub span_kind: SpanKind,
    /// Caller-modified file contents; anchors are patched against it.
    pub dirty_buffer: Vec<u8>,
    pub source_text: bool,
    pub references: bool,
    /// Resolve each reference target to its single binding definition.
    pub target_definitions: bool,
    pub filter: Vec<String>,
}

/// One decorated anchor: a span of the file referencing a target node.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub source_ticket: String,
    pub target_ticket: String,
    pub kind: String,
    pub anchor_start: Point,
    pub anchor_end: Point,
    /// Anchor ticket of the target's definition, when uniquely resolved.
    pub target_definition: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationsReply {
    pub location: Location,
    pub source_text: Vec<u8>,
    pub encoding: String,
    pub reference: Vec<Reference>,
    pub node: Vec<NodeInfo>,
    /// Definition anchors keyed by their tickets, referenced from
    /// `Reference::target_definition`.
    pub definition_locations: BTreeMap<String, Anchor>,
}

/// A fully resolved anchor, with every span expressed as [`Point`]s.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchor {
    pub ticket: String,
    pub kind: String,
    /// Ticket of the file containing the anchor.
    pub parent: String,
    /// The anchor's text; populated only when the caller asked for it.
    pub text: String,
    pub start: Point,
    pub end: Point,
    pub snippet: String,
    pub snippet_start: Point,
    pub snippet_end: Point,
}

/// Which definition anchors a cross-reference request selects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    #[default]
    NoDefinitions,
    AllDefinitions,
    FullDefinitions,
    BindingDefinitions,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    #[default]
    NoDeclarations,
    AllDeclarations,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    #[default]
    NoReferences,
    AllReferences,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentationKind {
    #[default]
    NoDocumentation,
    AllDocumentation,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferencesRequest {
    pub ticket: Vec<String>,
    pub definition_kind: DefinitionKind,
    pub declaration_kind: DeclarationKind,
    pub reference_kind: ReferenceKind,
    pub documentation_kind: DocumentationKind,
    /// Include each anchor's text in the reply.
    pub anchor_text: bool,
    /// Fact-name filter patterns; non-empty enables the related-nodes
    /// phase.
    pub filter: Vec<String>,
    pub page_size: i32,
    pub page_token: String,
}

/// A node related to the requested ticket by a non-anchor edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedNode {
    pub relation_kind: String,
    pub ticket: String,
    #[serde(default)]
    pub ordinal: u32,
}

/// All cross-references of one requested ticket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferenceSet {
    pub ticket: String,
    pub definition: Vec<Anchor>,
    pub declaration: Vec<Anchor>,
    pub reference: Vec<Anchor>,
    pub documentation: Vec<Anchor>,
    pub related_node: Vec<RelatedNode>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferencesReply {
    pub cross_references: BTreeMap<String, CrossReferenceSet>,
    /// Fact projections for related nodes, keyed by ticket.
    pub nodes: BTreeMap<String, NodeInfo>,
    pub next_page_token: String,
}

impl CrossReferenceSet {
    /// True when no anchor bucket holds any anchors.
    pub fn anchors_empty(&self) -> bool {
        self.definition.is_empty()
            && self.declaration.is_empty()
            && self.reference.is_empty()
            && self.documentation.is_empty()
    }
}

impl Location {
    pub fn file(ticket: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            kind: LocationKind::File,
            start: None,
            end: None,
        }
    }

    pub fn span(ticket: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            ticket: ticket.into(),
            kind: LocationKind::Span,
            start: Some(start),
            end: Some(end),
        }
    }
}

impl Point {
    pub const fn at_offset(byte_offset: i32) -> Self {
        Self {
            byte_offset,
            line_number: 0,
            column_offset: 0,
        }
    }
}
