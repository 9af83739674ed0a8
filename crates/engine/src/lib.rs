//! Serving-table implementation of the cross-reference service.
//!
//! Answers the Nodes, Edges, Decorations, and CrossReferences queries
//! from an immutable, pre-paginated serving corpus held in a key-value
//! store. The corpus may live in five per-kind tables or in one combined
//! table whose keys carry literal prefixes:
//!
//! ```text
//! edgeSets:<ticket>     -> PagedEdgeSet
//! edgePages:<page_key>  -> EdgePage
//! decor:<ticket>        -> FileDecorations
//! xrefs:<ticket>        -> PagedCrossReferences
//! xrefPages:<page_key>  -> CrossReferencesPage
//! ```

mod decorations;
mod error;
mod filter;
mod lookup;
mod pagination;
mod service;
mod xrefs;

pub use error::{Result, ServingError};
pub use filter::{convert_filters, matches_any};
pub use lookup::{
    cross_references_key, cross_references_page_key, decorations_key, edge_page_key, edge_set_key,
    CombinedTable, EdgeSetResult, LookupTables, SplitTables, CROSS_REFERENCES_PAGES_PREFIX,
    CROSS_REFERENCES_PREFIX, DECORATIONS_PREFIX, EDGE_PAGES_PREFIX, EDGE_SETS_PREFIX,
};
pub use pagination::{
    decode_page_token, encode_page_token, resolve_page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use service::ServingTable;
