use crate::error::{Result, ServingError};
use crate::filter::{convert_filters, node_to_info};
use crate::lookup::{CombinedTable, LookupTables, SplitTables};
use crate::pagination::{
    decode_page_token, encode_page_token, resolve_page_size, token_index, FilterStats,
};
use std::collections::HashSet;
use std::sync::Arc;
use xref_protocol::{
    EdgeSet, EdgeSetEdge, EdgeSetGroup, EdgesReply, EdgesRequest, NodeInfo, NodesReply,
    NodesRequest,
};
use xref_schema::{fix_tickets, is_anchor_edge};
use xref_serving::{PageToken, PagedEdgeSet};
use xref_store::{Table, TableError};

/// The serving engine: answers the four cross-reference queries from
/// static lookup tables.
///
/// All served records are immutable; per-request state lives on the
/// stack of each call.
pub struct ServingTable {
    tables: Arc<dyn LookupTables>,
}

impl ServingTable {
    pub fn new(tables: Arc<dyn LookupTables>) -> Self {
        Self { tables }
    }

    /// Serves from five per-kind tables.
    pub fn with_split(tables: SplitTables) -> Self {
        Self::new(Arc::new(tables))
    }

    /// Serves from one combined table whose keys carry the literal
    /// record-kind prefixes.
    pub fn with_combined(table: Arc<dyn Table>) -> Self {
        Self::new(Arc::new(CombinedTable::new(table)))
    }

    pub(crate) fn tables(&self) -> &dyn LookupTables {
        self.tables.as_ref()
    }

    /// Returns the requested nodes' facts, filtered by the request
    /// patterns. An empty filter list returns every fact; a node with no
    /// surviving facts is omitted.
    pub async fn nodes(&self, req: &NodesRequest) -> Result<NodesReply> {
        let tickets = fix_tickets(&req.ticket)?;
        let patterns = convert_filters(&req.filter);

        let mut rs = self
            .tables
            .paged_edge_sets(&tickets)
            .await
            .map_err(|err| ServingError::store("edge sets batch lookup error", err))?;

        let mut reply = NodesReply::default();
        while let Some(item) = rs.recv().await {
            let pes = match item.result {
                Ok(pes) => pes,
                Err(TableError::NoSuchKey) => continue,
                Err(err) => {
                    return Err(ServingError::store(
                        format!("edges lookup error (ticket {:?})", item.ticket),
                        err,
                    ))
                }
            };

            let mut info = NodeInfo {
                ticket: pes.source.ticket,
                fact: Vec::new(),
            };
            for fact in pes.source.fact {
                if patterns.is_empty() || crate::filter::matches_any(&fact.name, &patterns) {
                    info.fact.push(fact);
                }
            }
            if !info.fact.is_empty() {
                info.fact.sort_by(|a, b| a.name.cmp(&b.name));
                reply.node.push(info);
            }
        }
        Ok(reply)
    }

    /// Returns a page of the requested tickets' outgoing edges.
    pub async fn edges(&self, req: &EdgesRequest) -> Result<EdgesReply> {
        let tickets = fix_tickets(&req.ticket)?;
        let allowed: HashSet<String> = req.kind.iter().cloned().collect();
        let kinds = if allowed.is_empty() {
            KindFilter::All
        } else {
            KindFilter::Allow(allowed)
        };
        self.edges_query(EdgesQuery {
            tickets,
            filters: req.filter.clone(),
            kinds,
            page_size: req.page_size,
            page_token: req.page_token.clone(),
        })
        .await
    }

    /// Shared edges walk, also driven by the cross-references engine for
    /// its related-nodes tail.
    pub(crate) async fn edges_query(&self, req: EdgesQuery) -> Result<EdgesReply> {
        let max = resolve_page_size(req.page_size)?;
        let token = decode_page_token(&req.page_token)?;
        let page_token_start = token.index as usize;
        let mut stats = FilterStats::new(max, page_token_start);

        let patterns = convert_filters(&req.filters);
        let mut total_edges_possible = 0usize;
        let mut node_tickets: HashSet<String> = HashSet::new();

        let mut rs = self
            .tables
            .paged_edge_sets(&req.tickets)
            .await
            .map_err(|err| ServingError::store("edge sets batch lookup error", err))?;

        let mut reply = EdgesReply::default();
        while let Some(item) = rs.recv().await {
            let pes = match item.result {
                Ok(pes) => pes,
                Err(TableError::NoSuchKey) => continue,
                Err(err) => {
                    return Err(ServingError::store(
                        format!("edges lookup error (ticket {:?})", item.ticket),
                        err,
                    ))
                }
            };
            total_edges_possible += total_edges_with_kinds(&pes, &req.kinds);

            // The count above is needed from every record; keep receiving
            // even once the page is full.
            if stats.is_full() {
                continue;
            }

            let mut groups: Vec<EdgeSetGroup> = Vec::new();
            for group in &pes.group {
                if !req.kinds.passes(&group.kind) {
                    continue;
                }
                if let Some(window) = stats.filter_window(&group.edge) {
                    if !patterns.is_empty() {
                        for edge in window {
                            if node_tickets.insert(edge.target.ticket.clone()) {
                                reply.node.push(node_to_info(&patterns, &edge.target));
                            }
                        }
                    }
                    groups.push(EdgeSetGroup {
                        kind: group.kind.clone(),
                        edge: window
                            .iter()
                            .map(|edge| EdgeSetEdge {
                                target_ticket: edge.target.ticket.clone(),
                                ordinal: edge.ordinal,
                            })
                            .collect(),
                    });
                    if stats.is_full() {
                        break;
                    }
                }
            }

            if !stats.is_full() {
                for idx in &pes.page_index {
                    if !req.kinds.passes(&idx.edge_kind) {
                        continue;
                    }
                    if stats.skip_page(idx.edge_count as usize) {
                        log::debug!("skipping edge page {:?}", idx.page_key);
                        continue;
                    }

                    log::debug!("retrieving edge page {:?}", idx.page_key);
                    let page = match self.tables.edge_page(&idx.page_key).await {
                        Ok(page) => page,
                        Err(TableError::NoSuchKey) => {
                            return Err(ServingError::MissingEdgePage(idx.page_key.clone()))
                        }
                        Err(err) => {
                            return Err(ServingError::store(
                                format!("edge page lookup error (page key {:?})", idx.page_key),
                                err,
                            ))
                        }
                    };

                    if let Some(window) = stats.filter_window(&page.edges_group.edge) {
                        if !patterns.is_empty() {
                            for edge in window {
                                if node_tickets.insert(edge.target.ticket.clone()) {
                                    reply.node.push(node_to_info(&patterns, &edge.target));
                                }
                            }
                        }
                        groups.push(EdgeSetGroup {
                            kind: page.edges_group.kind.clone(),
                            edge: window
                                .iter()
                                .map(|edge| EdgeSetEdge {
                                    target_ticket: edge.target.ticket.clone(),
                                    ordinal: edge.ordinal,
                                })
                                .collect(),
                        });
                        if stats.is_full() {
                            break;
                        }
                    }
                }
            }

            if !groups.is_empty() {
                if !patterns.is_empty() && node_tickets.insert(pes.source.ticket.clone()) {
                    reply.node.push(node_to_info(&patterns, &pes.source));
                }
                reply.edge_set.push(EdgeSet {
                    source_ticket: pes.source.ticket.clone(),
                    group: groups,
                });
            }
        }

        // Accounting violations can only come from engine bugs.
        if stats.total > stats.max {
            panic!(
                "emitted edges exceed page size: {} > {}",
                stats.total, stats.max
            );
        }
        if page_token_start + stats.total > total_edges_possible
            && page_token_start <= total_edges_possible
        {
            panic!(
                "pagination overran the possible edges: {page_token_start}+{} > {total_edges_possible}",
                stats.total
            );
        }

        if page_token_start + stats.total < total_edges_possible && stats.total != 0 {
            reply.next_page_token = encode_page_token(&PageToken {
                index: token_index(page_token_start + stats.total)?,
                secondary_token: String::new(),
            })?;
        }
        Ok(reply)
    }
}

/// Internal edges request: tickets are already canonical and the kind
/// filter is pre-built.
pub(crate) struct EdgesQuery {
    pub tickets: Vec<String>,
    pub filters: Vec<String>,
    pub kinds: KindFilter,
    pub page_size: i32,
    pub page_token: String,
}

/// Which edge kinds a walk admits.
pub(crate) enum KindFilter {
    /// Every kind.
    All,
    /// Only the listed kinds.
    Allow(HashSet<String>),
    /// Every kind that is not an anchor edge.
    NonAnchor,
}

impl KindFilter {
    pub fn passes(&self, kind: &str) -> bool {
        match self {
            Self::All => true,
            Self::Allow(kinds) => kinds.contains(kind),
            Self::NonAnchor => !is_anchor_edge(kind),
        }
    }
}

/// Counts the edges of a record whose kind passes the filter, across
/// inline groups and page indices alike.
fn total_edges_with_kinds(pes: &PagedEdgeSet, kinds: &KindFilter) -> usize {
    if matches!(kinds, KindFilter::All) {
        return pes.total_edges as usize;
    }
    let mut total = 0;
    for group in &pes.group {
        if kinds.passes(&group.kind) {
            total += group.edge.len();
        }
    }
    for idx in &pes.page_index {
        if kinds.passes(&idx.edge_kind) {
            total += idx.edge_count as usize;
        }
    }
    total
}
