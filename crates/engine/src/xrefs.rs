use crate::error::{Result, ServingError};
use crate::pagination::{
    decode_page_token, encode_page_token, resolve_page_size, token_index, FilterStats,
};
use crate::service::{EdgesQuery, KindFilter, ServingTable};
use std::collections::HashSet;
use xref_protocol::{
    Anchor, CrossReferenceSet, CrossReferencesReply, CrossReferencesRequest, DeclarationKind,
    DefinitionKind, DocumentationKind, ReferenceKind, RelatedNode,
};
use xref_schema::{
    canonicalize, fix_tickets, is_anchor_edge, is_decl_kind, is_def_kind, is_doc_kind, is_ref_kind,
};
use xref_serving::{ExpandedAnchor, PageToken};
use xref_store::TableError;

/// Which reply bucket a stored group lands in.
#[derive(Debug, Clone, Copy)]
enum AnchorBucket {
    Definition,
    Declaration,
    Documentation,
    Reference,
}

impl ServingTable {
    /// Returns a page of the requested tickets' cross-references:
    /// anchors bucketed as definition/declaration/reference/
    /// documentation, then related non-anchor nodes when the caller
    /// supplied fact filters. Both phases share one compound page token.
    pub async fn cross_references(
        &self,
        req: &CrossReferencesRequest,
    ) -> Result<CrossReferencesReply> {
        let tickets = fix_tickets(&req.ticket)?;
        let max = resolve_page_size(req.page_size)?;
        let token = decode_page_token(&req.page_token)?;
        let page_token_start = token.index as usize;
        let edges_page_token = token.secondary_token;

        let mut stats = FilterStats::new(max, page_token_start);
        let mut total_refs_possible = 0usize;
        let mut reply = CrossReferencesReply::default();
        let mut next_token: Option<PageToken> = None;

        let wants_anchors = req.definition_kind != DefinitionKind::NoDefinitions
            || req.declaration_kind != DeclarationKind::NoDeclarations
            || req.reference_kind != ReferenceKind::NoReferences
            || req.documentation_kind != DocumentationKind::NoDocumentation;

        // A non-empty secondary token means a previous page already
        // exhausted the anchors; only the related-nodes tail remains.
        if edges_page_token.is_empty() && wants_anchors {
            for ticket in &tickets {
                let record = match self.tables().cross_references(ticket).await {
                    Ok(record) => record,
                    Err(TableError::NoSuchKey) => {
                        log::info!("missing cross-references for {ticket:?}");
                        continue;
                    }
                    Err(err) => {
                        return Err(ServingError::store(
                            format!("error looking up cross-references for ticket {ticket:?}"),
                            err,
                        ))
                    }
                };

                let mut crs = CrossReferenceSet {
                    ticket: ticket.clone(),
                    ..Default::default()
                };

                for group in &record.group {
                    let Some(bucket) = classify_group(req, &group.kind, record.incomplete) else {
                        continue;
                    };
                    total_refs_possible += group.anchor.len();
                    if add_anchors(
                        &mut stats,
                        bucket_slot(&mut crs, bucket),
                        &group.anchor,
                        req.anchor_text,
                    ) {
                        break;
                    }
                }

                if !stats.is_full() {
                    for idx in &record.page_index {
                        if stats.skip_page(idx.count as usize) {
                            log::debug!("skipping cross-references page {:?}", idx.page_key);
                            total_refs_possible += idx.count as usize;
                            continue;
                        }

                        log::debug!("retrieving cross-references page {:?}", idx.page_key);
                        let page = match self.tables().cross_references_page(&idx.page_key).await {
                            Ok(page) => page,
                            Err(TableError::NoSuchKey) => {
                                return Err(ServingError::MissingCrossReferencesPage(
                                    idx.page_key.clone(),
                                ))
                            }
                            Err(err) => {
                                return Err(ServingError::store(
                                    format!(
                                        "cross-references page lookup error (page key {:?})",
                                        idx.page_key
                                    ),
                                    err,
                                ))
                            }
                        };

                        // Unclassified page groups fall back to the
                        // reference bucket.
                        let bucket = classify_group(req, &page.group.kind, record.incomplete)
                            .unwrap_or(AnchorBucket::Reference);
                        total_refs_possible += page.group.anchor.len();
                        if add_anchors(
                            &mut stats,
                            bucket_slot(&mut crs, bucket),
                            &page.group.anchor,
                            req.anchor_text,
                        ) {
                            break;
                        }
                    }
                }

                if !crs.anchors_empty() {
                    reply.cross_references.insert(crs.ticket.clone(), crs);
                }
            }

            if page_token_start + stats.total < total_refs_possible && stats.total != 0 {
                next_token = Some(PageToken {
                    index: token_index(page_token_start + stats.total)?,
                    secondary_token: String::new(),
                });
            }
        }

        if !req.filter.is_empty() && !stats.is_full() {
            let edges = self
                .edges_query(EdgesQuery {
                    tickets: tickets.clone(),
                    filters: req.filter.clone(),
                    kinds: KindFilter::NonAnchor,
                    page_size: (stats.max - stats.total) as i32,
                    page_token: edges_page_token,
                })
                .await
                .map_err(|err| ServingError::RelatedNodes(Box::new(err)))?;

            for edge_set in &edges.edge_set {
                let mut related: Vec<RelatedNode> = Vec::new();
                let mut target_tickets: HashSet<&str> = HashSet::new();
                for group in &edge_set.group {
                    if is_anchor_edge(&group.kind) {
                        continue;
                    }
                    for edge in &group.edge {
                        target_tickets.insert(&edge.target_ticket);
                        related.push(RelatedNode {
                            relation_kind: group.kind.clone(),
                            ticket: edge.target_ticket.clone(),
                            ordinal: edge.ordinal,
                        });
                    }
                }

                if !target_tickets.is_empty() {
                    for node in &edges.node {
                        if target_tickets.contains(node.ticket.as_str()) {
                            reply.nodes.insert(node.ticket.clone(), node.clone());
                        }
                    }
                }
                if related.is_empty() {
                    continue;
                }
                match reply.cross_references.get_mut(&edge_set.source_ticket) {
                    Some(crs) => crs.related_node.extend(related),
                    None => {
                        reply.cross_references.insert(
                            edge_set.source_ticket.clone(),
                            CrossReferenceSet {
                                ticket: edge_set.source_ticket.clone(),
                                related_node: related,
                                ..Default::default()
                            },
                        );
                    }
                }
            }

            // An inner continuation supersedes any anchor token: anchors
            // are exhausted once this phase runs.
            if !edges.next_page_token.is_empty() {
                next_token = Some(PageToken {
                    index: 0,
                    secondary_token: edges.next_page_token.clone(),
                });
            }
        }

        if let Some(token) = next_token {
            reply.next_page_token = encode_page_token(&token)?;
        }
        Ok(reply)
    }
}

fn classify_group(
    req: &CrossReferencesRequest,
    kind: &str,
    incomplete: bool,
) -> Option<AnchorBucket> {
    if is_def_kind(req.definition_kind, kind, incomplete) {
        Some(AnchorBucket::Definition)
    } else if is_decl_kind(req.declaration_kind, kind, incomplete) {
        Some(AnchorBucket::Declaration)
    } else if is_doc_kind(req.documentation_kind, kind) {
        Some(AnchorBucket::Documentation)
    } else if is_ref_kind(req.reference_kind, kind) {
        Some(AnchorBucket::Reference)
    } else {
        None
    }
}

fn bucket_slot(crs: &mut CrossReferenceSet, bucket: AnchorBucket) -> &mut Vec<Anchor> {
    match bucket {
        AnchorBucket::Definition => &mut crs.definition,
        AnchorBucket::Declaration => &mut crs.declaration,
        AnchorBucket::Documentation => &mut crs.documentation,
        AnchorBucket::Reference => &mut crs.reference,
    }
}

/// Anchor-tuned filter kernel: applies skip/limit to one group's anchors
/// and appends the survivors. Returns true once the page is full.
fn add_anchors(
    stats: &mut FilterStats,
    to: &mut Vec<Anchor>,
    anchors: &[ExpandedAnchor],
    anchor_text: bool,
) -> bool {
    if stats.is_full() {
        return true;
    }
    if let Some(window) = stats.filter_window(anchors) {
        to.extend(
            window
                .iter()
                .map(|anchor| anchor_to_reply(anchor, anchor_text)),
        );
    }
    stats.is_full()
}

fn anchor_to_reply(anchor: &ExpandedAnchor, anchor_text: bool) -> Anchor {
    Anchor {
        ticket: anchor.ticket.clone(),
        kind: canonicalize(&anchor.kind).to_string(),
        parent: anchor.parent.clone(),
        text: if anchor_text {
            anchor.text.clone()
        } else {
            String::new()
        },
        start: anchor.span.start,
        end: anchor.span.end,
        snippet: anchor.snippet.clone(),
        snippet_start: anchor.snippet_span.start,
        snippet_end: anchor.snippet_span.end,
    }
}
