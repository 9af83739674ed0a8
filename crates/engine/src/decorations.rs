use crate::error::{Result, ServingError};
use crate::filter::{convert_filters, node_to_info};
use crate::service::ServingTable;
use std::collections::HashMap;
use xref_protocol::{
    CrossReferencesRequest, DecorationsReply, DecorationsRequest, DefinitionKind, LocationKind,
    Reference, SpanKind,
};
use xref_schema::{fix_ticket, mirror_edge, CALLABLE_AS_EDGE, NODE_KIND_FACT};
use xref_store::TableError;
use xref_text::{in_span_bounds, Normalizer, Patcher};

/// Bound on transitive target-definition resolution. Two jumps resolve
/// the callable-to-function indirection; the bound is a behavioral
/// contract, not a tunable.
const MAX_JUMPS: usize = 2;

impl ServingTable {
    /// Returns the decorations of one file: its text, its references
    /// patched against an optional dirty buffer and filtered by span,
    /// and optionally each reference target's unique definition.
    pub async fn decorations(&self, req: &DecorationsRequest) -> Result<DecorationsReply> {
        let location = match &req.location {
            Some(location) if !location.ticket.is_empty() => location,
            _ => return Err(ServingError::MissingLocation),
        };
        let ticket = fix_ticket(&location.ticket)?;

        let decor = match self.tables().file_decorations(&ticket).await {
            Ok(decor) => decor,
            Err(TableError::NoSuchKey) => return Err(ServingError::DecorationsNotFound),
            Err(err) => {
                return Err(ServingError::store(
                    format!("lookup error for file decorations {ticket:?}"),
                    err,
                ))
            }
        };

        let text: &[u8] = if req.dirty_buffer.is_empty() {
            &decor.file.text
        } else {
            &req.dirty_buffer
        };
        let norm = Normalizer::new(text);
        let loc = norm.location(location)?;

        let mut reply = DecorationsReply {
            location: loc.clone(),
            ..Default::default()
        };

        if req.source_text {
            reply.encoding = decor.file.encoding.clone();
            reply.source_text = match loc.kind {
                LocationKind::File => text.to_vec(),
                LocationKind::Span => {
                    let (start, end) = resolved_span(&loc);
                    text[start as usize..end as usize].to_vec()
                }
            };
        }

        if req.references {
            let patterns = convert_filters(&req.filter);
            let patcher = (!req.dirty_buffer.is_empty())
                .then(|| Patcher::new(&decor.file.text, &req.dirty_buffer));

            // The span constraining returned references. A FILE location
            // covers the whole text and forces within-span matching.
            let (start_boundary, end_boundary, span_kind) = match loc.kind {
                LocationKind::File => (0, norm.len() as i32, SpanKind::WithinSpan),
                LocationKind::Span => {
                    let (start, end) = resolved_span(&loc);
                    (start, end, req.span_kind)
                }
            };

            // Reference indices by target ticket, for definition
            // stamping below.
            let mut refs_by_target: HashMap<String, Vec<usize>> = HashMap::new();
            // Maps each jump ticket back to the decorated target whose
            // references it resolves.
            let mut node_targets: HashMap<String, String> = HashMap::new();

            for decoration in &decor.decoration {
                let (start, end, exists) = match &patcher {
                    Some(patcher) => {
                        patcher.patch(decoration.anchor.start_offset, decoration.anchor.end_offset)
                    }
                    None => (
                        decoration.anchor.start_offset,
                        decoration.anchor.end_offset,
                        true,
                    ),
                };
                // An anchor inside an edited region no longer exists.
                if !exists {
                    continue;
                }
                if !in_span_bounds(span_kind, start, end, start_boundary, end_boundary) {
                    continue;
                }

                refs_by_target
                    .entry(decoration.target.ticket.clone())
                    .or_default()
                    .push(reply.reference.len());
                reply.reference.push(Reference {
                    source_ticket: decoration.anchor.ticket.clone(),
                    target_ticket: decoration.target.ticket.clone(),
                    kind: decoration.kind.clone(),
                    anchor_start: norm.byte_offset(start),
                    anchor_end: norm.byte_offset(end),
                    target_definition: String::new(),
                });

                if !patterns.is_empty() && !node_targets.contains_key(&decoration.target.ticket) {
                    reply.node.push(node_to_info(&patterns, &decoration.target));
                }
                node_targets.insert(
                    decoration.target.ticket.clone(),
                    decoration.target.ticket.clone(),
                );
            }

            if req.target_definitions {
                self.resolve_target_definitions(&mut reply, &refs_by_target, node_targets)
                    .await?;
            }
        }

        Ok(reply)
    }

    /// Stamps each reference whose target has exactly one binding
    /// definition; targets without one are followed through a single
    /// `callableas` mirror relation, at most [`MAX_JUMPS`] times.
    async fn resolve_target_definitions(
        &self,
        reply: &mut DecorationsReply,
        refs_by_target: &HashMap<String, Vec<usize>>,
        mut node_targets: HashMap<String, String>,
    ) -> Result<()> {
        let rev_callable_as = mirror_edge(CALLABLE_AS_EDGE);

        for _ in 0..MAX_JUMPS {
            if node_targets.is_empty() {
                break;
            }
            let tickets: Vec<String> = node_targets.keys().cloned().collect();

            let xrefs = self
                .cross_references(&CrossReferencesRequest {
                    ticket: tickets,
                    definition_kind: DefinitionKind::BindingDefinitions,
                    // Node kinds of related nodes drive indirect jumps.
                    filter: vec![NODE_KIND_FACT.to_string()],
                    ..Default::default()
                })
                .await
                .map_err(|err| ServingError::TargetDefinitions(Box::new(err)))?;

            let mut next_jump: HashMap<String, String> = HashMap::new();

            for (ticket, crs) in &xrefs.cross_references {
                let Some(ref_ticket) = node_targets.get(ticket) else {
                    continue;
                };
                if crs.definition.len() == 1 {
                    let mut definition = crs.definition[0].clone();
                    definition.kind.clear();
                    let refs = refs_by_target
                        .get(ref_ticket)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    for &index in refs {
                        // A definition anchor never points at itself.
                        if definition.ticket != reply.reference[index].source_ticket {
                            reply.reference[index].target_definition = definition.ticket.clone();
                            reply
                                .definition_locations
                                .entry(definition.ticket.clone())
                                .or_insert_with(|| definition.clone());
                        }
                    }
                } else {
                    let mut relevant = crs
                        .related_node
                        .iter()
                        .filter(|node| node.relation_kind == rev_callable_as);
                    if let (Some(next), None) = (relevant.next(), relevant.next()) {
                        next_jump.insert(next.ticket.clone(), ref_ticket.clone());
                    }
                }
            }

            node_targets = next_jump;
        }
        Ok(())
    }
}

/// Byte offsets of a resolved SPAN location. The normalizer guarantees
/// both points exist and are ordered.
fn resolved_span(loc: &xref_protocol::Location) -> (i32, i32) {
    let start = loc.start.map(|p| p.byte_offset).unwrap_or_default();
    let end = loc.end.map(|p| p.byte_offset).unwrap_or_default();
    (start, end)
}
