//! Shared vocabulary of the serving corpus: canonical edge kinds, fact
//! names, the classification predicates the cross-reference engine
//! applies to stored groups, and the ticket URI service.

mod kinds;
mod ticket;

pub use kinds::{
    canonicalize, is_anchor_edge, is_decl_kind, is_def_kind, is_doc_kind, is_edge_variant,
    is_ref_kind, mirror_edge, CALLABLE_AS_EDGE, CHILD_OF_EDGE, DEFINES_BINDING_EDGE, DEFINES_EDGE,
    DOCUMENTS_EDGE, EDGE_PREFIX, MIRROR_PREFIX, NODE_KIND_FACT, REF_CALL_EDGE, REF_EDGE,
};
pub use ticket::{fix_ticket, fix_tickets, Result, Ticket, TicketError};
