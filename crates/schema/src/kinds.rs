use xref_protocol::{DeclarationKind, DefinitionKind, DocumentationKind, ReferenceKind};

/// Prefix of every canonical edge kind.
pub const EDGE_PREFIX: &str = "/kythe/edge/";
/// Prefix marking the mirror (reverse) direction of an edge kind.
pub const MIRROR_PREFIX: &str = "%";

pub const DEFINES_EDGE: &str = "/kythe/edge/defines";
pub const DEFINES_BINDING_EDGE: &str = "/kythe/edge/defines/binding";
pub const DOCUMENTS_EDGE: &str = "/kythe/edge/documents";
pub const REF_EDGE: &str = "/kythe/edge/ref";
pub const REF_CALL_EDGE: &str = "/kythe/edge/ref/call";
pub const CHILD_OF_EDGE: &str = "/kythe/edge/childof";
pub const CALLABLE_AS_EDGE: &str = "/kythe/edge/callableas";

/// Name of the fact holding a node's kind.
pub const NODE_KIND_FACT: &str = "/kythe/node/kind";

/// Strips the mirror prefix, leaving the forward edge kind.
pub fn canonicalize(kind: &str) -> &str {
    kind.strip_prefix(MIRROR_PREFIX).unwrap_or(kind)
}

/// Returns the opposite direction of `kind`.
pub fn mirror_edge(kind: &str) -> String {
    match kind.strip_prefix(MIRROR_PREFIX) {
        Some(forward) => forward.to_string(),
        None => format!("{MIRROR_PREFIX}{kind}"),
    }
}

/// True when `kind` is `base` itself or a subkind of it (`base/...`).
pub fn is_edge_variant(kind: &str, base: &str) -> bool {
    kind == base || (kind.starts_with(base) && kind.as_bytes().get(base.len()) == Some(&b'/'))
}

/// True for edge kinds that connect an anchor to the node it covers.
/// Anchor edges never contribute related nodes.
pub fn is_anchor_edge(kind: &str) -> bool {
    let kind = canonicalize(kind);
    is_edge_variant(kind, DEFINES_EDGE)
        || is_edge_variant(kind, DOCUMENTS_EDGE)
        || is_edge_variant(kind, REF_EDGE)
}

/// Classifies a stored group as definitions under the requested selector.
///
/// An incomplete set has no full definition; its `defines` groups
/// classify as declarations instead (see [`is_decl_kind`]).
pub fn is_def_kind(requested: DefinitionKind, edge_kind: &str, incomplete: bool) -> bool {
    if incomplete {
        return false;
    }
    let kind = canonicalize(edge_kind);
    match requested {
        DefinitionKind::NoDefinitions => false,
        DefinitionKind::FullDefinitions => kind == DEFINES_EDGE,
        DefinitionKind::BindingDefinitions => kind == DEFINES_BINDING_EDGE,
        DefinitionKind::AllDefinitions => is_edge_variant(kind, DEFINES_EDGE),
    }
}

/// Classifies a stored group as declarations under the requested selector.
pub fn is_decl_kind(requested: DeclarationKind, edge_kind: &str, incomplete: bool) -> bool {
    let kind = canonicalize(edge_kind);
    match requested {
        DeclarationKind::NoDeclarations => false,
        DeclarationKind::AllDeclarations => incomplete && is_edge_variant(kind, DEFINES_EDGE),
    }
}

/// Classifies a stored group as documentation under the requested selector.
pub fn is_doc_kind(requested: DocumentationKind, edge_kind: &str) -> bool {
    let kind = canonicalize(edge_kind);
    match requested {
        DocumentationKind::NoDocumentation => false,
        DocumentationKind::AllDocumentation => is_edge_variant(kind, DOCUMENTS_EDGE),
    }
}

/// Classifies a stored group as plain references under the requested
/// selector.
pub fn is_ref_kind(requested: ReferenceKind, edge_kind: &str) -> bool {
    let kind = canonicalize(edge_kind);
    match requested {
        ReferenceKind::NoReferences => false,
        ReferenceKind::AllReferences => is_edge_variant(kind, REF_EDGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_edge_roundtrips() {
        let rev = mirror_edge(CALLABLE_AS_EDGE);
        assert_eq!(rev, "%/kythe/edge/callableas");
        assert_eq!(mirror_edge(&rev), CALLABLE_AS_EDGE);
        assert_eq!(canonicalize(&rev), CALLABLE_AS_EDGE);
    }

    #[test]
    fn variant_requires_segment_boundary() {
        assert!(is_edge_variant(REF_CALL_EDGE, REF_EDGE));
        assert!(is_edge_variant(REF_EDGE, REF_EDGE));
        assert!(!is_edge_variant("/kythe/edge/reference", REF_EDGE));
    }

    #[test]
    fn anchor_edges_cover_both_directions() {
        assert!(is_anchor_edge(DEFINES_BINDING_EDGE));
        assert!(is_anchor_edge("%/kythe/edge/ref"));
        assert!(!is_anchor_edge(CHILD_OF_EDGE));
        assert!(!is_anchor_edge(CALLABLE_AS_EDGE));
    }

    #[test]
    fn def_kind_selectors() {
        use DefinitionKind::*;
        assert!(is_def_kind(AllDefinitions, DEFINES_BINDING_EDGE, false));
        assert!(is_def_kind(BindingDefinitions, DEFINES_BINDING_EDGE, false));
        assert!(!is_def_kind(BindingDefinitions, DEFINES_EDGE, false));
        assert!(is_def_kind(FullDefinitions, DEFINES_EDGE, false));
        assert!(!is_def_kind(FullDefinitions, DEFINES_BINDING_EDGE, false));
        assert!(!is_def_kind(NoDefinitions, DEFINES_EDGE, false));
    }

    #[test]
    fn incomplete_sets_reclassify_definitions_as_declarations() {
        assert!(!is_def_kind(
            DefinitionKind::AllDefinitions,
            DEFINES_EDGE,
            true
        ));
        assert!(is_decl_kind(
            DeclarationKind::AllDeclarations,
            DEFINES_EDGE,
            true
        ));
        assert!(!is_decl_kind(
            DeclarationKind::AllDeclarations,
            DEFINES_EDGE,
            false
        ));
    }

    #[test]
    fn doc_and_ref_kinds() {
        assert!(is_doc_kind(
            DocumentationKind::AllDocumentation,
            DOCUMENTS_EDGE
        ));
        assert!(!is_doc_kind(DocumentationKind::NoDocumentation, DOCUMENTS_EDGE));
        assert!(is_ref_kind(ReferenceKind::AllReferences, REF_CALL_EDGE));
        assert!(!is_ref_kind(ReferenceKind::AllReferences, CHILD_OF_EDGE));
    }
}
