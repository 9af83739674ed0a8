use xref_protocol::SpanKind;

/// Whether the patched anchor `[start, end)` passes the span filter
/// against the requested `[start_boundary, end_boundary)`.
pub fn in_span_bounds(
    kind: SpanKind,
    start: i32,
    end: i32,
    start_boundary: i32,
    end_boundary: i32,
) -> bool {
    match kind {
        SpanKind::WithinSpan => start_boundary <= start && end <= end_boundary,
        SpanKind::AroundSpan => start <= start_boundary && end_boundary <= end,
    }
}
