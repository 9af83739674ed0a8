use regex::Regex;
use xref_protocol::NodeInfo;
use xref_serving::Node;

/// Compiles fact-name filters into anchored patterns: `**` matches across
/// path segments, `*` within one, everything else is literal.
pub fn convert_filters(filters: &[String]) -> Vec<Regex> {
    filters
        .iter()
        .map(|filter| filter_to_regex(filter))
        .collect()
}

fn filter_to_regex(filter: &str) -> Regex {
    let mut pattern = String::with_capacity(filter.len() + 8);
    pattern.push('^');
    let mut rest = filter;
    while let Some(star) = rest.find('*') {
        pattern.push_str(&regex::escape(&rest[..star]));
        if rest[star..].starts_with("**") {
            pattern.push_str(".*");
            rest = &rest[star + 2..];
        } else {
            pattern.push_str("[^/]*");
            rest = &rest[star + 1..];
        }
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    // The pattern is escaped literals plus fixed fragments.
    Regex::new(&pattern).expect("filter pattern is always valid")
}

/// True when any compiled filter matches the fact name in full.
pub fn matches_any(name: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(name))
}

/// Projects a stored node through the filters into a reply `NodeInfo`,
/// facts sorted by name.
pub(crate) fn node_to_info(patterns: &[Regex], node: &Node) -> NodeInfo {
    let mut info = NodeInfo {
        ticket: node.ticket.clone(),
        fact: Vec::new(),
    };
    for fact in &node.fact {
        if matches_any(&fact.name, patterns) {
            info.fact.push(fact.clone());
        }
    }
    info.fact.sort_by(|a, b| a.name.cmp(&b.name));
    info
}
