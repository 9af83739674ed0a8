mod support;

use support::*;
use xref_engine::ServingError;
use xref_protocol::NodesRequest;

fn nodes_request(tickets: &[&str], filters: &[&str]) -> NodesRequest {
    NodesRequest {
        ticket: tickets.iter().map(|t| ticket(t)).collect(),
        filter: filters.iter().map(|f| f.to_string()).collect(),
    }
}

fn corpus() -> Corpus {
    let mut corpus = Corpus::new();
    corpus.add_edge_set(edge_set(
        node_with_facts(
            "T",
            &[
                ("/kythe/node/kind", "function"),
                ("/kythe/loc/start", "10"),
            ],
        ),
        vec![],
        vec![],
    ));
    corpus
}

#[tokio::test]
async fn fact_filter_projects_matching_facts_only() {
    let serving = corpus().combined();

    let reply = serving
        .nodes(&nodes_request(&["T"], &["/kythe/node/kind"]))
        .await
        .expect("nodes");

    assert_eq!(reply.node.len(), 1);
    let info = &reply.node[0];
    assert_eq!(info.ticket, ticket("T"));
    assert_eq!(info.fact.len(), 1);
    assert_eq!(info.fact[0].name, "/kythe/node/kind");
    assert_eq!(info.fact[0].value, b"function");
}

#[tokio::test]
async fn empty_filter_returns_all_facts_sorted() {
    let serving = corpus().combined();

    let reply = serving
        .nodes(&nodes_request(&["T"], &[]))
        .await
        .expect("nodes");

    assert_eq!(reply.node.len(), 1);
    let names: Vec<&str> = reply.node[0].fact.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["/kythe/loc/start", "/kythe/node/kind"]);
}

#[tokio::test]
async fn nodes_without_surviving_facts_are_omitted() {
    let serving = corpus().combined();

    let reply = serving
        .nodes(&nodes_request(&["T"], &["/no/such/fact"]))
        .await
        .expect("nodes");
    assert!(reply.node.is_empty());
}

#[tokio::test]
async fn missing_tickets_are_skipped() {
    let serving = corpus().combined();

    let reply = serving
        .nodes(&nodes_request(&["absent", "T"], &[]))
        .await
        .expect("nodes");
    assert_eq!(reply.node.len(), 1);
    assert_eq!(reply.node[0].ticket, ticket("T"));
}

#[tokio::test]
async fn empty_ticket_list_is_rejected() {
    let serving = corpus().combined();
    let err = serving
        .nodes(&NodesRequest::default())
        .await
        .expect_err("no tickets");
    assert!(matches!(err, ServingError::InvalidTicket(_)));
}
