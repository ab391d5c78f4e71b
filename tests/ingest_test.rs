mod common;

use common::{snapshot, FlakyBackend, BOOKS_TTL};
use kgbridge::graph::{EdgeType, Label, PropertyValue};
use kgbridge::rdf::{Literal, RdfFormat, RdfParser, RdfToGraphMapper, Triple};
use kgbridge::store::{GraphBackend, MemoryGraph, RetryPolicy};

fn books() -> Vec<Triple> {
    RdfParser::parse(BOOKS_TTL, RdfFormat::Turtle).unwrap()
}

#[test]
fn test_book_scenario() {
    let mut backend = MemoryGraph::new();
    let report = RdfToGraphMapper::new().ingest(&mut backend, &books());

    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.triples_seen, 8);
    assert_eq!(report.nodes_created, 4);

    let graph = backend.graph();
    let book = graph.find_node(&Label::new("Book"), "id", "BookX").unwrap();
    assert_eq!(book.get_str("uri"), Some("http://example.org/BookX"));
    assert_eq!(book.get_str("title_en"), Some("Knowledge Graphs"));
    assert_eq!(book.get_str("title_zh"), Some("知识图谱"));
    assert_eq!(book.get_property("pages"), Some(&PropertyValue::Integer(320)));

    let person = graph.find_node(&Label::new("Person"), "id", "PersonY").unwrap();
    assert_eq!(person.get_str("name"), Some("Zhang San"));
    // Unknown datatypes keep their lexical form
    assert_eq!(person.get_str("born"), Some("1980-05-01"));

    let authors: Vec<_> = graph
        .get_outgoing_edges(book.id)
        .into_iter()
        .filter(|e| e.edge_type == EdgeType::new("author"))
        .collect();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].target, person.id);
    assert_eq!(
        authors[0].get_property("uri").and_then(|v| v.as_string()),
        Some("http://example.org/author")
    );
}

#[test]
fn test_ingest_twice_is_idempotent() {
    let triples = books();
    let mapper = RdfToGraphMapper::new();
    let mut backend = MemoryGraph::new();

    mapper.ingest(&mut backend, &triples);
    let first = snapshot(backend.graph());
    let nodes = backend.graph().node_count();
    let edges = backend.graph().edge_count();

    let report = mapper.ingest(&mut backend, &triples);
    assert_eq!(report.nodes_created, 0);
    assert_eq!(report.edges_created, 0);
    assert_eq!(report.triples_applied, triples.len());
    assert_eq!(backend.graph().node_count(), nodes);
    assert_eq!(backend.graph().edge_count(), edges);
    assert_eq!(snapshot(backend.graph()), first);
}

#[test]
fn test_triple_order_does_not_matter() {
    let triples = books();
    let mut reversed = triples.clone();
    reversed.reverse();
    let mut rotated = triples.clone();
    rotated.rotate_left(3);

    let mapper = RdfToGraphMapper::new();
    let mut expected = MemoryGraph::new();
    mapper.ingest(&mut expected, &triples);

    for permutation in [reversed, rotated] {
        let mut backend = MemoryGraph::new();
        mapper.ingest(&mut backend, &permutation);
        assert_eq!(snapshot(backend.graph()), snapshot(expected.graph()));
    }
}

#[test]
fn test_language_tags_become_separate_keys() {
    let triples = vec![
        Triple::literal(
            "http://example.org/E1",
            "http://example.org/name",
            Literal::new_language_tagged_literal("张三", "zh").unwrap(),
        )
        .unwrap(),
        Triple::literal(
            "http://example.org/E1",
            "http://example.org/name",
            Literal::new_language_tagged_literal("ZhangSan", "en").unwrap(),
        )
        .unwrap(),
        Triple::literal(
            "http://example.org/E1",
            "http://example.org/name",
            Literal::new_simple_literal("Zhang San"),
        )
        .unwrap(),
    ];

    let mut backend = MemoryGraph::new();
    let report = RdfToGraphMapper::new().ingest(&mut backend, &triples);
    assert_eq!(report.properties_set, 3);

    let node = backend.graph().find_node(&Label::resource(), "id", "E1").unwrap();
    assert_eq!(node.get_str("name_zh"), Some("张三"));
    assert_eq!(node.get_str("name_en"), Some("ZhangSan"));
    assert_eq!(node.get_str("name"), Some("Zhang San"));
}

#[test]
fn test_repeated_literal_key_keeps_last_value() {
    let triples = vec![
        Triple::literal(
            "http://example.org/E1",
            "http://example.org/nickname",
            Literal::new_simple_literal("first"),
        )
        .unwrap(),
        Triple::literal(
            "http://example.org/E1",
            "http://example.org/nickname",
            Literal::new_simple_literal("second"),
        )
        .unwrap(),
    ];

    let mut backend = MemoryGraph::new();
    RdfToGraphMapper::new().ingest(&mut backend, &triples);
    let node = backend.graph().find_node(&Label::resource(), "id", "E1").unwrap();
    assert_eq!(node.get_str("nickname"), Some("second"));
}

#[test]
fn test_transient_failures_within_bound_are_retried() {
    // First two attempts of the first write fail
    let mut backend = FlakyBackend::new(|call| call < 2);
    let report = RdfToGraphMapper::new()
        .with_retry(RetryPolicy::immediate(3))
        .ingest(&mut backend, &books());

    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.triples_applied, 8);
    assert_eq!(backend.inner.graph().node_count(), 4);
}

#[test]
fn test_exhausted_retries_skip_only_that_triple() {
    let triples = vec![
        Triple::iris(
            "http://example.org/BookX",
            "http://example.org/author",
            "http://example.org/PersonY",
        )
        .unwrap(),
        Triple::literal(
            "http://example.org/BookX",
            "http://example.org/title",
            Literal::new_simple_literal("X"),
        )
        .unwrap(),
    ];

    // Writes 0 and 1 upsert the two resources; 2..=4 are every attempt at the edge
    let mut backend = FlakyBackend::new(|call| (2..=4).contains(&call));
    let report = RdfToGraphMapper::new()
        .with_retry(RetryPolicy::immediate(3))
        .ingest(&mut backend, &triples);

    assert_eq!(backend.calls(), 6);
    assert_eq!(report.triples_applied, 1);
    assert_eq!(report.triples_skipped, 1);
    assert_eq!(report.store_failures.len(), 1);
    assert!(report.store_failures[0].reason.contains("3 attempts"));

    let graph = backend.inner.graph();
    assert_eq!(graph.edge_count(), 0);
    let book = graph.find_node(&Label::resource(), "id", "BookX").unwrap();
    assert_eq!(book.get_str("title"), Some("X"));
}

#[test]
fn test_failed_write_leaves_no_partial_state() {
    let mut backend = FlakyBackend::new(|_| true);
    let report = RdfToGraphMapper::new()
        .with_retry(RetryPolicy::immediate(2))
        .ingest(&mut backend, &books());

    assert_eq!(report.triples_applied, 0);
    assert_eq!(report.nodes_upserted, 0);
    assert_eq!(backend.inner.graph().node_count(), 0);
    assert_eq!(backend.inner.graph().edge_count(), 0);

    // Reads still go through
    let labels = backend.read(|reader| reader.labels()).unwrap();
    assert!(labels.is_empty());
}
