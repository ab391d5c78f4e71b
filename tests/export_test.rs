mod common;

use common::{snapshot, BOOKS_TTL};
use kgbridge::extract::{import_entity_triples, EntityTriple};
use kgbridge::graph::{GraphStore, Label, PropertyMap, PropertyValue};
use kgbridge::rdf::{GraphToRdfMapper, RdfFormat, RdfParser, RdfSerializer, RdfToGraphMapper, Triple};
use kgbridge::store::MemoryGraph;
use std::collections::HashSet;

const BASE: &str = "http://example.org/";

fn book_graph() -> MemoryGraph {
    let triples = RdfParser::parse(BOOKS_TTL, RdfFormat::Turtle).unwrap();
    let mut backend = MemoryGraph::new();
    RdfToGraphMapper::new().ingest(&mut backend, &triples);
    backend
}

fn lines(triples: &[Triple]) -> HashSet<String> {
    triples.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_export_keeps_original_resources() {
    let backend = book_graph();
    let exported = GraphToRdfMapper::new(BASE).map_graph(backend.graph()).unwrap();
    let exported = lines(&exported);

    let author = Triple::iris(
        "http://example.org/BookX",
        "http://example.org/author",
        "http://example.org/PersonY",
    )
    .unwrap();
    let typed = Triple::iris(
        "http://example.org/BookX",
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
        "http://example.org/Book",
    )
    .unwrap();
    assert!(exported.contains(&author.to_string()));
    assert!(exported.contains(&typed.to_string()));
    assert!(exported.contains(
        r#"<http://example.org/BookX> <http://example.org/pages> "320"^^<http://www.w3.org/2001/XMLSchema#int> ."#
    ));
    assert!(exported.contains(r#"<http://example.org/BookX> <http://example.org/title_zh> "知识图谱" ."#));
}

#[test]
fn test_turtle_round_trip_reproduces_graph() {
    let backend = book_graph();
    let exported = GraphToRdfMapper::new(BASE).map_graph(backend.graph()).unwrap();

    let turtle = RdfSerializer::serialize(&exported, RdfFormat::Turtle).unwrap();
    let parsed = RdfParser::parse(&turtle, RdfFormat::Turtle).unwrap();
    assert_eq!(lines(&parsed), lines(&exported));

    let mut copy = MemoryGraph::new();
    let report = RdfToGraphMapper::new().ingest(&mut copy, &parsed);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(snapshot(copy.graph()), snapshot(backend.graph()));
}

#[test]
fn test_all_syntaxes_parse_back() {
    let backend = book_graph();
    let exported = GraphToRdfMapper::new(BASE).map_graph(backend.graph()).unwrap();

    for format in [RdfFormat::Turtle, RdfFormat::NTriples, RdfFormat::RdfXml] {
        let text = RdfSerializer::serialize(&exported, format).unwrap();
        let parsed = RdfParser::parse(&text, format).unwrap();
        assert_eq!(lines(&parsed), lines(&exported), "{:?}", format);
    }
}

#[test]
fn test_export_of_extracted_entities() {
    let mut backend = MemoryGraph::new();
    import_entity_triples(
        &mut backend,
        &[EntityTriple::new("马云", "founded", "阿里巴巴", "PER", "ORG")],
    );

    let exported = lines(&GraphToRdfMapper::new(BASE).map_graph(backend.graph()).unwrap());
    assert!(exported.contains("<http://example.org/per/马云> <http://example.org/founded> <http://example.org/org/阿里巴巴> ."));
    assert!(exported.contains(
        "<http://example.org/per/马云> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/PER> ."
    ));
    assert!(exported.contains(r#"<http://example.org/org/阿里巴巴> <http://example.org/name> "阿里巴巴" ."#));
}

#[test]
fn test_non_finite_doubles_use_xsd_spelling() {
    let mut graph = GraphStore::new();
    let mut props = PropertyMap::new();
    props.insert("id".to_string(), "r1".into());
    props.insert("high".to_string(), PropertyValue::Float(f64::INFINITY));
    props.insert("low".to_string(), PropertyValue::Float(f64::NEG_INFINITY));
    props.insert("drift".to_string(), PropertyValue::Float(f64::NAN));
    props.insert("mean".to_string(), PropertyValue::Float(2.5));
    graph.create_node_with_properties("Reading", props);

    let exported = GraphToRdfMapper::new(BASE).map_graph(&graph).unwrap();
    let text = lines(&exported);
    let double = "<http://www.w3.org/2001/XMLSchema#double>";
    let subject = "<http://example.org/reading/r1>";
    for (key, lexical) in [("high", "INF"), ("low", "-INF"), ("drift", "NaN"), ("mean", "2.5")] {
        let line = format!("{subject} <http://example.org/{key}> \"{lexical}\"^^{double} .");
        assert!(text.contains(&line), "missing {line}");
    }

    let ntriples = RdfSerializer::serialize(&exported, RdfFormat::NTriples).unwrap();
    let parsed = RdfParser::parse(&ntriples, RdfFormat::NTriples).unwrap();
    let mut copy = MemoryGraph::new();
    assert!(RdfToGraphMapper::new().ingest(&mut copy, &parsed).is_clean());

    let node = copy.graph().find_node(&Label::new("Reading"), "id", "r1").unwrap();
    let float = |key: &str| node.get_property(key).and_then(PropertyValue::as_float).unwrap();
    assert_eq!(float("high"), f64::INFINITY);
    assert_eq!(float("low"), f64::NEG_INFINITY);
    assert!(float("drift").is_nan());
    assert_eq!(float("mean"), 2.5);
}
