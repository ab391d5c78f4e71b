mod common;

use common::FlakyBackend;
use kgbridge::graph::{EdgeType, Label, NodeId, PropertyMap};
use kgbridge::rdf::{RdfFormat, RdfParser, RdfToGraphMapper};
use kgbridge::resolve::{Disambiguation, Disambiguator, EntityAligner, ResolutionReport, ResolverConfig};
use kgbridge::store::{GraphBackend, GraphReader, MemoryGraph, NodeKey, RetryPolicy};

const ORGS_TTL: &str = r#"
@prefix ex: <http://example.org/> .

ex:Alibaba a ex:ORG ; ex:name "阿里巴巴" ; ex:locatedIn ex:Hangzhou .
ex:AliGroup a ex:ORG ; ex:name "阿里集团" ; ex:owns ex:Taobao .
ex:Tencent a ex:ORG ; ex:name "腾讯" .
ex:Hangzhou a ex:LOC ; ex:name "杭州" .
ex:Taobao a ex:PRODUCT ; ex:name "淘宝" .
"#;

fn org_graph() -> MemoryGraph {
    let triples = RdfParser::parse(ORGS_TTL, RdfFormat::Turtle).unwrap();
    let mut backend = MemoryGraph::new();
    let report = RdfToGraphMapper::new().ingest(&mut backend, &triples);
    assert!(report.is_clean(), "{:?}", report);
    backend
}

fn alibaba_scorer(a: &str, b: &str) -> f64 {
    let pair = [a, b];
    if pair.contains(&"阿里巴巴") && pair.contains(&"阿里集团") {
        0.82
    } else {
        0.1
    }
}

fn outgoing_types(backend: &MemoryGraph, id: NodeId) -> Vec<String> {
    let mut types: Vec<String> = backend
        .graph()
        .get_outgoing_edges(id)
        .into_iter()
        .map(|e| e.edge_type.to_string())
        .collect();
    types.sort();
    types
}

#[test]
fn test_aligned_entities_keep_union_of_relationships() {
    let mut backend = org_graph();
    let org = Label::new("ORG");
    let alibaba = backend.graph().find_node(&org, "id", "Alibaba").unwrap().id;
    let ali_group = backend.graph().find_node(&org, "id", "AliGroup").unwrap().id;

    let config = ResolverConfig {
        labels: vec!["ORG".to_string()],
        ..ResolverConfig::with_threshold(0.8)
    };
    let report = EntityAligner::with_scorer(config, alibaba_scorer)
        .align(&mut backend)
        .unwrap();

    assert_eq!(report.merged_pairs(), vec![(alibaba, ali_group)]);
    assert_eq!(report.comparisons, 2);
    assert!(report.failures.is_empty());

    let graph = backend.graph();
    assert!(!graph.has_node(ali_group));
    assert_eq!(graph.get_nodes_by_label(&org).len(), 2);
    assert_eq!(outgoing_types(&backend, alibaba), vec!["locatedIn", "owns", "type"]);

    let taobao = graph.find_node(&Label::new("PRODUCT"), "id", "Taobao").unwrap();
    let owns = graph.find_edge(alibaba, &EdgeType::new("owns"), taobao.id);
    assert!(owns.is_some());
}

#[test]
fn test_configured_label_is_sanitized_like_ingest() {
    let ttl = r#"
@prefix ex: <http://example.org/> .

ex:AcmeA a ex:my-org ; ex:name "Acme" .
ex:AcmeB a ex:my-org ; ex:name "Acme" .
"#;
    let triples = RdfParser::parse(ttl, RdfFormat::Turtle).unwrap();
    let mut backend = MemoryGraph::new();
    assert!(RdfToGraphMapper::new().ingest(&mut backend, &triples).is_clean());
    assert_eq!(backend.graph().get_nodes_by_label(&Label::new("my_org")).len(), 2);

    let config = ResolverConfig {
        labels: vec!["my-org".to_string()],
        ..ResolverConfig::default()
    };
    let report = EntityAligner::with_scorer(config, |_: &str, _: &str| 1.0)
        .align(&mut backend)
        .unwrap();

    assert_eq!(report.merges.len(), 1);
    assert_eq!(report.merges[0].label, "my_org");
    assert_eq!(backend.graph().get_nodes_by_label(&Label::new("my_org")).len(), 1);
}

#[test]
fn test_alignment_below_threshold_changes_nothing() {
    let mut backend = org_graph();
    let nodes = backend.graph().node_count();
    let edges = backend.graph().edge_count();

    let report = EntityAligner::with_scorer(ResolverConfig::with_threshold(0.9), alibaba_scorer)
        .align_label(&mut backend, &Label::new("ORG"))
        .unwrap();

    assert!(report.merges.is_empty());
    assert_eq!(backend.graph().node_count(), nodes);
    assert_eq!(backend.graph().edge_count(), edges);
}

#[test]
fn test_chains_compare_against_kept_entity() {
    let mut backend = MemoryGraph::new();
    let [a, b, c] = ["A", "B", "C"].map(|name| {
        backend
            .write(|tx| tx.upsert_node(&NodeKey::new("ORG", "name", name), &PropertyMap::new()))
            .unwrap()
            .id
    });

    let scorer = |x: &str, y: &str| match (x.min(y), x.max(y)) {
        ("A", "B") | ("B", "C") => 0.85,
        _ => 0.5,
    };
    let report = EntityAligner::with_scorer(ResolverConfig::with_threshold(0.8), scorer)
        .align_label(&mut backend, &Label::new("ORG"))
        .unwrap();

    // B is absorbed into A, and C only ever meets A
    assert_eq!(report.merged_pairs(), vec![(a, b)]);
    assert_eq!(report.comparisons, 2);
    assert!(backend.graph().has_node(a));
    assert!(backend.graph().has_node(c));
}

#[test]
fn test_failed_merge_is_recorded_and_rolled_back() {
    let graph = org_graph();
    let nodes = graph.graph().node_count();
    let edges = graph.graph().edge_count();
    let mut backend = FlakyBackend::wrap(graph, |_| true);

    let report = EntityAligner::with_scorer(ResolverConfig::with_threshold(0.8), alibaba_scorer)
        .with_retry(RetryPolicy::immediate(2))
        .align_label(&mut backend, &Label::new("ORG"))
        .unwrap();

    assert!(report.merges.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].reason.contains("2 attempts"));
    assert_eq!(backend.calls(), 2);
    assert_eq!(backend.inner.graph().node_count(), nodes);
    assert_eq!(backend.inner.graph().edge_count(), edges);
}

#[test]
fn test_disambiguation_picks_entity_matching_context() {
    let mut backend = MemoryGraph::new();
    let (org, fruit) = backend
        .write(|tx| {
            let none = PropertyMap::new();
            let org = tx.upsert_node(&NodeKey::new("ORG", "name", "苹果"), &none)?.id;
            let iphone = tx.upsert_node(&NodeKey::new("PRODUCT", "name", "iPhone"), &none)?.id;
            tx.upsert_edge(org, &"生产".into(), iphone, &none)?;

            let fruit = tx.upsert_node(&NodeKey::new("FRUIT", "name", "苹果"), &none)?.id;
            let shandong = tx.upsert_node(&NodeKey::new("LOC", "name", "山东"), &none)?.id;
            tx.upsert_edge(fruit, &"生长于".into(), shandong, &none)?;
            Ok((org, fruit))
        })
        .unwrap();

    let config = ResolverConfig::default();
    let disambiguator = Disambiguator::new(&config);
    let reader: &dyn GraphReader = backend.graph();

    let outcome = disambiguator.disambiguate(reader, "苹果", "苹果公司生产iPhone手机").unwrap();
    assert_eq!(outcome.chosen(), Some(org));
    let Disambiguation::Match(found) = &outcome else {
        panic!("expected a match");
    };
    assert_eq!(found.label, Label::new("ORG"));
    assert_eq!(found.candidates.len(), 2);

    let outcome = disambiguator.disambiguate(reader, "苹果", "山东烟台生长于山东的苹果").unwrap();
    assert_eq!(outcome.chosen(), Some(fruit));

    let outcome = disambiguator.disambiguate(reader, "香蕉", "香蕉很甜").unwrap();
    assert_eq!(outcome, Disambiguation::NoMatch);

    let mut report = ResolutionReport::default();
    report.record_disambiguation("香蕉", "香蕉很甜", &outcome);
    assert_eq!(report.disambiguations[0].chosen, None);
}
