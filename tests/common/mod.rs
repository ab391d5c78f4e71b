//! Shared test fixtures
#![allow(dead_code)]

use kgbridge::graph::GraphStore;
use kgbridge::store::{GraphBackend, GraphReader, GraphTransaction, MemoryGraph, StoreError, StoreResult};
use std::collections::BTreeSet;

/// Backend that fails selected write calls with a transient error.
///
/// A failing call still runs its transaction body first, so the failure
/// exercises rollback of whatever the body wrote.
pub struct FlakyBackend {
    pub inner: MemoryGraph,
    calls: usize,
    fail: Box<dyn Fn(usize) -> bool>,
}

impl FlakyBackend {
    /// `fail(n)` decides whether the n-th write call (from 0) fails
    pub fn new(fail: impl Fn(usize) -> bool + 'static) -> Self {
        Self::wrap(MemoryGraph::new(), fail)
    }

    /// Flaky view of an existing graph
    pub fn wrap(inner: MemoryGraph, fail: impl Fn(usize) -> bool + 'static) -> Self {
        FlakyBackend {
            inner,
            calls: 0,
            fail: Box::new(fail),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl GraphBackend for FlakyBackend {
    fn write<T, F>(&mut self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn GraphTransaction) -> StoreResult<T>,
    {
        let call = self.calls;
        self.calls += 1;
        if (self.fail)(call) {
            return self.inner.write(|tx| {
                work(tx)?;
                Err(StoreError::Transient(format!("injected failure on write {}", call)))
            });
        }
        self.inner.write(work)
    }

    fn read<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn GraphReader) -> StoreResult<T>,
    {
        self.inner.read(work)
    }
}

pub const BOOKS_TTL: &str = r#"
@prefix ex: <http://example.org/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

ex:BookX a ex:Book ;
    ex:title "Knowledge Graphs"@en ;
    ex:title "知识图谱"@zh ;
    ex:pages "320"^^xsd:integer ;
    ex:author ex:PersonY .

ex:PersonY a ex:Person ;
    ex:name "Zhang San" ;
    ex:born "1980-05-01"^^xsd:date .
"#;

/// Order-insensitive picture of a graph, keyed by resource id
pub fn snapshot(graph: &GraphStore) -> BTreeSet<String> {
    let id_of = |id| {
        graph
            .get_node(id)
            .and_then(|n| n.get_str("id"))
            .unwrap_or("?")
            .to_string()
    };

    let mut lines = BTreeSet::new();
    for node in graph.all_nodes() {
        let mut props: Vec<String> = node
            .properties
            .iter()
            .map(|(k, v)| format!("{}={:?}", k, v))
            .collect();
        props.sort();
        lines.insert(format!("({}:{} {})", id_of(node.id), node.label, props.join(",")));
    }
    for edge in graph.all_edges() {
        lines.insert(format!("{}-[{}]->{}", id_of(edge.source), edge.edge_type, id_of(edge.target)));
    }
    lines
}
