//! kgbridge: RDF to property-graph bridge with entity resolution
//!
//! Turns RDF triples into a labelled property graph and cleans the result
//! up by merging duplicate entities and disambiguating same-named ones.
//!
//! # Pipeline
//!
//! ```text
//! triples ──▶ naming (safe names) ──▶ RdfToGraphMapper ──▶ GraphBackend
//!                                                              │
//!                         EntityAligner / Disambiguator ◀──────┘
//! ```
//!
//! # Modules
//!
//! - [`naming`]: label, relationship-type and property-key sanitizer
//! - [`graph`]: in-memory property graph
//! - [`store`]: transactional store boundary, in-memory backend, retries
//! - [`rdf`]: RDF terms, parsing, serialization and graph mapping
//! - [`resolve`]: entity alignment and disambiguation
//! - [`extract`]: NER/RE traits and entity-triple import
//! - [`config`]: YAML/JSON run configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use kgbridge::graph::Label;
//! use kgbridge::rdf::{Literal, RdfToGraphMapper, Triple};
//! use kgbridge::store::MemoryGraph;
//!
//! let triples = vec![
//!     Triple::literal(
//!         "http://example.org/E1",
//!         "http://example.org/name",
//!         Literal::new_language_tagged_literal("张三", "zh").unwrap(),
//!     )
//!     .unwrap(),
//!     Triple::literal(
//!         "http://example.org/E1",
//!         "http://example.org/name",
//!         Literal::new_language_tagged_literal("ZhangSan", "en").unwrap(),
//!     )
//!     .unwrap(),
//! ];
//!
//! let mut backend = MemoryGraph::new();
//! RdfToGraphMapper::new().ingest(&mut backend, &triples);
//!
//! let node = backend.graph().find_node(&Label::resource(), "id", "E1").unwrap();
//! assert_eq!(node.get_str("name_zh"), Some("张三"));
//! assert_eq!(node.get_str("name_en"), Some("ZhangSan"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod extract;
pub mod graph;
pub mod naming;
pub mod rdf;
pub mod resolve;
pub mod store;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, EdgeType, GraphError, GraphResult, GraphStore, Label, Node, NodeId, PropertyMap, PropertyValue,
};

pub use store::{
    GraphBackend, GraphReader, GraphTransaction, MemoryGraph, NodeKey, RetryPolicy, StoreError, StoreResult,
};

pub use rdf::{
    GraphToRdfMapper, IngestReport, Literal, MappingConfig, MappingError, NamedNode, RdfFormat, RdfParser,
    RdfSerializer, RdfToGraphMapper, Triple,
};

pub use resolve::{
    Disambiguation, Disambiguator, EntityAligner, ResolutionReport, ResolveError, ResolverConfig, SimilarityScorer,
};

pub use extract::{import_entity_triples, EntityTriple, Mention, TextExtractor};

pub use config::{ConfigError, KgConfig};

pub use kgbridge_similarity::similarity;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
