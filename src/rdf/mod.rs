//! RDF support for the knowledge-graph bridge
//!
//! This module covers:
//! - RDF terms and triples
//! - Parsing and writing Turtle, N-Triples and RDF/XML
//! - Namespace prefixes
//! - Property graph ↔ RDF mapping
//!
//! # Example
//!
//! ```rust
//! use kgbridge::rdf::{RdfFormat, RdfParser, RdfToGraphMapper};
//! use kgbridge::store::MemoryGraph;
//!
//! let input = r#"
//!     @prefix ex: <http://example.org/> .
//!     ex:BookX a ex:Book ; ex:author ex:PersonY .
//! "#;
//! let triples = RdfParser::parse(input, RdfFormat::Turtle).unwrap();
//!
//! let mut backend = MemoryGraph::new();
//! let report = RdfToGraphMapper::new().ingest(&mut backend, &triples);
//! assert_eq!(report.triples_applied, 2);
//! ```

mod mapping;
mod namespace;
mod serialization;
mod types;

pub use types::{
    vocab, BlankNode, Literal, NamedNode, RdfError, RdfObject, RdfPredicate, RdfResult, RdfSubject, Triple,
};

pub use mapping::{
    AmbiguousType, GraphToRdfMapper, IngestReport, MappingConfig, MappingError, MappingResult, RdfToGraphMapper,
    SkippedItem,
};

pub use namespace::{Namespace, NamespaceManager, PrefixError, PrefixResult};

pub use serialization::{
    ParseError, ParseResult, RdfFormat, RdfParser, RdfSerializer, SerializeError, SerializeResult,
};
