//! Property graph ↔ RDF mapping
//!
//! ## RDF → Property Graph ([`RdfToGraphMapper`])
//!
//! - The first `rdf:type` of a resource becomes its node label
//! - A node per resource, keyed by (label, local id), with its IRI as `uri`
//! - Resource objects become edges typed by the sanitized predicate
//! - Literal objects become node properties
//!
//! ## Property Graph → RDF ([`GraphToRdfMapper`])
//!
//! - Node → `<base><label>/<id>` with an `rdf:type <base><Label>` triple
//! - Scalar node properties → typed literals
//! - Edge → `(source, <base><type>, target)`

mod export;
mod ingest;

pub use export::GraphToRdfMapper;
pub use ingest::{AmbiguousType, IngestReport, RdfToGraphMapper, SkippedItem};

use super::namespace::PrefixError;
use super::RdfError;
use crate::naming::{configured_name, NameKind};
use crate::store::StoreError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mapping errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Object that is neither a usable resource nor a valid literal
    #[error("Malformed triple {triple}: {reason}")]
    MalformedTriple { triple: String, reason: String },

    /// Type predicate that cannot be expanded
    #[error("Invalid type predicate: {0}")]
    TypePredicate(#[from] PrefixError),

    #[error("Invalid IRI: {0}")]
    InvalidIri(#[from] RdfError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type MappingResult<T> = Result<T, MappingError>;

/// Mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Base IRI for exported resources and predicates
    pub base_iri: String,

    /// Predicates whose resource objects name the subject's type; full IRIs
    /// or `prefix:local`
    pub type_predicates: Vec<String>,

    /// Extra namespace prefixes for `type_predicates`
    pub prefixes: IndexMap<String, String>,

    /// Label for resources without a type assertion
    pub fallback_label: String,

    /// Node property holding the local id (the upsert key)
    pub id_property: String,

    /// Node property holding the resource IRI
    pub uri_property: String,

    /// Edge property holding the predicate IRI; `None` stores nothing
    pub edge_uri_property: Option<String>,

    /// Also create `type` edges for type assertions
    pub materialize_type_edges: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            base_iri: "http://example.org/".to_string(),
            type_predicates: vec!["rdf:type".to_string()],
            prefixes: IndexMap::new(),
            fallback_label: "Resource".to_string(),
            id_property: "id".to_string(),
            uri_property: "uri".to_string(),
            edge_uri_property: Some("uri".to_string()),
            materialize_type_edges: true,
        }
    }
}

impl MappingConfig {
    /// Default configuration with another base IRI
    pub fn new(base_iri: impl Into<String>) -> Self {
        Self {
            base_iri: base_iri.into(),
            ..Self::default()
        }
    }

    /// Rewrite the configured label and property names into their stored form
    pub fn sanitize_names(&mut self) {
        self.fallback_label = configured_name(&self.fallback_label, NameKind::Label);
        self.id_property = configured_name(&self.id_property, NameKind::Property);
        self.uri_property = configured_name(&self.uri_property, NameKind::Property);
        if let Some(key) = self.edge_uri_property.as_mut() {
            *key = configured_name(key, NameKind::Property);
        }
    }
}
