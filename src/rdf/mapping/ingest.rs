//! RDF triples → property graph

use super::{MappingConfig, MappingError, MappingResult};
use crate::graph::{EdgeType, Label, NodeId, PropertyMap, PropertyValue};
use crate::naming;
use crate::rdf::types::vocab;
use crate::rdf::{Literal, NamespaceManager, RdfObject, RdfSubject, Triple};
use crate::store::{GraphBackend, GraphTransaction, NodeKey, RetryPolicy, StoreResult};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, info, warn};

/// A resource with more than one type assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousType {
    pub subject: String,
    /// Label in use (first type seen)
    pub kept: String,
    pub ignored: String,
}

/// A triple or resource that was not written, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

/// Summary of one ingest run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub triples_seen: usize,
    pub triples_applied: usize,
    pub triples_skipped: usize,
    /// Distinct resources whose node upsert succeeded
    pub nodes_upserted: usize,
    /// Nodes that did not exist before this run
    pub nodes_created: usize,
    /// Resource triples written as edges
    pub edges_upserted: usize,
    /// Edges that did not exist before this run
    pub edges_created: usize,
    /// Literal triples written as node properties
    pub properties_set: usize,
    pub ambiguous_types: Vec<AmbiguousType>,
    pub malformed: Vec<SkippedItem>,
    pub store_failures: Vec<SkippedItem>,
}

impl IngestReport {
    /// True if every triple was applied without warnings
    pub fn is_clean(&self) -> bool {
        self.triples_skipped == 0 && self.ambiguous_types.is_empty() && self.store_failures.is_empty()
    }
}

/// Upsert identity of one RDF resource
#[derive(Debug, Clone)]
struct Resource {
    key: NodeKey,
    uri: String,
}

/// What one triple does to the graph
#[derive(Debug)]
enum Step {
    Link {
        subject: Resource,
        edge_type: EdgeType,
        predicate: String,
        object: Resource,
    },
    Property {
        subject: Resource,
        key: String,
        value: PropertyValue,
    },
    /// Type assertion already expressed by the label
    Typed { subject: Resource },
}

#[derive(Debug, Default)]
struct StepOutcome {
    nodes_created: usize,
    edge_created: bool,
}

/// RDF → property graph converter
///
/// Idempotent: every write is an upsert, so running the same triples twice
/// leaves the graph unchanged.
#[derive(Debug, Clone)]
pub struct RdfToGraphMapper {
    config: MappingConfig,
    type_predicates: FxHashSet<String>,
    retry: RetryPolicy,
}

impl RdfToGraphMapper {
    /// Converter with the default configuration
    pub fn new() -> Self {
        let mut type_predicates = FxHashSet::default();
        type_predicates.insert(vocab::RDF_TYPE.to_string());
        RdfToGraphMapper {
            config: MappingConfig::default(),
            type_predicates,
            retry: RetryPolicy::default(),
        }
    }

    /// Converter with a custom configuration.
    ///
    /// Fails if a type predicate uses an unknown prefix.
    pub fn with_config(mut config: MappingConfig) -> MappingResult<Self> {
        config.sanitize_names();
        let mut namespaces = NamespaceManager::new();
        for (prefix, iri) in &config.prefixes {
            namespaces.add_prefix(prefix.clone(), iri.clone());
        }
        let type_predicates = config
            .type_predicates
            .iter()
            .map(|p| namespaces.resolve(p))
            .collect::<Result<FxHashSet<_>, _>>()?;

        Ok(RdfToGraphMapper {
            config,
            type_predicates,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy used around each store transaction
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Write `triples` into `backend`.
    ///
    /// Malformed triples and store failures are skipped and reported; they
    /// never abort the run.
    pub fn ingest<B: GraphBackend>(&self, backend: &mut B, triples: &[Triple]) -> IngestReport {
        let mut report = IngestReport {
            triples_seen: triples.len(),
            ..IngestReport::default()
        };

        let labels = self.resolve_labels(triples, &mut report);
        self.upsert_resources(backend, triples, &labels, &mut report);

        for triple in triples {
            let step = match self.plan(triple, &labels) {
                Ok(step) => step,
                Err(e) => {
                    warn!("Skipping triple: {}", e);
                    report.triples_skipped += 1;
                    report.malformed.push(SkippedItem {
                        item: triple.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let result = self
                .retry
                .run(|| backend.write(|tx| apply_step(tx, &step, &self.config)));
            match result {
                Ok(outcome) => {
                    debug!("Applied {}", triple);
                    report.triples_applied += 1;
                    report.nodes_created += outcome.nodes_created;
                    match step {
                        Step::Link { .. } => {
                            report.edges_upserted += 1;
                            if outcome.edge_created {
                                report.edges_created += 1;
                            }
                        }
                        Step::Property { .. } => report.properties_set += 1,
                        Step::Typed { .. } => {}
                    }
                }
                Err(e) => {
                    warn!("Store failure on {}: {}", triple, e);
                    report.triples_skipped += 1;
                    report.store_failures.push(SkippedItem {
                        item: triple.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Ingested {}/{} triples ({} nodes created, {} edges created, {} skipped)",
            report.triples_applied,
            report.triples_seen,
            report.nodes_created,
            report.edges_created,
            report.triples_skipped
        );
        report
    }

    /// First type assertion per resource, in triple order
    fn resolve_labels(&self, triples: &[Triple], report: &mut IngestReport) -> FxHashMap<String, Label> {
        let mut labels: FxHashMap<String, Label> = FxHashMap::default();
        for triple in triples {
            if !self.type_predicates.contains(triple.predicate.as_str()) {
                continue;
            }
            let Some(type_resource) = triple.object.as_resource() else {
                continue;
            };

            let subject = triple.subject.key();
            let label = Label::sanitized(&type_resource.key());
            match labels.get(&subject) {
                None => {
                    labels.insert(subject, label);
                }
                Some(kept) if *kept != label => {
                    warn!(
                        "{} has several types; keeping {} and ignoring {}",
                        subject, kept, label
                    );
                    report.ambiguous_types.push(AmbiguousType {
                        subject,
                        kept: kept.to_string(),
                        ignored: label.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        labels
    }

    fn resource(&self, subject: &RdfSubject, labels: &FxHashMap<String, Label>) -> Resource {
        let uri = subject.key();
        let label = labels
            .get(&uri)
            .cloned()
            .unwrap_or_else(|| Label::sanitized(&self.config.fallback_label));
        let key = NodeKey::new(label, self.config.id_property.clone(), naming::local_id(&uri));
        Resource { key, uri }
    }

    /// One node per distinct resource, each in its own transaction
    fn upsert_resources<B: GraphBackend>(
        &self,
        backend: &mut B,
        triples: &[Triple],
        labels: &FxHashMap<String, Label>,
        report: &mut IngestReport,
    ) {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut resources = Vec::new();
        for triple in triples {
            let subjects = std::iter::once(triple.subject.clone()).chain(triple.object.as_resource());
            for subject in subjects {
                if seen.insert(subject.key()) {
                    resources.push(self.resource(&subject, labels));
                }
            }
        }

        for resource in resources {
            let mut props = PropertyMap::new();
            props.insert(self.config.uri_property.clone(), resource.uri.clone().into());

            match self
                .retry
                .run(|| backend.write(|tx| tx.upsert_node(&resource.key, &props)))
            {
                Ok(upserted) => {
                    report.nodes_upserted += 1;
                    if upserted.created {
                        report.nodes_created += 1;
                    }
                }
                Err(e) => {
                    warn!("Store failure on {}: {}", resource.key, e);
                    report.store_failures.push(SkippedItem {
                        item: resource.uri,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn plan(&self, triple: &Triple, labels: &FxHashMap<String, Label>) -> MappingResult<Step> {
        let subject = self.resource(&triple.subject, labels);
        let predicate = triple.predicate.as_str();

        if let Some(resource) = triple.object.as_resource() {
            let object = self.resource(&resource, labels);
            if !self.config.materialize_type_edges && self.type_predicates.contains(predicate) {
                return Ok(Step::Typed { subject });
            }
            return Ok(Step::Link {
                subject,
                edge_type: EdgeType::sanitized(predicate),
                predicate: predicate.to_string(),
                object,
            });
        }

        match &triple.object {
            RdfObject::Literal(literal) => {
                let value = literal_value(literal).map_err(|reason| MappingError::MalformedTriple {
                    triple: triple.to_string(),
                    reason,
                })?;
                let mut key = match literal.language() {
                    Some(lang) => naming::language_suffixed_key(predicate, lang),
                    None => naming::property_key(predicate),
                };
                // The key properties must keep identifying the node
                if key == self.config.id_property || key == self.config.uri_property {
                    key.push_str("_value");
                }
                Ok(Step::Property { subject, key, value })
            }
            _ => Err(MappingError::MalformedTriple {
                triple: triple.to_string(),
                reason: "quoted triple objects are not supported".to_string(),
            }),
        }
    }
}

impl Default for RdfToGraphMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_step(tx: &mut dyn GraphTransaction, step: &Step, config: &MappingConfig) -> StoreResult<StepOutcome> {
    let mut outcome = StepOutcome::default();
    match step {
        Step::Link {
            subject,
            edge_type,
            predicate,
            object,
        } => {
            let source = upsert_resource(tx, subject, config, None, &mut outcome)?;
            let target = upsert_resource(tx, object, config, None, &mut outcome)?;
            let mut props = PropertyMap::new();
            if let Some(key) = &config.edge_uri_property {
                props.insert(key.clone(), predicate.as_str().into());
            }
            let edge = tx.upsert_edge(source, edge_type, target, &props)?;
            outcome.edge_created = edge.created;
        }
        Step::Property { subject, key, value } => {
            upsert_resource(tx, subject, config, Some((key.as_str(), value)), &mut outcome)?;
        }
        Step::Typed { subject } => {
            upsert_resource(tx, subject, config, None, &mut outcome)?;
        }
    }
    Ok(outcome)
}

fn upsert_resource(
    tx: &mut dyn GraphTransaction,
    resource: &Resource,
    config: &MappingConfig,
    extra: Option<(&str, &PropertyValue)>,
    outcome: &mut StepOutcome,
) -> StoreResult<NodeId> {
    let mut props = PropertyMap::new();
    props.insert(config.uri_property.clone(), resource.uri.clone().into());
    if let Some((key, value)) = extra {
        props.insert(key.to_string(), value.clone());
    }
    let upserted = tx.upsert_node(&resource.key, &props)?;
    if upserted.created {
        outcome.nodes_created += 1;
    }
    Ok(upserted.id)
}

const XSD_INTEGER_TYPES: &[&str] = &[
    "integer",
    "int",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "positiveInteger",
    "negativeInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

const XSD_FLOAT_TYPES: &[&str] = &["decimal", "float", "double"];

/// Typed form of a literal.
///
/// Integer, decimal and boolean XSD types are parsed; every other literal,
/// dates included, keeps its lexical form as a string.
fn literal_value(literal: &Literal) -> Result<PropertyValue, String> {
    let lexical = literal.value();
    let Some(xsd_type) = literal.datatype_iri().strip_prefix(vocab::XSD) else {
        return Ok(PropertyValue::String(lexical.to_string()));
    };
    let trimmed = lexical.trim();

    if XSD_INTEGER_TYPES.contains(&xsd_type) {
        return trimmed
            .parse::<i64>()
            .map(PropertyValue::Integer)
            .map_err(|_| format!("'{}' is not a valid xsd:{}", lexical, xsd_type));
    }
    if XSD_FLOAT_TYPES.contains(&xsd_type) {
        return trimmed
            .parse::<f64>()
            .map(PropertyValue::Float)
            .map_err(|_| format!("'{}' is not a valid xsd:{}", lexical, xsd_type));
    }
    if xsd_type == "boolean" {
        return match trimmed {
            "true" | "1" => Ok(PropertyValue::Boolean(true)),
            "false" | "0" => Ok(PropertyValue::Boolean(false)),
            _ => Err(format!("'{}' is not a valid xsd:boolean", lexical)),
        };
    }
    Ok(PropertyValue::String(lexical.to_string()))
}
