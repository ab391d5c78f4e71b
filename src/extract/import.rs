//! Extraction pipeline and entity-triple import

use super::{EntityRecognizer, EntityTriple, RelationClassifier};
use crate::graph::{EdgeType, Label, PropertyMap};
use crate::naming::{configured_name, NameKind};
use crate::store::{GraphBackend, NodeKey, RetryPolicy};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Runs a recognizer and a relation classifier over text
pub struct TextExtractor<R, C> {
    recognizer: R,
    classifier: C,
}

impl<R: EntityRecognizer, C: RelationClassifier> TextExtractor<R, C> {
    pub fn new(recognizer: R, classifier: C) -> Self {
        TextExtractor { recognizer, classifier }
    }

    /// Triples for every pair of distinct mentions the classifier relates,
    /// the earlier mention as subject
    pub fn extract(&self, text: &str) -> Vec<EntityTriple> {
        let mentions = self.recognizer.recognize(text);
        debug!("Recognized {} mention(s)", mentions.len());

        let mut triples = Vec::new();
        for (i, head) in mentions.iter().enumerate() {
            for tail in &mentions[i + 1..] {
                if let Some(relation) = self.classifier.classify(text, head, tail) {
                    triples.push(EntityTriple::between(head, relation, tail));
                }
            }
        }
        triples
    }
}

/// A triple that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub triple: String,
    pub reason: String,
}

/// Summary of an entity-triple import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub triples_seen: usize,
    pub triples_applied: usize,
    pub nodes_created: usize,
    pub edges_created: usize,
    pub failures: Vec<ImportFailure>,
}

/// Writes entity triples as `(type {name})` nodes and typed edges
#[derive(Debug, Clone)]
pub struct EntityImporter {
    name_property: String,
    predicate_property: String,
    retry: RetryPolicy,
}

impl Default for EntityImporter {
    fn default() -> Self {
        EntityImporter {
            name_property: "name".to_string(),
            predicate_property: "predicate".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EntityImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_property(mut self, name_property: impl Into<String>) -> Self {
        self.name_property = configured_name(&name_property.into(), NameKind::Property);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upsert both entities and the relation, one transaction per triple.
    ///
    /// The edge type is the sanitized predicate; the raw predicate is kept
    /// in the `predicate` edge property.
    pub fn import<B: GraphBackend>(&self, backend: &mut B, triples: &[EntityTriple]) -> ImportReport {
        let mut report = ImportReport {
            triples_seen: triples.len(),
            ..ImportReport::default()
        };

        for triple in triples {
            let subject = NodeKey::new(
                Label::sanitized(&triple.subject_type),
                self.name_property.as_str(),
                triple.subject.as_str(),
            );
            let object = NodeKey::new(
                Label::sanitized(&triple.object_type),
                self.name_property.as_str(),
                triple.object.as_str(),
            );
            let edge_type = EdgeType::sanitized(&triple.predicate);
            let mut edge_props = PropertyMap::new();
            edge_props.insert(self.predicate_property.clone(), triple.predicate.as_str().into());

            let result = self.retry.run(|| {
                backend.write(|tx| {
                    let none = PropertyMap::new();
                    let s = tx.upsert_node(&subject, &none)?;
                    let o = tx.upsert_node(&object, &none)?;
                    let e = tx.upsert_edge(s.id, &edge_type, o.id, &edge_props)?;
                    Ok((usize::from(s.created) + usize::from(o.created), e.created))
                })
            });

            match result {
                Ok((nodes_created, edge_created)) => {
                    report.triples_applied += 1;
                    report.nodes_created += nodes_created;
                    if edge_created {
                        report.edges_created += 1;
                    }
                }
                Err(e) => {
                    warn!("Store failure on {}: {}", triple, e);
                    report.failures.push(ImportFailure {
                        triple: triple.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Imported {}/{} entity triples ({} nodes created, {} edges created)",
            report.triples_applied, report.triples_seen, report.nodes_created, report.edges_created
        );
        report
    }
}

/// Import with default settings
pub fn import_entity_triples<B: GraphBackend>(backend: &mut B, triples: &[EntityTriple]) -> ImportReport {
    EntityImporter::new().import(backend, triples)
}
