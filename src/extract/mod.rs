//! Text extraction import
//!
//! Named-entity recognition, relation classification and embedding models
//! sit behind the [`EntityRecognizer`], [`RelationClassifier`] and
//! [`Embedder`] traits. Rule-based implementations are provided for offline
//! use; [`decode_bio`] turns the per-token tags of a sequence-labelling model
//! into mentions.
//!
//! Extracted [`EntityTriple`]s are written with [`import_entity_triples`],
//! which keys nodes by `(entity type, name)`.

mod bio;
mod gazetteer;
mod import;
mod rules;

pub use bio::decode_bio;
pub use gazetteer::GazetteerRecognizer;
pub use import::{import_entity_triples, EntityImporter, ImportFailure, ImportReport, TextExtractor};
pub use rules::{KeywordRelationClassifier, RelationRule};

use serde::{Deserialize, Serialize};
use std::fmt;

/// An entity found in text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    /// Entity type tag, e.g. `PER`, `ORG`, `LOC`
    pub entity_type: String,
}

impl Mention {
    pub fn new(text: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Mention {
            text: text.into(),
            entity_type: entity_type.into(),
        }
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.text, self.entity_type)
    }
}

/// A typed relation between two named entities
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityTriple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub subject_type: String,
    pub object_type: String,
}

impl EntityTriple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        subject_type: impl Into<String>,
        object_type: impl Into<String>,
    ) -> Self {
        EntityTriple {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            subject_type: subject_type.into(),
            object_type: object_type.into(),
        }
    }

    /// Triple relating two mentions
    pub fn between(head: &Mention, predicate: impl Into<String>, tail: &Mention) -> Self {
        Self::new(
            head.text.clone(),
            predicate,
            tail.text.clone(),
            head.entity_type.clone(),
            tail.entity_type.clone(),
        )
    }
}

impl fmt::Display for EntityTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{})-[{}]->({}:{})",
            self.subject, self.subject_type, self.predicate, self.object, self.object_type
        )
    }
}

/// Finds entity mentions in text
pub trait EntityRecognizer {
    /// Distinct mentions in order of first appearance
    fn recognize(&self, text: &str) -> Vec<Mention>;
}

/// Names the relation `text` states between two mentions
pub trait RelationClassifier {
    /// `None` when the text states no relation between them
    fn classify(&self, text: &str, head: &Mention, tail: &Mention) -> Option<String>;
}

/// Maps text to a dense vector
pub trait Embedder {
    fn embed(&self, text: &str) -> Vec<f32>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> Vec<f32> {
        (**self).embed(text)
    }
}
