//! Entity resolution over a materialized graph
//!
//! Two post-passes run after ingest:
//!
//! - **Alignment** ([`EntityAligner`]): same-label entities whose names score
//!   at or above a threshold are merged into the first-seen one
//! - **Disambiguation** ([`Disambiguator`]): picks which of several same-named
//!   entities a piece of text refers to, by comparing the text with each
//!   entity's outgoing relationships
//!
//! Both score names through a [`SimilarityScorer`].

mod align;
mod candidates;
mod disambiguate;
mod scorer;

pub use align::{EntityAligner, MergeRecord, PairFailure};
pub use candidates::{AllPairs, CandidateFilter, SharedCharacters};
pub use disambiguate::{CandidateScore, Disambiguation, DisambiguationMatch, Disambiguator};
pub use scorer::{EmbeddingScorer, HybridScorer, SimilarityScorer};

use crate::graph::NodeId;
use crate::naming::{configured_name, NameKind};
use crate::store::StoreError;
use kgbridge_similarity::HybridConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolution errors
///
/// Only failures that stop a whole pass surface here; a failed merge is
/// recorded in the [`ResolutionReport`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f64),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// How candidate pairs are chosen before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateMode {
    /// Score every pair
    #[default]
    AllPairs,
    /// Skip pairs whose normalized names share no character
    SharedCharacters,
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum score for two entities to be merged
    pub threshold: f64,

    /// Property holding an entity's name
    pub name_property: String,

    /// Hybrid scorer weights and tokenizer
    pub similarity: HybridConfig,

    /// Also move relationships pointing at a merged entity
    pub redirect_incoming: bool,

    /// Labels to align; empty aligns every label
    pub labels: Vec<String>,

    pub candidates: CandidateMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            threshold: 0.8,
            name_property: "name".to_string(),
            similarity: HybridConfig::default(),
            redirect_incoming: true,
            labels: Vec::new(),
            candidates: CandidateMode::AllPairs,
        }
    }
}

impl ResolverConfig {
    /// Config with another merge threshold
    pub fn with_threshold(threshold: f64) -> Self {
        ResolverConfig {
            threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ResolveResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ResolveError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    /// Rewrite the configured property and label names into their stored form
    pub fn sanitize_names(&mut self) {
        self.name_property = configured_name(&self.name_property, NameKind::Property);
        for label in &mut self.labels {
            *label = configured_name(label, NameKind::Label);
        }
    }
}

/// A disambiguation query and its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisambiguationRecord {
    pub name: String,
    pub context: String,
    /// Chosen node, `None` when no entity has the name
    pub chosen: Option<NodeId>,
    pub score: Option<f64>,
}

/// Audit trail of a resolution run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionReport {
    /// Pairs scored
    pub comparisons: usize,
    /// Pairs the candidate filter ruled out
    pub pairs_filtered: usize,
    pub merges: Vec<MergeRecord>,
    pub failures: Vec<PairFailure>,
    pub disambiguations: Vec<DisambiguationRecord>,
}

impl ResolutionReport {
    /// `(kept, merged)` pairs in merge order
    pub fn merged_pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.merges.iter().map(|m| (m.kept, m.merged)).collect()
    }

    /// Fold another report into this one
    pub fn absorb(&mut self, other: ResolutionReport) {
        self.comparisons += other.comparisons;
        self.pairs_filtered += other.pairs_filtered;
        self.merges.extend(other.merges);
        self.failures.extend(other.failures);
        self.disambiguations.extend(other.disambiguations);
    }

    pub fn record_disambiguation(&mut self, name: &str, context: &str, outcome: &Disambiguation) {
        let (chosen, score) = match outcome {
            Disambiguation::Match(m) => (Some(m.node), Some(m.score)),
            Disambiguation::NoMatch => (None, None),
        };
        self.disambiguations.push(DisambiguationRecord {
            name: name.to_string(),
            context: context.to_string(),
            chosen,
            score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.threshold, 0.8);
        assert_eq!(config.name_property, "name");
        assert!(config.redirect_incoming);
        assert!(config.validate().is_ok());
        assert_eq!(
            ResolverConfig::with_threshold(1.5).validate(),
            Err(ResolveError::InvalidThreshold(1.5))
        );
    }

    #[test]
    fn test_sanitize_names() {
        let mut config = ResolverConfig {
            name_property: "full-name".to_string(),
            labels: vec!["my-org".to_string(), "Person".to_string()],
            ..ResolverConfig::default()
        };
        config.sanitize_names();
        assert_eq!(config.name_property, "full_name");
        assert_eq!(config.labels, vec!["my_org", "Person"]);
    }

    #[test]
    fn test_report_absorb() {
        let mut report = ResolutionReport {
            comparisons: 3,
            ..ResolutionReport::default()
        };
        report.record_disambiguation("苹果", "苹果发布新款iPhone", &Disambiguation::NoMatch);
        report.absorb(ResolutionReport {
            comparisons: 2,
            pairs_filtered: 1,
            ..ResolutionReport::default()
        });

        assert_eq!(report.comparisons, 5);
        assert_eq!(report.pairs_filtered, 1);
        assert_eq!(report.disambiguations.len(), 1);
        assert_eq!(report.disambiguations[0].chosen, None);
    }
}
