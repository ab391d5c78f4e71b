//! Weighted edit + TF-IDF score used for entity names

use crate::normalize::normalize;
use crate::sequence::sequence_ratio;
use crate::tfidf::{tfidf_cosine, Tokenizer};

/// Hybrid similarity configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HybridConfig {
    /// Weight of the sequence-alignment ratio
    pub edit_weight: f64,
    /// Weight of the TF-IDF cosine
    pub tfidf_weight: f64,
    /// Term splitting for the TF-IDF part
    pub tokenizer: Tokenizer,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            edit_weight: 0.6,
            tfidf_weight: 0.4,
            tokenizer: Tokenizer::Words,
        }
    }
}

/// Similarity of two entity names with the default weighting
pub fn similarity(a: &str, b: &str) -> f64 {
    hybrid_similarity(a, b, &HybridConfig::default())
}

/// Similarity of two texts in `[0, 1]`.
///
/// Both texts are normalized first; if either normalizes to the empty string
/// the score is 0.0.
pub fn hybrid_similarity(a: &str, b: &str, config: &HybridConfig) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let edit = sequence_ratio(&a, &b);
    let tfidf = tfidf_cosine(&a, &b, config.tokenizer);
    (config.edit_weight * edit + config.tfidf_weight * tfidf).clamp(0.0, 1.0)
}
