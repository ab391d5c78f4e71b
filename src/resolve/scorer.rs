//! Pluggable name scoring

use crate::extract::Embedder;
use kgbridge_similarity::{cosine_similarity, hybrid_similarity, HybridConfig};

/// Scores how likely two texts name the same thing, in `[0, 1]`
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> f64;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Weighted sequence-ratio + TF-IDF cosine over normalized text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HybridScorer {
    config: HybridConfig,
}

impl HybridScorer {
    pub fn new(config: HybridConfig) -> Self {
        HybridScorer { config }
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }
}

impl SimilarityScorer for HybridScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        hybrid_similarity(a, b, &self.config)
    }
}

/// Cosine similarity of model embeddings.
///
/// Negative cosines are clamped to 0.
#[derive(Debug, Clone)]
pub struct EmbeddingScorer<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> EmbeddingScorer<E> {
    pub fn new(embedder: E) -> Self {
        EmbeddingScorer { embedder }
    }
}

impl<E: Embedder> SimilarityScorer for EmbeddingScorer<E> {
    fn score(&self, a: &str, b: &str) -> f64 {
        let (va, vb) = (self.embedder.embed(a), self.embedder.embed(b));
        f64::from(cosine_similarity(&va, &vb)).clamp(0.0, 1.0)
    }
}
