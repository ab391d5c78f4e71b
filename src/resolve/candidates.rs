//! Candidate-pair prefilters
//!
//! A filter only decides which pairs get scored. It never changes how a
//! scored pair is merged. The aligner skips the filter at threshold 0,
//! where every pair merges regardless of score.

use kgbridge_similarity::normalize;
use rustc_hash::FxHashSet;

/// Decides whether a pair of names is worth scoring
pub trait CandidateFilter {
    fn admits(&self, a: &str, b: &str) -> bool;
}

/// Scores every pair
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPairs;

impl CandidateFilter for AllPairs {
    fn admits(&self, _a: &str, _b: &str) -> bool {
        true
    }
}

/// Blocks pairs whose normalized names share no character.
///
/// Such pairs have a sequence ratio and TF-IDF cosine of 0, so the hybrid
/// score never reaches a positive threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedCharacters;

impl CandidateFilter for SharedCharacters {
    fn admits(&self, a: &str, b: &str) -> bool {
        let chars: FxHashSet<char> = normalize(a).chars().collect();
        normalize(b).chars().any(|c| chars.contains(&c))
    }
}
