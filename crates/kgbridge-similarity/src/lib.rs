//! Text similarity for entity alignment and disambiguation
//!
//! Scores are built from two signals over normalized entity names:
//! - a Ratcliff/Obershelp sequence-alignment ratio ([`sequence_ratio`])
//! - a TF-IDF cosine over the pair treated as a two-document corpus ([`tfidf_cosine`])
//!
//! [`similarity`] combines them as `0.6 * edit + 0.4 * tfidf`.

pub mod hybrid;
pub mod normalize;
pub mod sequence;
pub mod tfidf;
pub mod vector;

pub use hybrid::{hybrid_similarity, similarity, HybridConfig};
pub use normalize::normalize;
pub use sequence::{sequence_ratio, Match, SequenceMatcher};
pub use tfidf::{tfidf_cosine, Tokenizer};
pub use vector::cosine_similarity;
