//! Vector similarity for embedding-based scorers

use ndarray::ArrayView1;

/// Cosine similarity of two embeddings.
///
/// Returns 0.0 for empty or mismatched inputs and for zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (a, b) = (ArrayView1::from(a), ArrayView1::from(b));
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}
