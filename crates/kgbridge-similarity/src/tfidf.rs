//! TF-IDF cosine similarity over a two-document corpus
//!
//! Weights follow the usual smoothed scheme: raw term counts multiplied by
//! `ln((1 + n) / (1 + df)) + 1`, each document vector L2-normalized.

use ndarray::Array1;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// How a normalized text is split into terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Tokenizer {
    /// Runs of two or more word characters
    #[default]
    Words,
    /// Overlapping character windows of length `n`
    CharNgrams { n: usize },
}

impl Tokenizer {
    /// Split `text` into terms.
    ///
    /// A non-empty text that yields no terms (a single character for
    /// [`Tokenizer::Words`], or text shorter than the window) becomes a single
    /// term so identical inputs still score 1.0.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut terms: Vec<String> = match self {
            Tokenizer::Words => word_pattern()
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            Tokenizer::CharNgrams { n } => {
                let chars: Vec<char> = text.chars().collect();
                if *n == 0 {
                    Vec::new()
                } else {
                    chars.windows(*n).map(|w| w.iter().collect()).collect()
                }
            }
        };
        if terms.is_empty() && !text.is_empty() {
            terms.push(text.to_string());
        }
        terms
    }
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static regex"))
}

/// Cosine similarity of the TF-IDF vectors of `a` and `b`.
///
/// Returns 0.0 when either input is empty.
pub fn tfidf_cosine(a: &str, b: &str, tokenizer: Tokenizer) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let docs = [tokenizer.tokenize(a), tokenizer.tokenize(b)];

    // Vocabulary in first-seen order, with document frequencies
    let mut vocab: HashMap<&str, usize> = HashMap::new();
    let mut df: Vec<usize> = Vec::new();
    for doc in &docs {
        let mut seen_in_doc: Vec<usize> = Vec::new();
        for term in doc {
            let next = vocab.len();
            let idx = *vocab.entry(term.as_str()).or_insert(next);
            if idx == df.len() {
                df.push(0);
            }
            if !seen_in_doc.contains(&idx) {
                seen_in_doc.push(idx);
                df[idx] += 1;
            }
        }
    }

    let n_docs = docs.len() as f64;
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1.0 + n_docs) / (1.0 + d as f64)).ln() + 1.0)
        .collect();

    let vectors: Vec<Array1<f64>> = docs
        .iter()
        .map(|doc| {
            let mut v = Array1::<f64>::zeros(vocab.len());
            for term in doc {
                v[vocab[term.as_str()]] += 1.0;
            }
            for (i, w) in v.iter_mut().enumerate() {
                *w *= idf[i];
            }
            let norm = v.dot(&v).sqrt();
            if norm > 0.0 {
                v /= norm;
            }
            v
        })
        .collect();

    vectors[0].dot(&vectors[1]).clamp(0.0, 1.0)
}
