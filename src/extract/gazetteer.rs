//! Dictionary-based entity recognition

use super::{EntityRecognizer, Mention};
use rustc_hash::FxHashSet;

/// Recognizes entities by longest dictionary match.
///
/// Text is scanned left to right; at each position the longest entry that
/// starts there is taken and scanning resumes after it.
#[derive(Debug, Clone, Default)]
pub struct GazetteerRecognizer {
    /// Entries sorted longest first
    entries: Vec<Mention>,
}

impl GazetteerRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface form. Empty forms are ignored and a repeated form keeps
    /// its first type.
    pub fn add(&mut self, text: impl Into<String>, entity_type: impl Into<String>) {
        let text = text.into();
        if text.is_empty() || self.entries.iter().any(|e| e.text == text) {
            return;
        }
        let len = text.chars().count();
        let at = self
            .entries
            .iter()
            .position(|e| e.text.chars().count() < len)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, Mention::new(text, entity_type));
    }

    pub fn with_entry(mut self, text: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.add(text, entity_type);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for GazetteerRecognizer {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut gazetteer = GazetteerRecognizer::new();
        for (text, entity_type) in iter {
            gazetteer.add(text, entity_type);
        }
        gazetteer
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, text: &str) -> Vec<Mention> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut mentions = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            match self.entries.iter().find(|e| rest.starts_with(e.text.as_str())) {
                Some(entry) => {
                    if seen.insert(entry.text.as_str()) {
                        mentions.push(entry.clone());
                    }
                    pos += entry.text.len();
                }
                None => {
                    pos += rest.chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        mentions
    }
}
