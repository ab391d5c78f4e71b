//! Safe graph names derived from IRIs and free text
//!
//! Every label, relationship type and property key that originates outside the
//! crate passes through [`sanitize`] before it reaches a store. The output only
//! contains `[A-Za-z0-9_]`, never starts with a digit and is never empty.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// What a sanitized name will be used as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    /// Relationship (edge) type
    Relationship,
    /// Node label
    Label,
    /// Property key on a node or edge
    Property,
}

impl NameKind {
    /// Token prepended when a name would start with a digit
    pub fn digit_prefix(&self) -> &'static str {
        match self {
            NameKind::Relationship => "rel_",
            NameKind::Label => "label_",
            NameKind::Property => "prop_",
        }
    }

    /// Token used when nothing usable is left
    pub fn default_name(&self) -> &'static str {
        match self {
            NameKind::Relationship => "RELATIONSHIP",
            NameKind::Label => "Resource",
            NameKind::Property => "property",
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Relationship => write!(f, "relationship"),
            NameKind::Label => write!(f, "label"),
            NameKind::Property => write!(f, "property"),
        }
    }
}

/// Terminal segment of an IRI: after the last '/', then after the last '#'
pub fn terminal_segment(raw: &str) -> &str {
    let after_slash = raw.rsplit('/').next().unwrap_or(raw);
    after_slash.rsplit('#').next().unwrap_or(after_slash)
}

/// Derive a safe name of the given kind from an IRI or text fragment.
///
/// Total and deterministic. Each character outside `[A-Za-z0-9_]` becomes a
/// single `_`.
pub fn sanitize(raw: &str, kind: NameKind) -> String {
    let segment = terminal_segment(raw);
    let mut name: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.is_empty() {
        return kind.default_name().to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, kind.digit_prefix());
    }
    name
}

/// Relationship type for a predicate IRI
pub fn relationship_type(raw: &str) -> String {
    sanitize(raw, NameKind::Relationship)
}

/// Label for a type IRI
pub fn label_name(raw: &str) -> String {
    sanitize(raw, NameKind::Label)
}

/// Property key for a predicate IRI
pub fn property_key(raw: &str) -> String {
    sanitize(raw, NameKind::Property)
}

/// Property key for a language-tagged literal, e.g. `name_zh_CN`
pub fn language_suffixed_key(predicate: &str, language: &str) -> String {
    let key = property_key(predicate);
    let lang: String = language
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if lang.is_empty() {
        key
    } else {
        format!("{}_{}", key, lang)
    }
}

/// Local identifier of a resource: the part after the last '/'.
///
/// An IRI ending in '/' has no terminal segment and keeps the whole IRI.
pub fn local_id(iri: &str) -> &str {
    match iri.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => iri,
    }
}

/// True if `name` is already a valid sanitized name
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Name taken from configuration, sanitized the same way ingest does so
/// that lookups match what the store holds
pub fn configured_name(raw: &str, kind: NameKind) -> String {
    if is_safe_name(raw) {
        return raw.to_string();
    }
    let name = sanitize(raw, kind);
    warn!("Configured {} name {:?} stored as {:?}", kind, raw, name);
    name
}
