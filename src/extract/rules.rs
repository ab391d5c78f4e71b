//! Keyword rules for relation classification

use super::{Mention, RelationClassifier};
use serde::{Deserialize, Serialize};

/// Relation stated by a keyword, optionally limited to entity types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRule {
    pub keyword: String,
    pub relation: String,
    #[serde(default)]
    pub head_type: Option<String>,
    #[serde(default)]
    pub tail_type: Option<String>,
}

impl RelationRule {
    pub fn new(keyword: impl Into<String>, relation: impl Into<String>) -> Self {
        RelationRule {
            keyword: keyword.into(),
            relation: relation.into(),
            head_type: None,
            tail_type: None,
        }
    }

    /// Only relate a `head_type` head to a `tail_type` tail
    pub fn typed(mut self, head_type: impl Into<String>, tail_type: impl Into<String>) -> Self {
        self.head_type = Some(head_type.into());
        self.tail_type = Some(tail_type.into());
        self
    }

    fn applies(&self, text: &str, head: &Mention, tail: &Mention) -> bool {
        let type_ok = |want: &Option<String>, m: &Mention| want.as_ref().map_or(true, |t| *t == m.entity_type);
        text.contains(self.keyword.as_str()) && type_ok(&self.head_type, head) && type_ok(&self.tail_type, tail)
    }
}

/// Returns the relation of the first rule that applies
#[derive(Debug, Clone, Default)]
pub struct KeywordRelationClassifier {
    rules: Vec<RelationRule>,
}

impl KeywordRelationClassifier {
    pub fn new(rules: Vec<RelationRule>) -> Self {
        KeywordRelationClassifier { rules }
    }

    pub fn with_rule(mut self, rule: RelationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[RelationRule] {
        &self.rules
    }
}

impl RelationClassifier for KeywordRelationClassifier {
    fn classify(&self, text: &str, head: &Mention, tail: &Mention) -> Option<String> {
        self.rules
            .iter()
            .find(|r| r.applies(text, head, tail))
            .map(|r| r.relation.clone())
    }
}
