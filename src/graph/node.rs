//! Node of the property graph
//!
//! Every node carries exactly one label. Upserts find nodes by
//! (label, key property), so a second label would make the key ambiguous.

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};

/// A node in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Type of the entity (e.g., "Book", "ORG")
    pub label: Label,

    /// Properties associated with this node
    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Node {
    /// Create a new node without properties
    pub fn new(id: NodeId, label: impl Into<Label>) -> Self {
        Self::new_with_properties(id, label, PropertyMap::new())
    }

    /// Create a new node with properties
    pub fn new_with_properties(id: NodeId, label: impl Into<Label>, properties: PropertyMap) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Node {
            id,
            label: label.into(),
            properties,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &Label) -> bool {
        &self.label == label
    }

    /// Set a property value, returning the previous one
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        let old = self.properties.insert(key.into(), value.into());
        self.update_timestamp();
        old
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// String value of a property, if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_string())
    }

    /// Remove a property
    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        let removed = self.properties.shift_remove(key);
        if removed.is_some() {
            self.update_timestamp();
        }
        removed
    }

    /// Check if property exists
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn update_timestamp(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_node() {
        let node = Node::new(NodeId::new(1), "Book");
        assert_eq!(node.id, NodeId::new(1));
        assert!(node.has_label(&Label::new("Book")));
        assert!(!node.has_label(&Label::new("Resource")));
    }

    #[test]
    fn test_node_properties() {
        let mut node = Node::new(NodeId::new(4), "Person");

        assert_eq!(node.set_property("name_zh", "张三"), None);
        node.set_property("age", 30i64);
        assert_eq!(node.get_str("name_zh"), Some("张三"));
        assert_eq!(node.get_str("age"), None);
        assert_eq!(node.get_property("age").unwrap().as_integer(), Some(30));

        let old = node.set_property("age", 31i64);
        assert_eq!(old, Some(PropertyValue::Integer(30)));

        assert!(node.remove_property("age").is_some());
        assert!(!node.has_property("age"));
        assert_eq!(node.property_count(), 1);
    }

    #[test]
    fn test_node_timestamps() {
        let node = Node::new(NodeId::new(6), "Test");
        assert!(node.created_at > 0);
        assert_eq!(node.created_at, node.updated_at);

        std::thread::sleep(std::time::Duration::from_millis(10));
        let mut node2 = node.clone();
        node2.set_property("key", "value");

        assert!(node2.updated_at > node.updated_at);
    }

    #[test]
    fn test_node_equality() {
        let node1 = Node::new(NodeId::new(7), "ORG");
        let node2 = Node::new(NodeId::new(7), "FRUIT");
        let node3 = Node::new(NodeId::new(8), "ORG");

        assert_eq!(node1, node2);
        assert_ne!(node1, node3);
    }
}
