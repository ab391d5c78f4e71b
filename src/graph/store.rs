//! In-memory graph storage
//!
//! Nodes and edges live in id-indexed arenas, so iteration follows creation
//! order. Three indices back the upsert operations:
//! - label -> node ids
//! - (property key, string value) -> node ids
//! - (source, edge type, target) -> edge id

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, Label, NodeId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Node {0} already exists")]
    NodeAlreadyExists(NodeId),

    #[error("Edge {0} already exists")]
    EdgeAlreadyExists(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),
}

pub type GraphResult<T> = Result<T, GraphError>;

type EdgeKey = (NodeId, EdgeType, NodeId);

/// Node and edge counts, overall and per label / edge type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub label_counts: BTreeMap<String, usize>,
    pub edge_type_counts: BTreeMap<String, usize>,
}

/// In-memory graph storage
#[derive(Debug)]
pub struct GraphStore {
    /// Node arena, indexed by node id
    nodes: Vec<Option<Node>>,

    /// Edge arena, indexed by edge id
    edges: Vec<Option<Edge>>,

    /// Outgoing edges for each node (adjacency list)
    outgoing: Vec<Vec<EdgeId>>,

    /// Incoming edges for each node (adjacency list)
    incoming: Vec<Vec<EdgeId>>,

    /// Label index, ordered by node id
    label_index: FxHashMap<Label, BTreeSet<NodeId>>,

    /// Index of string-valued node properties
    property_index: FxHashMap<(String, String), BTreeSet<NodeId>>,

    /// One edge per (source, type, target)
    edge_index: FxHashMap<EdgeKey, EdgeId>,

    node_count: usize,
    edge_count: usize,

    /// Next node ID
    next_node_id: u64,

    /// Next edge ID
    next_edge_id: u64,
}

impl GraphStore {
    /// Create an empty graph store
    pub fn new() -> Self {
        GraphStore {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            label_index: FxHashMap::default(),
            property_index: FxHashMap::default(),
            edge_index: FxHashMap::default(),
            node_count: 0,
            edge_count: 0,
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    /// Create a node with auto-generated ID and no properties
    pub fn create_node(&mut self, label: impl Into<Label>) -> NodeId {
        self.create_node_with_properties(label, PropertyMap::new())
    }

    /// Create a node with a label and properties
    pub fn create_node_with_properties(
        &mut self,
        label: impl Into<Label>,
        properties: PropertyMap,
    ) -> NodeId {
        let node_id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        self.insert_node(Node::new_with_properties(node_id, label, properties));
        node_id
    }

    fn insert_node(&mut self, node: Node) {
        let idx = node.id.as_u64() as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize(idx + 1, None);
            self.outgoing.resize(idx + 1, Vec::new());
            self.incoming.resize(idx + 1, Vec::new());
        }

        self.label_index
            .entry(node.label.clone())
            .or_default()
            .insert(node.id);
        for (key, value) in &node.properties {
            self.index_property(node.id, key, value);
        }

        self.nodes[idx] = Some(node);
        self.node_count += 1;
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_u64() as usize).and_then(|n| n.as_ref())
    }

    /// Check if a node exists
    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Set a property on a node, returning the previous value
    pub fn set_node_property(
        &mut self,
        node_id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();
        let node = self
            .nodes
            .get_mut(node_id.as_u64() as usize)
            .and_then(|n| n.as_mut())
            .ok_or(GraphError::NodeNotFound(node_id))?;

        let old = node.set_property(key.clone(), value.clone());
        if let Some(old) = &old {
            self.unindex_property(node_id, &key, old);
        }
        self.index_property(node_id, &key, &value);
        Ok(old)
    }

    /// Remove a property from a node, returning the removed value
    pub fn remove_node_property(&mut self, node_id: NodeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let node = self
            .nodes
            .get_mut(node_id.as_u64() as usize)
            .and_then(|n| n.as_mut())
            .ok_or(GraphError::NodeNotFound(node_id))?;

        let removed = node.remove_property(key);
        if let Some(old) = &removed {
            self.unindex_property(node_id, key, old);
        }
        Ok(removed)
    }

    /// Delete a node and all its connected edges.
    ///
    /// Returns the node and the removed edges, outgoing first.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<(Node, Vec<Edge>)> {
        let idx = id.as_u64() as usize;
        if !self.has_node(id) {
            return Err(GraphError::NodeNotFound(id));
        }

        let mut edge_ids = self.outgoing[idx].clone();
        for edge_id in &self.incoming[idx] {
            if !edge_ids.contains(edge_id) {
                edge_ids.push(*edge_id);
            }
        }
        let mut removed_edges = Vec::with_capacity(edge_ids.len());
        for edge_id in edge_ids {
            removed_edges.push(self.delete_edge(edge_id)?);
        }

        let node = self.nodes[idx].take().ok_or(GraphError::NodeNotFound(id))?;
        if let Some(set) = self.label_index.get_mut(&node.label) {
            set.remove(&id);
            if set.is_empty() {
                self.label_index.remove(&node.label);
            }
        }
        for (key, value) in &node.properties {
            self.unindex_property(id, key, value);
        }
        self.node_count -= 1;

        Ok((node, removed_edges))
    }

    /// Put back a previously deleted node under its original id
    pub fn restore_node(&mut self, node: Node) -> GraphResult<()> {
        if self.has_node(node.id) {
            return Err(GraphError::NodeAlreadyExists(node.id));
        }
        if node.id.as_u64() >= self.next_node_id {
            self.next_node_id = node.id.as_u64() + 1;
        }
        self.insert_node(node);
        Ok(())
    }

    /// Create an edge between two nodes
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        self.create_edge_with_properties(source, target, edge_type, PropertyMap::new())
    }

    /// Create an edge with properties.
    ///
    /// Fails with [`GraphError::EdgeAlreadyExists`] if an edge of the same type
    /// already links the two nodes in this direction.
    pub fn create_edge_with_properties(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        let edge_type = edge_type.into();
        if let Some(existing) = self.find_edge(source, &edge_type, target) {
            return Err(GraphError::EdgeAlreadyExists(existing.id));
        }

        let edge_id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;
        self.insert_edge(Edge::new_with_properties(
            edge_id, source, target, edge_type, properties,
        ))?;
        Ok(edge_id)
    }

    fn insert_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if !self.has_node(edge.source) {
            return Err(GraphError::InvalidEdgeSource(edge.source));
        }
        if !self.has_node(edge.target) {
            return Err(GraphError::InvalidEdgeTarget(edge.target));
        }

        let idx = edge.id.as_u64() as usize;
        if idx >= self.edges.len() {
            self.edges.resize(idx + 1, None);
        }

        self.outgoing[edge.source.as_u64() as usize].push(edge.id);
        self.incoming[edge.target.as_u64() as usize].push(edge.id);
        self.edge_index
            .insert((edge.source, edge.edge_type.clone(), edge.target), edge.id);

        self.edges[idx] = Some(edge);
        self.edge_count += 1;
        Ok(())
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.as_u64() as usize).and_then(|e| e.as_ref())
    }

    /// Check if an edge exists
    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.get_edge(id).is_some()
    }

    /// Set a property on an edge, returning the previous value
    pub fn set_edge_property(
        &mut self,
        edge_id: EdgeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let edge = self
            .edges
            .get_mut(edge_id.as_u64() as usize)
            .and_then(|e| e.as_mut())
            .ok_or(GraphError::EdgeNotFound(edge_id))?;
        Ok(edge.set_property(key, value))
    }

    /// Remove a property from an edge
    pub fn remove_edge_property(&mut self, edge_id: EdgeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let edge = self
            .edges
            .get_mut(edge_id.as_u64() as usize)
            .and_then(|e| e.as_mut())
            .ok_or(GraphError::EdgeNotFound(edge_id))?;
        Ok(edge.remove_property(key))
    }

    /// Delete an edge
    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self
            .edges
            .get_mut(id.as_u64() as usize)
            .and_then(|e| e.take())
            .ok_or(GraphError::EdgeNotFound(id))?;

        if let Some(adj) = self.outgoing.get_mut(edge.source.as_u64() as usize) {
            adj.retain(|&eid| eid != id);
        }
        if let Some(adj) = self.incoming.get_mut(edge.target.as_u64() as usize) {
            adj.retain(|&eid| eid != id);
        }
        self.edge_index
            .remove(&(edge.source, edge.edge_type.clone(), edge.target));
        self.edge_count -= 1;

        Ok(edge)
    }

    /// Put back a previously deleted edge under its original id
    pub fn restore_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if self.has_edge(edge.id) {
            return Err(GraphError::EdgeAlreadyExists(edge.id));
        }
        if let Some(existing) = self.find_edge(edge.source, &edge.edge_type, edge.target) {
            return Err(GraphError::EdgeAlreadyExists(existing.id));
        }
        if edge.id.as_u64() >= self.next_edge_id {
            self.next_edge_id = edge.id.as_u64() + 1;
        }
        self.insert_edge(edge)
    }

    /// The edge of `edge_type` from `source` to `target`, if any
    pub fn find_edge(&self, source: NodeId, edge_type: &EdgeType, target: NodeId) -> Option<&Edge> {
        self.edge_index
            .get(&(source, edge_type.clone(), target))
            .and_then(|&id| self.get_edge(id))
    }

    /// First node (in creation order) with `label` whose string property
    /// `key` equals `value`
    pub fn find_node(&self, label: &Label, key: &str, value: &str) -> Option<&Node> {
        self.property_index
            .get(&(key.to_string(), value.to_string()))
            .and_then(|ids| {
                ids.iter()
                    .filter_map(|&id| self.get_node(id))
                    .find(|node| node.has_label(label))
            })
    }

    /// All nodes, of any label, whose string property `key` equals `value`
    pub fn find_nodes_by_property(&self, key: &str, value: &str) -> Vec<&Node> {
        self.property_index
            .get(&(key.to_string(), value.to_string()))
            .map(|ids| ids.iter().filter_map(|&id| self.get_node(id)).collect())
            .unwrap_or_default()
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(node_id.as_u64() as usize)
            .map(|edge_ids| edge_ids.iter().filter_map(|&id| self.get_edge(id)).collect())
            .unwrap_or_default()
    }

    /// Get all incoming edges to a node
    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(node_id.as_u64() as usize)
            .map(|edge_ids| edge_ids.iter().filter_map(|&id| self.get_edge(id)).collect())
            .unwrap_or_default()
    }

    /// Get all nodes with a specific label, in creation order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|node_ids| node_ids.iter().filter_map(|&id| self.get_node(id)).collect())
            .unwrap_or_default()
    }

    /// Labels currently in use, sorted
    pub fn labels(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = self.label_index.keys().collect();
        labels.sort();
        labels
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Get total number of edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Get all nodes in creation order
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().flatten().collect()
    }

    /// Get all edges in creation order
    pub fn all_edges(&self) -> Vec<&Edge> {
        self.edges.iter().flatten().collect()
    }

    /// Counts per label and edge type
    pub fn statistics(&self) -> GraphStatistics {
        let mut stats = GraphStatistics {
            node_count: self.node_count,
            edge_count: self.edge_count,
            ..GraphStatistics::default()
        };
        for (label, ids) in &self.label_index {
            stats.label_counts.insert(label.to_string(), ids.len());
        }
        for edge in self.edges.iter().flatten() {
            *stats
                .edge_type_counts
                .entry(edge.edge_type.to_string())
                .or_insert(0) += 1;
        }
        stats
    }

    /// Clear all data from the graph
    pub fn clear(&mut self) {
        *self = GraphStore::new();
    }

    fn index_property(&mut self, id: NodeId, key: &str, value: &PropertyValue) {
        if let PropertyValue::String(s) = value {
            self.property_index
                .entry((key.to_string(), s.clone()))
                .or_default()
                .insert(id);
        }
    }

    fn unindex_property(&mut self, id: NodeId, key: &str, value: &PropertyValue) {
        if let PropertyValue::String(s) = value {
            let index_key = (key.to_string(), s.clone());
            if let Some(ids) = self.property_index.get_mut(&index_key) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.property_index.remove(&index_key);
                }
            }
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
