//! Transactional graph store boundary
//!
//! The converter, resolver and extraction import talk to a graph database only
//! through these traits:
//! - [`GraphReader`]: read-only pattern queries
//! - [`GraphTransaction`]: idempotent upserts plus detach-delete for merging
//! - [`GraphBackend`]: transaction scoping (commit on `Ok`, roll back on `Err`)
//!
//! [`MemoryGraph`] implements them over the in-memory [`GraphStore`](crate::graph::GraphStore).

pub mod memory;
pub mod retry;

use crate::graph::{Edge, EdgeId, EdgeType, GraphError, Label, Node, NodeId, PropertyMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use memory::MemoryGraph;
pub use retry::RetryPolicy;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Temporary failure; the same operation may succeed if retried
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Permanent store error: {0}")]
    Permanent(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl StoreError {
    /// True if retrying might help
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Identity of a node for upserts: its label plus one string-valued key
/// property (`id` for RDF resources, `name` for extracted entities)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub label: Label,
    pub property: String,
    pub value: String,
}

impl NodeKey {
    pub fn new(label: impl Into<Label>, property: impl Into<String>, value: impl Into<String>) -> Self {
        NodeKey {
            label: label.into(),
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {{{}: {:?}}})", self.label, self.property, self.value)
    }
}

/// Result of an upsert: the matched or created id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted<I> {
    pub id: I,
    /// False if an existing element was matched
    pub created: bool,
}

/// Read-only queries against a graph
pub trait GraphReader {
    /// Node by id
    fn node(&self, id: NodeId) -> StoreResult<Option<Node>>;

    /// Node matching an upsert key
    fn find_node(&self, key: &NodeKey) -> StoreResult<Option<Node>>;

    /// All nodes with `label`, in creation order
    fn nodes_by_label(&self, label: &Label) -> StoreResult<Vec<Node>>;

    /// All nodes of any label whose string property `key` equals `value`,
    /// in creation order
    fn nodes_by_property(&self, key: &str, value: &str) -> StoreResult<Vec<Node>>;

    /// Relationships leaving a node
    fn outgoing(&self, id: NodeId) -> StoreResult<Vec<Edge>>;

    /// Relationships entering a node
    fn incoming(&self, id: NodeId) -> StoreResult<Vec<Edge>>;

    /// Labels currently in use
    fn labels(&self) -> StoreResult<Vec<Label>>;
}

/// Mutations available inside a transaction
pub trait GraphTransaction: GraphReader {
    /// Find the node matching `key`, creating it if absent, then set every
    /// entry of `properties` on it
    fn upsert_node(&mut self, key: &NodeKey, properties: &PropertyMap) -> StoreResult<Upserted<NodeId>>;

    /// Find the `edge_type` edge from `source` to `target`, creating it if
    /// absent, then set every entry of `properties` on it
    fn upsert_edge(
        &mut self,
        source: NodeId,
        edge_type: &EdgeType,
        target: NodeId,
        properties: &PropertyMap,
    ) -> StoreResult<Upserted<EdgeId>>;

    /// Delete a node together with all its relationships
    fn detach_delete_node(&mut self, id: NodeId) -> StoreResult<()>;
}

/// A graph database handle with transaction scoping
pub trait GraphBackend {
    /// Run `work` in a write transaction.
    ///
    /// Everything `work` did is committed if it returns `Ok` and rolled back
    /// if it returns `Err`.
    fn write<T, F>(&mut self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn GraphTransaction) -> StoreResult<T>;

    /// Run `work` against a read-only view
    fn read<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn GraphReader) -> StoreResult<T>;
}
