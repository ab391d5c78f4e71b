//! In-memory backend with journaled rollback

use super::{GraphBackend, GraphReader, GraphTransaction, NodeKey, StoreResult, Upserted};
use crate::graph::{Edge, EdgeId, EdgeType, GraphStore, Label, Node, NodeId, PropertyMap, PropertyValue};
use tracing::{debug, warn};

/// [`GraphBackend`] over a [`GraphStore`]
///
/// A write transaction records an undo entry for every mutation and replays
/// them in reverse if the transaction closure fails.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    graph: GraphStore,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing store
    pub fn from_store(graph: GraphStore) -> Self {
        MemoryGraph { graph }
    }

    /// Direct read access to the underlying store
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn into_inner(self) -> GraphStore {
        self.graph
    }
}

impl GraphBackend for MemoryGraph {
    fn write<T, F>(&mut self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn GraphTransaction) -> StoreResult<T>,
    {
        let mut tx = MemoryTransaction {
            graph: &mut self.graph,
            journal: Vec::new(),
        };
        match work(&mut tx) {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!("Rolling back {} change(s) after: {}", tx.journal.len(), e);
                tx.rollback();
                Err(e)
            }
        }
    }

    fn read<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn GraphReader) -> StoreResult<T>,
    {
        work(&self.graph)
    }
}

impl GraphReader for GraphStore {
    fn node(&self, id: NodeId) -> StoreResult<Option<Node>> {
        Ok(self.get_node(id).cloned())
    }

    fn find_node(&self, key: &NodeKey) -> StoreResult<Option<Node>> {
        Ok(GraphStore::find_node(self, &key.label, &key.property, &key.value).cloned())
    }

    fn nodes_by_label(&self, label: &Label) -> StoreResult<Vec<Node>> {
        Ok(self.get_nodes_by_label(label).into_iter().cloned().collect())
    }

    fn nodes_by_property(&self, key: &str, value: &str) -> StoreResult<Vec<Node>> {
        Ok(self.find_nodes_by_property(key, value).into_iter().cloned().collect())
    }

    fn outgoing(&self, id: NodeId) -> StoreResult<Vec<Edge>> {
        Ok(self.get_outgoing_edges(id).into_iter().cloned().collect())
    }

    fn incoming(&self, id: NodeId) -> StoreResult<Vec<Edge>> {
        Ok(self.get_incoming_edges(id).into_iter().cloned().collect())
    }

    fn labels(&self) -> StoreResult<Vec<Label>> {
        Ok(GraphStore::labels(self).into_iter().cloned().collect())
    }
}

/// Inverse of one committed mutation
#[derive(Debug)]
enum Undo {
    NodeCreated(NodeId),
    NodeProperty {
        id: NodeId,
        key: String,
        old: Option<PropertyValue>,
    },
    EdgeCreated(EdgeId),
    EdgeProperty {
        id: EdgeId,
        key: String,
        old: Option<PropertyValue>,
    },
    EdgeDeleted(Edge),
    NodeDeleted(Node),
}

struct MemoryTransaction<'a> {
    graph: &'a mut GraphStore,
    journal: Vec<Undo>,
}

impl MemoryTransaction<'_> {
    /// Set one node property, journaling the previous value
    fn set_node_property(&mut self, id: NodeId, key: &str, value: PropertyValue) -> StoreResult<()> {
        let unchanged = self
            .graph
            .get_node(id)
            .and_then(|n| n.get_property(key))
            .is_some_and(|current| *current == value);
        if unchanged {
            return Ok(());
        }

        let old = self.graph.set_node_property(id, key, value)?;
        self.journal.push(Undo::NodeProperty {
            id,
            key: key.to_string(),
            old,
        });
        Ok(())
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            let result = match undo {
                Undo::NodeCreated(id) => self.graph.delete_node(id).map(|_| ()),
                Undo::NodeProperty { id, key, old: Some(old) } => {
                    self.graph.set_node_property(id, key, old).map(|_| ())
                }
                Undo::NodeProperty { id, key, old: None } => {
                    self.graph.remove_node_property(id, &key).map(|_| ())
                }
                Undo::EdgeCreated(id) => self.graph.delete_edge(id).map(|_| ()),
                Undo::EdgeProperty { id, key, old: Some(old) } => {
                    self.graph.set_edge_property(id, key, old).map(|_| ())
                }
                Undo::EdgeProperty { id, key, old: None } => {
                    self.graph.remove_edge_property(id, &key).map(|_| ())
                }
                Undo::EdgeDeleted(edge) => self.graph.restore_edge(edge),
                Undo::NodeDeleted(node) => self.graph.restore_node(node),
            };
            if let Err(e) = result {
                warn!("Rollback step failed: {}", e);
            }
        }
    }
}

impl GraphReader for MemoryTransaction<'_> {
    fn node(&self, id: NodeId) -> StoreResult<Option<Node>> {
        GraphReader::node(&*self.graph, id)
    }

    fn find_node(&self, key: &NodeKey) -> StoreResult<Option<Node>> {
        GraphReader::find_node(&*self.graph, key)
    }

    fn nodes_by_label(&self, label: &Label) -> StoreResult<Vec<Node>> {
        self.graph.nodes_by_label(label)
    }

    fn nodes_by_property(&self, key: &str, value: &str) -> StoreResult<Vec<Node>> {
        self.graph.nodes_by_property(key, value)
    }

    fn outgoing(&self, id: NodeId) -> StoreResult<Vec<Edge>> {
        self.graph.outgoing(id)
    }

    fn incoming(&self, id: NodeId) -> StoreResult<Vec<Edge>> {
        self.graph.incoming(id)
    }

    fn labels(&self) -> StoreResult<Vec<Label>> {
        GraphReader::labels(&*self.graph)
    }
}

impl GraphTransaction for MemoryTransaction<'_> {
    fn upsert_node(&mut self, key: &NodeKey, properties: &PropertyMap) -> StoreResult<Upserted<NodeId>> {
        let existing = self
            .graph
            .find_node(&key.label, &key.property, &key.value)
            .map(|n| n.id);

        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let mut initial = PropertyMap::new();
                initial.insert(key.property.clone(), PropertyValue::String(key.value.clone()));
                let id = self
                    .graph
                    .create_node_with_properties(key.label.clone(), initial);
                self.journal.push(Undo::NodeCreated(id));
                (id, true)
            }
        };

        for (prop, value) in properties {
            self.set_node_property(id, prop, value.clone())?;
        }
        Ok(Upserted { id, created })
    }

    fn upsert_edge(
        &mut self,
        source: NodeId,
        edge_type: &EdgeType,
        target: NodeId,
        properties: &PropertyMap,
    ) -> StoreResult<Upserted<EdgeId>> {
        let existing = self.graph.find_edge(source, edge_type, target).map(|e| e.id);

        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id = self.graph.create_edge(source, target, edge_type.clone())?;
                self.journal.push(Undo::EdgeCreated(id));
                (id, true)
            }
        };

        for (key, value) in properties {
            let unchanged = self
                .graph
                .get_edge(id)
                .and_then(|e| e.get_property(key))
                .is_some_and(|current| current == value);
            if unchanged {
                continue;
            }
            let old = self.graph.set_edge_property(id, key.clone(), value.clone())?;
            self.journal.push(Undo::EdgeProperty {
                id,
                key: key.clone(),
                old,
            });
        }
        Ok(Upserted { id, created })
    }

    fn detach_delete_node(&mut self, id: NodeId) -> StoreResult<()> {
        let (node, edges) = self.graph.delete_node(id)?;
        for edge in edges {
            self.journal.push(Undo::EdgeDeleted(edge));
        }
        self.journal.push(Undo::NodeDeleted(node));
        Ok(())
    }
}
