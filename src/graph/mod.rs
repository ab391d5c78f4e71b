//! Property graph data model
//!
//! Nodes carry one label and a property map; edges are directed, typed and
//! unique per (source, type, target). [`GraphStore`] keeps both in memory.

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStatistics, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
