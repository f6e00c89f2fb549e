//! Serializable captures of nodes and graph contexts.
//!
//! Undo and persistence share these types, so whatever a command captures
//! round-trips through a session file unchanged. Nodes are ordered by id and
//! connections by their 4-tuple, which makes two captures of the same graph
//! byte-equal once serialized.

use serde::{Deserialize, Serialize};

use super::connection::Connection;
use super::node::{NodeDescriptor, NodeId, Position};

/// Everything needed to re-create one node under its original id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// What the node is.
    pub descriptor: NodeDescriptor,
    /// Editor position.
    #[serde(default)]
    pub position: Position,
    /// False when bypassed.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// True when muted.
    #[serde(default)]
    pub muted: bool,
    /// Processor state blob.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state: Vec<u8>,
    /// Nested content of a subgraph node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<GraphSnapshot>,
}

fn enabled_by_default() -> bool {
    true
}

/// Nodes and arcs of one graph context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in ascending id order.
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
    /// Arcs in 4-tuple order.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphSnapshot {
    /// True if the context holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds a node by id, searching nested subgraphs too.
    pub fn find(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find_map(|node| {
            if node.id == id {
                Some(node)
            } else {
                node.subgraph.as_ref().and_then(|sub| sub.find(id))
            }
        })
    }

    /// Every node id in this context and all nested contexts.
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<NodeId>) {
        for node in &self.nodes {
            ids.push(node.id);
            if let Some(sub) = &node.subgraph {
                sub.collect_ids(ids);
            }
        }
    }
}
