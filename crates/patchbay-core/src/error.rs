//! Error types for graph edits and the undo system.
//!
//! Every controller and command call returns [`GraphError`] synchronously.
//! Nothing in this module crosses the render boundary: the audio thread has
//! no failure channel and renders silence instead.

use thiserror::Error;

use crate::graph::{Connection, GraphId, NodeId, Port};
use crate::processor::ProcessorError;

/// What a [`GraphError::NotFound`] failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// A node id that is not in the engine.
    Node(NodeId),
    /// A graph context that does not exist.
    Graph(GraphId),
    /// A port index past the end of a node's port list.
    Port {
        /// Owning node.
        node: NodeId,
        /// Requested port index.
        index: u32,
    },
    /// A connection the edit expected to find.
    Connection(Connection),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node {id}"),
            Self::Graph(graph) => write!(f, "graph {graph}"),
            Self::Port { node, index } => write!(f, "port {index} on {node}"),
            Self::Connection(conn) => write!(f, "connection {conn}"),
        }
    }
}

/// Errors returned by graph edits.
///
/// A failed edit leaves the node/arc set untouched and publishes nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The processor factory could not create the requested processor.
    #[error("failed to instantiate '{plugin}': {source}")]
    Instantiation {
        /// Plugin id passed to the factory.
        plugin: String,
        /// Factory failure.
        #[source]
        source: ProcessorError,
    },

    /// The two ports are not an output/input pair of the same type.
    #[error("incompatible ports: {from} cannot feed {to}")]
    IncompatiblePorts {
        /// Proposed source port.
        from: Port,
        /// Proposed destination port.
        to: Port,
    },

    /// The edit would introduce a cycle in the given graph context.
    #[error("edit would create a cycle in graph {0}")]
    WouldCreateCycle(GraphId),

    /// A referenced node, graph, port, or connection does not exist.
    #[error("{0} not found")]
    NotFound(Missing),

    /// An undo or redo found the graph in a state it cannot be applied to.
    #[error("undo state unavailable: {0}")]
    UndoStateUnavailable(String),

    /// An identical connection already exists.
    #[error("connection {0} already exists")]
    DuplicateConnection(Connection),

    /// A node id is already in use, e.g. twice in one snapshot.
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
}

impl GraphError {
    /// Creates a [`GraphError::NotFound`] for a node id.
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NotFound(Missing::Node(id))
    }

    /// Creates a [`GraphError::NotFound`] for a graph context.
    pub fn graph_not_found(graph: GraphId) -> Self {
        Self::NotFound(Missing::Graph(graph))
    }

    /// Creates a [`GraphError::NotFound`] for a port index.
    pub fn port_not_found(node: NodeId, index: u32) -> Self {
        Self::NotFound(Missing::Port { node, index })
    }

    /// Creates a [`GraphError::UndoStateUnavailable`] from any message.
    pub fn undo_unavailable(reason: impl Into<String>) -> Self {
        Self::UndoStateUnavailable(reason.into())
    }
}
