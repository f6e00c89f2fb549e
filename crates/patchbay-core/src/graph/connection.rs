//! Directed arcs between ports.
//!
//! A [`Connection`] names its endpoints by node id and port index only. The
//! graph context it belongs to is tracked by the topology; both endpoints
//! must live in that context.

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// A directed arc from an output port to an input port.
///
/// Ordering is lexicographic over the 4-tuple, which gives snapshots a
/// deterministic connection order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    /// Upstream node.
    pub source: NodeId,
    /// Output port index on `source`.
    pub source_port: u32,
    /// Downstream node.
    pub dest: NodeId,
    /// Input port index on `dest`.
    pub dest_port: u32,
}

impl Connection {
    /// Creates a connection.
    pub const fn new(source: NodeId, source_port: u32, dest: NodeId, dest_port: u32) -> Self {
        Self {
            source,
            source_port,
            dest,
            dest_port,
        }
    }

    /// True if either endpoint is `node`.
    #[inline]
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.dest == node
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source, self.source_port, self.dest, self.dest_port
        )
    }
}
