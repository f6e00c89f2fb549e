//! Live node/arc set, owned by the engine on the mutation side.
//!
//! The topology is never touched by the audio thread. Ordered collections
//! keep iteration deterministic, so two topologies holding the same nodes and
//! arcs produce byte-equal snapshots and identical plans.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GraphError;

use super::connection::Connection;
use super::node::{GraphId, Node, NodeId};

/// Nodes and arcs of one graph context.
#[derive(Debug, Default)]
pub(crate) struct GraphContext {
    pub nodes: BTreeSet<NodeId>,
    pub connections: BTreeSet<Connection>,
}

/// Everything removed by a cascading node removal.
#[derive(Debug, Default)]
pub(crate) struct Removed {
    /// Removed nodes, outermost first.
    pub nodes: Vec<Node>,
    /// Arcs removed from the removed node's own context.
    pub connections: Vec<Connection>,
}

/// All graph contexts of an engine.
#[derive(Debug)]
pub(crate) struct Topology {
    pub nodes: BTreeMap<NodeId, Node>,
    pub graphs: BTreeMap<GraphId, GraphContext>,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    /// Empty topology holding only the root context.
    pub fn new() -> Self {
        let mut graphs = BTreeMap::new();
        graphs.insert(GraphId::Root, GraphContext::default());
        Self {
            nodes: BTreeMap::new(),
            graphs,
        }
    }

    pub fn contains_graph(&self, graph: GraphId) -> bool {
        self.graphs.contains_key(&graph)
    }

    pub fn context(&self, graph: GraphId) -> Result<&GraphContext, GraphError> {
        self.graphs
            .get(&graph)
            .ok_or(GraphError::graph_not_found(graph))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Inserts a node into its graph context. Subgraph nodes get an empty
    /// nested context. Fails if the id is taken or the context is unknown.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let ctx = self
            .graphs
            .get_mut(&node.graph())
            .ok_or(GraphError::graph_not_found(node.graph()))?;
        ctx.nodes.insert(id);
        if node.is_subgraph() {
            self.graphs
                .insert(GraphId::Subgraph(id), GraphContext::default());
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Removes a node, every arc touching it, and any nested context it owns.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Removed, GraphError> {
        let node = self
            .nodes
            .remove(&id)
            .ok_or(GraphError::node_not_found(id))?;
        let mut removed = Removed::default();
        if let Some(ctx) = self.graphs.get_mut(&node.graph()) {
            ctx.nodes.remove(&id);
            removed.connections = ctx
                .connections
                .iter()
                .filter(|c| c.touches(id))
                .copied()
                .collect();
            for conn in &removed.connections {
                ctx.connections.remove(conn);
            }
        }
        let nested = node.is_subgraph();
        removed.nodes.push(node);
        if nested && let Some(ctx) = self.graphs.remove(&GraphId::Subgraph(id)) {
            for inner in ctx.nodes {
                if let Ok(mut inner_removed) = self.remove_node(inner) {
                    removed.nodes.append(&mut inner_removed.nodes);
                }
            }
        }
        Ok(removed)
    }

    /// Arcs in `id`'s context with `id` at either end.
    pub fn connections_touching(&self, id: NodeId) -> Vec<Connection> {
        self.nodes
            .get(&id)
            .and_then(|node| self.graphs.get(&node.graph()))
            .map(|ctx| {
                ctx.connections
                    .iter()
                    .filter(|c| c.touches(id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Kahn's algorithm over one context; ready nodes are taken in ascending id order.
    pub fn order(&self, graph: GraphId) -> Result<Vec<NodeId>, GraphError> {
        let ctx = self.context(graph)?;
        kahn_order(&ctx.nodes, ctx.connections.iter())
            .ok_or(GraphError::WouldCreateCycle(graph))
    }

    /// True if adding `conn` to `graph` would leave the context cyclic.
    pub fn would_cycle(&self, graph: GraphId, conn: &Connection) -> bool {
        let Some(ctx) = self.graphs.get(&graph) else {
            return false;
        };
        kahn_order(&ctx.nodes, ctx.connections.iter().chain(std::iter::once(conn))).is_none()
    }
}

/// Topological order of `nodes`, or `None` if the arcs contain a cycle.
fn kahn_order<'a>(
    nodes: &BTreeSet<NodeId>,
    connections: impl Iterator<Item = &'a Connection>,
) -> Option<Vec<NodeId>> {
    let mut in_degree: BTreeMap<NodeId, usize> = nodes.iter().map(|id| (*id, 0)).collect();
    let mut outgoing: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for conn in connections {
        if let Some(degree) = in_degree.get_mut(&conn.dest) {
            *degree += 1;
            outgoing.entry(conn.source).or_default().push(conn.dest);
        }
    }

    let mut ready: BTreeSet<NodeId> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut sorted = Vec::with_capacity(nodes.len());

    while let Some(id) = ready.pop_first() {
        sorted.push(id);
        for dest in outgoing.get(&id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dest) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dest);
                }
            }
        }
    }

    (sorted.len() == nodes.len()).then_some(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeDescriptor, Position};

    fn node(id: u32, graph: GraphId, descriptor: NodeDescriptor) -> Node {
        Node::new(NodeId(id), graph, descriptor, Position::default(), None)
    }

    fn midi(id: u32) -> Node {
        node(id, GraphId::Root, NodeDescriptor::MidiInput)
    }

    fn conn(a: u32, b: u32) -> Connection {
        Connection::new(NodeId(a), 0, NodeId(b), 0)
    }

    #[test]
    fn order_breaks_ties_by_ascending_id() {
        let mut topo = Topology::new();
        for id in [5, 2, 9] {
            topo.insert_node(midi(id)).unwrap();
        }
        assert_eq!(
            topo.order(GraphId::Root).unwrap(),
            vec![NodeId(2), NodeId(5), NodeId(9)]
        );
    }

    #[test]
    fn order_respects_arcs() {
        let mut topo = Topology::new();
        for id in 1..=3 {
            topo.insert_node(midi(id)).unwrap();
        }
        let ctx = topo.graphs.get_mut(&GraphId::Root).unwrap();
        ctx.connections.insert(conn(3, 1));
        ctx.connections.insert(conn(1, 2));
        assert_eq!(
            topo.order(GraphId::Root).unwrap(),
            vec![NodeId(3), NodeId(1), NodeId(2)]
        );
    }

    #[test]
    fn would_cycle_detects_back_edge() {
        let mut topo = Topology::new();
        for id in 1..=3 {
            topo.insert_node(midi(id)).unwrap();
        }
        let ctx = topo.graphs.get_mut(&GraphId::Root).unwrap();
        ctx.connections.insert(conn(1, 2));
        ctx.connections.insert(conn(2, 3));
        assert!(topo.would_cycle(GraphId::Root, &conn(3, 1)));
        assert!(!topo.would_cycle(GraphId::Root, &conn(1, 3)));
        assert!(topo.would_cycle(GraphId::Root, &conn(2, 2)));
    }

    #[test]
    fn remove_cascades_into_nested_context() {
        let mut topo = Topology::new();
        topo.insert_node(node(1, GraphId::Root, NodeDescriptor::stereo_subgraph()))
            .unwrap();
        topo.insert_node(node(2, GraphId::Subgraph(NodeId(1)), NodeDescriptor::MidiInput))
            .unwrap();
        topo.insert_node(midi(3)).unwrap();
        topo.graphs
            .get_mut(&GraphId::Root)
            .unwrap()
            .connections
            .insert(conn(3, 1));

        let removed = topo.remove_node(NodeId(1)).unwrap();
        let ids: Vec<NodeId> = removed.nodes.iter().map(Node::id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2)]);
        assert_eq!(removed.connections, vec![conn(3, 1)]);
        assert!(!topo.contains_graph(GraphId::Subgraph(NodeId(1))));
        assert_eq!(topo.nodes.len(), 1);
    }

    #[test]
    fn insert_rejects_unknown_graph_and_duplicate_id() {
        let mut topo = Topology::new();
        let err = topo
            .insert_node(node(1, GraphId::Subgraph(NodeId(7)), NodeDescriptor::MidiInput))
            .unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));

        topo.insert_node(midi(1)).unwrap();
        assert_eq!(
            topo.insert_node(midi(1)).unwrap_err(),
            GraphError::DuplicateNode(NodeId(1))
        );
    }
}
