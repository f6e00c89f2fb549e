//! Graph controller: the single entry point for structural edits.
//!
//! Every edit validates first, mutates the live topology, rebuilds a render
//! plan, and publishes it before returning. A rejected edit leaves the
//! node/arc set untouched and triggers no rebuild. Edits are serialized by
//! `&mut self`; callers on several threads wrap the controller in a `Mutex`.
//!
//! ```rust,ignore
//! let mut controller = GraphController::new(GraphEngine::default(), Box::new(registry));
//! let input = controller.add_node(NodeDescriptor::AudioInput { channels: 2 }, GraphId::Root, Position::new(0.1, 0.5))?;
//! let output = controller.add_node(NodeDescriptor::AudioOutput { channels: 2 }, GraphId::Root, Position::new(0.9, 0.5))?;
//! controller.add_connection(input, 0, output, 0, GraphId::Root)?;
//! ```

use crate::error::GraphError;
use crate::processor::{Processor, ProcessorFactory};

use super::connection::Connection;
use super::engine::{GraphEngine, RenderConfig, RenderHandle};
use super::node::{GraphId, Node, NodeDescriptor, NodeId, Position};
use super::port::can_connect;
use super::snapshot::{GraphSnapshot, NodeSnapshot};
use super::topology::Topology;

/// Notification delivered to subscribers after a successful edit.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    /// A node was created or restored.
    NodeAdded {
        /// New node.
        id: NodeId,
        /// Context it was added to.
        graph: GraphId,
    },
    /// A node was removed.
    NodeRemoved {
        /// Removed node.
        id: NodeId,
        /// Context it was removed from.
        graph: GraphId,
    },
    /// A node's name, position, flags, or parameters changed.
    NodeChanged(NodeId),
    /// An arc was created.
    ConnectionAdded {
        /// Context of the arc.
        graph: GraphId,
        /// The arc.
        connection: Connection,
    },
    /// An arc was removed.
    ConnectionRemoved {
        /// Context of the arc.
        graph: GraphId,
        /// The arc.
        connection: Connection,
    },
    /// The whole graph was replaced from a snapshot.
    Reloaded,
}

/// A node attribute that can be changed without a rebuild.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProperty {
    /// Editor position.
    Position(Position),
    /// Enabled flag; cleared = bypassed. A bypassed plugin or subgraph
    /// passes its inputs straight through and ignores its mute flag.
    Enabled(bool),
    /// Mute flag. A muted, enabled node still processes, then its outputs
    /// are silenced. Has no effect while the node is bypassed.
    Muted(bool),
    /// Display name.
    Name(String),
}

impl NodeProperty {
    /// Current value of the same attribute on `node`.
    fn read_from(&self, node: &Node) -> Self {
        match self {
            Self::Position(_) => Self::Position(node.position()),
            Self::Enabled(_) => Self::Enabled(node.is_enabled()),
            Self::Muted(_) => Self::Muted(node.is_muted()),
            Self::Name(_) => Self::Name(node.name().to_string()),
        }
    }
}

type Listener = Box<dyn Fn(&GraphChange) + Send>;

/// Mutation gateway wrapping a [`GraphEngine`] and a [`ProcessorFactory`].
pub struct GraphController {
    engine: GraphEngine,
    factory: Box<dyn ProcessorFactory>,
    listeners: Vec<Listener>,
}

impl GraphController {
    /// Creates a controller around `engine`, instantiating plugins through `factory`.
    pub fn new(engine: GraphEngine, factory: Box<dyn ProcessorFactory>) -> Self {
        Self {
            engine,
            factory,
            listeners: Vec::new(),
        }
    }

    /// The engine this controller edits.
    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    /// Current render settings.
    pub fn config(&self) -> RenderConfig {
        self.engine.config()
    }

    /// See [`GraphEngine::prepare`].
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), GraphError> {
        self.engine.prepare(sample_rate, block_size)
    }

    /// Applies every render setting at once, then prepares for it.
    pub fn configure(&mut self, config: RenderConfig) -> Result<(), GraphError> {
        self.engine
            .set_max_events_per_block(config.max_events_per_block);
        self.engine.prepare(config.sample_rate, config.block_size)
    }

    /// Handle for the audio callback. See [`GraphEngine::render_handle`].
    pub fn render_handle(&self) -> RenderHandle {
        self.engine.render_handle()
    }

    /// See [`GraphEngine::collect_garbage`].
    pub fn collect_garbage(&mut self) {
        self.engine.collect_garbage();
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.engine.node(id)
    }

    /// Registers a callback invoked after every successful edit.
    pub fn subscribe(&mut self, listener: impl Fn(&GraphChange) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, change: &GraphChange) {
        for listener in &self.listeners {
            listener(change);
        }
    }

    // --- Nodes ---

    /// Creates a node in `graph`.
    ///
    /// Subgraph nodes get boundary nodes matching their ports inside the new
    /// nested context.
    pub fn add_node(
        &mut self,
        descriptor: NodeDescriptor,
        graph: GraphId,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        if !self.engine.contains_graph(graph) {
            return Err(GraphError::graph_not_found(graph));
        }
        let processor = create_processor(self.factory.as_ref(), &descriptor)?;
        let config = self.engine.config();
        let id = self.engine.allocate_id();
        let node = Node::new(id, graph, descriptor.clone(), position, processor);
        node.prepare(config.sample_rate, config.block_size);
        self.engine.topology_mut().insert_node(node)?;

        let mut added = vec![(id, graph)];
        let staged = self
            .insert_boundaries(id, &descriptor, &mut added)
            .and_then(|()| self.engine.rebuild());
        if let Err(err) = staged {
            // Cascades into the nested context, taking any boundary nodes with it.
            let _ = self.engine.topology_mut().remove_node(id);
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id} in {graph}", descriptor.default_name());

        for (id, graph) in added {
            self.notify(&GraphChange::NodeAdded { id, graph });
        }
        Ok(id)
    }

    /// Creates the boundary nodes of a new subgraph node inside its nested context.
    fn insert_boundaries(
        &mut self,
        owner: NodeId,
        descriptor: &NodeDescriptor,
        added: &mut Vec<(NodeId, GraphId)>,
    ) -> Result<(), GraphError> {
        let inner = GraphId::Subgraph(owner);
        for (boundary, at) in boundary_nodes(descriptor) {
            let id = self.engine.allocate_id();
            self.engine
                .topology_mut()
                .insert_node(Node::new(id, inner, boundary, at, None))?;
            added.push((id, inner));
        }
        Ok(())
    }

    /// Removes a node, every arc touching it, and any nested context it owns.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let removed = self.engine.topology_mut().remove_node(id)?;
        self.engine.rebuild()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_remove: node {id} ({} nodes, {} arcs)",
            removed.nodes.len(),
            removed.connections.len()
        );

        if let Some(graph) = removed.nodes.first().map(Node::graph) {
            for connection in &removed.connections {
                self.notify(&GraphChange::ConnectionRemoved {
                    graph,
                    connection: *connection,
                });
            }
        }
        for node in &removed.nodes {
            self.notify(&GraphChange::NodeRemoved {
                id: node.id(),
                graph: node.graph(),
            });
        }
        // Processors still referenced by a retired plan are released by
        // `collect_garbage`, not here.
        drop(removed);
        Ok(())
    }

    // --- Connections ---

    /// Connects `source:source_port` to `dest:dest_port` inside `graph`.
    ///
    /// Fails with `NotFound`, `WouldCreateCycle` (including self-connections),
    /// `IncompatiblePorts`, or `DuplicateConnection`, in that order of checking.
    pub fn add_connection(
        &mut self,
        source: NodeId,
        source_port: u32,
        dest: NodeId,
        dest_port: u32,
        graph: GraphId,
    ) -> Result<(), GraphError> {
        let connection = Connection::new(source, source_port, dest, dest_port);
        if let Err(err) = validate_connection(self.engine.topology(), graph, &connection) {
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_connect: rejected {connection}: {err}");
            return Err(err);
        }
        insert_connection(self.engine.topology_mut(), graph, connection);
        if let Err(err) = self.engine.rebuild() {
            remove_connection(self.engine.topology_mut(), graph, &connection);
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {connection} in {graph}");

        self.notify(&GraphChange::ConnectionAdded { graph, connection });
        Ok(())
    }

    /// Removes the matching arc.
    ///
    /// Returns `Ok(false)` (and does nothing) if absent. If the rebuild fails
    /// the arc is put back and the error returned.
    pub fn remove_connection(
        &mut self,
        source: NodeId,
        source_port: u32,
        dest: NodeId,
        dest_port: u32,
        graph: GraphId,
    ) -> Result<bool, GraphError> {
        let connection = Connection::new(source, source_port, dest, dest_port);
        if !remove_connection(self.engine.topology_mut(), graph, &connection) {
            return Ok(false);
        }
        if let Err(err) = self.engine.rebuild() {
            insert_connection(self.engine.topology_mut(), graph, connection);
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {connection} in {graph}");

        self.notify(&GraphChange::ConnectionRemoved { graph, connection });
        Ok(true)
    }

    // --- Properties ---

    /// Current value of the attribute `like` names.
    pub fn property(&self, id: NodeId, like: &NodeProperty) -> Result<NodeProperty, GraphError> {
        let node = self
            .engine
            .node(id)
            .ok_or(GraphError::node_not_found(id))?;
        Ok(like.read_from(node))
    }

    /// Sets one node attribute. No rebuild: flags are read by the render
    /// thread directly.
    pub fn set_property(&mut self, id: NodeId, property: NodeProperty) -> Result<(), GraphError> {
        let node = self
            .engine
            .topology_mut()
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::node_not_found(id))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_property: {id} {property:?}");

        match property {
            NodeProperty::Position(position) => node.set_position(position),
            NodeProperty::Enabled(enabled) => node.set_enabled(enabled),
            NodeProperty::Muted(muted) => node.set_muted(muted),
            NodeProperty::Name(name) => node.set_name(name),
        }
        self.notify(&GraphChange::NodeChanged(id));
        Ok(())
    }

    /// Enables or bypasses a node.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<(), GraphError> {
        self.set_property(id, NodeProperty::Enabled(enabled))
    }

    /// Mutes or unmutes a node.
    pub fn set_muted(&mut self, id: NodeId, muted: bool) -> Result<(), GraphError> {
        self.set_property(id, NodeProperty::Muted(muted))
    }

    /// Moves a node. Coordinates are clamped into `0.0..=1.0`.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        self.set_property(id, NodeProperty::Position(position))
    }

    /// Renames a node.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), GraphError> {
        self.set_property(id, NodeProperty::Name(name.into()))
    }

    /// Sets a processor parameter, clamped to its range. No rebuild and no
    /// processor lock: the render thread picks the value up on its next block.
    ///
    /// Unknown indices, non-finite values, and nodes without a processor are
    /// ignored.
    pub fn set_parameter(
        &mut self,
        id: NodeId,
        index: usize,
        value: f32,
    ) -> Result<(), GraphError> {
        let node = self
            .engine
            .node(id)
            .ok_or(GraphError::node_not_found(id))?;
        if node.set_parameter(index, value) {
            self.notify(&GraphChange::NodeChanged(id));
        }
        Ok(())
    }

    /// Latest value of a processor parameter.
    pub fn parameter(&self, id: NodeId, index: usize) -> Option<f32> {
        self.engine.node(id)?.parameter(index)
    }

    // --- Snapshots ---

    /// Captures one node, including nested content for subgraph nodes.
    pub fn snapshot_node(&self, id: NodeId) -> Result<NodeSnapshot, GraphError> {
        let node = self
            .engine
            .node(id)
            .ok_or(GraphError::node_not_found(id))?;
        let subgraph = if node.is_subgraph() {
            Some(self.snapshot_graph(GraphId::Subgraph(id))?)
        } else {
            None
        };
        Ok(NodeSnapshot {
            id,
            name: node.name().to_string(),
            descriptor: node.descriptor().clone(),
            position: node.position(),
            enabled: node.is_enabled(),
            muted: node.is_muted(),
            state: node.state(),
            subgraph,
        })
    }

    /// Captures one graph context.
    pub fn snapshot_graph(&self, graph: GraphId) -> Result<GraphSnapshot, GraphError> {
        let ctx = self.engine.topology().context(graph)?;
        Ok(GraphSnapshot {
            nodes: ctx
                .nodes
                .iter()
                .map(|id| self.snapshot_node(*id))
                .collect::<Result<_, _>>()?,
            connections: ctx.connections.iter().copied().collect(),
        })
    }

    /// Captures the root graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.snapshot_graph(GraphId::Root).unwrap_or_default()
    }

    /// Re-creates a node from a snapshot under its original id and attaches
    /// `connections` in `graph`. One rebuild; on failure nothing changes.
    pub fn restore_node(
        &mut self,
        snapshot: &NodeSnapshot,
        graph: GraphId,
        connections: &[Connection],
    ) -> Result<NodeId, GraphError> {
        if !self.engine.contains_graph(graph) {
            return Err(GraphError::graph_not_found(graph));
        }
        let mut ids = vec![snapshot.id];
        if let Some(sub) = &snapshot.subgraph {
            ids.extend(sub.all_ids());
        }
        if let Some(taken) = ids.iter().find(|id| self.engine.node(**id).is_some()) {
            return Err(GraphError::undo_unavailable(format!(
                "{taken} is already in use"
            )));
        }

        let config = self.engine.config();
        let staged = instantiate(
            self.factory.as_ref(),
            config,
            snapshot,
            graph,
            self.engine.topology_mut(),
        )
        .and_then(|()| {
            for connection in connections {
                validate_connection(self.engine.topology(), graph, connection)?;
                insert_connection(self.engine.topology_mut(), graph, *connection);
            }
            Ok(())
        })
        .and_then(|()| self.engine.rebuild());

        if let Err(err) = staged {
            let _ = self.engine.topology_mut().remove_node(snapshot.id);
            return Err(err);
        }
        for id in &ids {
            self.engine.reserve_id(*id);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_restore: node {} in {graph} with {} arcs",
            snapshot.id,
            connections.len()
        );

        for id in ids {
            if let Some(node) = self.engine.node(id) {
                self.notify(&GraphChange::NodeAdded {
                    id,
                    graph: node.graph(),
                });
            }
        }
        for connection in connections {
            self.notify(&GraphChange::ConnectionAdded {
                graph,
                connection: *connection,
            });
        }
        Ok(snapshot.id)
    }

    /// Replaces the whole graph with `snapshot`. On failure the current
    /// graph stays in place.
    pub fn load_snapshot(&mut self, snapshot: &GraphSnapshot) -> Result<(), GraphError> {
        let config = self.engine.config();
        let mut staged = Topology::new();
        for node in &snapshot.nodes {
            instantiate(self.factory.as_ref(), config, node, GraphId::Root, &mut staged)?;
        }
        for connection in &snapshot.connections {
            validate_connection(&staged, GraphId::Root, connection)?;
            insert_connection(&mut staged, GraphId::Root, *connection);
        }

        let previous = self.engine.replace_topology(staged);
        if let Err(err) = self.engine.rebuild() {
            self.engine.replace_topology(previous);
            return Err(err);
        }
        for id in snapshot.all_ids() {
            self.engine.reserve_id(id);
        }
        drop(previous);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "graph_load: {} nodes, {} arcs",
            self.engine.node_count(),
            snapshot.connections.len()
        );

        self.notify(&GraphChange::Reloaded);
        Ok(())
    }

    /// Removes every node.
    pub fn clear(&mut self) -> Result<(), GraphError> {
        self.load_snapshot(&GraphSnapshot::default())
    }
}

impl std::fmt::Debug for GraphController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphController")
            .field("nodes", &self.engine.node_count())
            .field("generation", &self.engine.generation())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

fn create_processor(
    factory: &dyn ProcessorFactory,
    descriptor: &NodeDescriptor,
) -> Result<Option<Box<dyn Processor>>, GraphError> {
    match descriptor {
        NodeDescriptor::Plugin { id } => factory
            .create(id)
            .map(Some)
            .map_err(|source| GraphError::Instantiation {
                plugin: id.clone(),
                source,
            }),
        _ => Ok(None),
    }
}

/// Boundary nodes created inside a new subgraph, with their positions.
fn boundary_nodes(descriptor: &NodeDescriptor) -> Vec<(NodeDescriptor, Position)> {
    let NodeDescriptor::Subgraph {
        audio_inputs,
        audio_outputs,
        midi_input,
        midi_output,
    } = *descriptor
    else {
        return Vec::new();
    };
    let mut nodes = Vec::new();
    if audio_inputs > 0 {
        nodes.push((
            NodeDescriptor::AudioInput {
                channels: audio_inputs,
            },
            Position::new(0.25, 0.1),
        ));
    }
    if midi_input {
        nodes.push((NodeDescriptor::MidiInput, Position::new(0.75, 0.1)));
    }
    if audio_outputs > 0 {
        nodes.push((
            NodeDescriptor::AudioOutput {
                channels: audio_outputs,
            },
            Position::new(0.25, 0.9),
        ));
    }
    if midi_output {
        nodes.push((NodeDescriptor::MidiOutput, Position::new(0.75, 0.9)));
    }
    nodes
}

/// Builds the node described by `snapshot` (and its nested content) into `topology`.
fn instantiate(
    factory: &dyn ProcessorFactory,
    config: RenderConfig,
    snapshot: &NodeSnapshot,
    graph: GraphId,
    topology: &mut Topology,
) -> Result<(), GraphError> {
    let processor = create_processor(factory, &snapshot.descriptor)?;
    let mut node = Node::new(
        snapshot.id,
        graph,
        snapshot.descriptor.clone(),
        snapshot.position,
        processor,
    );
    node.set_name(snapshot.name.clone());
    node.set_enabled(snapshot.enabled);
    node.set_muted(snapshot.muted);
    node.prepare(config.sample_rate, config.block_size);
    if !snapshot.state.is_empty() {
        node.set_state(&snapshot.state)
            .map_err(|source| GraphError::Instantiation {
                plugin: snapshot.descriptor.default_name(),
                source,
            })?;
    }
    topology.insert_node(node)?;

    if let Some(sub) = &snapshot.subgraph {
        let inner = GraphId::Subgraph(snapshot.id);
        for child in &sub.nodes {
            instantiate(factory, config, child, inner, topology)?;
        }
        for connection in &sub.connections {
            validate_connection(topology, inner, connection)?;
            insert_connection(topology, inner, *connection);
        }
    }
    Ok(())
}

fn endpoint<'t>(
    topology: &'t Topology,
    graph: GraphId,
    id: NodeId,
) -> Result<&'t Node, GraphError> {
    topology
        .node(id)
        .filter(|node| node.graph() == graph)
        .ok_or(GraphError::node_not_found(id))
}

/// Checks every arc invariant against the current topology without mutating it.
fn validate_connection(
    topology: &Topology,
    graph: GraphId,
    connection: &Connection,
) -> Result<(), GraphError> {
    let ctx = topology.context(graph)?;
    let source = endpoint(topology, graph, connection.source)?;
    let dest = endpoint(topology, graph, connection.dest)?;
    let from = source
        .port(connection.source_port)
        .ok_or(GraphError::port_not_found(connection.source, connection.source_port))?;
    let to = dest
        .port(connection.dest_port)
        .ok_or(GraphError::port_not_found(connection.dest, connection.dest_port))?;

    if connection.source == connection.dest {
        return Err(GraphError::WouldCreateCycle(graph));
    }
    if !can_connect(&from, &to) {
        return Err(GraphError::IncompatiblePorts { from, to });
    }
    if ctx.connections.contains(connection) {
        return Err(GraphError::DuplicateConnection(*connection));
    }
    if topology.would_cycle(graph, connection) {
        return Err(GraphError::WouldCreateCycle(graph));
    }
    Ok(())
}

fn insert_connection(topology: &mut Topology, graph: GraphId, connection: Connection) {
    if let Some(ctx) = topology.graphs.get_mut(&graph) {
        ctx.connections.insert(connection);
    }
}

fn remove_connection(topology: &mut Topology, graph: GraphId, connection: &Connection) -> bool {
    topology
        .graphs
        .get_mut(&graph)
        .is_some_and(|ctx| ctx.connections.remove(connection))
}
