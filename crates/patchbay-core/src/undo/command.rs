//! Command trait and the built-in graph edit commands.

use crate::error::{GraphError, Missing};
use crate::graph::{
    Connection, GraphController, GraphId, NodeDescriptor, NodeId, NodeProperty, NodeSnapshot,
    Position,
};

/// A reversible edit.
///
/// `undo` assumes the state `perform` left behind. When the node or graph it
/// refers to is gone it fails with [`GraphError::UndoStateUnavailable`]
/// before changing anything.
pub trait Command: Send {
    /// Short label for menus and logs.
    fn name(&self) -> &str;

    /// Applies the edit.
    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError>;

    /// Reverts the edit.
    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError>;
}

fn require_node(controller: &GraphController, id: NodeId) -> Result<(), GraphError> {
    if controller.node(id).is_none() {
        return Err(GraphError::undo_unavailable(format!("{id} no longer exists")));
    }
    Ok(())
}

fn require_graph(controller: &GraphController, graph: GraphId) -> Result<(), GraphError> {
    if !controller.engine().contains_graph(graph) {
        return Err(GraphError::undo_unavailable(format!("graph {graph} no longer exists")));
    }
    Ok(())
}

// --- AddNode ---

/// Creates a node. Redo restores the node under the id it first received.
pub struct AddNodeCommand {
    descriptor: NodeDescriptor,
    graph: GraphId,
    position: Position,
    id: Option<NodeId>,
    removed: Option<NodeSnapshot>,
}

impl AddNodeCommand {
    /// Records what to create; nothing happens until `perform`.
    pub fn new(descriptor: NodeDescriptor, graph: GraphId, position: Position) -> Self {
        Self {
            descriptor,
            graph,
            position,
            id: None,
            removed: None,
        }
    }

    /// Id of the created node, once performed.
    pub fn node_id(&self) -> Option<NodeId> {
        self.id
    }
}

impl Command for AddNodeCommand {
    fn name(&self) -> &str {
        "Add node"
    }

    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        let id = match &self.removed {
            Some(snapshot) => controller.restore_node(snapshot, self.graph, &[])?,
            None => controller.add_node(self.descriptor.clone(), self.graph, self.position)?,
        };
        self.id = Some(id);
        Ok(())
    }

    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        let id = self
            .id
            .ok_or_else(|| GraphError::undo_unavailable("node was never added"))?;
        require_node(controller, id)?;
        let snapshot = controller.snapshot_node(id)?;
        controller.remove_node(id)?;
        self.removed = Some(snapshot);
        Ok(())
    }
}

// --- RemoveNode ---

/// Removes a node and its arcs. Undo brings both back under the same ids.
pub struct RemoveNodeCommand {
    id: NodeId,
    graph: GraphId,
    snapshot: NodeSnapshot,
    connections: Vec<Connection>,
}

impl RemoveNodeCommand {
    /// Captures the node's configuration, nested content, and attached arcs.
    pub fn new(controller: &GraphController, id: NodeId) -> Result<Self, GraphError> {
        let node = controller
            .node(id)
            .ok_or(GraphError::node_not_found(id))?;
        Ok(Self {
            id,
            graph: node.graph(),
            snapshot: controller.snapshot_node(id)?,
            connections: controller.engine().connections_touching(id),
        })
    }

    /// The node this command removes.
    pub fn node_id(&self) -> NodeId {
        self.id
    }
}

impl Command for RemoveNodeCommand {
    fn name(&self) -> &str {
        "Remove node"
    }

    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        // Re-capture: parameters or arcs may have changed since construction,
        // and grouped removals see arcs already taken by earlier members.
        self.snapshot = controller.snapshot_node(self.id)?;
        self.connections = controller.engine().connections_touching(self.id);
        controller.remove_node(self.id)
    }

    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        if controller.node(self.id).is_some() {
            return Err(GraphError::undo_unavailable(format!(
                "{} is still present",
                self.id
            )));
        }
        require_graph(controller, self.graph)?;
        for connection in &self.connections {
            for end in [connection.source, connection.dest] {
                if end != self.id {
                    require_node(controller, end)?;
                }
            }
        }
        controller.restore_node(&self.snapshot, self.graph, &self.connections)?;
        Ok(())
    }
}

// --- Connections ---

/// Adds one arc.
pub struct AddConnectionCommand {
    graph: GraphId,
    connection: Connection,
}

impl AddConnectionCommand {
    /// Arc from `source:source_port` to `dest:dest_port` inside `graph`.
    pub fn new(
        source: NodeId,
        source_port: u32,
        dest: NodeId,
        dest_port: u32,
        graph: GraphId,
    ) -> Self {
        Self {
            graph,
            connection: Connection::new(source, source_port, dest, dest_port),
        }
    }
}

impl Command for AddConnectionCommand {
    fn name(&self) -> &str {
        "Add connection"
    }

    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        let c = self.connection;
        controller.add_connection(c.source, c.source_port, c.dest, c.dest_port, self.graph)
    }

    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        let c = self.connection;
        let removed =
            controller.remove_connection(c.source, c.source_port, c.dest, c.dest_port, self.graph)?;
        if !removed {
            return Err(GraphError::undo_unavailable(format!("{c} no longer exists")));
        }
        Ok(())
    }
}

/// Removes one arc.
pub struct RemoveConnectionCommand {
    graph: GraphId,
    connection: Connection,
}

impl RemoveConnectionCommand {
    /// Arc from `source:source_port` to `dest:dest_port` inside `graph`.
    pub fn new(
        source: NodeId,
        source_port: u32,
        dest: NodeId,
        dest_port: u32,
        graph: GraphId,
    ) -> Self {
        Self {
            graph,
            connection: Connection::new(source, source_port, dest, dest_port),
        }
    }
}

impl Command for RemoveConnectionCommand {
    fn name(&self) -> &str {
        "Remove connection"
    }

    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        let c = self.connection;
        let removed =
            controller.remove_connection(c.source, c.source_port, c.dest, c.dest_port, self.graph)?;
        if !removed {
            return Err(GraphError::NotFound(Missing::Connection(c)));
        }
        Ok(())
    }

    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        let c = self.connection;
        require_graph(controller, self.graph)?;
        require_node(controller, c.source)?;
        require_node(controller, c.dest)?;
        controller.add_connection(c.source, c.source_port, c.dest, c.dest_port, self.graph)
    }
}

// --- Properties ---

/// Changes one node attribute; the previous value is captured up front.
pub struct SetNodePropertyCommand {
    id: NodeId,
    property: NodeProperty,
    previous: NodeProperty,
}

impl SetNodePropertyCommand {
    /// Fails with `NotFound` if `id` does not exist.
    pub fn new(
        controller: &GraphController,
        id: NodeId,
        property: NodeProperty,
    ) -> Result<Self, GraphError> {
        let previous = controller.property(id, &property)?;
        Ok(Self {
            id,
            property,
            previous,
        })
    }
}

impl Command for SetNodePropertyCommand {
    fn name(&self) -> &str {
        match self.property {
            NodeProperty::Position(_) => "Move node",
            NodeProperty::Enabled(true) => "Enable node",
            NodeProperty::Enabled(false) => "Bypass node",
            NodeProperty::Muted(true) => "Mute node",
            NodeProperty::Muted(false) => "Unmute node",
            NodeProperty::Name(_) => "Rename node",
        }
    }

    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        controller.set_property(self.id, self.property.clone())
    }

    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        require_node(controller, self.id)?;
        controller.set_property(self.id, self.previous.clone())
    }
}

// --- Groups ---

/// Several commands undone and redone as one unit.
///
/// Members perform in order and undo in reverse. If a member fails, the
/// members already applied in that pass are reverted (best effort) and the
/// error is returned.
pub struct CommandGroup {
    name: String,
    commands: Vec<Box<dyn Command>>,
}

impl CommandGroup {
    /// Empty group labelled `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a member.
    pub fn push(&mut self, command: impl Command + 'static) {
        self.commands.push(Box::new(command));
    }

    /// Appends a member, builder style.
    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.push(command);
        self
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CommandGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        for i in 0..self.commands.len() {
            if let Err(err) = self.commands[i].perform(controller) {
                for done in self.commands[..i].iter_mut().rev() {
                    if let Err(_rollback) = done.undo(controller) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            "undo_group: rollback of '{}' in '{}' failed: {_rollback}",
                            done.name(),
                            self.name
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&mut self, controller: &mut GraphController) -> Result<(), GraphError> {
        for i in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[i].undo(controller) {
                for undone in self.commands[i + 1..].iter_mut() {
                    if let Err(_rollback) = undone.perform(controller) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            "undo_group: re-apply of '{}' in '{}' failed: {_rollback}",
                            undone.name(),
                            self.name
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEngine, RenderConfig};
    use crate::test_support::factory;

    fn controller() -> GraphController {
        GraphController::new(GraphEngine::new(RenderConfig::default()), factory())
    }

    fn add(controller: &mut GraphController, plugin: &str) -> NodeId {
        controller
            .add_node(NodeDescriptor::plugin(plugin), GraphId::Root, Position::default())
            .unwrap()
    }

    #[test]
    fn add_node_redo_keeps_id() {
        let mut c = controller();
        let mut cmd = AddNodeCommand::new(
            NodeDescriptor::plugin("const"),
            GraphId::Root,
            Position::new(0.3, 0.3),
        );
        cmd.perform(&mut c).unwrap();
        let id = cmd.node_id().unwrap();
        c.set_parameter(id, 0, 0.75).unwrap();

        cmd.undo(&mut c).unwrap();
        assert!(c.node(id).is_none());
        cmd.perform(&mut c).unwrap();
        assert_eq!(cmd.node_id(), Some(id));
        assert_eq!(c.parameter(id, 0), Some(0.75));
    }

    #[test]
    fn add_node_undo_fails_when_node_gone() {
        let mut c = controller();
        let mut cmd = AddNodeCommand::new(
            NodeDescriptor::plugin("const"),
            GraphId::Root,
            Position::default(),
        );
        cmd.perform(&mut c).unwrap();
        c.remove_node(cmd.node_id().unwrap()).unwrap();
        assert!(matches!(
            cmd.undo(&mut c),
            Err(GraphError::UndoStateUnavailable(_))
        ));
    }

    #[test]
    fn remove_node_restores_arcs() {
        let mut c = controller();
        let a = add(&mut c, "const");
        let b = add(&mut c, "gain");
        let d = add(&mut c, "gain");
        c.add_connection(a, 0, b, 0, GraphId::Root).unwrap();
        c.add_connection(b, 2, d, 0, GraphId::Root).unwrap();
        let before = c.snapshot();

        let mut cmd = RemoveNodeCommand::new(&c, b).unwrap();
        cmd.perform(&mut c).unwrap();
        assert_eq!(c.engine().connections(GraphId::Root).count(), 0);
        cmd.undo(&mut c).unwrap();
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn remove_node_undo_needs_neighbours() {
        let mut c = controller();
        let a = add(&mut c, "const");
        let b = add(&mut c, "gain");
        c.add_connection(a, 0, b, 0, GraphId::Root).unwrap();

        let mut cmd = RemoveNodeCommand::new(&c, b).unwrap();
        cmd.perform(&mut c).unwrap();
        c.remove_node(a).unwrap();
        let before = c.snapshot();
        assert!(matches!(
            cmd.undo(&mut c),
            Err(GraphError::UndoStateUnavailable(_))
        ));
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn connection_commands_are_symmetric() {
        let mut c = controller();
        let a = add(&mut c, "const");
        let b = add(&mut c, "gain");
        let mut connect = AddConnectionCommand::new(a, 0, b, 0, GraphId::Root);
        connect.perform(&mut c).unwrap();
        assert_eq!(c.engine().connections(GraphId::Root).count(), 1);

        let mut disconnect = RemoveConnectionCommand::new(a, 0, b, 0, GraphId::Root);
        disconnect.perform(&mut c).unwrap();
        assert!(disconnect.perform(&mut c).is_err());
        disconnect.undo(&mut c).unwrap();
        connect.undo(&mut c).unwrap();
        assert_eq!(c.engine().connections(GraphId::Root).count(), 0);
        assert!(matches!(
            connect.undo(&mut c),
            Err(GraphError::UndoStateUnavailable(_))
        ));
    }

    #[test]
    fn property_command_restores_previous() {
        let mut c = controller();
        let a = add(&mut c, "const");
        let mut cmd =
            SetNodePropertyCommand::new(&c, a, NodeProperty::Name("Bias".into())).unwrap();
        assert_eq!(cmd.name(), "Rename node");
        cmd.perform(&mut c).unwrap();
        assert_eq!(c.node(a).unwrap().name(), "Bias");
        cmd.undo(&mut c).unwrap();
        assert_eq!(c.node(a).unwrap().name(), "const");

        assert!(SetNodePropertyCommand::new(&c, NodeId(99), NodeProperty::Muted(true)).is_err());
    }

    #[test]
    fn failed_group_rolls_back() {
        let mut c = controller();
        let a = add(&mut c, "const");
        let before = c.snapshot();

        let mut group = CommandGroup::new("Broken")
            .with(SetNodePropertyCommand::new(&c, a, NodeProperty::Muted(true)).unwrap())
            .with(AddNodeCommand::new(
                NodeDescriptor::plugin("missing"),
                GraphId::Root,
                Position::default(),
            ));
        assert!(group.perform(&mut c).is_err());
        assert_eq!(c.snapshot(), before);
    }
}
