//! Render plan builder.
//!
//! Turns the live [`Topology`] into an immutable [`RenderPlan`]: one
//! topological pass per graph context, subgraph contents flattened in place,
//! and every input port fed by explicit copy/mix/merge instructions.
//!
//! Input resolution per port type:
//!
//! - **Audio**: contributors are summed sample-by-sample (first copies, the
//!   rest mix) in topological order of their sources.
//! - **Event**: contributors are merged into one stably time-sorted list.
//! - **Control**: the last contributor in topological order wins.
//!
//! An input with no arcs is never written, so it reads silence, an empty
//! list, or its control default.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::GraphError;

use super::buffer::{BufferLayout, PlanBuffers};
use super::engine::RenderConfig;
use super::node::{GraphId, Node, NodeDescriptor, NodeId};
use super::plan::{PlanNode, RenderOp, RenderPlan};
use super::port::{PortDirection, PortType};
use super::topology::Topology;

/// Builds render plans from a topology.
pub(crate) struct PlanBuilder<'t> {
    topology: &'t Topology,
    layout: BufferLayout,
    nodes: Vec<PlanNode>,
    index: HashMap<NodeId, usize>,
    order: Vec<NodeId>,
    ops: Vec<RenderOp>,
}

impl<'t> PlanBuilder<'t> {
    pub fn new(topology: &'t Topology) -> Self {
        Self {
            topology,
            layout: BufferLayout::default(),
            nodes: Vec::with_capacity(topology.nodes.len()),
            index: HashMap::with_capacity(topology.nodes.len()),
            order: Vec::with_capacity(topology.nodes.len()),
            ops: Vec::new(),
        }
    }

    /// Builds the plan for the root context and everything nested in it.
    ///
    /// A cycle here means an edit slipped past the controller's validation.
    pub fn build(
        mut self,
        config: RenderConfig,
        generation: u64,
    ) -> Result<RenderPlan, GraphError> {
        if let Err(err) = self.emit_context(GraphId::Root, None) {
            #[cfg(feature = "tracing")]
            tracing::error!("graph_build: contract violation, plan not published: {err}");
            return Err(err);
        }

        let buffers = PlanBuffers::allocate(
            &self.layout,
            config.block_size,
            config.max_events_per_block,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_build: generation {generation}, {} nodes, {} ops, {} audio buffers",
            self.order.len(),
            self.ops.len(),
            buffers.audio_count()
        );

        Ok(RenderPlan {
            order: self.order,
            nodes: self.nodes,
            ops: self.ops,
            buffers: Mutex::new(buffers),
            config,
            generation,
        })
    }

    fn alloc(&mut self, node: &Node) -> usize {
        let layout = node.layout();
        let take = |counter: &mut usize, kind, direction| {
            let start = *counter;
            *counter += layout.count(kind, direction);
            start..*counter
        };
        let audio_in = take(&mut self.layout.audio_in, PortType::Audio, PortDirection::Input);
        let audio_out = take(&mut self.layout.audio_out, PortType::Audio, PortDirection::Output);
        let events_in = take(&mut self.layout.events_in, PortType::Event, PortDirection::Input);
        let events_out = take(&mut self.layout.events_out, PortType::Event, PortDirection::Output);
        let control_out = take(
            &mut self.layout.control_out,
            PortType::Control,
            PortDirection::Output,
        );
        let control_start = self.layout.control_defaults.len();
        self.layout
            .control_defaults
            .extend(layout.control_defaults());
        let control_in = control_start..self.layout.control_defaults.len();

        let idx = self.nodes.len();
        self.nodes.push(PlanNode {
            id: node.id(),
            shared: node.shared().clone(),
            audio_in,
            audio_out,
            events_in,
            events_out,
            control_in,
            control_out,
        });
        self.index.insert(node.id(), idx);
        idx
    }

    fn emit_context(&mut self, graph: GraphId, host: Option<usize>) -> Result<(), GraphError> {
        let topology = self.topology;
        let order = topology.order(graph)?;
        let ctx = topology.context(graph)?;

        let mut position = HashMap::with_capacity(order.len());
        for (pos, id) in order.iter().enumerate() {
            position.insert(*id, pos);
            if let Some(node) = topology.node(*id) {
                self.alloc(node);
            }
        }

        for id in &order {
            let Some(node) = topology.node(*id) else {
                continue;
            };
            let idx = self.index[id];
            self.order.push(*id);

            // Gather inputs: contributors sorted by their source's position in the order.
            let mut incoming: Vec<_> = ctx.connections.iter().filter(|c| c.dest == *id).collect();
            incoming.sort_by_key(|c| (c.dest_port, position.get(&c.source).copied()));

            let mut port_start = 0;
            while port_start < incoming.len() {
                let dest_port = incoming[port_start].dest_port;
                let port_end = incoming[port_start..]
                    .iter()
                    .position(|c| c.dest_port != dest_port)
                    .map_or(incoming.len(), |off| port_start + off);
                let group = &incoming[port_start..port_end];
                port_start = port_end;

                let (Some(spec), Some(dest_ch)) = (
                    node.layout().get(dest_port as usize),
                    node.layout().channel(dest_port as usize),
                ) else {
                    continue;
                };
                let dest = &self.nodes[idx];
                match spec.kind {
                    PortType::Audio => {
                        let to = dest.audio_in.start + dest_ch;
                        let mut first = true;
                        for conn in group {
                            let Some(from) = self.source_slot(conn.source, conn.source_port) else {
                                continue;
                            };
                            self.ops.push(if first {
                                RenderOp::CopyAudio { from, to }
                            } else {
                                RenderOp::MixAudio { from, to }
                            });
                            first = false;
                        }
                    }
                    PortType::Event => {
                        let to = dest.events_in.start + dest_ch;
                        self.ops.push(RenderOp::ClearEvents { buffer: to });
                        for conn in group {
                            if let Some(from) = self.source_slot(conn.source, conn.source_port) {
                                self.ops.push(RenderOp::MergeEvents { from, to });
                            }
                        }
                    }
                    PortType::Control => {
                        let to = dest.control_in.start + dest_ch;
                        if let Some(conn) = group.last()
                            && let Some(from) = self.source_slot(conn.source, conn.source_port)
                        {
                            self.ops.push(RenderOp::CopyControl { from, to });
                        }
                    }
                }
            }

            self.emit_node(node, idx, host)?;
        }
        Ok(())
    }

    /// Output pool slot of `port` on `node`, for whichever pool its type uses.
    fn source_slot(&self, node: NodeId, port: u32) -> Option<usize> {
        let idx = *self.index.get(&node)?;
        let channel = self.topology.node(node)?.layout().channel(port as usize)?;
        let kind = self.topology.node(node)?.layout().get(port as usize)?.kind;
        let plan_node = &self.nodes[idx];
        Some(match kind {
            PortType::Audio => plan_node.audio_out.start + channel,
            PortType::Event => plan_node.events_out.start + channel,
            PortType::Control => plan_node.control_out.start + channel,
        })
    }

    fn emit_node(
        &mut self,
        node: &Node,
        idx: usize,
        host: Option<usize>,
    ) -> Result<(), GraphError> {
        let this = &self.nodes[idx];
        match (node.descriptor(), host) {
            (NodeDescriptor::AudioInput { .. }, None) => {
                for (channel, to) in this.audio_out.clone().enumerate() {
                    self.ops.push(RenderOp::ReadHostAudio { channel, to });
                }
            }
            (NodeDescriptor::AudioInput { .. }, Some(host)) => {
                let from = self.nodes[host].audio_in.clone();
                for (from, to) in from.zip(this.audio_out.clone()) {
                    self.ops.push(RenderOp::ForwardAudio { from, to });
                }
            }
            (NodeDescriptor::AudioOutput { .. }, None) => {
                for (channel, from) in this.audio_in.clone().enumerate() {
                    self.ops.push(RenderOp::WriteHostAudio { from, channel });
                }
            }
            (NodeDescriptor::AudioOutput { .. }, Some(host)) => {
                let to = self.nodes[host].audio_out.clone();
                for (from, to) in this.audio_in.clone().zip(to) {
                    self.ops.push(RenderOp::ReturnAudio { from, to });
                }
            }
            (NodeDescriptor::MidiInput, None) => {
                for to in this.events_out.clone() {
                    self.ops.push(RenderOp::ReadHostEvents { to });
                }
            }
            (NodeDescriptor::MidiInput, Some(host)) => {
                let from = self.nodes[host].events_in.clone();
                for (from, to) in from.zip(this.events_out.clone()) {
                    self.ops.push(RenderOp::ForwardEvents { from, to });
                }
            }
            (NodeDescriptor::MidiOutput, None) => {
                for from in this.events_in.clone() {
                    self.ops.push(RenderOp::WriteHostEvents { from });
                }
            }
            (NodeDescriptor::MidiOutput, Some(host)) => {
                let to = self.nodes[host].events_out.clone();
                for (from, to) in this.events_in.clone().zip(to) {
                    self.ops.push(RenderOp::ReturnEvents { from, to });
                }
            }
            (NodeDescriptor::Plugin { .. }, _) => {
                self.ops.push(RenderOp::Process { node: idx });
            }
            (NodeDescriptor::Subgraph { .. }, _) => {
                let enter = self.ops.len();
                self.ops.push(RenderOp::EnterSubgraph {
                    node: idx,
                    skip_to: 0,
                });
                self.emit_context(GraphId::Subgraph(node.id()), Some(idx))?;
                self.ops.push(RenderOp::ExitSubgraph { node: idx });
                let after = self.ops.len();
                if let Some(RenderOp::EnterSubgraph { skip_to, .. }) = self.ops.get_mut(enter) {
                    *skip_to = after;
                }
            }
        }
        Ok(())
    }
}
