//! Graph engine: live node/arc set plus the published render plan.
//!
//! [`GraphEngine`] owns the live topology on the mutation side and publishes
//! immutable [`RenderPlan`]s through an `ArcSwap`. The audio thread renders
//! through a [`RenderHandle`], which performs exactly one atomic load per
//! call and never blocks.
//!
//! # Plan lifecycle
//!
//! Building → Published → Superseded → Reclaimed. A superseded plan moves to
//! the retirement list and is dropped on the mutation thread once the audio
//! thread no longer holds it, so neither plan buffers nor the processors of
//! removed nodes are ever freed on the audio thread.
//!
//! ```rust,ignore
//! let mut engine = GraphEngine::new(RenderConfig::default());
//! let handle = engine.render_handle();
//!
//! // audio thread
//! handle.render_block(&inputs, &mut outputs, &midi_in, &mut midi_out, 512);
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::GraphError;

use super::builder::PlanBuilder;
use super::connection::Connection;
use super::event::{EventBuffer, MidiEvent};
use super::node::{GraphId, Node, NodeId};
use super::plan::{HostIo, RenderPlan};
use super::topology::Topology;

/// Render settings the plan buffers are sized for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Maximum frames per processing chunk.
    pub block_size: usize,
    /// Capacity of every event buffer.
    pub max_events_per_block: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 512,
            max_events_per_block: 1024,
        }
    }
}

/// Owns the live graph and the currently published render plan.
pub struct GraphEngine {
    topology: Topology,
    config: RenderConfig,
    published: Arc<ArcSwap<RenderPlan>>,
    retired: Vec<Arc<RenderPlan>>,
    generation: u64,
    next_node: u32,
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl GraphEngine {
    /// Creates an engine with an empty root graph and an empty published plan.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            topology: Topology::new(),
            config,
            published: Arc::new(ArcSwap::from_pointee(RenderPlan::empty(config))),
            retired: Vec::new(),
            generation: 0,
            next_node: 1,
        }
    }

    /// Current render settings.
    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Propagates a new sample rate and block size to every node, then
    /// rebuilds and publishes a plan sized for it.
    ///
    /// Must complete before the first `render_block`. May allocate.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), GraphError> {
        self.config.sample_rate = sample_rate;
        self.config.block_size = block_size;
        for node in self.topology.nodes.values() {
            node.prepare(sample_rate, block_size);
        }
        #[cfg(feature = "tracing")]
        tracing::info!(
            "graph_prepare: {} nodes at {sample_rate} Hz, block {block_size}",
            self.topology.nodes.len()
        );
        self.rebuild()
    }

    /// Sets the event buffer capacity used by subsequent plans.
    pub fn set_max_events_per_block(&mut self, max_events: usize) {
        self.config.max_events_per_block = max_events;
    }

    /// Builds a plan from the live topology and publishes it.
    pub fn rebuild(&mut self) -> Result<(), GraphError> {
        let plan = PlanBuilder::new(&self.topology).build(self.config, self.generation + 1)?;
        self.publish(plan);
        Ok(())
    }

    /// Atomically swaps in `plan` and retires the previous one.
    pub(crate) fn publish(&mut self, plan: RenderPlan) {
        self.generation = plan.generation.max(self.generation + 1);
        let previous = self.published.swap(Arc::new(plan));
        self.retired.push(previous);
        self.collect_garbage();

        #[cfg(feature = "tracing")]
        {
            let current = self.published.load();
            tracing::debug!(
                "graph_publish: generation {}, {} ops, {} retired",
                current.generation,
                current.op_count(),
                self.retired.len()
            );
            for (i, line) in current.describe().iter().enumerate() {
                tracing::trace!("  op[{i}]: {line}");
            }
        }
    }

    /// Drops superseded plans that no render call still holds.
    ///
    /// Runs on every publish; call it from an idle timer to reclaim plans
    /// that were still in use at the last edit.
    pub fn collect_garbage(&mut self) {
        self.retired.retain(|plan| Arc::strong_count(plan) > 1);
    }

    /// Number of superseded plans awaiting reclamation.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Generation of the published plan.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The currently published plan.
    pub fn current_plan(&self) -> Arc<RenderPlan> {
        self.published.load_full()
    }

    /// Handle for the audio callback.
    ///
    /// Plans keep one set of scratch buffers, so a plan renders on one thread
    /// at a time. Hand out one handle to the single render thread.
    pub fn render_handle(&self) -> RenderHandle {
        RenderHandle {
            plan: Arc::clone(&self.published),
        }
    }

    /// Renders through the published plan. See [`RenderHandle::render_block`].
    pub fn render_block(
        &self,
        audio_in: &[&[f32]],
        audio_out: &mut [&mut [f32]],
        midi_in: &[MidiEvent],
        midi_out: &mut EventBuffer,
        num_samples: usize,
    ) {
        render_published(
            &self.published,
            audio_in,
            audio_out,
            midi_in,
            midi_out,
            num_samples,
        );
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.topology.node(id)
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.topology.nodes.values()
    }

    /// Nodes of one graph context in ascending id order.
    pub fn nodes_in(&self, graph: GraphId) -> impl Iterator<Item = &Node> {
        self.topology
            .graphs
            .get(&graph)
            .into_iter()
            .flat_map(|ctx| ctx.nodes.iter())
            .filter_map(|id| self.topology.node(*id))
    }

    /// Arcs of one graph context in 4-tuple order.
    pub fn connections(&self, graph: GraphId) -> impl Iterator<Item = &Connection> {
        self.topology
            .graphs
            .get(&graph)
            .into_iter()
            .flat_map(|ctx| ctx.connections.iter())
    }

    /// Arcs in `id`'s context with `id` at either end.
    pub fn connections_touching(&self, id: NodeId) -> Vec<Connection> {
        self.topology.connections_touching(id)
    }

    /// True if the graph context exists.
    pub fn contains_graph(&self, graph: GraphId) -> bool {
        self.topology.contains_graph(graph)
    }

    /// Total number of nodes across all contexts.
    pub fn node_count(&self) -> usize {
        self.topology.nodes.len()
    }

    /// Topological order of one context.
    pub fn order(&self, graph: GraphId) -> Result<Vec<NodeId>, GraphError> {
        self.topology.order(graph)
    }

    pub(crate) fn topology(&self) -> &Topology {
        &self.topology
    }

    pub(crate) fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    /// Swaps in a whole new topology, returning the old one.
    pub(crate) fn replace_topology(&mut self, topology: Topology) -> Topology {
        std::mem::replace(&mut self.topology, topology)
    }

    /// Next unused node id.
    pub(crate) fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    /// Keeps the id counter ahead of an id restored from a snapshot.
    pub(crate) fn reserve_id(&mut self, id: NodeId) {
        self.next_node = self.next_node.max(id.0 + 1);
    }
}

/// Render entry point handed to the audio callback.
///
/// `Send` but not `Clone`: one render thread owns it. Each call
/// loads the published plan once, so a block always renders entirely with the
/// old plan or entirely with the new.
pub struct RenderHandle {
    plan: Arc<ArcSwap<RenderPlan>>,
}

impl RenderHandle {
    /// Renders `num_samples` frames.
    ///
    /// `audio_out` channels are cleared, then every root audio output node
    /// sums into them; `midi_out` is cleared and receives every root MIDI
    /// output node's events. Missing input channels read silence and extra
    /// output channels stay silent. Requests larger than the prepared block
    /// size render in block-size chunks.
    ///
    /// Real-time safe: no allocation, blocking, or panics.
    ///
    /// One render thread per engine. A call that overlaps another render of
    /// the same plan (through a second handle or
    /// [`GraphEngine::render_block`]) cannot get the plan's buffers and
    /// returns with its outputs cleared.
    pub fn render_block(
        &self,
        audio_in: &[&[f32]],
        audio_out: &mut [&mut [f32]],
        midi_in: &[MidiEvent],
        midi_out: &mut EventBuffer,
        num_samples: usize,
    ) {
        render_published(
            &self.plan,
            audio_in,
            audio_out,
            midi_in,
            midi_out,
            num_samples,
        );
    }

    /// Generation of the plan the next render call would use.
    pub fn generation(&self) -> u64 {
        self.plan.load().generation
    }
}

fn render_published(
    published: &ArcSwap<RenderPlan>,
    audio_in: &[&[f32]],
    audio_out: &mut [&mut [f32]],
    midi_in: &[MidiEvent],
    midi_out: &mut EventBuffer,
    num_samples: usize,
) {
    for channel in audio_out.iter_mut() {
        let n = num_samples.min(channel.len());
        channel[..n].fill(0.0);
    }
    midi_out.clear();

    let plan = published.load();
    let mut host = HostIo {
        audio_in,
        audio_out,
        midi_in,
        midi_out,
    };
    plan.render(&mut host, num_samples);
}

impl std::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("generation", &self.generation())
            .finish()
    }
}
