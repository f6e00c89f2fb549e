//! Graph node types.
//!
//! Each node has a [`NodeId`], a [`NodeDescriptor`] that determines its role
//! (boundary, plugin, or subgraph), and a port layout fixed at construction.
//! The processor, its parameter slots, and the enabled/muted flags live in a
//! shared block that published render plans hold by reference count, so
//! toggling a flag or moving a parameter needs no rebuild and a removed
//! node's processor outlives every plan using it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::processor::{Processor, ProcessorError};

use super::param::ParamSlots;
use super::port::{Port, PortLayout};

/// Unique identifier for a node.
///
/// Ids come from a monotonically increasing counter and are never reused for
/// a different node. Undo restores a removed node under its original id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Wraps a raw id, e.g. one read back from a session file.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identifies a graph context: the root graph or the nested graph of a subgraph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphId {
    /// Top-level graph, fed by the engine's external I/O.
    Root,
    /// Nested graph owned by a subgraph node.
    Subgraph(NodeId),
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Subgraph(id) => write!(f, "subgraph({id})"),
        }
    }
}

/// Normalized 2-D position of a node in its editor view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate in `0.0..=1.0`.
    pub x: f64,
    /// Vertical coordinate in `0.0..=1.0`.
    pub y: f64,
}

impl Position {
    /// Creates a position, clamping both coordinates into `0.0..=1.0`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }.clamped()
    }

    /// Returns a copy with both coordinates clamped.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        Self {
            x: clamp(self.x),
            y: clamp(self.y),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeDescriptor {
    /// Reads external audio (root) or the subgraph node's audio inputs.
    AudioInput {
        /// Number of output channels.
        channels: u32,
    },
    /// Sums into external audio (root) or the subgraph node's audio outputs.
    AudioOutput {
        /// Number of input channels.
        channels: u32,
    },
    /// Reads external MIDI (root) or the subgraph node's event input.
    MidiInput,
    /// Merges into external MIDI (root) or the subgraph node's event output.
    MidiOutput,
    /// A processor created by the [`ProcessorFactory`](crate::ProcessorFactory).
    Plugin {
        /// Plugin id passed to the factory.
        id: String,
    },
    /// A node owning a nested graph context.
    Subgraph {
        /// Audio input channels.
        audio_inputs: u32,
        /// Audio output channels.
        audio_outputs: u32,
        /// Whether the subgraph takes an event input.
        midi_input: bool,
        /// Whether the subgraph produces an event output.
        midi_output: bool,
    },
}

impl NodeDescriptor {
    /// Shorthand for a plugin descriptor.
    pub fn plugin(id: impl Into<String>) -> Self {
        Self::Plugin { id: id.into() }
    }

    /// Stereo in/out subgraph with MIDI in and out.
    pub fn stereo_subgraph() -> Self {
        Self::Subgraph {
            audio_inputs: 2,
            audio_outputs: 2,
            midi_input: true,
            midi_output: true,
        }
    }

    /// Name given to a new node of this kind.
    pub fn default_name(&self) -> String {
        match self {
            Self::AudioInput { .. } => "Audio Input".to_string(),
            Self::AudioOutput { .. } => "Audio Output".to_string(),
            Self::MidiInput => "MIDI Input".to_string(),
            Self::MidiOutput => "MIDI Output".to_string(),
            Self::Plugin { id } => id.clone(),
            Self::Subgraph { .. } => "Subgraph".to_string(),
        }
    }

    /// True for boundary nodes that bridge a graph context to its host.
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            Self::AudioInput { .. } | Self::AudioOutput { .. } | Self::MidiInput | Self::MidiOutput
        )
    }

    /// Port layout for kinds that carry no processor. `None` for plugins.
    pub fn builtin_layout(&self) -> Option<PortLayout> {
        let layout = match self {
            Self::AudioInput { channels } => (0..*channels)
                .fold(PortLayout::new(), |l, c| l.audio_out(&format!("Out {}", c + 1))),
            Self::AudioOutput { channels } => (0..*channels)
                .fold(PortLayout::new(), |l, c| l.audio_in(&format!("In {}", c + 1))),
            Self::MidiInput => PortLayout::new().event_out("MIDI Out"),
            Self::MidiOutput => PortLayout::new().event_in("MIDI In"),
            Self::Plugin { .. } => return None,
            Self::Subgraph {
                audio_inputs,
                audio_outputs,
                midi_input,
                midi_output,
            } => {
                let mut layout = (0..*audio_inputs)
                    .fold(PortLayout::new(), |l, c| l.audio_in(&format!("In {}", c + 1)));
                if *midi_input {
                    layout = layout.event_in("MIDI In");
                }
                layout = (0..*audio_outputs)
                    .fold(layout, |l, c| l.audio_out(&format!("Out {}", c + 1)));
                if *midi_output {
                    layout = layout.event_out("MIDI Out");
                }
                layout
            }
        };
        Some(layout)
    }
}

/// State shared between a node and every render plan that references it.
pub(crate) struct NodeShared {
    /// Wrapped processor. `None` for boundary and subgraph nodes.
    pub processor: Option<Mutex<Box<dyn Processor>>>,
    /// Parameter values, applied by the render thread before `process`.
    pub params: ParamSlots,
    /// Cleared = bypassed.
    pub enabled: AtomicBool,
    /// Processed, then outputs silenced.
    pub muted: AtomicBool,
}

/// A processing unit in the graph.
pub struct Node {
    id: NodeId,
    name: String,
    graph: GraphId,
    descriptor: NodeDescriptor,
    position: Position,
    layout: PortLayout,
    shared: Arc<NodeShared>,
}

impl Node {
    /// Builds a node. `processor` must be `Some` exactly for plugin descriptors.
    pub(crate) fn new(
        id: NodeId,
        graph: GraphId,
        descriptor: NodeDescriptor,
        position: Position,
        processor: Option<Box<dyn Processor>>,
    ) -> Self {
        let layout = processor
            .as_ref()
            .map(|p| p.ports())
            .or_else(|| descriptor.builtin_layout())
            .unwrap_or_default();
        let params = processor
            .as_deref()
            .map(ParamSlots::capture)
            .unwrap_or_default();
        Self {
            id,
            name: descriptor.default_name(),
            graph,
            descriptor,
            position: position.clamped(),
            layout,
            shared: Arc::new(NodeShared {
                processor: processor.map(Mutex::new),
                params,
                enabled: AtomicBool::new(true),
                muted: AtomicBool::new(false),
            }),
        }
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Graph context the node lives in.
    pub fn graph(&self) -> GraphId {
        self.graph
    }

    /// What the node is.
    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    /// Editor position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Port layout.
    pub fn layout(&self) -> &PortLayout {
        &self.layout
    }

    /// False when bypassed.
    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Relaxed)
    }

    /// True when muted.
    pub fn is_muted(&self) -> bool {
        self.shared.muted.load(Ordering::Relaxed)
    }

    /// True if the node owns a nested graph context.
    pub fn is_subgraph(&self) -> bool {
        matches!(self.descriptor, NodeDescriptor::Subgraph { .. })
    }

    /// Resolved port `index`.
    pub fn port(&self, index: u32) -> Option<Port> {
        self.layout.get(index as usize).map(|spec| Port {
            node: self.id,
            index,
            direction: spec.direction,
            kind: spec.kind,
        })
    }

    pub(crate) fn shared(&self) -> &Arc<NodeShared> {
        &self.shared
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position.clamped();
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.shared.muted.store(muted, Ordering::Relaxed);
    }

    /// Runs `f` against the processor. The render thread skips the node
    /// (silence) for any block that overlaps the lock, so only prepare and
    /// state capture come through here.
    fn with_processor<R>(&self, f: impl FnOnce(&mut dyn Processor) -> R) -> Option<R> {
        self.shared.processor.as_ref().map(|p| {
            let mut guard = p.lock();
            f(&mut **guard)
        })
    }

    pub(crate) fn prepare(&self, sample_rate: f32, block_size: usize) {
        self.with_processor(|p| p.prepare(sample_rate, block_size));
    }

    /// Processor state blob, including parameter writes the render thread
    /// has not picked up yet. Empty for nodes without a processor.
    pub fn state(&self) -> Vec<u8> {
        self.with_processor(|p| {
            self.shared.params.apply_pending(p);
            p.state()
        })
        .unwrap_or_default()
    }

    pub(crate) fn set_state(&self, state: &[u8]) -> Result<(), ProcessorError> {
        self.with_processor(|p| -> Result<(), ProcessorError> {
            p.set_state(state)?;
            self.shared.params.refresh(p);
            Ok(())
        })
        .unwrap_or(Ok(()))
    }

    /// Number of processor parameters. Zero for nodes without a processor.
    pub fn param_count(&self) -> usize {
        self.shared.params.len()
    }

    /// Latest value of parameter `index`. Never locks the processor.
    pub fn parameter(&self, index: usize) -> Option<f32> {
        self.shared.params.get(index)
    }

    /// Queues a parameter write for the render thread. Returns `false` for
    /// an unknown index or a non-finite value.
    pub(crate) fn set_parameter(&self, index: usize, value: f32) -> bool {
        self.shared.params.set(index, value)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("graph", &self.graph)
            .field("descriptor", &self.descriptor)
            .field("position", &self.position)
            .field("enabled", &self.is_enabled())
            .field("muted", &self.is_muted())
            .finish_non_exhaustive()
    }
}
