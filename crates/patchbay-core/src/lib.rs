//! Patchbay Core - audio processing graph engine for a plugin host
//!
//! This crate holds the part of the host that has to be right under real-time
//! pressure: the node/port/connection model, the render-plan builder, the
//! engine that renders the published plan on the audio thread, the controller
//! through which every structural edit flows, and the undo system wrapping
//! those edits.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`GraphController`] - the single mutation gateway (add/remove nodes and connections)
//! - [`GraphEngine`] - owns the node/arc set and the published [`RenderPlan`]
//! - [`RenderHandle`] - handle the audio callback renders through
//! - [`can_connect`] - the port compatibility predicate
//!
//! ## Processors
//!
//! - [`Processor`] - capability trait implemented by every processing unit
//! - [`ProcessorFactory`] - creates processors from plugin ids
//!
//! ## Undo
//!
//! - [`Command`] - a reversible edit
//! - [`History`] - linear undo/redo stack with grouped entries
//!
//! # Example
//!
//! ```rust,ignore
//! use patchbay_core::{GraphController, GraphEngine, GraphId, NodeDescriptor, Position};
//!
//! let mut controller = GraphController::new(GraphEngine::default(), Box::new(registry));
//! controller.prepare(48000.0, 256);
//!
//! let input = controller.add_node(NodeDescriptor::AudioInput { channels: 2 }, GraphId::Root, Position::default())?;
//! let gain = controller.add_node(NodeDescriptor::plugin("gain"), GraphId::Root, Position::new(0.5, 0.5))?;
//! controller.add_connection(input, 0, gain, 0, GraphId::Root)?;
//!
//! // Hand this to the audio callback.
//! let handle = controller.render_handle();
//! handle.render_block(&inputs, &mut outputs, &midi_in, &mut midi_out, 256);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: the render path performs one atomic load per block and
//!   never allocates, blocks, or panics
//! - **Immutable plans**: every edit builds a fresh plan; published plans never change
//! - **Reversible edits**: every structural edit has a command with a faithful undo

pub mod error;
pub mod graph;
pub mod processor;
pub mod undo;

#[cfg(test)]
mod test_support;

pub use error::{GraphError, Missing};
pub use graph::{
    Connection, EventBuffer, GraphChange, GraphController, GraphEngine, GraphId, GraphSnapshot,
    MidiEvent, Node, NodeDescriptor, NodeId, NodeProperty, NodeSnapshot, Port, PortDirection,
    PortLayout, PortSpec, PortType, Position, RenderConfig, RenderHandle, RenderPlan, can_connect,
};
pub use processor::{ParamDescriptor, ProcessBuffers, Processor, ProcessorError, ProcessorFactory};
pub use undo::{
    AddConnectionCommand, AddNodeCommand, Command, CommandGroup, History, RemoveConnectionCommand,
    RemoveNodeCommand, SetNodePropertyCommand,
};
