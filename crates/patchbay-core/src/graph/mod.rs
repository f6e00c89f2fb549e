//! Processing graph: ports, nodes, arcs, render plans, and the engine that
//! publishes them.
//!
//! The mutation side owns the live topology and edits it through
//! [`GraphController`]. Every accepted edit compiles the topology into a
//! [`RenderPlan`] (a flat op list over preallocated buffers) and publishes it
//! with one atomic swap. The audio thread only ever sees complete plans.

mod buffer;
mod builder;
mod connection;
mod controller;
mod engine;
mod event;
mod node;
mod param;
mod plan;
mod port;
mod snapshot;
mod topology;

pub use connection::Connection;
pub use controller::{GraphChange, GraphController, NodeProperty};
pub use engine::{GraphEngine, RenderConfig, RenderHandle};
pub use event::{EventBuffer, MidiEvent};
pub use node::{GraphId, Node, NodeDescriptor, NodeId, Position};
pub use plan::RenderPlan;
pub use port::{Port, PortDirection, PortLayout, PortSpec, PortType, can_connect};
pub use snapshot::{GraphSnapshot, NodeSnapshot};
