//! Per-plan port buffers.
//!
//! Every port of every node in a plan gets its own slot, allocated once when
//! the plan is built and reused for every block it renders. Input and output
//! ports live in separate pools so a node's inputs and outputs can be
//! borrowed at the same time.

use super::event::EventBuffer;

/// Storage for one render plan's port buffers.
#[derive(Debug)]
pub(crate) struct PlanBuffers {
    /// One buffer per audio input port.
    pub audio_in: Vec<Vec<f32>>,
    /// One buffer per audio output port.
    pub audio_out: Vec<Vec<f32>>,
    /// One list per event input port.
    pub events_in: Vec<EventBuffer>,
    /// One list per event output port.
    pub events_out: Vec<EventBuffer>,
    /// One value per control input port, seeded with the port default.
    pub control_in: Vec<f32>,
    /// One value per control output port.
    pub control_out: Vec<f32>,
}

/// Slot counts collected while laying out a plan.
#[derive(Debug, Default)]
pub(crate) struct BufferLayout {
    pub audio_in: usize,
    pub audio_out: usize,
    pub events_in: usize,
    pub events_out: usize,
    pub control_defaults: Vec<f32>,
    pub control_out: usize,
}

impl PlanBuffers {
    /// Allocates zeroed buffers for `layout`.
    pub fn allocate(layout: &BufferLayout, block_size: usize, event_capacity: usize) -> Self {
        Self {
            audio_in: vec![vec![0.0; block_size]; layout.audio_in],
            audio_out: vec![vec![0.0; block_size]; layout.audio_out],
            events_in: event_pool(layout.events_in, event_capacity),
            events_out: event_pool(layout.events_out, event_capacity),
            control_in: layout.control_defaults.clone(),
            control_out: vec![0.0; layout.control_out],
        }
    }

    /// Total number of audio buffers.
    pub fn audio_count(&self) -> usize {
        self.audio_in.len() + self.audio_out.len()
    }
}

// `vec![buf; n]` would clone, and cloning a `Vec` drops its spare capacity.
fn event_pool(count: usize, capacity: usize) -> Vec<EventBuffer> {
    (0..count)
        .map(|_| EventBuffer::with_capacity(capacity))
        .collect()
}
