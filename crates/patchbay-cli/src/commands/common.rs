//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::Context;
use patchbay_config::Session;
use patchbay_core::{EventBuffer, GraphController, NodeDescriptor, RenderHandle};
use patchbay_nodes::NodeRegistry;

/// Output channels every command renders.
pub const CHANNELS: usize = 2;

/// Load a session file and build a controller running it.
pub fn open_session(path: &Path) -> anyhow::Result<(Session, GraphController)> {
    let session = Session::load(path)
        .with_context(|| format!("failed to load session {}", path.display()))?;
    let controller = session
        .controller(Box::new(NodeRegistry::new()))
        .with_context(|| format!("session '{}' could not be built", session.name))?;
    tracing::info!(
        session = %session.name,
        nodes = controller.engine().node_count(),
        "session loaded"
    );
    Ok((session, controller))
}

/// Short description of a node kind.
pub fn describe_kind(descriptor: &NodeDescriptor) -> String {
    match descriptor {
        NodeDescriptor::AudioInput { channels } => format!("audio in ({channels} ch)"),
        NodeDescriptor::AudioOutput { channels } => format!("audio out ({channels} ch)"),
        NodeDescriptor::MidiInput => "midi in".to_string(),
        NodeDescriptor::MidiOutput => "midi out".to_string(),
        NodeDescriptor::Plugin { id } => format!("plugin '{id}'"),
        NodeDescriptor::Subgraph {
            audio_inputs,
            audio_outputs,
            ..
        } => format!("subgraph ({audio_inputs} in, {audio_outputs} out)"),
    }
}

/// Stereo render buffers around a [`RenderHandle`].
///
/// Everything is allocated up front so [`Renderer::render`] can run inside
/// an audio callback.
pub struct Renderer {
    handle: RenderHandle,
    left: Vec<f32>,
    right: Vec<f32>,
    midi_out: EventBuffer,
}

impl Renderer {
    /// Buffers for up to `max_frames` per call.
    pub fn new(handle: RenderHandle, max_frames: usize, max_events: usize) -> Self {
        Self {
            handle,
            left: vec![0.0; max_frames],
            right: vec![0.0; max_frames],
            midi_out: EventBuffer::with_capacity(max_events),
        }
    }

    /// Largest frame count one call renders.
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    /// Renders up to `frames` frames and returns the left and right channels.
    pub fn render(&mut self, frames: usize) -> (&[f32], &[f32]) {
        let n = frames.min(self.left.len());
        self.handle.render_block(
            &[],
            &mut [&mut self.left[..n], &mut self.right[..n]],
            &[],
            &mut self.midi_out,
            n,
        );
        (&self.left[..n], &self.right[..n])
    }
}

/// Peak absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Root mean square of the samples.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| f64::from(*s) * f64::from(*s)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}
