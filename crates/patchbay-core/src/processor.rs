//! The processor capability trait and the per-block buffer view it renders into.
//!
//! A [`Processor`] is the unit of work wrapped by a plugin node. The render
//! path reaches it through `dyn Processor`, so the trait stays object-safe.
//! Processors are created through a [`ProcessorFactory`], which is the only
//! way the graph learns about plugin implementations.
//!
//! ## Design Decisions
//!
//! - **Block processing**: `process` receives every port of the node at once
//!   through [`ProcessBuffers`], so multichannel and event-driven processors
//!   need no special casing in the engine.
//! - **No allocations**: `process` runs on the audio thread. Implementations
//!   must not allocate, block, or panic there.
//! - **State as bytes**: `state`/`set_state` default to a little-endian
//!   encoding of the parameter values, which is enough for the built-in
//!   processors and keeps undo snapshots format-agnostic.

use thiserror::Error;

use crate::graph::{EventBuffer, PortLayout};

/// Errors produced by processor factories and state restoration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// No processor is registered under this id.
    #[error("unknown plugin id '{0}'")]
    UnknownPlugin(String),

    /// A state blob could not be applied.
    #[error("invalid processor state: {0}")]
    InvalidState(String),

    /// The processor exists but cannot be created right now.
    #[error("plugin '{plugin}' unavailable: {reason}")]
    Unavailable {
        /// Plugin id.
        plugin: String,
        /// Why creation failed.
        reason: String,
    },
}

/// Metadata for one processor parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name (e.g., "Gain", "Frequency").
    pub name: &'static str,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Value after construction or reset.
    pub default: f32,
}

impl ParamDescriptor {
    /// Creates a descriptor for a linear range.
    pub const fn new(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            min,
            max,
            default,
        }
    }

    /// Clamps a value into `[min, max]`.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Mutable view over one node's port buffers for a single block.
///
/// Audio slices returned by the accessors are exactly `num_samples` long.
/// Output buffers are cleared by the engine before `process` runs, so a
/// processor may either overwrite or accumulate into them.
pub struct ProcessBuffers<'a> {
    audio_in: &'a [Vec<f32>],
    audio_out: &'a mut [Vec<f32>],
    events_in: &'a [EventBuffer],
    events_out: &'a mut [EventBuffer],
    control_in: &'a [f32],
    control_out: &'a mut [f32],
    num_samples: usize,
}

impl<'a> ProcessBuffers<'a> {
    /// Assembles a buffer view. Every audio buffer must hold at least
    /// `num_samples` samples.
    pub fn new(
        audio_in: &'a [Vec<f32>],
        audio_out: &'a mut [Vec<f32>],
        events_in: &'a [EventBuffer],
        events_out: &'a mut [EventBuffer],
        control_in: &'a [f32],
        control_out: &'a mut [f32],
        num_samples: usize,
    ) -> Self {
        Self {
            audio_in,
            audio_out,
            events_in,
            events_out,
            control_in,
            control_out,
            num_samples,
        }
    }

    /// Number of samples in this block.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of audio input channels.
    pub fn audio_input_count(&self) -> usize {
        self.audio_in.len()
    }

    /// Number of audio output channels.
    pub fn audio_output_count(&self) -> usize {
        self.audio_out.len()
    }

    /// Audio input channel `index`.
    pub fn audio_input(&self, index: usize) -> Option<&[f32]> {
        let n = self.num_samples;
        self.audio_in.get(index).map(|b| &b[..n.min(b.len())])
    }

    /// Audio output channel `index`.
    pub fn audio_output(&mut self, index: usize) -> Option<&mut [f32]> {
        let n = self.num_samples;
        self.audio_out.get_mut(index).map(|b| {
            let len = n.min(b.len());
            &mut b[..len]
        })
    }

    /// Input and output channel `index` at once, for in-place style processing.
    pub fn audio_channel(&mut self, index: usize) -> Option<(&[f32], &mut [f32])> {
        let n = self.num_samples;
        let input = self.audio_in.get(index)?;
        let output = self.audio_out.get_mut(index)?;
        let len = n.min(input.len()).min(output.len());
        Some((&input[..len], &mut output[..len]))
    }

    /// Audio input `input` together with audio output `output`.
    pub fn audio_route(&mut self, input: usize, output: usize) -> Option<(&[f32], &mut [f32])> {
        let n = self.num_samples;
        let src = self.audio_in.get(input)?;
        let dst = self.audio_out.get_mut(output)?;
        let len = n.min(src.len()).min(dst.len());
        Some((&src[..len], &mut dst[..len]))
    }

    /// Event input port `index`.
    pub fn events_input(&self, index: usize) -> Option<&EventBuffer> {
        self.events_in.get(index)
    }

    /// Event output port `index`.
    pub fn events_output(&mut self, index: usize) -> Option<&mut EventBuffer> {
        self.events_out.get_mut(index)
    }

    /// Event input and output port `index` at once.
    pub fn event_channel(&mut self, index: usize) -> Option<(&EventBuffer, &mut EventBuffer)> {
        let input = self.events_in.get(index)?;
        let output = self.events_out.get_mut(index)?;
        Some((input, output))
    }

    /// Current value of control input `index`.
    pub fn control_input(&self, index: usize) -> Option<f32> {
        self.control_in.get(index).copied()
    }

    /// Sets control output `index`. Out-of-range indices are ignored.
    pub fn set_control_output(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.control_out.get_mut(index) {
            *slot = value;
        }
    }
}

/// Capability trait for everything a plugin node can wrap.
///
/// # Example
///
/// ```rust
/// use patchbay_core::{PortLayout, ProcessBuffers, Processor};
///
/// struct Invert;
///
/// impl Processor for Invert {
///     fn ports(&self) -> PortLayout {
///         PortLayout::new().audio_in("In").audio_out("Out")
///     }
///
///     fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}
///
///     fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
///         if let Some((input, output)) = buffers.audio_channel(0) {
///             for (o, i) in output.iter_mut().zip(input) {
///                 *o = -*i;
///             }
///         }
///     }
/// }
/// ```
pub trait Processor: Send {
    /// Port layout. Called once when the owning node is constructed.
    fn ports(&self) -> PortLayout;

    /// Configures the processor for a sample rate and maximum block size.
    ///
    /// Called on the mutation thread and may allocate.
    fn prepare(&mut self, sample_rate: f32, block_size: usize);

    /// Renders one block. Real-time: no allocation, blocking, or panics.
    fn process(&mut self, buffers: &mut ProcessBuffers<'_>);

    /// Clears internal state (delay lines, phases) without touching parameters.
    fn reset(&mut self) {}

    /// Number of parameters.
    fn param_count(&self) -> usize {
        0
    }

    /// Descriptor for parameter `index`.
    fn param_info(&self, _index: usize) -> Option<ParamDescriptor> {
        None
    }

    /// Current value of parameter `index`.
    fn get_param(&self, _index: usize) -> f32 {
        0.0
    }

    /// Sets parameter `index`. Out-of-range indices are ignored.
    fn set_param(&mut self, _index: usize, _value: f32) {}

    /// Serializes the processor's configuration.
    ///
    /// The default encodes every parameter as a little-endian `f32`.
    fn state(&self) -> Vec<u8> {
        (0..self.param_count())
            .flat_map(|i| self.get_param(i).to_le_bytes())
            .collect()
    }

    /// Restores a blob produced by [`state`](Self::state).
    fn set_state(&mut self, state: &[u8]) -> Result<(), ProcessorError> {
        let count = self.param_count();
        if state.len() != count * 4 {
            return Err(ProcessorError::InvalidState(format!(
                "expected {} bytes for {count} parameters, got {}",
                count * 4,
                state.len()
            )));
        }
        for (i, chunk) in state.chunks_exact(4).enumerate() {
            let bytes = [chunk[0], chunk[1], chunk[2], chunk[3]];
            self.set_param(i, f32::from_le_bytes(bytes));
        }
        Ok(())
    }
}

/// Creates processors by plugin id.
///
/// Implemented by the host's plugin layer. Closures with the right signature
/// implement it too, which keeps tests short.
pub trait ProcessorFactory: Send {
    /// Instantiates the processor registered under `plugin_id`.
    fn create(&self, plugin_id: &str) -> Result<Box<dyn Processor>, ProcessorError>;
}

impl<F> ProcessorFactory for F
where
    F: Fn(&str) -> Result<Box<dyn Processor>, ProcessorError> + Send,
{
    fn create(&self, plugin_id: &str) -> Result<Box<dyn Processor>, ProcessorError> {
        self(plugin_id)
    }
}
