//! Small processors shared by unit tests.

use crate::graph::{EventBuffer, MidiEvent, PortLayout, RenderHandle};
use crate::processor::{
    ParamDescriptor, ProcessBuffers, Processor, ProcessorError, ProcessorFactory,
};

/// Writes a constant to its single audio output. Param 0 is the value.
pub(crate) struct Constant {
    value: f32,
}

impl Processor for Constant {
    fn ports(&self) -> PortLayout {
        PortLayout::new().audio_out("Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let n = buffers.num_samples();
        if let Some(out) = buffers.audio_output(0) {
            out[..n].fill(self.value);
        }
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        (index == 0).then(|| ParamDescriptor::new("Value", -1.0, 1.0, 1.0))
    }

    fn get_param(&self, index: usize) -> f32 {
        if index == 0 { self.value } else { 0.0 }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            self.value = value;
        }
    }
}

/// Audio in (port 0), control in "Gain" (port 1), audio out (port 2).
/// Output is input times param 0 times the control value.
pub(crate) struct Gain {
    gain: f32,
}

impl Processor for Gain {
    fn ports(&self) -> PortLayout {
        PortLayout::new()
            .audio_in("In")
            .control_in("Gain", 1.0)
            .audio_out("Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let n = buffers.num_samples();
        let gain = self.gain * buffers.control_input(0).unwrap_or(1.0);
        if let Some((input, output)) = buffers.audio_channel(0) {
            for (o, i) in output[..n].iter_mut().zip(&input[..n]) {
                *o = i * gain;
            }
        }
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        (index == 0).then(|| ParamDescriptor::new("Gain", 0.0, 4.0, 1.0))
    }

    fn get_param(&self, index: usize) -> f32 {
        if index == 0 { self.gain } else { 0.0 }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            self.gain = value;
        }
    }
}

/// Emits a note-on at the start of every block on event output 0.
pub(crate) struct NoteSource;

impl Processor for NoteSource {
    fn ports(&self) -> PortLayout {
        PortLayout::new().event_out("Notes")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        if let Some(out) = buffers.events_output(0) {
            out.push(MidiEvent::note_on(0, 0, 60, 100));
        }
    }
}

/// Test factory: `const`, `const:<value>`, `gain`, `notes`.
pub(crate) fn factory() -> Box<dyn ProcessorFactory> {
    Box::new(|id: &str| -> Result<Box<dyn Processor>, ProcessorError> {
        match id {
            "const" => Ok(Box::new(Constant { value: 1.0 })),
            "gain" => Ok(Box::new(Gain { gain: 1.0 })),
            "notes" => Ok(Box::new(NoteSource)),
            other => match other.strip_prefix("const:").map(str::parse::<f32>) {
                Some(Ok(value)) => Ok(Box::new(Constant { value })),
                _ => Err(ProcessorError::UnknownPlugin(other.to_string())),
            },
        }
    })
}

/// Renders one stereo block with silent inputs.
pub(crate) fn render_stereo(handle: &RenderHandle, num_samples: usize) -> [Vec<f32>; 2] {
    let mut left = vec![0.0f32; num_samples];
    let mut right = vec![0.0f32; num_samples];
    let mut midi_out = EventBuffer::with_capacity(64);
    handle.render_block(&[], &mut [&mut left, &mut right], &[], &mut midi_out, num_samples);
    [left, right]
}
