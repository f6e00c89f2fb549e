//! MIDI processors.

use patchbay_core::{ParamDescriptor, PortLayout, ProcessBuffers, Processor};

const SEMITONES: ParamDescriptor = ParamDescriptor::new("Semitones", -24.0, 24.0, 0.0);

/// Shifts note-on/off events by a whole number of semitones.
///
/// Notes pushed outside 0..=127 are dropped; every other event passes through
/// unchanged and in order.
#[derive(Debug, Clone, Default)]
pub struct Transpose {
    semitones: i8,
}

impl Transpose {
    /// Transposer with no shift.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor for Transpose {
    fn ports(&self) -> PortLayout {
        PortLayout::new().event_in("MIDI In").event_out("MIDI Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let Some((input, output)) = buffers.event_channel(0) else {
            return;
        };
        for event in input {
            if !(event.is_note_on() || event.is_note_off()) {
                output.push(*event);
                continue;
            }
            let note = i16::from(event.data[1]) + i16::from(self.semitones);
            if let Ok(note @ 0..=127) = u8::try_from(note) {
                let mut moved = *event;
                moved.data[1] = note;
                output.push(moved);
            }
        }
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        (index == 0).then_some(SEMITONES)
    }

    fn get_param(&self, index: usize) -> f32 {
        if index == 0 {
            f32::from(self.semitones)
        } else {
            0.0
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            self.semitones = SEMITONES.clamp(value).round() as i8;
        }
    }
}
