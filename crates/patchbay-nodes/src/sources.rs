//! Signal sources: DC, sine oscillator, constant control value.

use std::f64::consts::TAU;

use patchbay_core::{ParamDescriptor, PortLayout, ProcessBuffers, Processor};

const LEVEL: ParamDescriptor = ParamDescriptor::new("Level", -1.0, 1.0, 1.0);

/// Writes a constant value to a single audio output.
#[derive(Debug, Clone)]
pub struct Constant {
    level: f32,
}

impl Default for Constant {
    fn default() -> Self {
        Self::new()
    }
}

impl Constant {
    /// DC source at the default level (1.0).
    pub fn new() -> Self {
        Self {
            level: LEVEL.default,
        }
    }
}

impl Processor for Constant {
    fn ports(&self) -> PortLayout {
        PortLayout::new().audio_out("Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        if let Some(out) = buffers.audio_output(0) {
            out.fill(self.level);
        }
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        (index == 0).then_some(LEVEL)
    }

    fn get_param(&self, index: usize) -> f32 {
        if index == 0 { self.level } else { 0.0 }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            self.level = LEVEL.clamp(value);
        }
    }
}

const FREQUENCY: ParamDescriptor = ParamDescriptor::new("Frequency", 20.0, 20000.0, 440.0);
const AMPLITUDE: ParamDescriptor = ParamDescriptor::new("Level", 0.0, 1.0, 0.5);

/// Sine oscillator with a mono audio output.
///
/// Phase is accumulated in `f64` so long renders stay in tune.
#[derive(Debug, Clone)]
pub struct Sine {
    frequency: f32,
    level: f32,
    phase: f64,
    sample_rate: f64,
}

impl Default for Sine {
    fn default() -> Self {
        Self::new()
    }
}

impl Sine {
    /// 440 Hz at half scale.
    pub fn new() -> Self {
        Self {
            frequency: FREQUENCY.default,
            level: AMPLITUDE.default,
            phase: 0.0,
            sample_rate: 48000.0,
        }
    }
}

impl Processor for Sine {
    fn ports(&self) -> PortLayout {
        PortLayout::new().audio_out("Out")
    }

    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        self.sample_rate = f64::from(sample_rate);
    }

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let step = f64::from(self.frequency) / self.sample_rate;
        let level = self.level;
        let Some(out) = buffers.audio_output(0) else {
            return;
        };
        for sample in out.iter_mut() {
            *sample = (self.phase * TAU).sin() as f32 * level;
            self.phase = (self.phase + step).fract();
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn param_count(&self) -> usize {
        2
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(FREQUENCY),
            1 => Some(AMPLITUDE),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.frequency,
            1 => self.level,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.frequency = FREQUENCY.clamp(value),
            1 => self.level = AMPLITUDE.clamp(value),
            _ => {}
        }
    }
}

const VALUE: ParamDescriptor = ParamDescriptor::new("Value", -10.0, 10.0, 1.0);

/// Publishes its parameter on a control output every block.
#[derive(Debug, Clone)]
pub struct Control {
    value: f32,
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}

impl Control {
    /// Control source at 1.0.
    pub fn new() -> Self {
        Self {
            value: VALUE.default,
        }
    }
}

impl Processor for Control {
    fn ports(&self) -> PortLayout {
        PortLayout::new().control_out("Value")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        buffers.set_control_output(0, self.value);
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        (index == 0).then_some(VALUE)
    }

    fn get_param(&self, index: usize) -> f32 {
        if index == 0 { self.value } else { 0.0 }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            self.value = VALUE.clamp(value);
        }
    }
}
