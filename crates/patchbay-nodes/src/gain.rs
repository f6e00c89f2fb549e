//! Level processors: stereo gain and a two-bus stereo mixer.

use patchbay_core::{ParamDescriptor, PortLayout, ProcessBuffers, Processor};

use crate::smoothed::SmoothedParam;

const GAIN: ParamDescriptor = ParamDescriptor::new("Gain", 0.0, 4.0, 1.0);

/// Stereo gain.
///
/// Ports: audio in L/R (0, 1), control in "Gain" (2, default 1.0), audio out
/// L/R (3, 4). The applied gain is the parameter times the control input,
/// smoothed per sample.
#[derive(Debug, Clone)]
pub struct Gain {
    gain: f32,
    smoothed: SmoothedParam,
}

impl Default for Gain {
    fn default() -> Self {
        Self::new()
    }
}

impl Gain {
    /// Unity gain.
    pub fn new() -> Self {
        Self {
            gain: GAIN.default,
            smoothed: SmoothedParam::new(GAIN.default),
        }
    }
}

impl Processor for Gain {
    fn ports(&self) -> PortLayout {
        PortLayout::new()
            .audio_in("In L")
            .audio_in("In R")
            .control_in("Gain", 1.0)
            .audio_out("Out L")
            .audio_out("Out R")
    }

    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        self.smoothed.set_sample_rate(sample_rate);
    }

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let modulation = buffers.control_input(0).unwrap_or(1.0);
        self.smoothed.set_target(self.gain * modulation);

        // Both channels follow the same glide.
        let start = self.smoothed.clone();
        for ch in 0..2 {
            let mut glide = start.clone();
            if let Some((input, output)) = buffers.audio_channel(ch) {
                for (o, i) in output.iter_mut().zip(input) {
                    *o = i * glide.advance();
                }
                self.smoothed = glide;
            }
        }
    }

    fn reset(&mut self) {
        self.smoothed.snap_to_target();
    }

    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        (index == 0).then_some(GAIN)
    }

    fn get_param(&self, index: usize) -> f32 {
        if index == 0 { self.gain } else { 0.0 }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            self.gain = GAIN.clamp(value);
        }
    }
}

const LEVEL_1: ParamDescriptor = ParamDescriptor::new("Level 1", 0.0, 2.0, 1.0);
const LEVEL_2: ParamDescriptor = ParamDescriptor::new("Level 2", 0.0, 2.0, 1.0);

/// Sums two stereo buses into one.
///
/// Ports: audio in 1L, 1R, 2L, 2R (0-3), audio out L/R (4, 5).
#[derive(Debug, Clone)]
pub struct Mixer {
    levels: [f32; 2],
    smoothed: [SmoothedParam; 2],
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    /// Both buses at unity.
    pub fn new() -> Self {
        Self {
            levels: [LEVEL_1.default, LEVEL_2.default],
            smoothed: [
                SmoothedParam::new(LEVEL_1.default),
                SmoothedParam::new(LEVEL_2.default),
            ],
        }
    }
}

impl Processor for Mixer {
    fn ports(&self) -> PortLayout {
        PortLayout::new()
            .audio_in("In 1 L")
            .audio_in("In 1 R")
            .audio_in("In 2 L")
            .audio_in("In 2 R")
            .audio_out("Out L")
            .audio_out("Out R")
    }

    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        for param in &mut self.smoothed {
            param.set_sample_rate(sample_rate);
        }
    }

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        for (bus, param) in self.smoothed.iter_mut().enumerate() {
            param.set_target(self.levels[bus]);
            let start = param.clone();
            for ch in 0..2 {
                let mut glide = start.clone();
                if let Some((input, output)) = buffers.audio_route(bus * 2 + ch, ch) {
                    for (o, i) in output.iter_mut().zip(input) {
                        *o += i * glide.advance();
                    }
                    *param = glide;
                }
            }
        }
    }

    fn reset(&mut self) {
        for param in &mut self.smoothed {
            param.snap_to_target();
        }
    }

    fn param_count(&self) -> usize {
        2
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(LEVEL_1),
            1 => Some(LEVEL_2),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        self.levels.get(index).copied().unwrap_or(0.0)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        let descriptor = match index {
            0 => LEVEL_1,
            1 => LEVEL_2,
            _ => return,
        };
        self.levels[index] = descriptor.clamp(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::EventBuffer;

    fn run(
        processor: &mut dyn Processor,
        audio_in: &[Vec<f32>],
        audio_out: &mut [Vec<f32>],
        control_in: &[f32],
    ) {
        let n = audio_out[0].len();
        let mut buffers = ProcessBuffers::new(
            audio_in,
            audio_out,
            &[],
            &mut [] as &mut [EventBuffer],
            control_in,
            &mut [],
            n,
        );
        processor.process(&mut buffers);
    }

    #[test]
    fn gain_multiplies_by_param_and_control() {
        let mut gain = Gain::new();
        gain.set_param(0, 2.0);
        let input = vec![vec![0.5; 32], vec![-0.5; 32]];
        let mut output = vec![vec![0.0; 32]; 2];
        run(&mut gain, &input, &mut output, &[0.5]);
        assert!(output[0].iter().all(|s| (*s - 0.5).abs() < 1e-6));
        assert!(output[1].iter().all(|s| (*s + 0.5).abs() < 1e-6));
    }

    #[test]
    fn prepared_gain_glides() {
        let mut gain = Gain::new();
        gain.prepare(48000.0, 64);
        gain.set_param(0, 0.0);
        let input = vec![vec![1.0; 64], vec![1.0; 64]];
        let mut output = vec![vec![0.0; 64]; 2];
        run(&mut gain, &input, &mut output, &[1.0]);
        assert!(output[0][0] > 0.9);
        assert!(output[0][63] < output[0][0]);
        assert_eq!(output[0], output[1]);
    }

    #[test]
    fn mixer_sums_buses_with_levels() {
        let mut mixer = Mixer::new();
        mixer.set_param(1, 0.5);
        let input = vec![vec![1.0; 16], vec![0.0; 16], vec![1.0; 16], vec![2.0; 16]];
        let mut output = vec![vec![0.0; 16]; 2];
        run(&mut mixer, &input, &mut output, &[]);
        assert!(output[0].iter().all(|s| (*s - 1.5).abs() < 1e-6));
        assert!(output[1].iter().all(|s| (*s - 1.0).abs() < 1e-6));
    }

    #[test]
    fn mixer_levels_clamp() {
        let mut mixer = Mixer::new();
        mixer.set_param(0, 9.0);
        mixer.set_param(7, 1.0);
        assert_eq!(mixer.get_param(0), 2.0);
        assert_eq!(mixer.get_param(7), 0.0);
    }
}
