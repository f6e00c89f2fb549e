//! One-pole parameter smoothing.
//!
//! Parameter changes arrive once per block from the mutation thread; stepping
//! a gain by that much in one sample clicks. [`SmoothedParam`] glides toward
//! its target with an exponential time constant instead.

/// Default smoothing time for gains and levels.
pub const DEFAULT_SMOOTHING_MS: f32 = 10.0;

/// Exponentially smoothed parameter value.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Parameter at `initial`, changing instantly until a sample rate is set.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 0.0,
            smoothing_time_ms: DEFAULT_SMOOTHING_MS,
        }
    }

    /// Sets the value to glide toward.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jumps straight to `value`.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Updates the sample rate and recomputes the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// True once the value is within 1e-6 of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Skips the remaining glide.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    // coeff = 1 - exp(-1 / (tau * sample_rate)), tau in seconds.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - (-1.0 / samples).exp();
        }
    }
}
