//! Schroeder allpass for reverb diffusion.

use crate::DelayLine;
use crate::flush_denormal;

/// Schroeder allpass filter.
///
/// ```text
/// output      = -input + delayed
/// delay_input = input + delayed * feedback
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: DelayLine,
    feedback: f32,
}

impl AllpassFilter {
    /// Create an allpass with the given delay length in samples.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            feedback: 0.5,
        }
    }

    /// Set the feedback coefficient, clamped to `[-0.99, 0.99]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.front();
        self.delay
            .push(flush_denormal(input + delayed * self.feedback));
        -input + delayed
    }

    /// Clear delay memory.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}
