//! First-order exponential follower.
//!
//! ```text
//! y[n] = y[n-1] + coeff * (x[n] - y[n-1])
//! ```
//!
//! With `coeff` in `(0, 1]` this is a one-pole lowpass written in terms of
//! the fraction of the remaining distance covered per step. The synthesis
//! algorithms use it per sample as a slew limiter; the audio task uses it
//! per block to smooth the pitch control.
//!
//! # Usage
//!
//! ```rust
//! use disyn_core::Smoother;
//!
//! let mut slew = Smoother::new(0.5);
//! assert_eq!(slew.process(1.0), 0.5);
//! assert_eq!(slew.process(1.0), 0.75);
//! ```

use crate::flush_denormal;

/// One-pole follower with a directly specified coefficient.
///
/// # Invariants
///
/// - `coeff` is always in `[0, 1]`, so the state never overshoots its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    state: f32,
    coeff: f32,
}

impl Smoother {
    /// Create a follower with the given coefficient and a zero state.
    pub fn new(coeff: f32) -> Self {
        Self {
            state: 0.0,
            coeff: coeff.clamp(0.0, 1.0),
        }
    }

    /// Set the coefficient (clamped to `[0, 1]`).
    #[inline]
    pub fn set_coeff(&mut self, coeff: f32) {
        self.coeff = coeff.clamp(0.0, 1.0);
    }

    /// Current coefficient.
    #[inline]
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// Move toward `target` and return the new state.
    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.state = flush_denormal(self.state + (target - self.state) * self.coeff);
        self.state
    }

    /// Move toward `target` using a one-off coefficient.
    #[inline]
    pub fn process_with(&mut self, target: f32, coeff: f32) -> f32 {
        self.coeff = coeff.clamp(0.0, 1.0);
        self.process(target)
    }

    /// Current state.
    #[inline]
    pub fn value(&self) -> f32 {
        self.state
    }

    /// Force the state to `value`.
    pub fn snap(&mut self, value: f32) {
        self.state = value;
    }

    /// Reset the state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_target() {
        let mut s = Smoother::new(0.1);
        let mut out = 0.0;
        for _ in 0..500 {
            out = s.process(0.8);
        }
        assert!((out - 0.8).abs() < 1e-4);
    }

    #[test]
    fn never_overshoots() {
        let mut s = Smoother::new(0.9);
        for _ in 0..50 {
            let y = s.process(1.0);
            assert!(y <= 1.0);
        }
    }

    #[test]
    fn unity_coeff_is_passthrough() {
        let mut s = Smoother::default();
        assert_eq!(s.process(0.3), 0.3);
        assert_eq!(s.process(-0.7), -0.7);
    }

    #[test]
    fn coefficient_is_clamped() {
        let s = Smoother::new(3.0);
        assert_eq!(s.coeff(), 1.0);
        let s = Smoother::new(-1.0);
        assert_eq!(s.coeff(), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut s = Smoother::new(0.5);
        s.process(1.0);
        s.reset();
        assert_eq!(s.value(), 0.0);
    }
}
