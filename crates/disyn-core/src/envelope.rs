//! Linear attack/release envelope.
//!
//! Attack and release are normalized controls mapped exponentially onto
//! time ranges:
//!
//! | Control | Range |
//! |---------|-------|
//! | attack  | 1 ms .. 1 s |
//! | release | 10 ms .. 3 s |
//!
//! Both controls at zero select drone mode: the level is held at 1 and the
//! envelope never reports itself finished.

use crate::{clamp01, expo_map};

const ATTACK_MIN_S: f32 = 0.001;
const ATTACK_MAX_S: f32 = 1.0;
const RELEASE_MIN_S: f32 = 0.01;
const RELEASE_MAX_S: f32 = 3.0;

/// Envelope segment currently being produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Finished; output is zero.
    #[default]
    Idle,
    /// Gate high, ramping toward (or holding at) full level.
    Attack,
    /// Gate low, ramping toward zero.
    Release,
    /// Both times at zero; level pinned at 1.
    Drone,
}

/// Attack/release envelope with linear segments.
///
/// # Example
///
/// ```rust
/// use disyn_core::ArEnvelope;
///
/// let mut env = ArEnvelope::new(44100.0);
/// env.set_attack(0.0);
/// env.set_release(0.0);
/// env.set_gate(true);
/// assert_eq!(env.process(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct ArEnvelope {
    sample_rate: f32,
    attack_norm: f32,
    release_norm: f32,
    attack_step: f32,
    release_step: f32,
    level: f32,
    gate: bool,
    active: bool,
}

impl Default for ArEnvelope {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl ArEnvelope {
    /// Create an envelope with attack and release at their midpoints.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            sample_rate,
            attack_norm: 0.5,
            release_norm: 0.5,
            attack_step: 0.0,
            release_step: 0.0,
            level: 0.0,
            gate: false,
            active: false,
        };
        env.set_attack(0.5);
        env.set_release(0.5);
        env
    }

    /// Set attack from a normalized control.
    pub fn set_attack(&mut self, value: f32) {
        self.attack_norm = clamp01(value);
        self.attack_step = self.step_for(expo_map(self.attack_norm, ATTACK_MIN_S, ATTACK_MAX_S));
    }

    /// Set release from a normalized control.
    pub fn set_release(&mut self, value: f32) {
        self.release_norm = clamp01(value);
        self.release_step =
            self.step_for(expo_map(self.release_norm, RELEASE_MIN_S, RELEASE_MAX_S));
    }

    /// Attack time in seconds.
    pub fn attack_seconds(&self) -> f32 {
        expo_map(self.attack_norm, ATTACK_MIN_S, ATTACK_MAX_S)
    }

    /// Release time in seconds.
    pub fn release_seconds(&self) -> f32 {
        expo_map(self.release_norm, RELEASE_MIN_S, RELEASE_MAX_S)
    }

    fn step_for(&self, seconds: f32) -> f32 {
        1.0 / (seconds * self.sample_rate).max(1.0)
    }

    /// Raise or lower the gate. Raising it marks the envelope active.
    pub fn set_gate(&mut self, gate: bool) {
        self.gate = gate;
        if gate {
            self.active = true;
        }
    }

    /// Whether drone mode is selected.
    pub fn is_drone(&self) -> bool {
        self.attack_norm <= 0.0 && self.release_norm <= 0.0
    }

    /// Advance one sample and return the level in `[0, 1]`.
    #[inline]
    pub fn process(&mut self) -> f32 {
        if self.is_drone() {
            self.level = 1.0;
            self.active = true;
            return self.level;
        }

        if self.gate {
            self.level = (self.level + self.attack_step).min(1.0);
        } else {
            self.level -= self.release_step;
            if self.level <= 0.0 {
                self.level = 0.0;
                self.active = false;
            }
        }
        self.level
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// False once a release has reached zero.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current segment.
    pub fn state(&self) -> EnvelopeState {
        if self.is_drone() {
            EnvelopeState::Drone
        } else if !self.active {
            EnvelopeState::Idle
        } else if self.gate {
            EnvelopeState::Attack
        } else {
            EnvelopeState::Release
        }
    }

    /// Zero the level and mark active, ready for a fresh attack.
    pub fn reset(&mut self) {
        self.level = 0.0;
        self.active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_reaches_full_level_in_attack_time() {
        let sr = 1000.0;
        let mut env = ArEnvelope::new(sr);
        env.set_attack(0.0); // 1 ms -> clamps to one-sample step
        env.set_release(0.5);
        env.reset();
        env.set_gate(true);
        assert_eq!(env.process(), 1.0);
    }

    #[test]
    fn attack_is_linear() {
        let mut env = ArEnvelope::new(1000.0);
        env.set_attack(1.0); // 1 s = 1000 samples
        env.reset();
        env.set_gate(true);
        let a = env.process();
        let b = env.process();
        assert!((a - 0.001).abs() < 1e-6);
        assert!((b - 0.002).abs() < 1e-6);
    }

    #[test]
    fn release_reaches_zero_and_goes_idle() {
        let mut env = ArEnvelope::new(1000.0);
        env.set_attack(0.0);
        env.set_release(0.0001); // ~10 ms = 10 samples
        env.reset();
        env.set_gate(true);
        env.process();
        env.set_gate(false);
        assert_eq!(env.state(), EnvelopeState::Release);
        let mut samples = 0;
        while env.is_active() && samples < 100 {
            env.process();
            samples += 1;
        }
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert!((9..=12).contains(&samples), "released in {} samples", samples);
    }

    #[test]
    fn drone_holds_full_level() {
        let mut env = ArEnvelope::new(44100.0);
        env.set_attack(0.0);
        env.set_release(0.0);
        env.set_gate(false);
        for _ in 0..100 {
            assert_eq!(env.process(), 1.0);
        }
        assert!(env.is_active());
        assert_eq!(env.state(), EnvelopeState::Drone);
    }

    #[test]
    fn time_mapping_endpoints() {
        let mut env = ArEnvelope::new(44100.0);
        env.set_attack(1.0);
        env.set_release(1.0);
        assert!((env.attack_seconds() - 1.0).abs() < 1e-4);
        assert!((env.release_seconds() - 3.0).abs() < 1e-3);
        env.set_attack(-1.0);
        assert!((env.attack_seconds() - 0.001).abs() < 1e-6);
    }
}
