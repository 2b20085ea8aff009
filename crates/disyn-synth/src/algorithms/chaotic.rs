//! Iterated and chaotic generators.
//!
//! [`Logistic`] steps the logistic map once per pitch period, giving a
//! pitched but never-repeating staircase. [`Lorenz`] integrates the Lorenz
//! system with a time step proportional to pitch, so pitch sets the speed
//! at which the attractor is traced rather than a frequency.

use disyn_core::{Smoother, clamp01, soft_clip};
use libm::ceilf;

use super::kernels::step_phase;
use super::{Algorithm, AlgorithmContext, AlgorithmOutput};

/// Logistic map `x ← r·x·(1 - x)` with `r = 3.9`, advanced on each phase wrap.
#[derive(Debug, Clone)]
pub struct Logistic {
    sample_rate: f32,
    phase: f32,
    x: f32,
    smoothed: Smoother,
}

impl Logistic {
    /// Growth rate; inside the chaotic regime.
    pub const RATE: f32 = 3.9;
    /// Initial map state.
    pub const SEED: f32 = 0.37;

    /// Current map state in `(0, 1)`.
    pub fn state(&self) -> f32 {
        self.x
    }
}

impl Algorithm for Logistic {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
            x: Self::SEED,
            smoothed: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.x = Self::SEED;
        self.smoothed.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, _p2: f32, _p3: f32) -> AlgorithmOutput {
        let slew = 0.02 + (1.0 - clamp01(p1)) * 0.18;
        let last = self.phase;
        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        if self.phase < last {
            // The clamp keeps rounding from pinning the map at 0 or 1.
            self.x = (Self::RATE * self.x * (1.0 - self.x)).clamp(1e-4, 0.9999);
        }
        let raw = self.x * 2.0 - 1.0;
        AlgorithmOutput::new(self.smoothed.process_with(raw, slew), raw)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Lorenz attractor (`σ = 10`, `ρ = 28`, `β = 8/3`), integrated with
/// forward Euler.
///
/// The per-sample time step is `pitch / sample_rate` clamped to
/// `[1e-4, 0.05]` and split into sub-steps of at most [`Lorenz::MAX_SUBSTEP`],
/// since a single Euler step above roughly 0.02 spirals off the attractor.
/// Should the state still go non-finite or leave the attractor's
/// neighbourhood it restarts from the seed point.
#[derive(Debug, Clone)]
pub struct Lorenz {
    sample_rate: f32,
    x: f32,
    y: f32,
    z: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl Lorenz {
    /// Smallest per-sample time step.
    pub const MIN_DT: f32 = 1e-4;
    /// Largest per-sample time step.
    pub const MAX_DT: f32 = 0.05;
    /// Largest single Euler step.
    pub const MAX_SUBSTEP: f32 = 0.0125;

    const SIGMA: f32 = 10.0;
    const RHO: f32 = 28.0;
    const BETA: f32 = 8.0 / 3.0;
    const ESCAPE: f32 = 1e3;
    const OUTPUT_SCALE: f32 = 0.05;

    /// Time step covered by one sample at `pitch`.
    pub fn time_step(pitch: f32, sample_rate: f32) -> f32 {
        let dt = pitch / sample_rate;
        if dt.is_nan() {
            Self::MIN_DT
        } else {
            dt.clamp(Self::MIN_DT, Self::MAX_DT)
        }
    }

    /// Current `(x, y, z)` state.
    pub fn state(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    fn seed(&mut self) {
        self.x = 0.1;
        self.y = 0.0;
        self.z = 0.0;
    }

    fn integrate(&mut self, dt: f32) {
        let steps = ceilf(dt / Self::MAX_SUBSTEP).max(1.0);
        let h = dt / steps;
        for _ in 0..steps as u32 {
            let dx = Self::SIGMA * (self.y - self.x);
            let dy = self.x * (Self::RHO - self.z) - self.y;
            let dz = self.x * self.y - Self::BETA * self.z;
            self.x += dx * h;
            self.y += dy * h;
            self.z += dz * h;
        }

        let escaped = !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite())
            || self.x.abs() > Self::ESCAPE
            || self.y.abs() > Self::ESCAPE
            || self.z.abs() > Self::ESCAPE;
        if escaped {
            self.seed();
        }
    }
}

impl Algorithm for Lorenz {
    fn new(ctx: AlgorithmContext) -> Self {
        let mut alg = Self {
            sample_rate: ctx.sample_rate,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        };
        alg.seed();
        alg
    }

    fn reset(&mut self) {
        self.seed();
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, _p2: f32, _p3: f32) -> AlgorithmOutput {
        let slew = 0.01 + (1.0 - clamp01(p1)) * 0.19;
        self.integrate(Self::time_step(pitch, self.sample_rate));

        let primary = soft_clip(self.x * Self::OUTPUT_SCALE);
        let secondary = soft_clip(self.y * Self::OUTPUT_SCALE);
        AlgorithmOutput::new(
            self.out_primary.process_with(primary, slew),
            self.out_secondary.process_with(secondary, slew),
        )
    }
}
