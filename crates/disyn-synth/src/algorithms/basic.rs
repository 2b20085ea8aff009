//! Elementary waveforms.
//!
//! Sine, ramp and triangle are quantized onto `1..=64` levels per polarity
//! by parameter 1, which gives a staircase "bit-crushed" timbre at low
//! settings and a clean wave at the top. [`Pulse`] takes its width from
//! parameter 1 and [`Noise`] is sample-and-hold noise refreshed once per
//! cycle with an adjustable slew.

use core::f32::consts::TAU;

use disyn_core::{Smoother, clamp01};
use libm::sinf;

use super::kernels::{Lcg, quantize_bipolar, step_count, step_phase};
use super::{Algorithm, AlgorithmContext, AlgorithmOutput};

const MAX_STEPS: u32 = 64;
const NOISE_SEED: u32 = 0x6d2b_79f5;

macro_rules! quantized_wave {
    ($(#[$doc:meta])* $name:ident, |$phase:ident| $shape:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            sample_rate: f32,
            phase: f32,
        }

        impl Algorithm for $name {
            fn new(ctx: AlgorithmContext) -> Self {
                Self {
                    sample_rate: ctx.sample_rate,
                    phase: 0.0,
                }
            }

            fn reset(&mut self) {
                self.phase = 0.0;
            }

            fn process(&mut self, pitch: f32, p1: f32, _p2: f32, _p3: f32) -> AlgorithmOutput {
                let steps = step_count(p1, MAX_STEPS);
                self.phase = step_phase(self.phase, pitch, self.sample_rate);
                let $phase = self.phase;
                AlgorithmOutput::mono(quantize_bipolar($shape, steps))
            }

            fn phase(&self) -> Option<f32> {
                Some(self.phase)
            }
        }
    };
}

quantized_wave!(
    /// Quantized sine.
    Sine,
    |phase| sinf(TAU * phase)
);

quantized_wave!(
    /// Quantized rising ramp.
    Ramp,
    |phase| phase * 2.0 - 1.0
);

quantized_wave!(
    /// Quantized triangle, peaking at half phase.
    Triangle,
    |phase| 1.0 - 4.0 * (phase - 0.5).abs()
);

/// Pulse wave with width `0.05..0.95`; the secondary channel is inverted.
#[derive(Debug, Clone)]
pub struct Pulse {
    sample_rate: f32,
    phase: f32,
}

impl Pulse {
    /// Duty cycle for a normalized control.
    pub fn width(p1: f32) -> f32 {
        0.05 + clamp01(p1) * 0.9
    }
}

impl Algorithm for Pulse {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn process(&mut self, pitch: f32, p1: f32, _p2: f32, _p3: f32) -> AlgorithmOutput {
        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        let value = if self.phase < Self::width(p1) { 1.0 } else { -1.0 };
        AlgorithmOutput::new(value, -value)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Sample-and-hold noise.
///
/// A new value is drawn each time the phase wraps. The primary channel is
/// the held value through a slew whose coefficient falls from 1.0 to 0.02
/// as parameter 1 rises; the secondary is the raw held value.
#[derive(Debug, Clone)]
pub struct Noise {
    sample_rate: f32,
    phase: f32,
    held: f32,
    smoothed: Smoother,
    rng: Lcg,
}

impl Algorithm for Noise {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
            held: 0.0,
            smoothed: Smoother::default(),
            rng: Lcg::new(NOISE_SEED),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.held = 0.0;
        self.smoothed.reset();
        self.rng.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, _p2: f32, _p3: f32) -> AlgorithmOutput {
        let slew = 0.02 + (1.0 - clamp01(p1)) * 0.98;
        let last = self.phase;
        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        if self.phase < last {
            self.held = self.rng.next_bipolar();
        }
        let output = self.smoothed.process_with(self.held, slew);
        AlgorithmOutput::new(output, self.held)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}
