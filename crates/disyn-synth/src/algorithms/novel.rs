//! Experimental generators.
//!
//! | Generator | Param 1 | Param 2 | Param 3 |
//! |-----------|---------|---------|---------|
//! | [`Multistage`] (N1) | tanh drive 0.1..10 | exponent 0.1..1.5 | ring ratio 0.5..2 |
//! | [`FreqAsymmetry`] (N2) | low ratio 0.5..1 | high ratio 1..2 | index |
//! | [`CrossMod`] (N3) | modulator offset | cross depth | mix |
//! | [`Taylor`] (N4) | terms 1..10 | 2nd harmonic terms 1..10 | blend |

use core::f32::consts::TAU;

use disyn_core::{Smoother, clamp01, expo_map, lerp};
use libm::{cosf, powf, roundf, sinf, tanhf};

use super::kernels::{asymmetric_fm, normalize_output, shape_and_slew, step_phase, taylor_sine};
use super::{Algorithm, AlgorithmContext, AlgorithmOutput, NumericGuards};

/// N1: `tanh` drive, power-law stage, then ring modulation.
#[derive(Debug, Clone)]
pub struct Multistage {
    sample_rate: f32,
    phase: f32,
    ring_phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl Algorithm for Multistage {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
            ring_phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.ring_phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let drive = expo_map(p1, 0.1, 10.0);
        let exponent = lerp(0.1, 1.5, clamp01(p2));
        let ring_ratio = 0.5 + clamp01(p3) * 1.5;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.ring_phase = step_phase(self.ring_phase, pitch * ring_ratio, self.sample_rate);

        let stage1 = tanhf(drive * sinf(self.phase * TAU));
        let stage2 = stage1.signum() * powf(stage1.abs(), exponent);
        let stage3 = stage2 * (1.0 + sinf(self.ring_phase * TAU));

        let primary = shape_and_slew(stage3 * 1.2, &mut self.out_primary, 0.06, 0.5);
        let secondary = shape_and_slew(stage2 * 1.2, &mut self.out_secondary, 0.06, 0.5);
        normalize_output(primary, secondary, 1.0)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// N2: asymmetric FM whose asymmetry ratio tracks pitch.
///
/// Below 500 Hz the low ratio applies, above 2 kHz the high ratio, and in
/// between the two are interpolated linearly.
#[derive(Debug, Clone)]
pub struct FreqAsymmetry {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    mod_phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl FreqAsymmetry {
    /// Lower edge of the interpolation band in Hz.
    pub const BAND_LOW_HZ: f32 = 500.0;
    /// Upper edge of the interpolation band in Hz.
    pub const BAND_HIGH_HZ: f32 = 2000.0;

    /// Asymmetry ratio for `pitch` given the two band-edge ratios.
    pub fn ratio_for_pitch(pitch: f32, low: f32, high: f32) -> f32 {
        if pitch <= Self::BAND_LOW_HZ {
            low
        } else if pitch >= Self::BAND_HIGH_HZ {
            high
        } else {
            let alpha = (pitch - Self::BAND_LOW_HZ) / (Self::BAND_HIGH_HZ - Self::BAND_LOW_HZ);
            lerp(low, high, alpha)
        }
    }
}

impl Algorithm for FreqAsymmetry {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            mod_phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let low = 0.5 + clamp01(p1) * 0.5;
        let high = 1.0 + clamp01(p2);
        let index = expo_map(0.2 + clamp01(p3) * 0.8, 0.01, 10.0);
        let ratio = Self::ratio_for_pitch(pitch, low, high);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.mod_phase = step_phase(self.mod_phase, pitch, self.sample_rate);

        let carrier = self.phase * TAU;
        let modulator = self.mod_phase * TAU;
        let raw_primary = asymmetric_fm(index, ratio, carrier, modulator, &self.guards);
        let raw_secondary = cosf(carrier + index * sinf(modulator)) * 0.5;

        let primary = shape_and_slew(raw_primary, &mut self.out_primary, 0.03, 0.7);
        let secondary = shape_and_slew(raw_secondary, &mut self.out_secondary, 0.03, 0.7);
        normalize_output(primary, secondary, self.guards.output_limit)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// N3: a sine phase-modulated by a detuned partner, crossfaded with it.
#[derive(Debug, Clone)]
pub struct CrossMod {
    sample_rate: f32,
    phase: f32,
    mod_phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl Algorithm for CrossMod {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
            mod_phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let offset = clamp01(p1);
        let depth = clamp01(p2) * 2.0;
        let mix = clamp01(p3);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.mod_phase = step_phase(self.mod_phase, pitch * (1.0 + offset), self.sample_rate);

        let modulator = sinf(self.mod_phase * TAU);
        let carrier = sinf(self.phase * TAU + depth * modulator);

        let raw_primary = (carrier * (1.0 - mix) + modulator * mix) * 1.4;
        let raw_secondary = carrier * 1.4;
        let primary = shape_and_slew(raw_primary, &mut self.out_primary, 0.07, 0.3);
        let secondary = shape_and_slew(raw_secondary, &mut self.out_secondary, 0.07, 0.3);
        normalize_output(primary, secondary, 1.2)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// N4: fundamental and second harmonic from truncated Taylor series.
///
/// Few terms give a clipped, bright approximation; ten terms are
/// indistinguishable from `sin`.
#[derive(Debug, Clone)]
pub struct Taylor {
    sample_rate: f32,
    phase: f32,
}

impl Taylor {
    /// Term count (1..=10) for a normalized control.
    pub fn terms(param: f32) -> u32 {
        (roundf(1.0 + clamp01(param) * 9.0) as u32).max(1)
    }
}

impl Algorithm for Taylor {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let blend = clamp01(p3);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        let theta = self.phase * TAU;
        let fundamental = taylor_sine(theta, Self::terms(p1));
        let second = taylor_sine(2.0 * theta, Self::terms(p2));

        let output = fundamental * (1.0 - blend) + second * blend;
        AlgorithmOutput::new(output.clamp(-1.0, 1.0), second.clamp(-1.0, 1.0))
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}
