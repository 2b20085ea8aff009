//! Closed-form spectral generators.
//!
//! | Generator | Param 1 | Param 2 | Param 3 |
//! |-----------|---------|---------|---------|
//! | [`DirichletPulse`] | harmonics 1..64 | tilt -3..15 dB | shape |
//! | [`DsfSingle`] | decay 0..0.98 | ratio 0.5..4 | sine mix |
//! | [`DsfDouble`] | decay 0..0.96 | ratio 0.5..4.5 | balance |
//! | [`TanhSquare`] | drive 0.05..5 | trim 0.2..1.2 | bias |
//! | [`TanhSaw`] | drive 0.05..4.5 | blend | edge |
//! | [`Paf`] | formant ratio 0.5..6 | bandwidth 50..3000 Hz | bell depth |
//! | [`ModFm`] | index 0.01..8 | ratio 0.25..6 | modulator feedback |

use core::f32::consts::TAU;

use disyn_core::{Smoother, clamp_abs, clamp01, db_to_linear, expo_map, lerp};
use libm::{cosf, roundf, sinf, tanhf};

use super::kernels::{dsf_component, normalize_output, safe_exp, shape_and_slew, step_phase};
use super::{Algorithm, AlgorithmContext, AlgorithmOutput, NumericGuards};

/// Band-limited pulse from the Dirichlet kernel.
///
/// ```text
/// value = sin((2h + 1)·θ/2) / sin(θ/2) - 1
/// ```
///
/// The sum of `h` cosine harmonics, doubled. Near `θ = 0` the denominator is
/// replaced by a signed floor instead of dividing by zero. With `h = 1` the
/// kernel reduces to `2·cos θ`.
///
/// The tilted kernel is clamped to `±1`, soft-clipped and slewed, and the
/// pair is limited to `0.4`.
#[derive(Debug, Clone)]
pub struct DirichletPulse {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl DirichletPulse {
    /// Harmonic count for a normalized control.
    pub fn harmonics(p1: f32) -> u32 {
        (roundf(1.0 + clamp01(p1) * 63.0) as u32).max(1)
    }

    /// Spectral tilt in dB for a normalized control.
    pub fn tilt_db(p2: f32) -> f32 {
        lerp(-3.0, 15.0, clamp01(p2))
    }
}

impl Algorithm for DirichletPulse {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let harmonics = Self::harmonics(p1);
        let tilt = db_to_linear(Self::tilt_db(p2));
        let shape = clamp01(p3);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        let theta = self.phase * TAU;

        let numerator = sinf((2.0 * harmonics as f32 + 1.0) * theta * 0.5);
        let mut denominator = sinf(theta * 0.5);
        let floor = self.guards.dirichlet_denominator_floor;
        if denominator.abs() < floor {
            denominator = if denominator < 0.0 { -floor } else { floor };
        }
        let value = numerator / denominator - 1.0;

        let base = clamp_abs(value / harmonics as f32 * tilt, 1.0);
        let shaped = tanhf(base * (1.0 + shape * 4.0));
        let raw_primary = base * (1.0 - shape) + shaped * shape;

        let primary = shape_and_slew(raw_primary, &mut self.out_primary, 0.05, 0.7);
        let secondary = shape_and_slew(base, &mut self.out_secondary, 0.05, 0.7);
        normalize_output(primary, secondary, 0.4)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Single-sided DSF mixed with its fundamental sine.
#[derive(Debug, Clone)]
pub struct DsfSingle {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    partial_phase: f32,
}

impl Algorithm for DsfSingle {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            partial_phase: 0.0,
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.partial_phase = 0.0;
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let decay = (clamp01(p1) * 0.98).min(0.98);
        let ratio = expo_map(p2, 0.5, 4.0);
        let mix = clamp01(p3);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.partial_phase = step_phase(self.partial_phase, pitch * ratio, self.sample_rate);

        let w = self.phase * TAU;
        let t = self.partial_phase * TAU;
        let dsf = dsf_component(w, t, decay, &self.guards) * 0.5;
        let sine = sinf(w) * 0.5;
        AlgorithmOutput::new(dsf * (1.0 - mix) + sine * mix, dsf)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Sum of a positive- and a negative-frequency DSF sharing one fundamental.
///
/// The negative series places partials at `w - k·t`. Param 3 sets the
/// balance between the two; the secondary output is their difference.
#[derive(Debug, Clone)]
pub struct DsfDouble {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    partial_phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl Algorithm for DsfDouble {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            partial_phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.partial_phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let decay = clamp01(p1) * 0.96;
        let ratio = expo_map(p2, 0.5, 4.5);
        let balance = clamp01(p3) * 2.0 - 1.0;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.partial_phase = step_phase(self.partial_phase, pitch * ratio, self.sample_rate);

        let w = self.phase * TAU;
        let t = self.partial_phase * TAU;
        let positive = dsf_component(w, t, decay, &self.guards);
        let negative = dsf_component(w, -t, decay, &self.guards);

        let pos_weight = 0.5 + balance * 0.5;
        let neg_weight = 0.5 - balance * 0.5;
        let raw_primary = (positive * pos_weight + negative * neg_weight) * 0.5;
        let raw_secondary = (positive - negative) * 0.5;

        let primary = shape_and_slew(raw_primary, &mut self.out_primary, 0.06, 0.7);
        let secondary = shape_and_slew(raw_secondary, &mut self.out_secondary, 0.06, 0.7);
        normalize_output(primary, secondary, 0.6)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Sine driven into `tanh`, with a DC bias on the primary channel.
#[derive(Debug, Clone)]
pub struct TanhSquare {
    sample_rate: f32,
    phase: f32,
}

impl Algorithm for TanhSquare {
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
        let drive = expo_map(p1, 0.05, 5.0);
        let trim = expo_map(p2, 0.2, 1.2);
        let bias = (clamp01(p3) - 0.5) * 0.8;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        let sine = sinf(self.phase * TAU);
        AlgorithmOutput::new(
            tanhf((sine + bias) * drive) * trim,
            tanhf(sine * drive) * trim,
        )
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// `tanh` square with a cosine edge term that skews it toward a saw.
///
/// `saw = square + cos·(1 - square²)·edge` adds energy only on the
/// transitions, where `1 - square²` is non-zero.
#[derive(Debug, Clone)]
pub struct TanhSaw {
    sample_rate: f32,
    phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl Algorithm for TanhSaw {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let drive = expo_map(p1, 0.05, 4.5);
        let blend = clamp01(p2);
        let edge = 0.5 + clamp01(p3) * 1.5;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        let angle = self.phase * TAU;
        let square = tanhf(sinf(angle) * drive);
        let saw = square + cosf(angle) * (1.0 - square * square) * edge;

        let raw = square * (1.0 - blend) + saw * blend;
        let primary = shape_and_slew(tanhf(raw) * 0.7, &mut self.out_primary, 0.08, 0.5);
        let secondary = shape_and_slew(square * 0.7, &mut self.out_secondary, 0.08, 0.5);
        normalize_output(primary, secondary, 0.6)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Phase-aligned formant.
///
/// A carrier at `pitch · ratio` is windowed once per fundamental period by
/// the bell `exp(-g·(1 - cos θ))`, where `g = bandwidth / pitch`. Wider
/// bandwidth gives a narrower bell in time and a broader formant.
#[derive(Debug, Clone)]
pub struct Paf {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    carrier_phase: f32,
    out_primary: Smoother,
    out_secondary: Smoother,
}

impl Algorithm for Paf {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            carrier_phase: 0.0,
            out_primary: Smoother::default(),
            out_secondary: Smoother::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.carrier_phase = 0.0;
        self.out_primary.reset();
        self.out_secondary.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let ratio = expo_map(p1, 0.5, 6.0);
        let bandwidth = expo_map(p2, 50.0, 3000.0);
        let depth = 0.4 + clamp01(p3) * 0.6;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.carrier_phase = step_phase(self.carrier_phase, pitch * ratio, self.sample_rate);

        let g = bandwidth / pitch.max(1.0);
        let bell = safe_exp(-g * (1.0 - cosf(self.phase * TAU)), &self.guards);
        let carrier = sinf(self.carrier_phase * TAU);

        let raw_primary = carrier * ((1.0 - depth) + depth * bell) * 0.5;
        let raw_secondary = carrier * bell * 0.5;
        let primary = shape_and_slew(raw_primary, &mut self.out_primary, 0.35, 0.6);
        let secondary = shape_and_slew(raw_secondary, &mut self.out_secondary, 0.35, 0.6);
        normalize_output(primary, secondary, 0.5)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// Modified FM.
///
/// ```text
/// out = cos(2π·carrier) · exp(index · (modulator - 1))
/// ```
///
/// The exponential term is at most 1, so loudness stays stable as the index
/// grows. Param 3 feeds the modulator's sine back into its own phase.
#[derive(Debug, Clone)]
pub struct ModFm {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    mod_phase: f32,
}

impl Algorithm for ModFm {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            mod_phase: 0.0,
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let index = expo_map(p1, 0.01, 8.0);
        let ratio = expo_map(p2, 0.25, 6.0);
        let feedback = clamp01(p3) * 0.8;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.mod_phase = step_phase(self.mod_phase, pitch * ratio, self.sample_rate);

        let carrier = cosf(self.phase * TAU);
        let mod_angle = self.mod_phase * TAU;
        let modulator = cosf(mod_angle + feedback * sinf(mod_angle));

        AlgorithmOutput::new(
            carrier * safe_exp(index * (modulator - 1.0), &self.guards) * 0.6,
            carrier * modulator * 0.6,
        )
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn ctx() -> AlgorithmContext {
        AlgorithmContext::new(SR)
    }

    #[test]
    fn dirichlet_single_harmonic_tracks_cosine() {
        let mut alg = DirichletPulse::new(ctx());
        let mut phase = 0.0f32;
        let mut correlation = 0.0f32;
        for i in 0..4000 {
            let out = alg.process(220.0, 0.0, 0.5, 0.0);
            phase = step_phase(phase, 220.0, SR);
            if i >= 1000 {
                correlation += out.secondary * cosf(phase * TAU);
            }
        }
        assert!(correlation > 100.0, "correlation {}", correlation);
    }

    #[test]
    fn dirichlet_output_limited_at_corners() {
        for &pitch in &[20.0, 220.0, 3000.0, SR * 0.5] {
            for corner in 0..8 {
                let p1 = (corner & 1) as f32;
                let p2 = ((corner >> 1) & 1) as f32;
                let p3 = ((corner >> 2) & 1) as f32;
                let mut alg = DirichletPulse::new(ctx());
                for _ in 0..4000 {
                    let out = alg.process(pitch, p1, p2, p3);
                    assert!(out.is_finite());
                    assert!(
                        out.primary.abs() <= 0.4 + 1e-6 && out.secondary.abs() <= 0.4 + 1e-6,
                        "pitch {} params ({}, {}, {}): {:?}",
                        pitch,
                        p1,
                        p2,
                        p3,
                        out
                    );
                }
            }
        }
    }

    #[test]
    fn dirichlet_reset_clears_output_slew() {
        let mut fresh = DirichletPulse::new(ctx());
        let mut used = DirichletPulse::new(ctx());
        for _ in 0..300 {
            used.process(330.0, 0.7, 1.0, 0.5);
        }
        used.reset();
        for _ in 0..300 {
            let a = fresh.process(110.0, 0.2, 0.3, 0.9);
            let b = used.process(110.0, 0.2, 0.3, 0.9);
            assert_eq!(a.primary.to_bits(), b.primary.to_bits());
            assert_eq!(a.secondary.to_bits(), b.secondary.to_bits());
        }
    }

    #[test]
    fn dirichlet_harmonic_mapping() {
        assert_eq!(DirichletPulse::harmonics(0.0), 1);
        assert_eq!(DirichletPulse::harmonics(1.0), 64);
        assert!((DirichletPulse::tilt_db(0.0) + 3.0).abs() < 1e-6);
        assert!((DirichletPulse::tilt_db(1.0) - 15.0).abs() < 1e-6);
    }

    #[test]
    fn dirichlet_finite_at_phase_zero() {
        let mut alg = DirichletPulse::new(ctx());
        // Pitch equal to the sample rate keeps the phase pinned at 0.
        for _ in 0..10 {
            assert!(alg.process(SR, 1.0, 1.0, 1.0).is_finite());
        }
    }

    #[test]
    fn dsf_single_zero_decay_full_mix_is_sine() {
        let mut alg = DsfSingle::new(ctx());
        for _ in 0..100 {
            let out = alg.process(440.0, 0.0, 0.5, 1.0);
            let expected = sinf(alg.phase * TAU) * 0.5;
            assert!((out.primary - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn dsf_double_balance_extremes_differ() {
        let mut a = DsfDouble::new(ctx());
        let mut b = DsfDouble::new(ctx());
        let mut diff = 0.0f32;
        for _ in 0..2000 {
            let x = a.process(220.0, 0.8, 0.3, 0.0);
            let y = b.process(220.0, 0.8, 0.3, 1.0);
            diff = diff.max((x.primary - y.primary).abs());
        }
        assert!(diff > 1e-3, "balance should change the output");
    }

    #[test]
    fn tanh_square_saturates_with_drive() {
        let mut alg = TanhSquare::new(ctx());
        let mut peak = 0.0f32;
        for _ in 0..1000 {
            peak = peak.max(alg.process(100.0, 1.0, 1.0, 0.5).primary.abs());
        }
        // tanh(5) * 1.2
        assert!(peak > 1.15 && peak <= 1.2 + 1e-5, "peak {}", peak);
    }

    #[test]
    fn tanh_saw_limited() {
        let mut alg = TanhSaw::new(ctx());
        for _ in 0..5000 {
            assert!(alg.process(330.0, 1.0, 1.0, 1.0).peak() <= 0.6 + 1e-6);
        }
    }

    #[test]
    fn paf_limited() {
        let mut alg = Paf::new(ctx());
        for i in 0..5000 {
            let p = (i % 100) as f32 / 100.0;
            assert!(alg.process(200.0, p, 1.0 - p, p).peak() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn modfm_zero_index_is_carrier() {
        let mut alg = ModFm::new(ctx());
        for _ in 0..200 {
            let out = alg.process(440.0, 0.0, 0.5, 0.0);
            let carrier = cosf(alg.phase * TAU) * 0.6;
            // index 0.01 barely moves the envelope.
            assert!((out.primary - carrier).abs() < 0.02);
        }
    }

    #[test]
    fn modfm_bounded_by_carrier_scale() {
        let mut alg = ModFm::new(ctx());
        for _ in 0..10_000 {
            let out = alg.process(523.0, 1.0, 1.0, 1.0);
            assert!(out.primary.abs() <= 0.6 + 1e-6);
        }
    }
}
