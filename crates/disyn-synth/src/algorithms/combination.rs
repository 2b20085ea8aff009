//! Hybrid generators built from the spectral kernels.
//!
//! | Generator | Param 1 | Param 2 | Param 3 |
//! |-----------|---------|---------|---------|
//! | [`HybridFormant`] (C1) | index 0.01..3 | unused | formant spacing |
//! | [`Cascaded`] (C2) | DSF decay 0.5..0.95 | asymmetry 0.5..2 | shaper mix |
//! | [`ParallelBank`] (C3) | index 0.01..8 | unused | ModFM/PAF mix |
//! | [`Feedback`] (C4) | index 0.01..8 | feedback 0..0.95 | drive |
//! | [`Morphing`] (C5) | morph position | character | morph curve |
//! | [`Inharmonic`] (C6) | DSF decay 0.5..0.9 | formant shift 5..50 Hz | formant mix |
//! | [`AdaptiveFilter`] (C7) | cutoff | resonance | dry sine mix |

use core::f32::consts::{PI, TAU};

use disyn_core::{Smoother, clamp_abs, clamp01, expo_map, lerp};
use libm::{cosf, powf, sinf, tanhf};

use super::kernels::{
    asymmetric_fm, dsf_component, normalize_output, safe_exp, shape_and_slew, step_phase,
};
use super::{Algorithm, AlgorithmContext, AlgorithmOutput, NumericGuards};

const GOLDEN_RATIO: f32 = 1.618_034;

/// Pair of output slew states shared by most hybrids.
#[derive(Debug, Clone, Copy, Default)]
struct OutputSlew {
    primary: Smoother,
    secondary: Smoother,
}

impl OutputSlew {
    fn apply(&mut self, primary: f32, secondary: f32, slew: f32, clip: f32, limit: f32) -> AlgorithmOutput {
        let p = shape_and_slew(primary, &mut self.primary, slew, clip);
        let s = shape_and_slew(secondary, &mut self.secondary, slew, clip);
        normalize_output(p, s, limit)
    }

    fn reset(&mut self) {
        self.primary.reset();
        self.secondary.reset();
    }
}

/// C1: rectified-modulator ModFM plus three fixed formant partials.
#[derive(Debug, Clone)]
pub struct HybridFormant {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    mod_phase: f32,
    formant_phases: [f32; 3],
}

impl HybridFormant {
    const FORMANTS_HZ: [f32; 3] = [800.0, 1200.0, 2400.0];
}

impl Algorithm for HybridFormant {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            mod_phase: 0.0,
            formant_phases: [0.0; 3],
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
        self.formant_phases = [0.0; 3];
    }

    fn process(&mut self, pitch: f32, p1: f32, _p2: f32, p3: f32) -> AlgorithmOutput {
        let index = expo_map(p1, 0.01, 3.0);
        let spacing = 0.8 + clamp01(p3) * 0.4;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.mod_phase = step_phase(self.mod_phase, pitch, self.sample_rate);

        let modulator = sinf(self.mod_phase * TAU);
        let carrier = sinf(self.phase * TAU);
        let base = carrier
            * safe_exp(-index * (modulator.abs() - 1.0), &self.guards)
            * safe_exp(-index, &self.guards)
            * 0.4;

        let mut formants = 0.0;
        for (phase, hz) in self.formant_phases.iter_mut().zip(Self::FORMANTS_HZ) {
            *phase = step_phase(*phase, hz * spacing, self.sample_rate);
            formants += sinf(*phase * TAU) * 0.5;
        }

        let limit = self.guards.output_limit;
        AlgorithmOutput::new(
            clamp_abs((base + formants) * 0.25, limit),
            clamp_abs(base * 0.5, limit),
        )
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// C2: DSF drives an asymmetric FM voice, followed by a `tanh` stage.
#[derive(Debug, Clone)]
pub struct Cascaded {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    carrier_phase: f32,
    out: OutputSlew,
}

impl Algorithm for Cascaded {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            carrier_phase: 0.0,
            out: OutputSlew::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.carrier_phase = 0.0;
        self.out.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let decay = lerp(0.5, 0.95, clamp01(p1));
        let asymmetry = expo_map(p2, 0.5, 2.0);
        let mix = clamp01(p3);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.carrier_phase = step_phase(self.carrier_phase, pitch, self.sample_rate);

        let w = self.phase * TAU;
        let dsf = clamp_abs(dsf_component(w, w, decay, &self.guards) * 0.5, 1.0);
        let fm = asymmetric_fm(2.0, asymmetry, self.carrier_phase * TAU, dsf * PI, &self.guards);
        let shaped = tanhf(fm * 3.0);

        let raw_primary = (dsf * (1.0 - mix) + shaped * mix) * 0.9;
        let raw_secondary = shaped * 0.9;
        self.out.apply(raw_primary, raw_secondary, 0.06, 0.4, 0.9)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// C3: three ModFM voices at different ratios against two formant partials.
#[derive(Debug, Clone)]
pub struct ParallelBank {
    sample_rate: f32,
    guards: NumericGuards,
    carrier_phases: [f32; 3],
    mod_phases: [f32; 3],
    formant_phases: [f32; 2],
}

impl ParallelBank {
    const RATIOS: [f32; 3] = [1.0, 1.5, 1.333];
    const FORMANTS_HZ: [f32; 2] = [800.0, 2400.0];
}

impl Algorithm for ParallelBank {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            carrier_phases: [0.0; 3],
            mod_phases: [0.0; 3],
            formant_phases: [0.0; 2],
        }
    }

    fn reset(&mut self) {
        self.carrier_phases = [0.0; 3];
        self.mod_phases = [0.0; 3];
        self.formant_phases = [0.0; 2];
    }

    fn process(&mut self, pitch: f32, p1: f32, _p2: f32, p3: f32) -> AlgorithmOutput {
        let index = expo_map(p1, 0.01, 8.0);
        let balance = clamp01(p3);

        let mut modfm = 0.0;
        for i in 0..3 {
            self.carrier_phases[i] = step_phase(self.carrier_phases[i], pitch, self.sample_rate);
            self.mod_phases[i] =
                step_phase(self.mod_phases[i], pitch * Self::RATIOS[i], self.sample_rate);
            let modulator = cosf(self.mod_phases[i] * TAU);
            modfm += cosf(self.carrier_phases[i] * TAU)
                * safe_exp(index * (modulator - 1.0), &self.guards);
        }
        modfm /= 3.0;

        let mut paf = 0.0;
        for (phase, hz) in self.formant_phases.iter_mut().zip(Self::FORMANTS_HZ) {
            *phase = step_phase(*phase, hz, self.sample_rate);
            paf += sinf(*phase * TAU) * 0.5;
        }
        paf /= 2.0;

        AlgorithmOutput::new(
            (modfm * (1.0 - balance) + paf * balance) * 0.5,
            (paf - modfm) * 0.5,
        )
    }

    fn phase(&self) -> Option<f32> {
        Some(self.carrier_phases[0])
    }
}

/// C4: ModFM whose previous output bends its own frequency.
///
/// ```text
/// freq' = freq + feedback · prev · freq
/// ```
///
/// `prev` is the unshaped ModFM sample, at most 1 in magnitude, and
/// feedback tops out at 0.95, so `freq'` stays within `(0.05, 1.95)·freq`.
#[derive(Debug, Clone)]
pub struct Feedback {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    mod_phase: f32,
    feedback_sample: f32,
    out: OutputSlew,
}

impl Feedback {
    /// Largest feedback gain.
    pub const MAX_FEEDBACK: f32 = 0.95;
}

impl Algorithm for Feedback {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            mod_phase: 0.0,
            feedback_sample: 0.0,
            out: OutputSlew::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
        self.feedback_sample = 0.0;
        self.out.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let index = expo_map(p1, 0.01, 8.0);
        let feedback = clamp01(p2) * Self::MAX_FEEDBACK;
        let drive = 1.0 + clamp01(p3) * 2.0;

        let freq = pitch + feedback * self.feedback_sample * pitch;
        self.phase = step_phase(self.phase, freq, self.sample_rate);
        self.mod_phase = step_phase(self.mod_phase, freq, self.sample_rate);

        let carrier = cosf(self.phase * TAU);
        let modulator = cosf(self.mod_phase * TAU);
        let modfm = carrier * safe_exp(index * (modulator - 1.0), &self.guards);
        self.feedback_sample = clamp_abs(modfm, 1.0);

        let raw_primary = tanhf(modfm * drive) * 0.6;
        let raw_secondary = carrier * 0.4;
        self.out.apply(raw_primary, raw_secondary, 0.06, 0.5, 0.8)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// C5: crossfades DSF → ModFM → PAF along a curved morph axis.
#[derive(Debug, Clone)]
pub struct Morphing {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    mod_phase: f32,
    formant_phase: f32,
    out: OutputSlew,
}

impl Algorithm for Morphing {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            mod_phase: 0.0,
            formant_phase: 0.0,
            out: OutputSlew::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
        self.formant_phase = 0.0;
        self.out.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let curve = 0.5 + clamp01(p3) * 1.5;
        let position = powf(clamp01(p1), curve);
        let character = clamp01(p2);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.mod_phase = step_phase(self.mod_phase, pitch, self.sample_rate);
        self.formant_phase = step_phase(self.formant_phase, pitch * 2.0, self.sample_rate);

        let w = self.phase * TAU;
        let index = expo_map(character, 0.01, 8.0);
        let modulator = cosf(self.mod_phase * TAU);
        let modfm = cosf(w) * safe_exp(index * (modulator - 1.0), &self.guards);

        let (raw, secondary) = if position < 0.5 {
            let alpha = position * 2.0;
            let decay = 0.5 + character * 0.4;
            let dsf = dsf_component(w, TAU * 1.5, decay, &self.guards);
            (dsf * (1.0 - alpha) + modfm * alpha, modfm)
        } else {
            let alpha = (position - 0.5) * 2.0;
            let paf = sinf(self.formant_phase * TAU) * 0.5;
            (modfm * (1.0 - alpha) + paf * alpha, paf)
        };

        self.out.apply(raw * 0.8, secondary * 0.8, 0.06, 0.4, 0.9)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// C6: DSF with golden-ratio partial spacing plus a shifted formant partial.
#[derive(Debug, Clone)]
pub struct Inharmonic {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    partial_phase: f32,
    formant_phase: f32,
    out: OutputSlew,
}

impl Algorithm for Inharmonic {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            partial_phase: 0.0,
            formant_phase: 0.0,
            out: OutputSlew::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.partial_phase = 0.0;
        self.formant_phase = 0.0;
        self.out.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let decay = lerp(0.5, 0.9, clamp01(p1));
        let shift = expo_map(p2, 5.0, 50.0);
        let mix = clamp01(p3) * 0.5;

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.partial_phase = step_phase(self.partial_phase, pitch * GOLDEN_RATIO, self.sample_rate);
        self.formant_phase = step_phase(self.formant_phase, pitch * 2.0 + shift, self.sample_rate);

        let dsf = clamp_abs(
            dsf_component(self.phase * TAU, self.partial_phase * TAU, decay, &self.guards) * 0.5,
            1.0,
        );
        let paf = sinf(self.formant_phase * TAU) * 0.5;

        let raw_primary = dsf * (1.0 - mix) + paf * mix;
        let raw_secondary = dsf * 0.5;
        self.out.apply(raw_primary, raw_secondary, 0.04, 0.9, 0.4)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

/// C7: DSF used as a resonant comb over the fundamental.
///
/// Cutoff moves the partial spacing (`1..3 × pitch`), resonance raises the
/// DSF decay (`0.5..0.8`).
#[derive(Debug, Clone)]
pub struct AdaptiveFilter {
    sample_rate: f32,
    guards: NumericGuards,
    phase: f32,
    partial_phase: f32,
    out: OutputSlew,
}

impl Algorithm for AdaptiveFilter {
    fn new(ctx: AlgorithmContext) -> Self {
        Self {
            sample_rate: ctx.sample_rate,
            guards: ctx.guards,
            phase: 0.0,
            partial_phase: 0.0,
            out: OutputSlew::default(),
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.partial_phase = 0.0;
        self.out.reset();
    }

    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let spacing = 1.0 + clamp01(p1) * 2.0;
        let decay = 0.5 + clamp01(p2) * 0.3;
        let mix = clamp01(p3);

        self.phase = step_phase(self.phase, pitch, self.sample_rate);
        self.partial_phase = step_phase(self.partial_phase, pitch * spacing, self.sample_rate);

        let w = self.phase * TAU;
        let dsf = clamp_abs(
            dsf_component(w, self.partial_phase * TAU, decay, &self.guards),
            1.0,
        );
        let sine = sinf(w) * 0.5;

        let raw_primary = (dsf * (1.0 - mix) + sine * mix) * 0.8;
        let raw_secondary = dsf * 0.8;
        self.out.apply(raw_primary, raw_secondary, 0.06, 0.4, 0.9)
    }

    fn phase(&self) -> Option<f32> {
        Some(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn run<A: Algorithm>(alg: &mut A, pitch: f32, p: [f32; 3], n: usize) -> f32 {
        let mut peak = 0.0f32;
        for _ in 0..n {
            let out = alg.process(pitch, p[0], p[1], p[2]);
            assert!(out.is_finite());
            peak = peak.max(out.peak());
        }
        peak
    }

    #[test]
    fn hybrid_formant_clamped_to_output_limit() {
        let mut alg = HybridFormant::new(AlgorithmContext::new(SR));
        assert!(run(&mut alg, 110.0, [1.0, 0.0, 1.0], 5000) <= 0.5);
    }

    #[test]
    fn cascaded_respects_limit() {
        let mut alg = Cascaded::new(AlgorithmContext::new(SR));
        assert!(run(&mut alg, 330.0, [1.0, 1.0, 1.0], 5000) <= 0.9 + 1e-6);
    }

    #[test]
    fn parallel_bank_channel_ranges() {
        // Primary is a half-scale blend; secondary is half the difference
        // of a unit ModFM mix and a half-scale formant mix.
        for p in [[0.0, 0.5, 0.0], [0.0, 0.5, 0.5], [1.0, 0.5, 1.0], [0.3, 0.0, 0.7]] {
            let mut alg = ParallelBank::new(AlgorithmContext::new(SR));
            let (mut primary, mut secondary) = (0.0f32, 0.0f32);
            for _ in 0..5000 {
                let out = alg.process(220.0, p[0], p[1], p[2]);
                assert!(out.is_finite());
                primary = primary.max(out.primary.abs());
                secondary = secondary.max(out.secondary.abs());
            }
            assert!(primary <= 0.5 + 1e-6, "primary {} at {:?}", primary, p);
            assert!(secondary <= 0.75 + 1e-6, "secondary {} at {:?}", secondary, p);
        }
    }

    #[test]
    fn feedback_full_sweep_bounded() {
        let mut alg = Feedback::new(AlgorithmContext::new(SR));
        for step in 0..=20 {
            let fb = step as f32 / 20.0;
            assert!(run(&mut alg, 440.0, [1.0, fb, 1.0], 2000) <= 0.8 + 1e-6);
        }
    }

    #[test]
    fn feedback_sample_changes_output() {
        let mut dry = Feedback::new(AlgorithmContext::new(SR));
        let mut wet = Feedback::new(AlgorithmContext::new(SR));
        let mut diff = 0.0f32;
        for _ in 0..4000 {
            let a = dry.process(220.0, 0.5, 0.0, 0.5);
            let b = wet.process(220.0, 0.5, 1.0, 0.5);
            diff = diff.max((a.primary - b.primary).abs());
        }
        assert!(diff > 1e-3);
    }

    #[test]
    fn morphing_covers_both_halves() {
        let mut alg = Morphing::new(AlgorithmContext::new(SR));
        assert!(run(&mut alg, 200.0, [0.2, 0.5, 0.0], 3000) <= 0.9 + 1e-6);
        assert!(run(&mut alg, 200.0, [0.9, 0.5, 0.0], 3000) <= 0.9 + 1e-6);
    }

    #[test]
    fn inharmonic_and_filter_limited() {
        let mut c6 = Inharmonic::new(AlgorithmContext::new(SR));
        assert!(run(&mut c6, 150.0, [1.0, 1.0, 1.0], 5000) <= 0.4 + 1e-6);
        let mut c7 = AdaptiveFilter::new(AlgorithmContext::new(SR));
        assert!(run(&mut c7, 150.0, [1.0, 1.0, 0.0], 5000) <= 0.9 + 1e-6);
    }
}
