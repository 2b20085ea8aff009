//! Oscillator dispatcher.
//!
//! [`OscillatorBank`] owns one live instance of every generator, built up
//! front, so switching algorithm never allocates and never pays first-use
//! latency. Dispatch is a `match` on [`AlgorithmKind`]; an index outside the
//! generator range falls back to a plain sine with its own phase.

use core::f32::consts::TAU;

use disyn_core::clamp01;
use libm::sinf;

use crate::algorithms::basic::{Noise, Pulse, Ramp, Sine, Triangle};
use crate::algorithms::chaotic::{Logistic, Lorenz};
use crate::algorithms::combination::{
    AdaptiveFilter, Cascaded, Feedback, HybridFormant, Inharmonic, Morphing, ParallelBank,
};
use crate::algorithms::kernels::step_phase;
use crate::algorithms::novel::{CrossMod, FreqAsymmetry, Multistage, Taylor};
use crate::algorithms::spectral::{
    DirichletPulse, DsfDouble, DsfSingle, ModFm, Paf, TanhSaw, TanhSquare,
};
use crate::algorithms::trajectory::Trajectory;
use crate::algorithms::{Algorithm, AlgorithmContext, AlgorithmKind, AlgorithmOutput};

macro_rules! oscillator_bank {
    ($($kind:ident => $field:ident: $ty:ty),* $(,)?) => {
        /// One instance of every generator plus a fallback sine.
        #[derive(Debug, Clone)]
        pub struct OscillatorBank {
            sample_rate: f32,
            fallback_phase: f32,
            $($field: $ty,)*
        }

        impl OscillatorBank {
            /// Build every generator for `ctx`.
            pub fn new(ctx: AlgorithmContext) -> Self {
                Self {
                    sample_rate: ctx.sample_rate,
                    fallback_phase: 0.0,
                    $($field: <$ty>::new(ctx),)*
                }
            }

            /// Reset every generator and the fallback phase.
            pub fn reset(&mut self) {
                self.fallback_phase = 0.0;
                $(self.$field.reset();)*
            }

            fn dispatch(
                &mut self,
                kind: AlgorithmKind,
                pitch: f32,
                p1: f32,
                p2: f32,
                p3: f32,
            ) -> AlgorithmOutput {
                match kind {
                    $(AlgorithmKind::$kind => self.$field.process(pitch, p1, p2, p3),)*
                }
            }

            /// Main phase of the generator at `index`, if it has one.
            pub fn phase_of(&self, index: usize) -> Option<f32> {
                match AlgorithmKind::from_index(index)? {
                    $(AlgorithmKind::$kind => self.$field.phase(),)*
                }
            }
        }
    };
}

oscillator_bank! {
    DirichletPulse => dirichlet: DirichletPulse,
    DsfSingle => dsf_single: DsfSingle,
    DsfDouble => dsf_double: DsfDouble,
    TanhSquare => tanh_square: TanhSquare,
    TanhSaw => tanh_saw: TanhSaw,
    Paf => paf: Paf,
    ModFm => mod_fm: ModFm,
    HybridFormant => hybrid_formant: HybridFormant,
    Cascaded => cascaded: Cascaded,
    ParallelBank => parallel_bank: ParallelBank,
    Feedback => feedback: Feedback,
    Morphing => morphing: Morphing,
    Inharmonic => inharmonic: Inharmonic,
    AdaptiveFilter => adaptive_filter: AdaptiveFilter,
    Multistage => multistage: Multistage,
    FreqAsymmetry => freq_asymmetry: FreqAsymmetry,
    CrossMod => cross_mod: CrossMod,
    Taylor => taylor: Taylor,
    Trajectory => trajectory: Trajectory,
    Sine => sine: Sine,
    Ramp => ramp: Ramp,
    Triangle => triangle: Triangle,
    Pulse => pulse: Pulse,
    Noise => noise: Noise,
    Logistic => logistic: Logistic,
    Lorenz => lorenz: Lorenz,
}

impl OscillatorBank {
    /// Sample rate the generators were built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// One sample from the generator at `index`.
    ///
    /// Parameters are clamped to `[0, 1]` before dispatch. Out-of-range
    /// indices produce a sine at `pitch` on both channels.
    pub fn process(&mut self, index: usize, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput {
        let (p1, p2, p3) = (clamp01(p1), clamp01(p2), clamp01(p3));
        match AlgorithmKind::from_index(index) {
            Some(kind) => self.dispatch(kind, pitch, p1, p2, p3),
            None => {
                self.fallback_phase = step_phase(self.fallback_phase, pitch, self.sample_rate);
                AlgorithmOutput::mono(sinf(self.fallback_phase * TAU))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    #[test]
    fn out_of_range_index_plays_sine() {
        let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
        // 480 Hz: quarter cycle after 25 samples.
        let mut out = AlgorithmOutput::SILENCE;
        for _ in 0..25 {
            out = bank.process(AlgorithmKind::COUNT + 5, 480.0, 0.5, 0.5, 0.5);
        }
        assert!((out.primary - 1.0).abs() < 1e-3);
        assert_eq!(out.primary, out.secondary);
    }

    #[test]
    fn every_generator_produces_output() {
        let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
        for kind in AlgorithmKind::ALL {
            let mut energy = 0.0;
            for _ in 0..4800 {
                let out = bank.process(kind.index(), 220.0, 0.5, 0.5, 0.5);
                assert!(out.is_finite(), "{:?}", kind);
                energy += out.primary * out.primary;
            }
            assert!(energy > 1e-3, "{:?} is silent", kind);
        }
    }

    #[test]
    fn reset_restores_phases() {
        let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
        for kind in AlgorithmKind::ALL {
            bank.process(kind.index(), 300.0, 0.2, 0.4, 0.6);
        }
        bank.reset();
        for kind in AlgorithmKind::ALL {
            if let Some(phase) = bank.phase_of(kind.index()) {
                assert_eq!(phase, 0.0, "{:?}", kind);
            }
        }
        assert_eq!(bank.phase_of(AlgorithmKind::COUNT), None);
    }

    #[test]
    fn params_are_clamped() {
        let mut a = OscillatorBank::new(AlgorithmContext::new(SR));
        let mut b = OscillatorBank::new(AlgorithmContext::new(SR));
        for _ in 0..256 {
            let wild = a.process(AlgorithmKind::ModFm.index(), 220.0, 7.0, -3.0, f32::NAN);
            let tame = b.process(AlgorithmKind::ModFm.index(), 220.0, 1.0, 0.0, 0.0);
            assert_eq!(wild, tame);
        }
    }
}
