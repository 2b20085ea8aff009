//! Shared math for the synthesis algorithms.
//!
//! Everything here is a pure function of its arguments, except
//! [`shape_and_slew`] which advances the caller's [`Smoother`].

use core::f32::consts::{PI, TAU};

use disyn_core::{Smoother, clamp01, soft_clip};
use libm::{cosf, expf, floorf, roundf, sinf, sqrtf};

use super::{AlgorithmOutput, NumericGuards};

/// Advance a normalized phase by `freq / sample_rate` and wrap into `[0, 1)`.
///
/// # Example
///
/// ```rust
/// use disyn_synth::algorithms::kernels::step_phase;
///
/// let p = step_phase(0.75, 11025.0, 44100.0);
/// assert_eq!(p, 0.0);
/// ```
#[inline]
pub fn step_phase(phase: f32, freq: f32, sample_rate: f32) -> f32 {
    let next = phase + freq / sample_rate;
    let wrapped = next - floorf(next);
    // `next - floor(next)` rounds up to 1.0 for tiny negative inputs.
    if wrapped >= 1.0 || wrapped.is_nan() {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle into `[-π, π]`.
#[inline]
pub fn wrap_angle(x: f32) -> f32 {
    x - TAU * floorf((x + PI) / TAU)
}

/// `exp(x)` with `x` clamped to `±guards.exp_clamp`.
#[inline]
pub fn safe_exp(x: f32, guards: &NumericGuards) -> f32 {
    expf(x.clamp(-guards.exp_clamp, guards.exp_clamp))
}

/// Blend between `value` and `tanh(value)` by `amount` in `[0, 1]`.
#[inline]
pub fn soft_clip_blend(value: f32, amount: f32) -> f32 {
    value + (soft_clip(value) - value) * clamp01(amount)
}

/// Partial soft clip followed by a one-pole slew.
#[inline]
pub fn shape_and_slew(value: f32, state: &mut Smoother, slew: f32, clip: f32) -> f32 {
    state.process_with(soft_clip_blend(value, clip), slew)
}

/// One closed-form DSF term: a band-limited series of partials at
/// `w + k·t` with amplitudes `decay^k`, normalized by `sqrt(1 - decay²)`.
///
/// The denominator `1 - 2·decay·cos t + decay²` is floored at
/// `guards.dsf_denominator_floor`.
#[inline]
pub fn dsf_component(w: f32, t: f32, decay: f32, guards: &NumericGuards) -> f32 {
    let decay = decay.clamp(0.0, 0.999);
    let denominator =
        (1.0 - 2.0 * decay * cosf(t) + decay * decay).max(guards.dsf_denominator_floor);
    let numerator = sinf(w) - decay * sinf(w - t);
    (numerator / denominator) * sqrtf(1.0 - decay * decay)
}

/// Asymmetric FM voice.
///
/// `k` is the modulation index and `r` the asymmetry ratio; `r = 1` is
/// ordinary phase modulation. Angles are in radians. The asymmetry gain
/// `exp(k·(r - 1/r)·cos(mod)/2)` uses [`safe_exp`] and is capped at
/// `guards.asymmetry_max_gain`, so the result never exceeds
/// `0.5 · asymmetry_max_gain` in magnitude.
#[inline]
pub fn asymmetric_fm(k: f32, r: f32, carrier: f32, modulator: f32, guards: &NumericGuards) -> f32 {
    let r = r.max(1e-3);
    let asymmetry =
        safe_exp(k * (r - 1.0 / r) * cosf(modulator) * 0.5, guards).min(guards.asymmetry_max_gain);
    cosf(carrier + k * sinf(modulator)) * asymmetry * 0.5
}

/// Truncated Taylor series for `sin(x)` with `terms` terms (at least one),
/// evaluated on the wrapped angle and clamped to `±1.5`.
#[inline]
pub fn taylor_sine(x: f32, terms: u32) -> f32 {
    let wrapped = wrap_angle(x);
    let x2 = wrapped * wrapped;
    let mut term = wrapped;
    let mut sum = 0.0;
    for n in 0..terms.max(1) {
        sum += term;
        let denom = ((2 * n + 2) * (2 * n + 3)) as f32;
        term *= -x2 / denom;
    }
    sum.clamp(-1.5, 1.5)
}

/// Quantize a bipolar value onto `steps` levels per polarity.
#[inline]
pub fn quantize_bipolar(value: f32, steps: u32) -> f32 {
    let steps = steps.max(1) as f32;
    (roundf(value * steps) / steps).clamp(-1.0, 1.0)
}

/// Map a normalized control onto `1..=max` integer steps.
#[inline]
pub fn step_count(param: f32, max: u32) -> u32 {
    1 + roundf(clamp01(param) * (max - 1) as f32) as u32
}

/// Scale both channels so the larger magnitude is at most `limit`.
#[inline]
pub fn normalize_output(primary: f32, secondary: f32, limit: f32) -> AlgorithmOutput {
    let max_abs = primary.abs().max(secondary.abs());
    if max_abs > limit && max_abs > 0.0 {
        let scale = limit / max_abs;
        AlgorithmOutput::new(primary * scale, secondary * scale)
    } else {
        AlgorithmOutput::new(primary, secondary)
    }
}

/// Deterministic 32-bit LCG (Numerical Recipes constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
    seed: u32,
}

impl Lcg {
    /// Create a generator with the given seed.
    pub const fn new(seed: u32) -> Self {
        Self { state: seed, seed }
    }

    /// Next value in `[0, 1)` using the top 24 bits of state.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((self.state >> 8) & 0x00FF_FFFF) as f32 / 16_777_216.0
    }

    /// Next value in `[-1, 1]`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((self.state >> 8) & 0x00FF_FFFF) as f32 / 8_388_607.5 - 1.0
    }

    /// Restore the original seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }
}
