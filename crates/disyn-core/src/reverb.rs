//! One channel of the voice reverb.
//!
//! Freeverb topology: eight parallel damped combs summed into four series
//! allpasses. The voice runs two independent instances, one per output
//! channel; the right channel is built with a small tuning spread so the
//! tails decorrelate.
//!
//! ```text
//! input ─┬─ comb 1 ─┐
//!        ├─ comb 2 ─┤
//!        │   ...    ├─ Σ ─ AP1 ─ AP2 ─ AP3 ─ AP4 ─ wet
//!        └─ comb 8 ─┘
//!
//! output = input + wet · level
//! ```
//!
//! `level = 0` is an exact passthrough, so a dry voice decays to true
//! silence and the engine's auto-stop can fire.

use crate::{AllpassFilter, CombFilter, clamp01, lerp};

const REFERENCE_RATE: f32 = 44100.0;
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Tuning offset (in 44.1 kHz samples) for the second channel.
pub const STEREO_SPREAD: usize = 23;

const INPUT_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const DAMPING: f32 = 0.4;
const ALLPASS_FEEDBACK: f32 = 0.5;
const MIN_FEEDBACK: f32 = 0.7;
const MAX_FEEDBACK: f32 = 0.98;

fn scale_to_rate(samples: usize, sample_rate: f32) -> usize {
    ((samples as f32 * sample_rate / REFERENCE_RATE) as usize).max(1)
}

/// Mono Freeverb-style reverb channel.
///
/// # Example
///
/// ```rust
/// use disyn_core::Reverb;
///
/// let mut reverb = Reverb::new(44100.0);
/// reverb.set_size(0.5);
/// reverb.set_level(0.0);
/// assert_eq!(reverb.process(0.25), 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct Reverb {
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],
    size: f32,
    level: f32,
}

impl Reverb {
    /// Create a reverb channel at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_spread(sample_rate, 0)
    }

    /// Create a channel whose delay tunings are offset by `spread` samples
    /// (44.1 kHz reference, scaled to `sample_rate`).
    pub fn with_spread(sample_rate: f32, spread: usize) -> Self {
        let combs =
            COMB_TUNINGS_44K.map(|n| CombFilter::new(scale_to_rate(n + spread, sample_rate)));
        let allpasses =
            ALLPASS_TUNINGS_44K.map(|n| AllpassFilter::new(scale_to_rate(n + spread, sample_rate)));
        let mut reverb = Self {
            combs,
            allpasses,
            size: 0.0,
            level: 0.0,
        };
        for ap in &mut reverb.allpasses {
            ap.set_feedback(ALLPASS_FEEDBACK);
        }
        reverb.set_size(0.1);
        reverb.set_level(0.1);
        reverb
    }

    /// Room size in `[0, 1]`; maps onto comb feedback.
    pub fn set_size(&mut self, size: f32) {
        self.size = clamp01(size);
        let feedback = lerp(MIN_FEEDBACK, MAX_FEEDBACK, self.size);
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damp(DAMPING);
        }
    }

    /// Current size.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Wet send level in `[0, 1]`.
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp01(level);
    }

    /// Current level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let feed = input * INPUT_GAIN;
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(feed);
        }
        for ap in &mut self.allpasses {
            wet = ap.process(wet);
        }
        input + wet * self.level * WET_SCALE
    }

    /// Clear every delay line.
    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for ap in &mut self.allpasses {
            ap.clear();
        }
    }
}
