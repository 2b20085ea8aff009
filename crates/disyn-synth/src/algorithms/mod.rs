//! Synthesis algorithm library.
//!
//! Every generator is an independent struct that owns its own phase,
//! feedback, smoothing and RNG state and implements [`Algorithm`]. No state
//! is shared between generators; the [`OscillatorBank`](crate::OscillatorBank)
//! owns one of each and dispatches by [`AlgorithmKind`].
//!
//! # Families
//!
//! | Module | Generators |
//! |--------|------------|
//! | [`spectral`] | Dirichlet pulse, DSF single/double, tanh square/saw, PAF, ModFM |
//! | [`combination`] | Seven hybrids built from the spectral kernels (C1..C7) |
//! | [`novel`] | Multistage, asymmetric FM, cross-modulation, Taylor sine (N1..N4) |
//! | [`trajectory`] | Point bouncing inside a regular polygon |
//! | [`basic`] | Quantized sine/ramp/triangle, pulse, sample-and-hold noise |
//! | [`chaotic`] | Logistic map, Lorenz attractor |
//!
//! # Contract
//!
//! - `process` advances exactly one sample and returns two correlated but
//!   distinct channels.
//! - Parameters arrive clamped to `[0, 1]`; each generator remaps them.
//! - Output is finite for finite, in-range input. Near-singular math is
//!   guarded with the thresholds in [`NumericGuards`].
//! - No allocation, O(1) per sample, deterministic after `reset()`.

pub mod basic;
pub mod chaotic;
pub mod combination;
pub mod kernels;
pub mod novel;
pub mod spectral;
pub mod trajectory;

/// One sample of generator output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlgorithmOutput {
    /// Main channel (left).
    pub primary: f32,
    /// Auxiliary channel (right).
    pub secondary: f32,
}

impl AlgorithmOutput {
    /// Both channels at zero.
    pub const SILENCE: Self = Self {
        primary: 0.0,
        secondary: 0.0,
    };

    /// Build from two channels.
    #[inline]
    pub const fn new(primary: f32, secondary: f32) -> Self {
        Self { primary, secondary }
    }

    /// Same value on both channels.
    #[inline]
    pub const fn mono(value: f32) -> Self {
        Self::new(value, value)
    }

    /// True when both channels are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.primary.is_finite() && self.secondary.is_finite()
    }

    /// Larger of the two magnitudes.
    #[inline]
    pub fn peak(&self) -> f32 {
        self.primary.abs().max(self.secondary.abs())
    }
}

/// Numeric guard thresholds.
///
/// These are calibration constants that shape timbre near singular points
/// and can be tuned per build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericGuards {
    /// Minimum magnitude for the Dirichlet kernel's `sin(θ/2)` denominator.
    pub dirichlet_denominator_floor: f32,
    /// Minimum value of the DSF denominator `1 - 2r·cos t + r²`.
    pub dsf_denominator_floor: f32,
    /// Argument clamp applied before exponentiation.
    pub exp_clamp: f32,
    /// Cap on the asymmetric-FM gain term.
    pub asymmetry_max_gain: f32,
    /// Hard limit for generators that clamp to an audio range.
    pub output_limit: f32,
}

impl Default for NumericGuards {
    fn default() -> Self {
        Self {
            dirichlet_denominator_floor: 1e-2,
            dsf_denominator_floor: 1e-2,
            exp_clamp: 4.0,
            asymmetry_max_gain: 1.5,
            output_limit: 0.5,
        }
    }
}

/// Construction context shared by every generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmContext {
    /// Fixed sample rate in Hz.
    pub sample_rate: f32,
    /// Numeric guard thresholds.
    pub guards: NumericGuards,
}

impl AlgorithmContext {
    /// Context with default guards.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            guards: NumericGuards::default(),
        }
    }

    /// Replace the guards.
    pub fn with_guards(mut self, guards: NumericGuards) -> Self {
        self.guards = guards;
        self
    }
}

/// Per-sample synthesis generator.
pub trait Algorithm {
    /// Construct with all state at its reset value.
    fn new(ctx: AlgorithmContext) -> Self
    where
        Self: Sized;

    /// Zero all internal state.
    fn reset(&mut self);

    /// Advance one sample at `pitch` Hz with normalized parameters.
    fn process(&mut self, pitch: f32, p1: f32, p2: f32, p3: f32) -> AlgorithmOutput;

    /// Main phase accumulator, if the generator has one. Always in `[0, 1)`.
    fn phase(&self) -> Option<f32> {
        None
    }
}

/// Every synthesis generator, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    /// Band-limited pulse from the Dirichlet kernel.
    DirichletPulse,
    /// Single-sided discrete summation formula.
    DsfSingle,
    /// Positive plus negative frequency DSF pair.
    DsfDouble,
    /// `tanh`-saturated sine.
    TanhSquare,
    /// `tanh` square skewed into a saw.
    TanhSaw,
    /// Phase-aligned formant.
    Paf,
    /// Modified FM.
    ModFm,
    /// C1: ModFM plus formant bank.
    HybridFormant,
    /// C2: DSF into asymmetric FM into `tanh`.
    Cascaded,
    /// C3: Parallel ModFM voices plus PAF formants.
    ParallelBank,
    /// C4: ModFM with output fed back into frequency.
    Feedback,
    /// C5: DSF to ModFM to PAF crossfade.
    Morphing,
    /// C6: DSF at a golden ratio plus shifted formant.
    Inharmonic,
    /// C7: DSF used as a resonant filter over a sine.
    AdaptiveFilter,
    /// N1: `tanh`, exponential and ring-mod stages.
    Multistage,
    /// N2: Pitch-dependent asymmetric FM.
    FreqAsymmetry,
    /// N3: Cross-modulated sine pair.
    CrossMod,
    /// N4: Truncated Taylor sine.
    Taylor,
    /// Point bouncing inside a polygon.
    Trajectory,
    /// Quantized sine.
    Sine,
    /// Quantized ramp.
    Ramp,
    /// Quantized triangle.
    Triangle,
    /// Variable-width pulse.
    Pulse,
    /// Sample-and-hold noise with slew.
    Noise,
    /// Logistic map stepped once per cycle.
    Logistic,
    /// Lorenz attractor.
    Lorenz,
}

impl AlgorithmKind {
    /// Number of synthesis generators.
    pub const COUNT: usize = 26;

    /// All generators in catalog order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::DirichletPulse,
        Self::DsfSingle,
        Self::DsfDouble,
        Self::TanhSquare,
        Self::TanhSaw,
        Self::Paf,
        Self::ModFm,
        Self::HybridFormant,
        Self::Cascaded,
        Self::ParallelBank,
        Self::Feedback,
        Self::Morphing,
        Self::Inharmonic,
        Self::AdaptiveFilter,
        Self::Multistage,
        Self::FreqAsymmetry,
        Self::CrossMod,
        Self::Taylor,
        Self::Trajectory,
        Self::Sine,
        Self::Ramp,
        Self::Triangle,
        Self::Pulse,
        Self::Noise,
        Self::Logistic,
        Self::Lorenz,
    ];

    /// Look up a generator by catalog index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Catalog index.
    pub fn index(self) -> usize {
        self as usize
    }
}
