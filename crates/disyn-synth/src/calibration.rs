//! Per-algorithm gain calibration.
//!
//! Raw generator outputs differ in amplitude and density by orders of
//! magnitude, so the voice engine scales each one twice: a *fold gain*
//! before the shared `tanh`/wavefolder stage brings worst-case peaks into a
//! comparable range, and an *output gain* afterwards evens out loudness.
//!
//! [`GainCalibration::default`] carries the tuned tables. [`analyze_gains`]
//! regenerates suggestions by sweeping a parameter grid:
//!
//! ```rust
//! use disyn_synth::calibration::{AnalysisConfig, analyze_gains};
//!
//! let config = AnalysisConfig { samples: 256, ..AnalysisConfig::default() };
//! let report = analyze_gains(19, &config); // Sine
//! assert!(report.peak <= 1.0);
//! assert_eq!(report.fold_gain, 1.0);
//! ```

use crate::algorithms::{AlgorithmContext, AlgorithmKind};
use crate::oscillator::OscillatorBank;

/// Fold and output gain per synthesis generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainCalibration {
    fold: [f32; AlgorithmKind::COUNT],
    output: [f32; AlgorithmKind::COUNT],
}

const TUNED_FOLD: [f32; 19] = [
    0.901_067, 0.2450, 0.03480, 0.10, 0.2000, 0.01, 0.01, 0.05, 0.01, 0.01, 0.1, 0.01, 1.0,
    0.0004, 0.00355, 0.000_699, 0.01, 1.0, 1.0,
];

const TUNED_OUTPUT: [f32; 19] = [
    0.4721, 1.0, 1.0, 0.20, 0.4991, 0.80, 0.60, 1.0, 0.40, 0.60, 0.8208, 0.50, 0.7967, 0.500,
    0.40, 0.50, 0.9917, 0.4501, 0.6886,
];

impl Default for GainCalibration {
    /// Tuned tables; generators without a tuned entry use unity.
    fn default() -> Self {
        let mut cal = Self::unity();
        cal.fold[..TUNED_FOLD.len()].copy_from_slice(&TUNED_FOLD);
        cal.output[..TUNED_OUTPUT.len()].copy_from_slice(&TUNED_OUTPUT);
        cal
    }
}

impl GainCalibration {
    /// Every gain set to 1.
    pub const fn unity() -> Self {
        Self {
            fold: [1.0; AlgorithmKind::COUNT],
            output: [1.0; AlgorithmKind::COUNT],
        }
    }

    /// Fold gain for `index`; 1.0 outside the generator range.
    #[inline]
    pub fn fold_gain(&self, index: usize) -> f32 {
        self.fold.get(index).copied().unwrap_or(1.0)
    }

    /// Output gain for `index`; 1.0 outside the generator range.
    #[inline]
    pub fn output_gain(&self, index: usize) -> f32 {
        self.output.get(index).copied().unwrap_or(1.0)
    }

    /// Replace both gains for one generator. Ignored for unknown indices;
    /// non-finite or negative gains are stored as 0.
    pub fn set(&mut self, index: usize, fold_gain: f32, output_gain: f32) {
        let sanitize = |g: f32| if g.is_finite() { g.max(0.0) } else { 0.0 };
        if let (Some(f), Some(o)) = (self.fold.get_mut(index), self.output.get_mut(index)) {
            *f = sanitize(fold_gain);
            *o = sanitize(output_gain);
        }
    }

    /// Store the suggestions from an analysis report.
    pub fn apply(&mut self, report: &GainReport) {
        self.set(report.algorithm, report.fold_gain, report.output_gain);
    }
}

/// Sweep settings for [`analyze_gains`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Pitch held during the sweep.
    pub pitch: f32,
    /// Samples rendered per grid point.
    pub samples: usize,
    /// Values swept for each of the three parameters.
    pub grid: [f32; 5],
    /// Peak the fold gain should bring the worst case down to.
    pub target_peak: f32,
    /// RMS the output gain should bring the loudest case to.
    pub target_rms: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            pitch: 220.0,
            samples: 4096,
            grid: [0.0, 0.25, 0.5, 0.75, 1.0],
            target_peak: 1.2,
            target_rms: 0.4,
        }
    }
}

/// Worst-case measurements and derived gains for one generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainReport {
    /// Catalog index analyzed.
    pub algorithm: usize,
    /// Largest magnitude seen on either channel.
    pub peak: f32,
    /// Largest primary-channel RMS over the grid points.
    pub rms: f32,
    /// `min(1, target_peak / peak)`.
    pub fold_gain: f32,
    /// `min(2, target_rms / (rms * fold_gain))`.
    pub output_gain: f32,
}

/// Measure generator `algorithm` over the full parameter grid.
///
/// Each grid point starts from a freshly reset generator. Unknown indices
/// measure the bank's fallback sine.
pub fn analyze_gains(algorithm: usize, config: &AnalysisConfig) -> GainReport {
    let mut bank = OscillatorBank::new(AlgorithmContext::new(config.sample_rate));
    let samples = config.samples.max(1);
    let mut worst_peak = 0.0f64;
    let mut worst_rms = 0.0f64;

    for &p1 in &config.grid {
        for &p2 in &config.grid {
            for &p3 in &config.grid {
                bank.reset();
                let mut peak = 0.0f64;
                let mut sum_sq = 0.0f64;
                for _ in 0..samples {
                    let out = bank.process(algorithm, config.pitch, p1, p2, p3);
                    peak = peak.max(f64::from(out.peak()));
                    sum_sq += f64::from(out.primary) * f64::from(out.primary);
                }
                let rms = libm::sqrt(sum_sq / samples as f64);
                worst_peak = worst_peak.max(peak);
                worst_rms = worst_rms.max(rms);
            }
        }
    }

    let target_peak = f64::from(config.target_peak);
    let target_rms = f64::from(config.target_rms);
    let fold_gain = if worst_peak > 0.0 {
        (target_peak / worst_peak).min(1.0)
    } else {
        1.0
    };
    let output_gain = if worst_rms > 0.0 {
        (target_rms / (worst_rms * fold_gain)).min(2.0)
    } else {
        1.0
    };

    GainReport {
        algorithm,
        peak: worst_peak as f32,
        rms: worst_rms as f32,
        fold_gain: fold_gain as f32,
        output_gain: output_gain as f32,
    }
}
