//! Monophonic voice engine.
//!
//! Composes the oscillator bank with the shared post-processing chain:
//!
//! ```text
//! bank → tanh(x · fold_gain) → tanh(wavefold(·, amount))
//!      → × envelope × velocity × master × output_gain → reverb (L/R)
//! ```
//!
//! The voice is either idle or playing. [`VoiceEngine::note_on`] starts it
//! and resets the generators, envelope and reverbs; [`VoiceEngine::note_off`]
//! starts the release. Once the envelope has finished and both channels
//! have stayed under the silence floor for two consecutive samples the
//! voice stops itself, after which [`VoiceEngine::process`] returns silence
//! without computing anything.

use disyn_core::reverb::STEREO_SPREAD;
use disyn_core::{ArEnvelope, Reverb, Wavefolder, clamp01, soft_clip};

use crate::algorithms::{AlgorithmContext, AlgorithmKind, AlgorithmOutput};
use crate::calibration::GainCalibration;
use crate::oscillator::OscillatorBank;

/// Magnitude under which a channel counts as silent.
pub const SILENCE_FLOOR: f32 = 1e-5;
/// Consecutive silent samples required before auto-stop.
pub const SILENT_SAMPLES_TO_STOP: u8 = 2;

/// Default algorithm: Tanh Sq.
pub const DEFAULT_ALGORITHM: usize = 3;

/// Single synthesizer voice.
///
/// ```rust
/// use disyn_synth::VoiceEngine;
///
/// let mut voice = VoiceEngine::new(48000.0);
/// voice.set_algorithm(6); // Mod FM
/// voice.note_on(220.0, 1.0);
/// let out = voice.process();
/// assert!(out.is_finite());
/// voice.note_off();
/// ```
#[derive(Debug, Clone)]
pub struct VoiceEngine {
    bank: OscillatorBank,
    calibration: GainCalibration,
    envelope: ArEnvelope,
    folder: Wavefolder,
    reverb_left: Reverb,
    reverb_right: Reverb,

    frequency: f32,
    algorithm: usize,
    param1: f32,
    param2: f32,
    param3: f32,
    wavefold: f32,
    master_gain: f32,
    velocity: f32,
    gate: bool,
    playing: bool,
    silent_run: u8,
}

impl VoiceEngine {
    /// Create an idle voice with default guards.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_context(AlgorithmContext::new(sample_rate))
    }

    /// Create an idle voice with explicit guards.
    pub fn with_context(ctx: AlgorithmContext) -> Self {
        Self {
            bank: OscillatorBank::new(ctx),
            calibration: GainCalibration::default(),
            envelope: ArEnvelope::new(ctx.sample_rate),
            folder: Wavefolder::new(),
            reverb_left: Reverb::new(ctx.sample_rate),
            reverb_right: Reverb::with_spread(ctx.sample_rate, STEREO_SPREAD),
            frequency: 440.0,
            algorithm: DEFAULT_ALGORITHM,
            param1: 0.55,
            param2: 0.5,
            param3: 0.5,
            wavefold: 0.0,
            master_gain: 0.8,
            velocity: 1.0,
            gate: false,
            playing: false,
            silent_run: 0,
        }
    }

    /// Start a note at `frequency` Hz.
    ///
    /// Resets every generator, the envelope and both reverbs, then raises
    /// the gate. Velocity is clamped to `[0, 1]`.
    pub fn note_on(&mut self, frequency: f32, velocity: f32) {
        self.set_frequency(frequency);
        self.velocity = clamp01(velocity);
        self.gate = true;
        self.playing = true;
        self.silent_run = 0;
        self.bank.reset();
        self.envelope.reset();
        self.reverb_left.reset();
        self.reverb_right.reset();
        self.envelope.set_gate(true);
    }

    /// Lower the gate; the envelope starts its release.
    pub fn note_off(&mut self) {
        self.gate = false;
        self.envelope.set_gate(false);
    }

    /// Render one stereo sample.
    #[inline]
    pub fn process(&mut self) -> AlgorithmOutput {
        if !self.playing {
            return AlgorithmOutput::SILENCE;
        }

        let raw = self.bank.process(
            self.algorithm,
            self.frequency,
            self.param1,
            self.param2,
            self.param3,
        );
        let fold_gain = self.calibration.fold_gain(self.algorithm);
        let output_gain = self.calibration.output_gain(self.algorithm);

        let (folder, fold) = (self.folder, self.wavefold);
        let shape = |x: f32| soft_clip(folder.process(soft_clip(x * fold_gain), fold));
        let (folded_l, folded_r) = (shape(raw.primary), shape(raw.secondary));

        let env = self.envelope.process();
        let gain = env * self.velocity * self.master_gain * output_gain;
        let left = self.reverb_left.process(folded_l * gain);
        let right = self.reverb_right.process(folded_r * gain);

        if !self.envelope.is_active() && left.abs().max(right.abs()) < SILENCE_FLOOR {
            self.silent_run = self.silent_run.saturating_add(1);
            if self.silent_run >= SILENT_SAMPLES_TO_STOP {
                self.playing = false;
                #[cfg(feature = "tracing")]
                tracing::debug!(algorithm = self.algorithm, "voice auto-stopped");
            }
        } else {
            self.silent_run = 0;
        }

        AlgorithmOutput::new(left, right)
    }

    /// Select the synthesis generator.
    ///
    /// Indices outside the generator range (special modes included) are
    /// ignored. A change resets the oscillator bank only; the envelope and
    /// reverb tails carry on.
    pub fn set_algorithm(&mut self, index: usize) {
        if index >= AlgorithmKind::COUNT || index == self.algorithm {
            return;
        }
        self.algorithm = index;
        self.bank.reset();
        #[cfg(feature = "tracing")]
        tracing::debug!(algorithm = index, "voice algorithm changed");
    }

    /// Pitch in Hz; negative values clamp to 0.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = if frequency.is_nan() { 0.0 } else { frequency.max(0.0) };
    }

    /// First algorithm parameter, clamped to `[0, 1]`.
    pub fn set_param1(&mut self, value: f32) {
        self.param1 = clamp01(value);
    }

    /// Second algorithm parameter, clamped to `[0, 1]`.
    pub fn set_param2(&mut self, value: f32) {
        self.param2 = clamp01(value);
    }

    /// Third algorithm parameter, clamped to `[0, 1]`.
    pub fn set_param3(&mut self, value: f32) {
        self.param3 = clamp01(value);
    }

    /// Wavefold amount, clamped to `[0, 1]`.
    pub fn set_wavefold_amount(&mut self, value: f32) {
        self.wavefold = clamp01(value);
    }

    /// Normalized attack time.
    pub fn set_attack(&mut self, value: f32) {
        self.envelope.set_attack(value);
    }

    /// Normalized release time.
    pub fn set_release(&mut self, value: f32) {
        self.envelope.set_release(value);
    }

    /// Reverb size for both channels.
    pub fn set_reverb_size(&mut self, value: f32) {
        self.reverb_left.set_size(value);
        self.reverb_right.set_size(value);
    }

    /// Reverb level for both channels.
    pub fn set_reverb_level(&mut self, value: f32) {
        self.reverb_left.set_level(value);
        self.reverb_right.set_level(value);
    }

    /// Master gain, clamped to `[0, 1]`.
    pub fn set_master_gain(&mut self, value: f32) {
        self.master_gain = clamp01(value);
    }

    /// Replace the gain tables.
    pub fn set_calibration(&mut self, calibration: GainCalibration) {
        self.calibration = calibration;
    }

    /// Current gain tables.
    pub fn calibration(&self) -> &GainCalibration {
        &self.calibration
    }

    /// Whether the voice is rendering.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the gate is held.
    pub fn gate(&self) -> bool {
        self.gate
    }

    /// Selected generator index.
    pub fn algorithm(&self) -> usize {
        self.algorithm
    }

    /// Current pitch in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// `(param1, param2, param3)`.
    pub fn params(&self) -> (f32, f32, f32) {
        (self.param1, self.param2, self.param3)
    }

    /// Envelope level after the last processed sample.
    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    /// Main phase of the active generator.
    pub fn oscillator_phase(&self) -> Option<f32> {
        self.bank.phase_of(self.algorithm)
    }
}
