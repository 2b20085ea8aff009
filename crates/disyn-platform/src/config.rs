//! Audio task constants.
//!
//! [`DspConfig::default`] reproduces the hardware build. Hosts override
//! individual fields (a different sample rate for a sound card, a larger
//! block for offline rendering) and leave the rest alone.

use disyn_core::clamp01;

/// Tunables for [`AudioTask`](crate::AudioTask).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DspConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per block (one tick).
    pub block_frames: usize,
    /// Depth of CV and pot deviation from center on params 1 and 2.
    pub param_mod_depth: f32,
    /// Weight of the pitch CV in the pitch control.
    pub pitch_cv_mix: f32,
    /// Weight of the pitch pot in the pitch control.
    pub pitch_pot_mix: f32,
    /// Read pitch CV and pot as `1 - v`.
    pub invert_pitch: bool,
    /// One-pole coefficient for the block-rate pitch smoother.
    pub pitch_smoothing: f32,
    /// Frequency at pitch control 0.
    pub pitch_min_hz: f32,
    /// Frequency at pitch control 1.
    pub pitch_max_hz: f32,
    /// Pitch CV depth on reverb size.
    pub reverb_size_cv_depth: f32,
    /// Pitch pot depth on reverb size.
    pub reverb_size_pot_depth: f32,
    /// Pitch CV depth on reverb level.
    pub reverb_level_cv_depth: f32,
    /// Pitch pot depth on reverb level.
    pub reverb_level_pot_depth: f32,
    /// Pitch CV depth on master gain.
    pub master_cv_depth: f32,
    /// Pitch pot depth on master gain.
    pub master_pot_depth: f32,
    /// Voice samples at or beyond this magnitude are replaced by silence.
    pub sample_guard: f32,
    /// Gain applied before the final soft clip in synth mode.
    pub pre_gain: f32,
    /// Drive of an extra `tanh` stage before the pre-gain; 0 disables it.
    pub pre_clip_drive: f32,
    /// Square-wave frequency of the hardware self-test mode.
    pub hardware_tone_hz: f32,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_frames: 64,
            param_mod_depth: 0.5,
            pitch_cv_mix: 0.5,
            pitch_pot_mix: 0.5,
            invert_pitch: true,
            pitch_smoothing: 0.5,
            pitch_min_hz: 55.0,
            pitch_max_hz: 880.0,
            reverb_size_cv_depth: 0.0,
            reverb_size_pot_depth: 0.0,
            reverb_level_cv_depth: 0.0,
            reverb_level_pot_depth: 0.0,
            master_cv_depth: 0.0,
            master_pot_depth: 0.0,
            sample_guard: 8.0,
            pre_gain: 0.7,
            pre_clip_drive: 0.0,
            hardware_tone_hz: 440.0,
        }
    }
}

impl DspConfig {
    /// Interleaved samples per block.
    #[inline]
    pub fn block_samples(&self) -> usize {
        self.block_frames.max(1) * 2
    }

    /// Sample rate as `f32`.
    #[inline]
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }

    /// Combine the pitch CV and pot into one control value in `[0, 1]`.
    pub fn pitch_control(&self, cv: f32, pot: f32) -> f32 {
        let read = |v: f32| {
            if self.invert_pitch {
                clamp01(1.0 - v)
            } else {
                clamp01(v)
            }
        };
        clamp01(read(cv) * self.pitch_cv_mix + read(pot) * self.pitch_pot_mix)
    }

    /// Linear map of a smoothed pitch control onto the pitch range.
    #[inline]
    pub fn pitch_to_hz(&self, control: f32) -> f32 {
        self.pitch_min_hz + clamp01(control) * (self.pitch_max_hz - self.pitch_min_hz)
    }

    /// Problems that would make the task misbehave, as a message.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive");
        }
        if self.block_frames == 0 {
            return Err("block size must be positive");
        }
        if !(self.pitch_min_hz.is_finite() && self.pitch_max_hz.is_finite())
            || self.pitch_min_hz < 0.0
            || self.pitch_max_hz < self.pitch_min_hz
        {
            return Err("pitch range must be finite, non-negative and ascending");
        }
        if self.sample_guard.is_nan() || self.sample_guard <= 0.0 {
            return Err("sample guard must be positive");
        }
        if !(0.0..=1.0).contains(&self.pitch_smoothing) {
            return Err("pitch smoothing must be within [0, 1]");
        }
        Ok(())
    }
}
