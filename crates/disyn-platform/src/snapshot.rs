//! Values exchanged between the control task and the audio task.
//!
//! Both snapshots are small `Copy` structs. They cross the task boundary
//! by value through a single-slot mailbox, so neither side ever holds a
//! reference into the other's state.

use disyn_core::clamp01;

/// Every control value the audio task consumes, normalized to `[0, 1]`.
///
/// `cv*` and `pot*` are raw modulation sources centered on 0.5:
/// `cv0`/`pot0` modulate param 1, `cv1`/`pot1` modulate param 2, and
/// `cv2`/`pot2` drive pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParameterSnapshot {
    /// Catalog index, special modes included.
    pub algorithm: u8,
    /// Attack time.
    pub attack: f32,
    /// Release time.
    pub decay: f32,
    /// Reverb size.
    pub reverb_size: f32,
    /// Reverb send level.
    pub reverb_level: f32,
    /// First algorithm parameter.
    pub param1: f32,
    /// Second algorithm parameter.
    pub param2: f32,
    /// Master gain.
    pub master_gain: f32,
    /// Param 1 control voltage.
    pub cv0: f32,
    /// Param 2 control voltage.
    pub cv1: f32,
    /// Pitch control voltage.
    pub cv2: f32,
    /// Param 1 potentiometer.
    pub pot0: f32,
    /// Param 2 potentiometer.
    pub pot1: f32,
    /// Pitch potentiometer.
    pub pot2: f32,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            algorithm: 0,
            attack: 0.1,
            decay: 0.5,
            reverb_size: 0.1,
            reverb_level: 0.1,
            param1: 0.55,
            param2: 0.5,
            master_gain: 0.8,
            cv0: 0.0,
            cv1: 0.0,
            cv2: 0.0,
            pot0: 0.0,
            pot1: 0.0,
            pot2: 0.0,
        }
    }
}

impl ParameterSnapshot {
    /// Copy with every continuous field clamped to `[0, 1]`.
    ///
    /// NaN becomes 0. The algorithm index is left alone; unknown indices
    /// are ignored downstream.
    pub fn clamped(&self) -> Self {
        Self {
            algorithm: self.algorithm,
            attack: clamp01(self.attack),
            decay: clamp01(self.decay),
            reverb_size: clamp01(self.reverb_size),
            reverb_level: clamp01(self.reverb_level),
            param1: clamp01(self.param1),
            param2: clamp01(self.param2),
            master_gain: clamp01(self.master_gain),
            cv0: clamp01(self.cv0),
            cv1: clamp01(self.cv1),
            cv2: clamp01(self.cv2),
            pot0: clamp01(self.pot0),
            pot1: clamp01(self.pot1),
            pot2: clamp01(self.pot2),
        }
    }

    /// True when both envelope times are zero, which holds the gate open.
    #[inline]
    pub fn is_drone(&self) -> bool {
        self.attack <= 0.0 && self.decay <= 0.0
    }
}

/// Audio-task health as seen by the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// Cumulative failed or short block writes, plus one for a failed init.
    pub underruns: u32,
    /// False once the output boundary failed to start.
    pub audio_ok: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            underruns: 0,
            audio_ok: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_power_on_state() {
        let p = ParameterSnapshot::default();
        assert_eq!(p.algorithm, 0);
        assert_eq!(p.param1, 0.55);
        assert_eq!(p.master_gain, 0.8);
        assert!(!p.is_drone());
        assert!(StatusSnapshot::default().audio_ok);
    }

    #[test]
    fn clamped_sanitizes_every_field() {
        let p = ParameterSnapshot {
            algorithm: 200,
            attack: -1.0,
            param2: 4.0,
            cv2: f32::NAN,
            ..ParameterSnapshot::default()
        }
        .clamped();
        assert_eq!(p.algorithm, 200);
        assert_eq!(p.attack, 0.0);
        assert_eq!(p.param2, 1.0);
        assert_eq!(p.cv2, 0.0);
    }

    #[test]
    fn drone_needs_both_times_zero() {
        let mut p = ParameterSnapshot {
            attack: 0.0,
            ..ParameterSnapshot::default()
        };
        assert!(!p.is_drone());
        p.decay = 0.0;
        assert!(p.is_drone());
    }
}
