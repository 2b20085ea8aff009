//! The real-time audio task.
//!
//! [`AudioTask`] owns the voice engine and everything the per-block loop
//! touches. One [`tick`](AudioTask::tick) renders one block:
//!
//! 1. Take the newest [`ParameterSnapshot`] if one arrived; otherwise keep
//!    the previous one.
//! 2. Read the gate. Zero attack and zero decay hold it open (drone).
//! 3. On an algorithm change, forget the last gate level and zero the
//!    test-tone phase, so a held gate re-triggers the new algorithm.
//! 4. Modulate params 1 and 2 by CV and pot deviation from center. Slots
//!    the catalog marks unused are pinned to 0.5.
//! 5. Smooth the pitch control once per block and map it onto the pitch
//!    range.
//! 6. Push every setter to the voice and fire `note_on`/`note_off` on gate
//!    edges only. Skipped in test-tone mode.
//! 7. Render the block: hardware square, test tone, or the voice through
//!    the guard, optional pre-clip and final soft clip.
//! 8. Drive the busy line low while sound is playing.
//! 9. Write the block. A failed or short write counts one underrun.
//! 10. Publish a [`StatusSnapshot`].
//!
//! Nothing in a tick blocks except the output boundary itself, which is
//! how a host paces the loop.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use core::f32::consts::TAU;

use disyn_core::{Smoother, clamp01, soft_clip};
use disyn_synth::VoiceEngine;
use disyn_synth::algorithms::kernels::step_phase;
use disyn_synth::catalog::{self, HARDWARE_INDEX, TEST_INDEX};
use libm::sinf;

use crate::boundary::{AudioOutput, GateIo, OutputError};
use crate::config::DspConfig;
use crate::mailbox::{Inbox, Outbox};
use crate::snapshot::{ParameterSnapshot, StatusSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Synth,
    Hardware,
    TestTone,
}

impl OutputMode {
    fn of(algorithm: u8) -> Self {
        match usize::from(algorithm) {
            HARDWARE_INDEX => OutputMode::Hardware,
            TEST_INDEX => OutputMode::TestTone,
            _ => OutputMode::Synth,
        }
    }
}

/// `nominal` offset by CV and pot deviation from 0.5, clamped to `[0, 1]`.
#[inline]
fn modulate(nominal: f32, cv: f32, pot: f32, cv_depth: f32, pot_depth: f32) -> f32 {
    clamp01(nominal + (cv - 0.5) * cv_depth + (pot - 0.5) * pot_depth)
}

/// Full-scale float to signed 16-bit PCM. NaN packs as 0.
#[inline]
fn to_pcm(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// Voice engine plus the block loop that drives it.
#[derive(Debug)]
pub struct AudioTask<O, G> {
    config: DspConfig,
    voice: VoiceEngine,
    output: O,
    gate: G,

    params: ParameterSnapshot,
    pitch: Smoother,
    frequency: f32,
    last_gate: bool,
    last_algorithm: u8,
    test_phase: f32,
    hardware_phase: f32,

    block: Vec<i16>,
    status: StatusSnapshot,
    ticks: u64,
}

impl<O: AudioOutput, G: GateIo> AudioTask<O, G> {
    /// Build the task and its voice. The block buffer is allocated here and
    /// never again.
    pub fn new(config: DspConfig, output: O, gate: G) -> Self {
        let voice = VoiceEngine::new(config.sample_rate_hz());
        Self::with_voice(config, voice, output, gate)
    }

    /// Build the task around an existing voice (custom guards or gains).
    pub fn with_voice(config: DspConfig, voice: VoiceEngine, output: O, gate: G) -> Self {
        let params = ParameterSnapshot::default();
        Self {
            config,
            voice,
            output,
            gate,
            params,
            pitch: Smoother::new(config.pitch_smoothing),
            frequency: config.pitch_min_hz,
            last_gate: false,
            last_algorithm: params.algorithm,
            test_phase: 0.0,
            hardware_phase: 0.0,
            block: vec![0; config.block_samples()],
            status: StatusSnapshot::default(),
            ticks: 0,
        }
    }

    /// Start the output boundary.
    ///
    /// A failure is recorded (one underrun, `audio_ok` cleared for good)
    /// and returned, but the task stays usable: later ticks keep
    /// rendering and simply fail to deliver.
    pub fn init(&mut self) -> Result<(), OutputError> {
        let result = self
            .output
            .begin(self.config.sample_rate, self.config.block_frames.max(1));
        if let Err(_err) = result {
            self.status.underruns = self.status.underruns.saturating_add(1);
            self.status.audio_ok = false;
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "audio output failed to start");
        }
        result
    }

    /// Run one block.
    pub fn tick<I, S>(&mut self, params: &mut I, status: &mut S)
    where
        I: Inbox<ParameterSnapshot> + ?Sized,
        S: Outbox<StatusSnapshot> + ?Sized,
    {
        if let Some(update) = params.try_take() {
            self.params = update.clamped();
        }
        let p = self.params;
        let config = self.config;
        let mode = OutputMode::of(p.algorithm);
        let info = catalog::info(usize::from(p.algorithm));

        let engine_gate = self.gate.read() || p.is_drone();

        if p.algorithm != self.last_algorithm {
            self.last_gate = false;
            self.test_phase = 0.0;
            self.last_algorithm = p.algorithm;
            #[cfg(feature = "tracing")]
            tracing::debug!(algorithm = p.algorithm, name = info.name, "algorithm selected");
        }

        let depth = config.param_mod_depth;
        let param1 = if info.param1.is_unused() {
            0.5
        } else {
            modulate(p.param1, p.cv0, p.pot0, depth, depth)
        };
        let param2 = if info.param2.is_unused() {
            0.5
        } else {
            modulate(p.param2, p.cv1, p.pot1, depth, depth)
        };

        let control = config.pitch_control(p.cv2, p.pot2);
        self.frequency = config.pitch_to_hz(self.pitch.process(control));

        let reverb_size = modulate(
            p.reverb_size,
            p.cv2,
            p.pot2,
            config.reverb_size_cv_depth,
            config.reverb_size_pot_depth,
        );
        let reverb_level = modulate(
            p.reverb_level,
            p.cv2,
            p.pot2,
            config.reverb_level_cv_depth,
            config.reverb_level_pot_depth,
        );
        let master_gain = modulate(
            p.master_gain,
            p.cv2,
            p.pot2,
            config.master_cv_depth,
            config.master_pot_depth,
        );

        if mode != OutputMode::TestTone {
            let voice = &mut self.voice;
            voice.set_algorithm(usize::from(p.algorithm));
            voice.set_param1(param1);
            voice.set_param2(param2);
            voice.set_attack(p.attack);
            voice.set_release(p.decay);
            voice.set_reverb_size(reverb_size);
            voice.set_reverb_level(reverb_level);
            voice.set_master_gain(master_gain);
            voice.set_frequency(self.frequency);
            if engine_gate && !self.last_gate {
                voice.note_on(self.frequency, 1.0);
            } else if !engine_gate && self.last_gate {
                voice.note_off();
            }
        }
        self.last_gate = engine_gate;

        self.render(mode, param1, param2, master_gain, engine_gate);

        let sound_playing = match mode {
            OutputMode::Hardware => true,
            OutputMode::TestTone => engine_gate,
            OutputMode::Synth => self.voice.is_playing(),
        };
        self.gate.write(!sound_playing);

        match self.output.write(&self.block) {
            Ok(written) if written >= self.block.len() => {}
            Ok(_written) => {
                self.status.underruns = self.status.underruns.saturating_add(1);
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    written = _written,
                    expected = self.block.len(),
                    underruns = self.status.underruns,
                    "short audio write"
                );
            }
            Err(_err) => {
                self.status.underruns = self.status.underruns.saturating_add(1);
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, underruns = self.status.underruns, "audio write failed");
            }
        }

        status.publish(self.status);
        self.ticks += 1;
    }

    fn render(&mut self, mode: OutputMode, param1: f32, param2: f32, gain: f32, gate: bool) {
        let sr = self.config.sample_rate_hz();
        let guard = self.config.sample_guard;
        let drive = self.config.pre_clip_drive;
        let pre_gain = self.config.pre_gain;

        let test = catalog::info(TEST_INDEX);
        let test_freq = catalog::map_normalized(&test.param1, param1);
        let test_level = catalog::map_normalized(&test.param2, param2);
        let gate_level = if gate { 1.0 } else { 0.0 };

        for frame in self.block.chunks_exact_mut(2) {
            let (left, right) = match mode {
                OutputMode::Hardware => {
                    self.hardware_phase =
                        step_phase(self.hardware_phase, self.config.hardware_tone_hz, sr);
                    let tone = if self.hardware_phase < 0.5 { 1.0 } else { -1.0 };
                    let s = soft_clip(tone * gain);
                    (s, s)
                }
                OutputMode::TestTone => {
                    self.test_phase = step_phase(self.test_phase, test_freq, sr);
                    let tone = sinf(self.test_phase * TAU);
                    let s = soft_clip(tone * test_level * gate_level * gain);
                    (s, s)
                }
                OutputMode::Synth => {
                    let out = self.voice.process();
                    let shape = |x: f32| {
                        let x = if x > -guard && x < guard { x } else { 0.0 };
                        let x = if drive > 0.0 { soft_clip(x * drive) } else { x };
                        soft_clip(x * gain * pre_gain)
                    };
                    (shape(out.primary), shape(out.secondary))
                }
            };
            frame[0] = to_pcm(left);
            frame[1] = to_pcm(right);
        }
    }

    /// Voice engine.
    pub fn voice(&self) -> &VoiceEngine {
        &self.voice
    }

    /// Mutable voice engine, for calibration changes between ticks.
    pub fn voice_mut(&mut self) -> &mut VoiceEngine {
        &mut self.voice
    }

    /// Task configuration.
    pub fn config(&self) -> &DspConfig {
        &self.config
    }

    /// Parameters in effect (the last snapshot taken, clamped).
    pub fn params(&self) -> &ParameterSnapshot {
        &self.params
    }

    /// Latest status, as last published.
    pub fn status(&self) -> StatusSnapshot {
        self.status
    }

    /// Voice frequency derived in the last tick.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// The last rendered block, interleaved.
    pub fn last_block(&self) -> &[i16] {
        &self.block
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Output boundary.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Mutable output boundary.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Gate boundary.
    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Mutable gate boundary.
    pub fn gate_mut(&mut self) -> &mut G {
        &mut self.gate
    }

    /// Give back both boundaries.
    pub fn into_parts(self) -> (O, G) {
        (self.output, self.gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{FixedGate, NullOutput};
    use crate::mailbox::LocalSlot;

    type Task = AudioTask<NullOutput, FixedGate>;

    fn task(gate: bool) -> Task {
        let mut t = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(gate));
        t.init().unwrap();
        t
    }

    fn run(t: &mut Task, snapshot: Option<ParameterSnapshot>) -> LocalSlot<StatusSnapshot> {
        let mut params = LocalSlot::new();
        if let Some(s) = snapshot {
            params.publish(s);
        }
        let mut status = LocalSlot::new();
        t.tick(&mut params, &mut status);
        status
    }

    #[test]
    fn modulate_centers_on_half() {
        assert_eq!(modulate(0.3, 0.5, 0.5, 0.5, 0.5), 0.3);
        assert_eq!(modulate(0.3, 1.0, 0.5, 0.5, 0.5), 0.55);
        assert_eq!(modulate(0.3, 0.0, 0.0, 0.5, 0.5), 0.0);
    }

    #[test]
    fn pcm_packing() {
        assert_eq!(to_pcm(1.0), i16::MAX);
        assert_eq!(to_pcm(-4.0), -i16::MAX);
        assert_eq!(to_pcm(f32::NAN), 0);
    }

    #[test]
    fn mode_from_index() {
        assert_eq!(OutputMode::of(0), OutputMode::Synth);
        assert_eq!(OutputMode::of(HARDWARE_INDEX as u8), OutputMode::Hardware);
        assert_eq!(OutputMode::of(TEST_INDEX as u8), OutputMode::TestTone);
        assert_eq!(OutputMode::of(200), OutputMode::Synth);
    }

    #[test]
    fn every_tick_publishes_status() {
        let mut t = task(false);
        let mut status = run(&mut t, None);
        assert_eq!(status.try_take(), Some(StatusSnapshot::default()));
        assert_eq!(t.ticks(), 1);
        assert_eq!(t.output().samples_written(), 128);
    }

    #[test]
    fn gate_edge_starts_and_stops_voice() {
        let mut t = task(true);
        run(&mut t, None);
        assert!(t.voice().is_playing());
        assert!(t.voice().gate());
        // Busy output is active low.
        assert!(!t.gate().output());

        t.gate_mut().set(false);
        run(&mut t, None);
        assert!(!t.voice().gate());
    }

    #[test]
    fn pitch_smoothing_halves_the_distance() {
        let mut t = task(false);
        // Controls at zero read as full scale after inversion.
        run(&mut t, None);
        assert_eq!(t.frequency(), 55.0 + 0.5 * 825.0);
        run(&mut t, None);
        assert_eq!(t.frequency(), 55.0 + 0.75 * 825.0);
    }

    #[test]
    fn unused_slot_ignores_modulation() {
        let mut t = task(true);
        // C1 Hyb: param 2 unused.
        let snapshot = ParameterSnapshot {
            algorithm: 7,
            param2: 0.9,
            cv1: 1.0,
            pot1: 1.0,
            ..ParameterSnapshot::default()
        };
        run(&mut t, Some(snapshot));
        assert_eq!(t.voice().params().1, 0.5);
    }

    #[test]
    fn hardware_mode_is_a_square() {
        let mut t = task(false);
        let snapshot = ParameterSnapshot {
            algorithm: HARDWARE_INDEX as u8,
            master_gain: 1.0,
            ..ParameterSnapshot::default()
        };
        run(&mut t, Some(snapshot));
        let peak = to_pcm(libm::tanhf(1.0));
        assert!(t.last_block().iter().all(|&s| s == peak || s == -peak));
        assert_eq!(t.last_block()[0], t.last_block()[1]);
        // Always busy.
        assert!(!t.gate().output());
    }

    #[test]
    fn test_tone_follows_gate() {
        let mut t = task(false);
        let snapshot = ParameterSnapshot {
            algorithm: TEST_INDEX as u8,
            cv0: 0.5,
            pot0: 0.5,
            cv1: 0.5,
            pot1: 0.5,
            ..ParameterSnapshot::default()
        };
        run(&mut t, Some(snapshot));
        assert!(t.last_block().iter().all(|&s| s == 0));
        assert!(t.gate().output());
        // Test mode never touches the voice.
        assert!(!t.voice().is_playing());

        t.gate_mut().set(true);
        run(&mut t, None);
        assert!(t.last_block().iter().any(|&s| s != 0));
        assert!(!t.gate().output());
        assert!(!t.voice().is_playing());
    }
}
