//! End-to-end tests for the audio task loop.

use disyn_platform::{
    AudioOutput, AudioTask, DspConfig, FixedGate, Inbox, LocalSlot, NullOutput, OutputError,
    Outbox, ParameterSnapshot, PatternGate, StatusSnapshot,
};
use disyn_synth::catalog::{HARDWARE_INDEX, TEST_INDEX};

/// Output whose failures are scripted.
#[derive(Debug, Default)]
struct FlakyOutput {
    refuse_begin: bool,
    /// Accept this many samples per write, if set.
    accept: Option<usize>,
    fail_writes: bool,
    blocks: Vec<Vec<i16>>,
}

impl AudioOutput for FlakyOutput {
    fn begin(&mut self, _sample_rate: u32, _block_frames: usize) -> Result<(), OutputError> {
        if self.refuse_begin {
            Err(OutputError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, OutputError> {
        self.blocks.push(samples.to_vec());
        if self.fail_writes {
            return Err(OutputError::NotStarted);
        }
        Ok(self.accept.map_or(samples.len(), |n| n.min(samples.len())))
    }
}

/// Snapshot with every modulation source centered.
fn neutral() -> ParameterSnapshot {
    ParameterSnapshot {
        cv0: 0.5,
        cv1: 0.5,
        cv2: 0.5,
        pot0: 0.5,
        pot1: 0.5,
        pot2: 0.5,
        ..ParameterSnapshot::default()
    }
}

fn tick<O: AudioOutput, G: disyn_platform::GateIo>(
    task: &mut AudioTask<O, G>,
    params: &mut LocalSlot<ParameterSnapshot>,
) -> StatusSnapshot {
    let mut status = LocalSlot::new();
    task.tick(params, &mut status);
    status.try_take().expect("status published every tick")
}

// ---------------------------------------------------------------------------
// Underruns and init
// ---------------------------------------------------------------------------

#[test]
fn init_failure_is_sticky_and_loop_continues() {
    let output = FlakyOutput {
        refuse_begin: true,
        fail_writes: true,
        ..FlakyOutput::default()
    };
    let mut task = AudioTask::new(DspConfig::default(), output, FixedGate::new(true));
    assert_eq!(task.init(), Err(OutputError::Unavailable));
    assert_eq!(
        task.status(),
        StatusSnapshot {
            underruns: 1,
            audio_ok: false
        }
    );

    let mut params = LocalSlot::new();
    for i in 1..=5 {
        let status = tick(&mut task, &mut params);
        // One count per failed block, never two.
        assert_eq!(status.underruns, 1 + i);
        assert!(!status.audio_ok);
    }
    assert_eq!(task.output().blocks.len(), 5);
    assert!(task.voice().is_playing());
}

#[test]
fn short_write_counts_once() {
    let output = FlakyOutput {
        accept: Some(100),
        ..FlakyOutput::default()
    };
    let mut task = AudioTask::new(DspConfig::default(), output, FixedGate::new(false));
    task.init().unwrap();
    let mut params = LocalSlot::new();
    assert_eq!(tick(&mut task, &mut params).underruns, 1);
    assert_eq!(tick(&mut task, &mut params).underruns, 2);
    assert!(task.status().audio_ok);

    task.output_mut().accept = None;
    assert_eq!(tick(&mut task, &mut params).underruns, 2);
}

// ---------------------------------------------------------------------------
// Parameter hand-off
// ---------------------------------------------------------------------------

#[test]
fn newest_snapshot_wins_and_stale_one_is_kept() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(false));
    task.init().unwrap();
    let mut params = LocalSlot::new();
    for i in 0..10 {
        params.publish(ParameterSnapshot {
            param1: i as f32 / 10.0,
            ..neutral()
        });
    }
    tick(&mut task, &mut params);
    assert_eq!(task.params().param1, 0.9);

    // Nothing new: the last snapshot stays in effect.
    tick(&mut task, &mut params);
    assert_eq!(task.params().param1, 0.9);
    assert_eq!(task.voice().params().0, 0.9);
}

#[test]
fn modulation_reaches_the_voice() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(false));
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        param1: 0.5,
        param2: 0.5,
        cv0: 1.0,
        pot1: 0.0,
        ..neutral()
    });
    tick(&mut task, &mut params);
    let (p1, p2, _) = task.voice().params();
    assert_eq!(p1, 0.75);
    assert_eq!(p2, 0.25);
}

// ---------------------------------------------------------------------------
// Gate handling
// ---------------------------------------------------------------------------

#[test]
fn drone_holds_gate_without_input() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(false));
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        attack: 0.0,
        decay: 0.0,
        ..neutral()
    });
    for _ in 0..20 {
        tick(&mut task, &mut params);
    }
    assert!(task.voice().is_playing());
    assert_eq!(task.voice().envelope_level(), 1.0);
    assert!(!task.gate().output());
    assert!(task.last_block().iter().any(|&s| s != 0));
}

#[test]
fn note_fires_on_edges_only() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        attack: 0.3,
        ..neutral()
    });
    // ~350-sample attack: full level after a handful of blocks.
    for _ in 0..10 {
        tick(&mut task, &mut params);
    }
    assert_eq!(task.voice().envelope_level(), 1.0);

    // Gate still high: no retrigger.
    tick(&mut task, &mut params);
    assert_eq!(task.voice().envelope_level(), 1.0);
}

#[test]
fn algorithm_change_retriggers_held_gate() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
    let mut params = LocalSlot::new();
    let snapshot = ParameterSnapshot {
        attack: 0.3,
        ..neutral()
    };
    params.publish(snapshot);
    for _ in 0..10 {
        tick(&mut task, &mut params);
    }
    assert_eq!(task.voice().envelope_level(), 1.0);

    params.publish(ParameterSnapshot {
        algorithm: 6,
        ..snapshot
    });
    tick(&mut task, &mut params);
    assert_eq!(task.voice().algorithm(), 6);
    let level = task.voice().envelope_level();
    assert!(level > 0.0 && level < 0.5, "envelope restarted at {}", level);
}

#[test]
fn voice_goes_idle_and_busy_line_rises() {
    let config = DspConfig::default();
    // One block high, then a long low stretch.
    let gate = PatternGate::new(10_000, 1);
    let mut task = AudioTask::new(config, NullOutput::default(), gate);
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        attack: 0.0,
        decay: 0.05,
        reverb_level: 0.0,
        ..neutral()
    });
    tick(&mut task, &mut params);
    assert!(task.voice().is_playing());
    assert!(!task.gate().output());

    let mut blocks = 0;
    while task.voice().is_playing() {
        tick(&mut task, &mut params);
        blocks += 1;
        assert!(blocks < 2000, "voice never stopped");
    }
    tick(&mut task, &mut params);
    assert!(task.gate().output());
    assert!(task.last_block().iter().all(|&s| s == 0));
}

// ---------------------------------------------------------------------------
// Output modes
// ---------------------------------------------------------------------------

#[test]
fn hardware_mode_ignores_gate_and_is_busy() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(false));
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        algorithm: HARDWARE_INDEX as u8,
        ..neutral()
    });
    let mut crossings = 0;
    let mut last = 0i16;
    for _ in 0..690 {
        tick(&mut task, &mut params);
        for frame in task.last_block().chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
            if last <= 0 && frame[0] > 0 {
                crossings += 1;
            }
            last = frame[0];
        }
    }
    // ~1 s at 440 Hz.
    assert!((438..=442).contains(&crossings), "{} cycles", crossings);
    assert!(!task.gate().output());
}

#[test]
fn test_tone_level_and_frequency_follow_params() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        algorithm: TEST_INDEX as u8,
        param1: 0.0, // 50 Hz
        param2: 1.0, // full level
        master_gain: 1.0,
        ..neutral()
    });
    let mut left = Vec::new();
    for _ in 0..69 {
        tick(&mut task, &mut params);
        left.extend(task.last_block().iter().step_by(2).copied());
    }
    let peak = left.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    let expected = (libm::tanhf(1.0) * 32767.0) as u16;
    assert!(peak.abs_diff(expected) < 40, "peak {} vs {}", peak, expected);
    let rising = left.windows(2).filter(|w| w[0] <= 0 && w[1] > 0).count();
    // ~0.1 s of 50 Hz.
    assert!((4..=6).contains(&rising), "{} cycles", rising);
}

#[test]
fn synth_output_stays_in_range_for_every_algorithm() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
    let mut params = LocalSlot::new();
    for algorithm in 0..HARDWARE_INDEX as u8 {
        params.publish(ParameterSnapshot {
            algorithm,
            master_gain: 1.0,
            reverb_level: 1.0,
            reverb_size: 1.0,
            ..neutral()
        });
        for _ in 0..20 {
            tick(&mut task, &mut params);
            // Guard plus final soft clip keep everything inside full scale.
            assert!(
                task.last_block()
                    .iter()
                    .all(|&s| s.unsigned_abs() < i16::MAX as u16)
            );
        }
        assert!(task.voice().is_playing(), "algorithm {}", algorithm);
    }
}

#[test]
fn zero_master_is_silent() {
    let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
    let mut params = LocalSlot::new();
    params.publish(ParameterSnapshot {
        master_gain: 0.0,
        ..neutral()
    });
    for _ in 0..5 {
        tick(&mut task, &mut params);
        assert!(task.last_block().iter().all(|&s| s == 0));
    }
}

#[test]
fn custom_block_size() {
    let config = DspConfig {
        block_frames: 256,
        sample_rate: 48000,
        ..DspConfig::default()
    };
    let mut task = AudioTask::new(config, NullOutput::default(), FixedGate::new(true));
    task.init().unwrap();
    let mut params = LocalSlot::new();
    tick(&mut task, &mut params);
    assert_eq!(task.last_block().len(), 512);
    assert_eq!(task.output().samples_written(), 512);
    let (output, _gate) = task.into_parts();
    assert!(output.is_started());
}
