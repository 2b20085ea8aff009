//! Integration tests for disyn-synth.
//!
//! Tests cover every generator's numeric safety, determinism and phase
//! invariants, spectral and geometric sanity checks for individual
//! generators, and the voice engine's note lifecycle.

use core::f32::consts::TAU;

use disyn_synth::algorithms::combination::Feedback;
use disyn_synth::algorithms::trajectory::Trajectory;
use disyn_synth::algorithms::{Algorithm, AlgorithmContext, AlgorithmKind, AlgorithmOutput};
use disyn_synth::{OscillatorBank, VoiceEngine, catalog};

const SR: f32 = 48000.0;

/// Magnitude of bin `freq` over `signal` (Goertzel).
fn goertzel(signal: &[f32], freq: f32, sample_rate: f32) -> f32 {
    let w = TAU * freq / sample_rate;
    let coeff = 2.0 * w.cos();
    let (mut s1, mut s2) = (0.0f64, 0.0f64);
    for &x in signal {
        let s0 = f64::from(x) + f64::from(coeff) * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    let power = s1 * s1 + s2 * s2 - f64::from(coeff) * s1 * s2;
    (power.max(0.0).sqrt() / signal.len() as f64) as f32
}

// ---------------------------------------------------------------------------
// 1. Every generator
// ---------------------------------------------------------------------------

#[test]
fn every_generator_finite_for_10k_samples() {
    let corners = [
        (0.0, 0.0, 0.0),
        (1.0, 1.0, 1.0),
        (0.0, 1.0, 0.5),
        (1.0, 0.0, 0.25),
        (0.5, 0.5, 0.5),
    ];
    let pitches = [20.0, 220.0, 2000.0, 12_000.0];

    let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
    for kind in AlgorithmKind::ALL {
        for &(p1, p2, p3) in &corners {
            for &pitch in &pitches {
                bank.reset();
                for i in 0..10_000 {
                    let out = bank.process(kind.index(), pitch, p1, p2, p3);
                    assert!(
                        out.is_finite() && out.peak() < 100.0,
                        "{:?} at {} Hz ({}, {}, {}) sample {}: {:?}",
                        kind,
                        pitch,
                        p1,
                        p2,
                        p3,
                        i,
                        out
                    );
                }
            }
        }
    }
}

#[test]
fn every_generator_deterministic_after_reset() {
    let sweep = |bank: &mut OscillatorBank, index: usize, i: usize| -> AlgorithmOutput {
        let t = i as f32 / 2000.0;
        bank.process(index, 110.0 + 800.0 * t, t, 1.0 - t, 0.5)
    };
    for kind in AlgorithmKind::ALL {
        let mut fresh = OscillatorBank::new(AlgorithmContext::new(SR));
        let mut used = OscillatorBank::new(AlgorithmContext::new(SR));
        for i in 0..1500 {
            used.process(kind.index(), 3000.0, 0.9, 0.1, 1.0 - i as f32 / 1500.0);
        }
        used.reset();

        for i in 0..2000 {
            let a = sweep(&mut fresh, kind.index(), i);
            let b = sweep(&mut used, kind.index(), i);
            assert_eq!(
                (a.primary.to_bits(), a.secondary.to_bits()),
                (b.primary.to_bits(), b.secondary.to_bits()),
                "{:?} sample {}: fresh {:?} vs reset {:?}",
                kind,
                i,
                a,
                b
            );
        }
    }
}

#[test]
fn every_phase_stays_in_unit_interval() {
    let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
    let pitches = [0.0, 1.0, 440.0, 23_999.0, 40_000.0];
    for kind in AlgorithmKind::ALL {
        for &pitch in &pitches {
            bank.reset();
            for _ in 0..5000 {
                bank.process(kind.index(), pitch, 0.7, 0.3, 0.9);
                if let Some(phase) = bank.phase_of(kind.index()) {
                    assert!(
                        (0.0..1.0).contains(&phase),
                        "{:?} phase {} at {} Hz",
                        kind,
                        phase,
                        pitch
                    );
                }
            }
        }
    }
}

#[test]
fn catalog_matches_generators() {
    for kind in AlgorithmKind::ALL {
        let info = catalog::info(kind.index());
        assert_ne!(info.name, catalog::DEFAULT_INFO.name);
        assert!(!catalog::is_special_mode(kind.index()));
    }
    assert_eq!(catalog::all().len(), AlgorithmKind::COUNT + 2);
}

// ---------------------------------------------------------------------------
// 2. Individual generators
// ---------------------------------------------------------------------------

#[test]
fn dirichlet_single_harmonic_is_pure() {
    // One harmonic, no shaping: the kernel reduces to a cosine.
    let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
    let pitch = 480.0;
    let signal: Vec<f32> = (0..4800)
        .map(|_| {
            bank.process(AlgorithmKind::DirichletPulse.index(), pitch, 0.0, 0.5, 0.0)
                .primary
        })
        .collect();

    let fundamental = goertzel(&signal, pitch, SR);
    for h in 2..=5 {
        let harmonic = goertzel(&signal, pitch * h as f32, SR);
        assert!(
            fundamental > 4.0 * harmonic,
            "harmonic {} at {} vs fundamental {}",
            h,
            harmonic,
            fundamental
        );
    }
}

#[test]
fn dirichlet_more_harmonics_adds_upper_partials() {
    // 800 samples per cycle; the output slew barely touches the fifth.
    let pitch = 60.0;
    let fifth_ratio = |p1: f32| {
        let mut bank = OscillatorBank::new(AlgorithmContext::new(SR));
        let signal: Vec<f32> = (0..4800)
            .map(|_| {
                bank.process(AlgorithmKind::DirichletPulse.index(), pitch, p1, 0.0, 0.0)
                    .primary
            })
            .collect();
        goertzel(&signal, pitch * 5.0, SR) / goertzel(&signal, pitch, SR)
    };
    // p1 = 0.1 → 7 harmonics of equal weight before the clamp.
    let one = fifth_ratio(0.0);
    let seven = fifth_ratio(0.1);
    assert!(seven > 0.25, "fifth/first with seven harmonics {}", seven);
    assert!(seven > 4.0 * one, "seven {} vs one {}", seven, one);
}

#[test]
fn trajectory_triangle_is_periodic() {
    // Three sides, launched at 30° without jitter.
    let mut alg = Trajectory::new(AlgorithmContext::new(SR));
    let pitch = 240.0;
    let xs: Vec<f32> = (0..6000)
        .map(|_| alg.process(pitch, 0.0, 30.0 / 360.0, 0.0).primary)
        .collect();
    let crossings: Vec<usize> = (1..xs.len())
        .filter(|&i| xs[i - 1] < 0.1 && xs[i] >= 0.1)
        .collect();
    assert!(crossings.len() >= 8, "only {} crossings", crossings.len());

    // Side length √3; one lap of the inscribed orbit covers three sides'
    // worth of travel at 4·pitch/sr per sample.
    let speed = 4.0 * pitch / SR;
    let lap = 3.0 * 3.0f32.sqrt() / speed;
    let laps: Vec<usize> = crossings.windows(3).map(|w| w[2] - w[0]).collect();
    for &period in &laps {
        let period = period as f32;
        assert!(
            (0.95 * lap..=1.02 * lap).contains(&period),
            "period {} vs ideal {}",
            period,
            lap
        );
    }
    for pair in laps.windows(2) {
        assert!((pair[0] as i32 - pair[1] as i32).abs() <= 2, "{:?}", laps);
    }
}

#[test]
fn feedback_sweep_stays_bounded() {
    let mut alg = Feedback::new(AlgorithmContext::new(SR));
    let steps = 48_000;
    let mut peak = 0.0f32;
    for i in 0..steps {
        let fb = i as f32 / steps as f32;
        let out = alg.process(220.0, 1.0, fb, 1.0);
        assert!(out.is_finite());
        peak = peak.max(out.peak());
    }
    assert!(peak <= 0.8 + 1e-5, "peak {}", peak);
}

#[test]
fn feedback_sweep_through_voice_stays_bounded() {
    let mut voice = VoiceEngine::new(SR);
    voice.set_algorithm(AlgorithmKind::Feedback.index());
    voice.set_attack(0.0);
    voice.set_release(0.5);
    voice.set_param1(1.0);
    voice.set_master_gain(1.0);
    voice.note_on(220.0, 1.0);
    for i in 0..48_000 {
        voice.set_param2(i as f32 / 48_000.0);
        let out = voice.process();
        assert!(out.is_finite() && out.peak() < 2.0, "{:?} at {}", out, i);
    }
}

// ---------------------------------------------------------------------------
// 3. Voice engine lifecycle
// ---------------------------------------------------------------------------

#[test]
fn voice_release_then_auto_stop() {
    let mut voice = VoiceEngine::new(SR);
    voice.set_algorithm(AlgorithmKind::Sine.index());
    voice.set_attack(0.0);
    voice.set_release(0.001);
    voice.set_reverb_level(0.2);
    voice.set_reverb_size(0.2);
    voice.note_on(330.0, 1.0);
    for _ in 0..2400 {
        voice.process();
    }
    voice.note_off();

    let mut tail = 0usize;
    while voice.is_playing() {
        voice.process();
        tail += 1;
        assert!(tail < 10 * SR as usize, "reverb tail never decayed");
    }
    assert!(tail > 0);
    assert_eq!(voice.process(), AlgorithmOutput::SILENCE);

    // A new note revives the voice.
    voice.note_on(330.0, 1.0);
    assert!(voice.is_playing());
}

#[test]
fn envelope_continues_across_algorithm_switch() {
    let mut voice = VoiceEngine::new(SR);
    voice.set_attack(0.6);
    voice.note_on(220.0, 1.0);
    for _ in 0..1000 {
        voice.process();
    }
    let before = voice.envelope_level();
    assert!(before > 0.0 && before < 1.0, "mid-attack level {}", before);

    voice.set_algorithm(AlgorithmKind::Pulse.index());
    voice.process();
    let after = voice.envelope_level();
    assert!(after > before, "envelope restarted: {} -> {}", before, after);
    assert!(after - before < 0.01);
}

#[test]
fn wavefold_changes_timbre_not_safety() {
    let render = |fold: f32| -> Vec<f32> {
        let mut voice = VoiceEngine::new(SR);
        voice.set_algorithm(AlgorithmKind::Sine.index());
        voice.set_attack(0.0);
        voice.set_reverb_level(0.0);
        voice.set_wavefold_amount(fold);
        voice.note_on(480.0, 1.0);
        (0..4800).map(|_| voice.process().primary).collect()
    };
    let clean = render(0.0);
    let folded = render(1.0);
    assert!(folded.iter().all(|x| x.is_finite() && x.abs() <= 1.0));

    let distortion = |s: &[f32]| {
        let upper: f32 = (2..=10)
            .map(|h| goertzel(s, 480.0 * h as f32, SR).powi(2))
            .sum();
        upper.sqrt() / goertzel(s, 480.0, SR).max(1e-9)
    };
    let (clean_thd, folded_thd) = (distortion(&clean), distortion(&folded));
    assert!(
        folded_thd > 4.0 * clean_thd,
        "fold did not add harmonics: {} vs {}",
        folded_thd,
        clean_thd
    );
}

#[test]
fn test_tone_and_hardware_modes_are_not_voice_algorithms() {
    let mut voice = VoiceEngine::new(SR);
    let before = voice.algorithm();
    voice.set_algorithm(catalog::HARDWARE_INDEX);
    voice.set_algorithm(catalog::TEST_INDEX);
    assert_eq!(voice.algorithm(), before);
    assert_eq!(catalog::HARDWARE_INDEX, AlgorithmKind::COUNT);
}
