//! Disyn Synth - distortion-synthesis voice engine
//!
//! This crate turns a selected synthesis algorithm and a handful of
//! normalized parameters into stereo samples. It builds on the primitives
//! in `disyn-core`.
//!
//! # Core Components
//!
//! ## Algorithms
//!
//! Twenty-six per-sample generators behind one [`Algorithm`] trait:
//! closed-form spectral synthesis, modulation synthesis, hybrids, a
//! bouncing-point trajectory oscillator, elementary waves and chaotic maps.
//! See [`algorithms`] for the families.
//!
//! ## Dispatch and Metadata
//!
//! - [`OscillatorBank`] - One live instance of every generator, selected by index
//! - [`catalog`] - Display names and parameter ranges, including the
//!   hardware-test and test-tone modes
//!
//! ## Voice
//!
//! - [`VoiceEngine`] - Monophonic voice: bank, wavefolder, envelope, stereo
//!   reverb and per-algorithm gain calibration, with auto-stop on silence
//! - [`GainCalibration`] / [`analyze_gains`] - Gain tables and the sweep that
//!   derives them
//!
//! ```rust
//! use disyn_synth::{VoiceEngine, catalog};
//!
//! let mut voice = VoiceEngine::new(44100.0);
//! let index = catalog::find("PAF").unwrap();
//! voice.set_algorithm(index);
//! voice.set_param1(0.3);
//! voice.note_on(110.0, 0.8);
//!
//! let mut left = vec![0.0; 512];
//! for sample in left.iter_mut() {
//!     *sample = voice.process().primary;
//! }
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! disyn-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod algorithms;
pub mod calibration;
pub mod catalog;
pub mod oscillator;
pub mod voice;

pub use algorithms::{
    Algorithm, AlgorithmContext, AlgorithmKind, AlgorithmOutput, NumericGuards,
};
pub use calibration::{AnalysisConfig, GainCalibration, GainReport, analyze_gains};
pub use catalog::{AlgorithmInfo, ParamInfo};
pub use oscillator::OscillatorBank;
pub use voice::VoiceEngine;
