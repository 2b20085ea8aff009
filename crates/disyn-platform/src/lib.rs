//! Disyn Platform - real-time audio task and task boundaries
//!
//! This crate wires the voice engine from `disyn-synth` to the outside
//! world. The audio task owns the engine outright and talks to everything
//! else through narrow seams: two single-slot mailboxes for parameters and
//! status, and two boundary traits for the audio output and gate lines.
//!
//! # Core Abstractions
//!
//! ## Snapshots
//!
//! - [`ParameterSnapshot`] - Every control value, copied from the control
//!   task once per audio block
//! - [`StatusSnapshot`] - Underrun count and audio health, published back
//!
//! ## Hand-off
//!
//! - [`Inbox`] / [`Outbox`] - Non-blocking, latest-value-wins channel halves
//! - [`LocalSlot`] - Single-threaded slot for bare-metal loops and tests
//! - [`mailbox()`] - Thread-safe slot shared between two tasks (`std`)
//!
//! ## Boundaries
//!
//! - [`AudioOutput`] - Accepts interleaved signed 16-bit stereo blocks
//! - [`GateIo`] - Note-trigger input and busy-indicator output
//!
//! ## Audio Task
//!
//! - [`DspConfig`] - Block size, modulation depths, pitch range and output
//!   stage constants
//! - [`AudioTask`] - One [`tick`](AudioTask::tick) per block: pull
//!   parameters, derive pitch and modulated parameters, render, write,
//!   publish status
//! - [`runtime`] - Runs the audio task and a control surface on two named
//!   threads (`std`)
//!
//! # no_std Support
//!
//! Everything except the thread runtime and the shared mailbox works
//! without `std`. Disable the default feature:
//!
//! ```toml
//! [dependencies]
//! disyn-platform = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use disyn_platform::{
//!     AudioTask, DspConfig, FixedGate, LocalSlot, NullOutput, Outbox, ParameterSnapshot,
//! };
//!
//! let mut task = AudioTask::new(DspConfig::default(), NullOutput::default(), FixedGate::new(true));
//! task.init();
//!
//! let mut params = LocalSlot::new();
//! let mut status = LocalSlot::new();
//! params.publish(ParameterSnapshot::default());
//! task.tick(&mut params, &mut status);
//!
//! assert!(task.voice().is_playing());
//! assert_eq!(task.status().underruns, 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod audio_task;
pub mod boundary;
pub mod config;
pub mod mailbox;
#[cfg(feature = "std")]
pub mod runtime;
pub mod snapshot;

pub use audio_task::AudioTask;
pub use boundary::{AudioOutput, FixedGate, GateIo, NullOutput, OutputError, PatternGate};
pub use config::DspConfig;
#[cfg(feature = "std")]
pub use mailbox::{MailboxReader, MailboxWriter, mailbox};
pub use mailbox::{Inbox, LocalSlot, Outbox};
pub use snapshot::{ParameterSnapshot, StatusSnapshot};
