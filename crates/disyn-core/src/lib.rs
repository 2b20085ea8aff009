//! Disyn Core - DSP primitives for the disyn voice
//!
//! This crate provides the building blocks that the synthesis engine wraps
//! around its oscillator: shaping math, a one-pole smoother, delay-based
//! reverb components, a wavefolder and an attack/release envelope.
//!
//! # Components
//!
//! ## Math
//!
//! - [`soft_clip`], [`foldback`], [`db_to_linear`], [`flush_denormal`]
//! - Parameter mapping: [`lerp`], [`expo_map`], [`clamp01`], [`clamp_abs`]
//!
//! ## Smoothing
//!
//! - [`Smoother`] - First-order exponential follower used for slew limiting
//!   and block-rate control smoothing
//!
//! ## Reverb
//!
//! - [`DelayLine`] - Circular buffer, allocated once at construction
//! - [`CombFilter`] - Feedback comb with lowpass damping
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//! - [`Reverb`] - One channel of the voice reverb (parallel combs into series allpasses)
//!
//! ## Voice Shaping
//!
//! - [`Wavefolder`] - Drive-scaled foldback
//! - [`ArEnvelope`] - Linear attack/release envelope with drone mode
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for embedded targets:
//!
//! ```toml
//! [dependencies]
//! disyn-core = { version = "0.1", default-features = false }
//! ```
//!
//! Delay buffers need `alloc`; nothing allocates after construction.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod comb;
pub mod delay;
pub mod envelope;
pub mod math;
pub mod reverb;
pub mod smoother;
pub mod wavefolder;

pub use allpass::AllpassFilter;
pub use comb::CombFilter;
pub use delay::DelayLine;
pub use envelope::ArEnvelope;
pub use math::{
    clamp_abs, clamp01, db_to_linear, expo_map, flush_denormal, foldback, lerp, soft_clip,
};
pub use reverb::Reverb;
pub use smoother::Smoother;
pub use wavefolder::Wavefolder;
