//! Drive-scaled foldback wavefolder.
//!
//! The fold amount scales the input drive from 1x to 5x before reflecting
//! the signal about ±1. Amount 0 passes the signal through unchanged.

use crate::{clamp01, foldback};

const MAX_EXTRA_DRIVE: f32 = 4.0;
const THRESHOLD: f32 = 1.0;

/// Stateless wavefolder.
///
/// # Example
///
/// ```rust
/// use disyn_core::Wavefolder;
///
/// let folder = Wavefolder::new();
/// assert_eq!(folder.process(0.4, 0.0), 0.4);
/// assert!(folder.process(0.9, 1.0).abs() <= 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Wavefolder;

impl Wavefolder {
    /// Create a wavefolder.
    pub fn new() -> Self {
        Self
    }

    /// Fold `input` with the given amount in `[0, 1]`.
    #[inline]
    pub fn process(&self, input: f32, amount: f32) -> f32 {
        let amount = clamp01(amount);
        if amount <= 0.0 {
            return input;
        }
        foldback(input * (1.0 + amount * MAX_EXTRA_DRIVE), THRESHOLD)
    }
}
