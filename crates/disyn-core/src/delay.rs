//! Fixed-length delay line.
//!
//! A circular buffer allocated once at construction. Reads always return
//! the sample written `len` steps ago, which is all the reverb's comb and
//! allpass stages need.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Integer-length delay line (heap-allocated, never reallocates).
///
/// # Example
///
/// ```rust
/// use disyn_core::DelayLine;
///
/// let mut delay = DelayLine::new(3);
/// assert_eq!(delay.tick(1.0), 0.0);
/// assert_eq!(delay.tick(0.0), 0.0);
/// assert_eq!(delay.tick(0.0), 0.0);
/// assert_eq!(delay.tick(0.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    index: usize,
}

impl DelayLine {
    /// Create a delay of `len` samples (at least one).
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    /// The sample that will be returned by the next [`tick`](Self::tick).
    #[inline]
    pub fn front(&self) -> f32 {
        self.buffer[self.index]
    }

    /// Replace the oldest sample with `input` and advance.
    #[inline]
    pub fn push(&mut self, input: f32) {
        self.buffer[self.index] = input;
        self.index += 1;
        if self.index == self.buffer.len() {
            self.index = 0;
        }
    }

    /// Read the oldest sample, then write `input` in its place.
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let out = self.front();
        self.push(input);
        out
    }

    /// Zero the buffer.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }

    /// Delay length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false; a delay line holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
