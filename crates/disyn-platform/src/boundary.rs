//! Audio and gate boundaries.
//!
//! The audio task only ever sees these two traits. Hardware drivers, host
//! audio devices, and file recorders implement [`AudioOutput`]; a digital
//! input/output pin pair, or a scripted pattern, implements [`GateIo`].

use core::fmt;

/// Why an output boundary refused to start or to take a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// The device could not be opened or configured.
    Unavailable,
    /// A write arrived before a successful `begin`.
    NotStarted,
    /// The device rejected the block.
    Rejected,
    /// The consumer on the other side has gone away.
    Disconnected,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Unavailable => write!(f, "audio output unavailable"),
            OutputError::NotStarted => write!(f, "audio output not started"),
            OutputError::Rejected => write!(f, "audio output rejected block"),
            OutputError::Disconnected => write!(f, "audio output disconnected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutputError {}

/// Sink for interleaved stereo signed 16-bit blocks.
pub trait AudioOutput {
    /// Prepare the device for `sample_rate` Hz and blocks of `block_frames`.
    fn begin(&mut self, sample_rate: u32, block_frames: usize) -> Result<(), OutputError>;

    /// Hand over one interleaved block.
    ///
    /// Returns how many samples (not frames) were accepted. Fewer than
    /// `samples.len()` is a short write.
    fn write(&mut self, samples: &[i16]) -> Result<usize, OutputError>;
}

/// Gate input and busy output lines.
pub trait GateIo {
    /// Current level of the note-trigger input.
    fn read(&mut self) -> bool;

    /// Drive the output line.
    fn write(&mut self, level: bool);
}

/// Output that accepts and discards everything.
#[derive(Debug, Clone, Default)]
pub struct NullOutput {
    started: bool,
    samples: u64,
}

impl NullOutput {
    /// True after `begin`.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Total samples accepted.
    pub fn samples_written(&self) -> u64 {
        self.samples
    }
}

impl AudioOutput for NullOutput {
    fn begin(&mut self, _sample_rate: u32, _block_frames: usize) -> Result<(), OutputError> {
        self.started = true;
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, OutputError> {
        self.samples += samples.len() as u64;
        Ok(samples.len())
    }
}

/// Gate held at a fixed level; remembers the last output written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedGate {
    input: bool,
    output: bool,
}

impl FixedGate {
    /// Gate reading `input`.
    pub const fn new(input: bool) -> Self {
        Self {
            input,
            output: false,
        }
    }

    /// Change the input level.
    pub fn set(&mut self, input: bool) {
        self.input = input;
    }

    /// Last level written to the output line.
    pub fn output(&self) -> bool {
        self.output
    }
}

impl GateIo for FixedGate {
    fn read(&mut self) -> bool {
        self.input
    }

    fn write(&mut self, level: bool) {
        self.output = level;
    }
}

/// Repeating on/off gate counted in reads (one read per audio block).
///
/// ```rust
/// use disyn_platform::{GateIo, PatternGate};
///
/// let mut gate = PatternGate::new(4, 1);
/// let levels: Vec<bool> = (0..8).map(|_| gate.read()).collect();
/// assert_eq!(levels, [true, false, false, false, true, false, false, false]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternGate {
    period: u32,
    high: u32,
    position: u32,
    output: bool,
}

impl PatternGate {
    /// High for `high` of every `period` reads. A zero period reads as one.
    pub fn new(period: u32, high: u32) -> Self {
        let period = period.max(1);
        Self {
            period,
            high: high.min(period),
            position: 0,
            output: false,
        }
    }

    /// Pattern from a period in seconds and a duty cycle in `[0, 1]`.
    pub fn from_seconds(period_secs: f32, duty: f32, sample_rate: f32, block_frames: usize) -> Self {
        let blocks_per_sec = sample_rate / block_frames.max(1) as f32;
        let period = libm::roundf(period_secs.max(0.0) * blocks_per_sec).max(1.0);
        let high = libm::roundf(period * disyn_core::clamp01(duty));
        Self::new(period as u32, high as u32)
    }

    /// Reads per cycle.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// High reads per cycle.
    pub fn high(&self) -> u32 {
        self.high
    }

    /// Last level written to the output line.
    pub fn output(&self) -> bool {
        self.output
    }
}

impl GateIo for PatternGate {
    fn read(&mut self) -> bool {
        let level = self.position < self.high;
        self.position = (self.position + 1) % self.period;
        level
    }

    fn write(&mut self, level: bool) {
        self.output = level;
    }
}
