//! Host audio outputs for the disyn audio task.
//!
//! This crate provides two implementations of
//! [`AudioOutput`](disyn_platform::AudioOutput):
//!
//! - **WAV recording**: [`WavRecorder`] writes every block to a stereo
//!   16-bit file, for offline rendering
//! - **Realtime playback**: [`DeviceOutput`] feeds a cpal output stream
//!   through a bounded block queue that paces the audio task
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use disyn_io::WavRecorder;
//! use disyn_platform::{AudioTask, DspConfig, FixedGate, LocalSlot};
//!
//! let recorder = WavRecorder::new("voice.wav");
//! let mut task = AudioTask::new(DspConfig::default(), recorder, FixedGate::new(true));
//! task.init()?;
//! let (mut params, mut status) = (LocalSlot::new(), LocalSlot::new());
//! for _ in 0..690 {
//!     task.tick(&mut params, &mut status);
//! }
//! let (recorder, _) = task.into_parts();
//! recorder.finalize()?;
//! ```

mod device;
mod wav;

pub use device::{DeviceConfig, DeviceOutput, list_output_devices};
pub use wav::{Recording, WavRecorder, read_recording};

/// Error types for host audio output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// The other end of the block queue has gone away.
    #[error("Audio stream disconnected")]
    Disconnected,
}

/// Convenience result type for host audio output.
pub type Result<T> = std::result::Result<T, Error>;
