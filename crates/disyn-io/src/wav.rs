//! WAV recording and read-back.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use disyn_platform::{AudioOutput, OutputError};
use hound::{SampleFormat, WavReader, WavWriter};

use crate::Result;

/// Output boundary that records every block to a stereo 16-bit WAV file.
///
/// The file is created by [`begin`](AudioOutput::begin), once the sample
/// rate is known. Call [`finalize`](Self::finalize) to patch the header;
/// dropping the recorder finalizes too but swallows errors.
pub struct WavRecorder {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    sample_rate: Option<u32>,
    frames: u64,
}

impl std::fmt::Debug for WavRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavRecorder")
            .field("path", &self.path)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl WavRecorder {
    /// Recorder that will write to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            sample_rate: None,
            frames: 0,
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stereo frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Sample rate given to `begin`, if started.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Flush and close the file. Returns the number of frames written;
    /// a recorder that never started writes nothing and returns 0.
    pub fn finalize(mut self) -> Result<u64> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            tracing::info!(path = %self.path.display(), frames = self.frames, "recording finalized");
        }
        Ok(self.frames)
    }
}

impl AudioOutput for WavRecorder {
    fn begin(&mut self, sample_rate: u32, _block_frames: usize) -> std::result::Result<(), OutputError> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        match WavWriter::create(&self.path, spec) {
            Ok(writer) => {
                self.writer = Some(writer);
                self.sample_rate = Some(sample_rate);
                self.frames = 0;
                tracing::debug!(path = %self.path.display(), sample_rate, "recording started");
                Ok(())
            }
            Err(err) => {
                tracing::error!(path = %self.path.display(), error = %err, "cannot create WAV file");
                Err(OutputError::Unavailable)
            }
        }
    }

    fn write(&mut self, samples: &[i16]) -> std::result::Result<usize, OutputError> {
        let writer = self.writer.as_mut().ok_or(OutputError::NotStarted)?;
        for (written, &sample) in samples.iter().enumerate() {
            if let Err(err) = writer.write_sample(sample) {
                tracing::warn!(error = %err, written, "WAV write failed");
                self.frames += (written / 2) as u64;
                return if written == 0 {
                    Err(OutputError::Rejected)
                } else {
                    Ok(written)
                };
            }
        }
        self.frames += (samples.len() / 2) as u64;
        Ok(samples.len())
    }
}

/// A stereo file loaded as normalized floats.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Left channel.
    pub left: Vec<f32>,
    /// Right channel (a copy of left for mono files).
    pub right: Vec<f32>,
}

impl Recording {
    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Largest magnitude on either channel.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// RMS over both channels.
    pub fn rms(&self) -> f32 {
        let n = self.left.len() + self.right.len();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .left
            .iter()
            .chain(self.right.iter())
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        (sum / n as f64).sqrt() as f32
    }
}

/// Load a WAV file as stereo floats in `[-1, 1]`.
///
/// Mono files are duplicated to both channels; channels past the second
/// are dropped.
pub fn read_recording<P: AsRef<Path>>(path: P) -> Result<Recording> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mut left = Vec::with_capacity(interleaved.len() / channels);
    let mut right = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(if channels > 1 { frame[1] } else { frame[0] });
    }

    Ok(Recording {
        sample_rate: spec.sample_rate,
        left,
        right,
    })
}
