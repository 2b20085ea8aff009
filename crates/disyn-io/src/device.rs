//! Realtime playback through cpal.
//!
//! [`DeviceOutput`] is the audio task's side of a bounded block queue. The
//! cpal stream lives on its own `disyn-device` thread and drains the queue
//! from the device callback. When the queue is full, `write` waits, so the
//! device clock paces the audio task. When it runs dry, the callback plays
//! silence and counts a device-side underrun.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};
use disyn_platform::{AudioOutput, OutputError};

use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Names of every output device on the default host.
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    Ok(devices.filter_map(|d| device_name(&d).ok()).collect())
}

/// Find an output device by case-insensitive substring, or the default.
fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    match name {
        Some(search) => {
            let search_lower = search.to_lowercase();
            let devices = host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?;
            for device in devices {
                if let Ok(dev_name) = device_name(&device)
                    && dev_name.to_lowercase().contains(search_lower.as_str())
                {
                    return Ok(device);
                }
            }
            Err(Error::DeviceNotFound(format!(
                "no output device matching '{}'",
                search
            )))
        }
        None => host.default_output_device().ok_or(Error::NoDevice),
    }
}

/// Device selection and queueing.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Output device name (substring match); default device if `None`.
    pub device: Option<String>,
    /// Blocks buffered between the audio task and the device.
    pub queue_blocks: usize,
    /// Ask the device for exactly one task block per callback.
    pub fixed_buffer: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device: None,
            queue_blocks: 4,
            fixed_buffer: false,
        }
    }
}

/// Callback-side state: the block being played and the queue behind it.
struct BlockFeeder {
    blocks: Receiver<Vec<i16>>,
    recycle: Sender<Vec<i16>>,
    current: Vec<i16>,
    position: usize,
    starved: Arc<AtomicU64>,
}

impl BlockFeeder {
    fn new(blocks: Receiver<Vec<i16>>, recycle: Sender<Vec<i16>>, starved: Arc<AtomicU64>) -> Self {
        Self {
            blocks,
            recycle,
            current: Vec::new(),
            position: 0,
            starved,
        }
    }

    fn next_frame(&mut self) -> Option<(i16, i16)> {
        if self.position + 1 >= self.current.len() {
            let done = std::mem::take(&mut self.current);
            if done.capacity() > 0 {
                // Pool full or writer gone: the block is freed here instead.
                let _ = self.recycle.try_send(done);
            }
            self.current = self.blocks.try_recv().ok()?;
            self.position = 0;
            if self.current.len() < 2 {
                return None;
            }
        }
        let frame = (self.current[self.position], self.current[self.position + 1]);
        self.position += 2;
        Some(frame)
    }

    /// Fill an interleaved device buffer of `channels` channels.
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        let to_f32 = |s: i16| f32::from(s) / 32768.0;
        let mut starved = false;
        for frame in data.chunks_mut(channels.max(1)) {
            let (l, r) = match self.next_frame() {
                Some((l, r)) => (to_f32(l), to_f32(r)),
                None => {
                    starved = true;
                    (0.0, 0.0)
                }
            };
            match frame {
                [mono] => *mono = (l + r) * 0.5,
                [left, right, rest @ ..] => {
                    *left = l;
                    *right = r;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
        if starved {
            self.starved.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Open, configure and start the stream. Runs on the device thread.
fn open_stream(
    name: Option<&str>,
    sample_rate: u32,
    fixed_frames: Option<u32>,
    mut feeder: BlockFeeder,
) -> Result<(cpal::Stream, u16)> {
    let host = cpal::default_host();
    let device = find_output_device(&host, name)?;
    let channels = device
        .default_output_config()
        .map(|c| c.channels())
        .unwrap_or(2);

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: fixed_frames.map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                feeder.fill(data, usize::from(channels));
            },
            |err| tracing::error!(error = %err, "output stream error"),
            None,
        )
        .map_err(|e| Error::Stream(e.to_string()))?;

    stream.play().map_err(|e| Error::Stream(e.to_string()))?;
    tracing::info!(channels, sample_rate, "output stream started");
    Ok((stream, channels))
}

/// Output boundary backed by the system audio device.
#[derive(Debug)]
pub struct DeviceOutput {
    config: DeviceConfig,
    blocks: Option<Sender<Vec<i16>>>,
    recycle: Option<Receiver<Vec<i16>>>,
    stop: Arc<AtomicBool>,
    holder: Option<JoinHandle<()>>,
    starved: Arc<AtomicU64>,
    channels: u16,
    write_timeout: Duration,
}

impl DeviceOutput {
    /// Output for `config`; nothing is opened until `begin`.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            blocks: None,
            recycle: None,
            stop: Arc::new(AtomicBool::new(false)),
            holder: None,
            starved: Arc::new(AtomicU64::new(0)),
            channels: 0,
            write_timeout: Duration::from_millis(250),
        }
    }

    /// Device channel count; 0 before a successful `begin`.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Device callbacks that ran out of queued audio.
    pub fn device_underruns(&self) -> u64 {
        self.starved.load(Ordering::Relaxed)
    }

    /// Stop the stream and release the device.
    pub fn close(&mut self) {
        self.blocks = None;
        self.recycle = None;
        self.stop.store(true, Ordering::Relaxed);
        if let Some(holder) = self.holder.take() {
            holder.thread().unpark();
            if holder.join().is_err() {
                tracing::warn!("device thread panicked");
            }
        }
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        self.close();
    }
}

impl AudioOutput for DeviceOutput {
    fn begin(&mut self, sample_rate: u32, block_frames: usize) -> std::result::Result<(), OutputError> {
        self.close();
        self.stop = Arc::new(AtomicBool::new(false));

        let queue = self.config.queue_blocks.max(1);
        let (block_tx, block_rx) = bounded::<Vec<i16>>(queue);
        let (recycle_tx, recycle_rx) = bounded::<Vec<i16>>(queue + 2);
        let (ready_tx, ready_rx) = bounded::<Result<u16>>(1);

        let feeder = BlockFeeder::new(block_rx, recycle_tx, Arc::clone(&self.starved));
        let name = self.config.device.clone();
        let fixed = self.config.fixed_buffer.then_some(block_frames as u32);
        let stop = Arc::clone(&self.stop);

        let holder = thread::Builder::new()
            .name("disyn-device".into())
            .spawn(move || match open_stream(name.as_deref(), sample_rate, fixed, feeder) {
                Ok((stream, channels)) => {
                    let _ = ready_tx.send(Ok(channels));
                    while !stop.load(Ordering::Relaxed) {
                        thread::park_timeout(Duration::from_millis(50));
                    }
                    drop(stream);
                    tracing::debug!("output stream closed");
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .map_err(|err| {
                tracing::error!(error = %err, "cannot spawn device thread");
                OutputError::Unavailable
            })?;

        match ready_rx.recv() {
            Ok(Ok(channels)) => {
                let block_secs = block_frames.max(1) as f64 / f64::from(sample_rate.max(1));
                self.write_timeout =
                    Duration::from_secs_f64(block_secs * (queue + 1) as f64) + Duration::from_millis(100);
                self.channels = channels;
                self.blocks = Some(block_tx);
                self.recycle = Some(recycle_rx);
                self.holder = Some(holder);
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::error!(error = %err, "cannot open audio device");
                let _ = holder.join();
                Err(OutputError::Unavailable)
            }
            Err(_) => {
                let _ = holder.join();
                Err(OutputError::Unavailable)
            }
        }
    }

    fn write(&mut self, samples: &[i16]) -> std::result::Result<usize, OutputError> {
        let blocks = self.blocks.as_ref().ok_or(OutputError::NotStarted)?;
        let mut block = self
            .recycle
            .as_ref()
            .and_then(|r| r.try_recv().ok())
            .unwrap_or_default();
        block.clear();
        block.extend_from_slice(samples);
        match blocks.send_timeout(block, self.write_timeout) {
            Ok(()) => Ok(samples.len()),
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => Err(OutputError::Rejected),
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                Err(OutputError::Disconnected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feeder() -> (BlockFeeder, Sender<Vec<i16>>, Receiver<Vec<i16>>) {
        let (block_tx, block_rx) = bounded(4);
        let (recycle_tx, recycle_rx) = bounded(6);
        let feeder = BlockFeeder::new(block_rx, recycle_tx, Arc::new(AtomicU64::new(0)));
        (feeder, block_tx, recycle_rx)
    }

    #[test]
    fn plays_blocks_in_order_then_silence() {
        let (mut feeder, tx, recycle) = feeder();
        tx.send(vec![16384, -16384, 0, 8192]).unwrap();
        tx.send(vec![-32768, 32767]).unwrap();

        let mut data = [9.0f32; 8];
        feeder.fill(&mut data, 2);
        assert_eq!(data[..6], [0.5, -0.5, 0.0, 0.25, -1.0, 32767.0 / 32768.0]);
        assert_eq!(data[6..], [0.0, 0.0]);
        assert_eq!(feeder.starved.load(Ordering::Relaxed), 1);
        // The first block went back for reuse.
        assert_eq!(recycle.try_recv().unwrap().len(), 4);
    }

    #[test]
    fn keeps_playing_when_recycle_pool_is_closed() {
        let (mut feeder, tx, recycle) = feeder();
        drop(recycle);
        tx.send(vec![16384, 16384]).unwrap();
        tx.send(vec![-16384, -16384]).unwrap();
        tx.send(vec![8192, 8192]).unwrap();

        let mut data = [0.0f32; 6];
        feeder.fill(&mut data, 2);
        assert_eq!(data, [0.5, 0.5, -0.5, -0.5, 0.25, 0.25]);
        assert_eq!(feeder.starved.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn mono_device_downmixes() {
        let (mut feeder, tx, _recycle) = feeder();
        tx.send(vec![16384, 0]).unwrap();
        let mut data = [0.0f32; 1];
        feeder.fill(&mut data, 1);
        assert_eq!(data[0], 0.25);
    }

    #[test]
    fn extra_channels_are_silent() {
        let (mut feeder, tx, _recycle) = feeder();
        tx.send(vec![16384, 16384]).unwrap();
        let mut data = [1.0f32; 4];
        feeder.fill(&mut data, 4);
        assert_eq!(data, [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(feeder.starved.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn write_before_begin() {
        let mut out = DeviceOutput::new(DeviceConfig::default());
        assert_eq!(out.write(&[0; 4]), Err(OutputError::NotStarted));
        assert_eq!(out.channels(), 0);
        assert_eq!(out.device_underruns(), 0);
    }
}
