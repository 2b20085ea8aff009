//! Live playback on an output device.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use disyn_io::{DeviceConfig, DeviceOutput, list_output_devices};
use disyn_platform::runtime::{self, ControlSurface, FixedControl};
use disyn_platform::{AudioTask, ParameterSnapshot, StatusSnapshot};

use crate::patch::AlgorithmRef;

#[derive(Args)]
pub struct PlayArgs {
    /// Patch file (TOML); `-` reads stdin
    #[arg(short, long)]
    patch: Option<PathBuf>,

    /// Algorithm name or index, overriding the patch
    #[arg(short, long, value_parser = super::parse_algorithm)]
    algorithm: Option<AlgorithmRef>,

    /// Stop after this many seconds (default: until Ctrl+C)
    #[arg(short, long)]
    seconds: Option<f32>,

    /// Output device name (substring match)
    #[arg(short, long)]
    device: Option<String>,

    /// Blocks queued between the audio task and the device
    #[arg(long, default_value = "4")]
    queue_blocks: usize,

    /// Ask the device for one task block per callback
    #[arg(long)]
    fixed_buffer: bool,

    /// Hold the gate high
    #[arg(long)]
    drone: bool,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,
}

/// Publishes the patch once and raises `audio_down` when the task reports
/// its output as unusable.
struct PlaySurface {
    inner: FixedControl,
    audio_down: Arc<AtomicBool>,
}

impl ControlSurface for PlaySurface {
    fn poll(&mut self) -> Option<ParameterSnapshot> {
        self.inner.poll()
    }

    fn on_status(&mut self, status: StatusSnapshot) {
        if !status.audio_ok {
            self.audio_down.store(true, Ordering::Relaxed);
        }
        self.inner.on_status(status);
    }
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    if args.list_devices {
        println!("Output devices:");
        for name in list_output_devices()? {
            println!("  {name}");
        }
        return Ok(());
    }

    let mut patch = super::load_patch(args.patch.as_deref())?;
    if let Some(algorithm) = args.algorithm {
        patch.parameters.algorithm = algorithm;
    }
    let snapshot = patch.snapshot()?;
    let config = patch.dsp;

    let output = DeviceOutput::new(DeviceConfig {
        device: args.device.clone(),
        queue_blocks: args.queue_blocks,
        fixed_buffer: args.fixed_buffer,
    });
    let gate = super::gate_for(&patch, args.drone);
    let task = AudioTask::new(config, output, gate);

    println!(
        "Playing {} at {} Hz, {} frames per block",
        super::algorithm_name(snapshot.algorithm),
        config.sample_rate,
        config.block_frames
    );
    println!("  Output: {}", args.device.as_deref().unwrap_or("default"));
    if args.seconds.is_none() {
        println!("\nPress Ctrl+C to stop...\n");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let audio_down = Arc::new(AtomicBool::new(false));
    let surface = PlaySurface {
        inner: FixedControl::new(snapshot),
        audio_down: Arc::clone(&audio_down),
    };
    let rt = runtime::spawn(task, surface, Duration::from_millis(1))?;
    let deadline = args
        .seconds
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| Instant::now() + Duration::from_secs_f32(s));

    while running.load(Ordering::SeqCst)
        && !audio_down.load(Ordering::Relaxed)
        && !rt.is_finished()
        && deadline.is_none_or(|d| Instant::now() < d)
    {
        thread::sleep(Duration::from_millis(20));
    }

    let task = rt
        .stop()
        .map_err(|_| anyhow::anyhow!("audio thread panicked"))?;
    let status = task.status();
    let ticks = task.ticks();
    let (mut output, _gate) = task.into_parts();
    let device_underruns = output.device_underruns();
    output.close();

    if !status.audio_ok {
        anyhow::bail!("audio device unavailable ({} underruns)", status.underruns);
    }
    println!(
        "Done! {} blocks rendered, {} task underruns, {} device underruns",
        ticks,
        status.underruns,
        device_underruns
    );
    Ok(())
}
