//! Offline rendering to a WAV file.

use std::path::PathBuf;

use clap::Args;
use disyn_io::{WavRecorder, read_recording};
use disyn_platform::{AudioTask, Inbox, LocalSlot, Outbox};
use indicatif::{ProgressBar, ProgressStyle};

use crate::patch::AlgorithmRef;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    output: PathBuf,

    /// Patch file (TOML); `-` reads stdin
    #[arg(short, long)]
    patch: Option<PathBuf>,

    /// Algorithm name or index, overriding the patch
    #[arg(short, long, value_parser = super::parse_algorithm)]
    algorithm: Option<AlgorithmRef>,

    /// Length in seconds
    #[arg(short, long, default_value = "4.0")]
    seconds: f32,

    /// Hold the gate high for the whole render
    #[arg(long)]
    drone: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !args.seconds.is_finite() || args.seconds <= 0.0 {
        anyhow::bail!("--seconds must be positive");
    }

    let mut patch = super::load_patch(args.patch.as_deref())?;
    if let Some(algorithm) = args.algorithm {
        patch.parameters.algorithm = algorithm;
    }
    let snapshot = patch.snapshot()?;
    let config = patch.dsp;

    let frames = (args.seconds * config.sample_rate_hz()) as u64;
    let block = config.block_frames as u64;
    let ticks = frames.div_ceil(block);

    println!(
        "Rendering {} for {:.2}s at {} Hz",
        super::algorithm_name(snapshot.algorithm),
        args.seconds,
        config.sample_rate
    );

    let recorder = WavRecorder::new(&args.output);
    let mut task = AudioTask::new(config, recorder, super::gate_for(&patch, args.drone));
    task.init()
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", args.output.display(), e))?;

    let mut params = LocalSlot::new();
    let mut status = LocalSlot::new();
    params.publish(snapshot);

    let pb = ProgressBar::new(ticks * block);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    for tick in 0..ticks {
        task.tick(&mut params, &mut status);
        if tick % 64 == 0 {
            pb.set_position(tick * block);
        }
    }
    pb.finish_with_message("done");

    let underruns = status.try_take().map_or(0, |s| s.underruns);
    if underruns > 0 {
        tracing::warn!(underruns, "render dropped blocks");
    }

    let (recorder, _gate) = task.into_parts();
    let written = recorder.finalize()?;
    let recording = read_recording(&args.output)?;

    println!("\nWrote {} frames to {}", written, args.output.display());
    println!(
        "  Peak {:.3}  RMS {:.3}  ({:.2}s)",
        recording.peak(),
        recording.rms(),
        recording.duration_secs()
    );
    Ok(())
}
