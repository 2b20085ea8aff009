//! Gain calibration analysis.

use clap::Args;
use disyn_synth::AlgorithmKind;
use disyn_synth::calibration::{AnalysisConfig, GainCalibration, analyze_gains};
use indicatif::{ProgressBar, ProgressStyle};

use crate::patch::AlgorithmRef;

#[derive(Args)]
pub struct AnalyzeGainsArgs {
    /// Analyze one generator (name or index) instead of all
    #[arg(short, long, value_parser = super::parse_algorithm)]
    algorithm: Option<AlgorithmRef>,

    /// Samples rendered per grid point
    #[arg(short, long, default_value = "4096")]
    samples: usize,

    /// Pitch held during the sweep, in Hz
    #[arg(long, default_value = "220.0")]
    pitch: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "44100")]
    sample_rate: u32,
}

pub fn run(args: AnalyzeGainsArgs) -> anyhow::Result<()> {
    let indices: Vec<usize> = match &args.algorithm {
        Some(algorithm) => {
            let index = usize::from(algorithm.resolve()?);
            if index >= AlgorithmKind::COUNT {
                anyhow::bail!(
                    "{} is a special mode, not a generator",
                    super::algorithm_name(index as u8)
                );
            }
            vec![index]
        }
        None => (0..AlgorithmKind::COUNT).collect(),
    };

    let config = AnalysisConfig {
        sample_rate: args.sample_rate as f32,
        pitch: args.pitch,
        samples: args.samples.max(1),
        ..AnalysisConfig::default()
    };
    let current = GainCalibration::default();

    let pb = ProgressBar::new(indices.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    let mut reports = Vec::with_capacity(indices.len());
    for &index in &indices {
        pb.set_message(super::algorithm_name(index as u8));
        reports.push(analyze_gains(index, &config));
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Gain analysis: {} samples x {} grid points at {} Hz",
        config.samples,
        config.grid.len().pow(3),
        config.pitch
    );
    println!();
    println!(
        "  {:>3}  {:10}  {:>10}  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}",
        "#", "Name", "Peak", "RMS", "Fold", "Output", "Cur fold", "Cur out"
    );
    for report in &reports {
        println!(
            "  {:>3}  {:10}  {:>10.4}  {:>8.4}  {:>10.6}  {:>10.4}  {:>10.6}  {:>10.4}",
            report.algorithm,
            super::algorithm_name(report.algorithm as u8),
            report.peak,
            report.rms,
            report.fold_gain,
            report.output_gain,
            current.fold_gain(report.algorithm),
            current.output_gain(report.algorithm)
        );
    }

    let mut suggested = current;
    for report in &reports {
        suggested.apply(report);
    }
    let changed = reports
        .iter()
        .filter(|r| {
            (current.fold_gain(r.algorithm) - suggested.fold_gain(r.algorithm)).abs() > 1e-3
                || (current.output_gain(r.algorithm) - suggested.output_gain(r.algorithm)).abs()
                    > 1e-3
        })
        .count();
    println!();
    println!("{changed} of {} generators differ from the tuned tables.", reports.len());
    tracing::debug!(analyzed = reports.len(), changed, "gain analysis finished");
    Ok(())
}
