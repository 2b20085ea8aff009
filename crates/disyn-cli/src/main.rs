//! Disyn CLI - render, play and calibrate the distortion-synthesis voice.

mod commands;
mod patch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "disyn")]
#[command(author, version, about = "Distortion-synthesis voice: offline render, live playback and gain analysis", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List synthesis algorithms and their parameters
    Algorithms(commands::algorithms::AlgorithmsArgs),

    /// Render a patch to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a patch on an audio output device
    Play(commands::play::PlayArgs),

    /// Measure generator levels and suggest fold/output gains
    AnalyzeGains(commands::analyze_gains::AnalyzeGainsArgs),

    /// Write a patch file with default settings
    InitPatch(commands::init_patch::InitPatchArgs),
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Algorithms(args) => commands::algorithms::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::AnalyzeGains(args) => commands::analyze_gains::run(args),
        Commands::InitPatch(args) => commands::init_patch::run(args),
    }
}
