//! Patch file scaffolding.

use std::path::PathBuf;

use clap::Args;

use crate::patch::{AlgorithmRef, Patch};

#[derive(Args)]
pub struct InitPatchArgs {
    /// Where to write the patch (`-` prints it)
    output: PathBuf,

    /// Algorithm name or index
    #[arg(short, long, value_parser = super::parse_algorithm)]
    algorithm: Option<AlgorithmRef>,

    /// Zero attack and decay so the voice drones
    #[arg(long)]
    drone: bool,

    /// Replace an existing file
    #[arg(short, long)]
    force: bool,
}

pub fn run(args: InitPatchArgs) -> anyhow::Result<()> {
    let mut patch = Patch::default();
    if let Some(algorithm) = args.algorithm {
        patch.parameters.algorithm = algorithm;
    }
    if args.drone {
        patch.parameters.attack = 0.0;
        patch.parameters.decay = 0.0;
        patch.gate.drone = true;
    }
    patch.validate()?;

    if args.output == PathBuf::from("-") {
        print!("{}", patch.to_toml()?);
        return Ok(());
    }
    if args.output.exists() && !args.force {
        anyhow::bail!("{} exists; pass --force to replace it", args.output.display());
    }
    patch.save(&args.output)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
