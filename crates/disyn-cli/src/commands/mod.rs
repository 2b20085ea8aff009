//! CLI command implementations.

pub mod algorithms;
pub mod analyze_gains;
pub mod init_patch;
pub mod play;
pub mod render;

use std::io::Read;
use std::path::Path;

use disyn_platform::PatternGate;
use disyn_synth::catalog;

use crate::patch::{AlgorithmRef, Patch};

/// Patch from `path` (`-` reads stdin), or the default patch.
pub fn load_patch(path: Option<&Path>) -> anyhow::Result<Patch> {
    match path {
        Some(p) if p == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(Patch::from_toml(&text)?)
        }
        Some(p) => Ok(Patch::load(p)?),
        None => Ok(Patch::default()),
    }
}

/// Parse an `--algorithm` value: a catalog index or display name.
pub fn parse_algorithm(s: &str) -> Result<AlgorithmRef, String> {
    let algorithm = s
        .parse::<u8>()
        .map_or_else(|_| AlgorithmRef::Name(s.to_string()), AlgorithmRef::Index);
    algorithm.resolve().map_err(|e| e.to_string())?;
    Ok(algorithm)
}

/// Display name for a catalog index.
pub fn algorithm_name(index: u8) -> &'static str {
    catalog::info(usize::from(index)).name
}

/// Gate input from the patch: a pattern, or constantly high.
pub fn gate_for(patch: &Patch, drone: bool) -> PatternGate {
    if drone || patch.gate.drone {
        PatternGate::new(1, 1)
    } else {
        PatternGate::from_seconds(
            patch.gate.period,
            patch.gate.duty,
            patch.dsp.sample_rate_hz(),
            patch.dsp.block_frames,
        )
    }
}
