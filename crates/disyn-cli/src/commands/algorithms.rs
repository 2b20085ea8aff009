//! Algorithm catalog listing.

#![allow(clippy::print_literal)] // Table headers use literal strings

use clap::Args;
use disyn_synth::catalog::{self, AlgorithmInfo, ParamInfo};

#[derive(Args)]
pub struct AlgorithmsArgs {
    /// Show one algorithm (name or index) with a value table
    #[arg(value_name = "ALGORITHM", value_parser = super::parse_algorithm)]
    algorithm: Option<crate::patch::AlgorithmRef>,
}

fn range(param: &ParamInfo) -> String {
    if param.is_unused() {
        "-".to_string()
    } else if param.integer {
        format!("{} {:.0}..{:.0}", param.label, param.min, param.max)
    } else {
        format!("{} {}..{}", param.label, param.min, param.max)
    }
}

fn mode(index: usize) -> &'static str {
    if index == catalog::HARDWARE_INDEX {
        "self-test"
    } else if index == catalog::TEST_INDEX {
        "test tone"
    } else {
        ""
    }
}

fn show(index: usize, info: &AlgorithmInfo) {
    println!("{} (#{})", info.name, index);
    println!("{}", "=".repeat(info.name.len() + 4 + index.to_string().len()));
    println!();
    if catalog::is_special_mode(index) {
        println!("Special mode: {}", mode(index));
        println!();
    }
    for (slot, param) in [("param1", &info.param1), ("param2", &info.param2)] {
        if param.is_unused() {
            println!("  {slot}: unused");
            continue;
        }
        println!("  {slot}: {}", range(param));
        let values: Vec<String> = [0.0, 0.25, 0.5, 0.75, 1.0]
            .iter()
            .map(|&n| format!("{n:.2} -> {}", catalog::display_value(param, n)))
            .collect();
        println!("    {}", values.join(", "));
    }
}

pub fn run(args: AlgorithmsArgs) -> anyhow::Result<()> {
    if let Some(algorithm) = args.algorithm {
        let index = usize::from(algorithm.resolve()?);
        show(index, catalog::info(index));
        return Ok(());
    }

    println!("Available Algorithms");
    println!("====================");
    println!();
    println!("  {:>3}  {:10}  {:22}  {:22}  {}", "#", "Name", "Param 1", "Param 2", "Mode");
    println!("  {:>3}  {:10}  {:22}  {:22}  {}", "-", "----", "-------", "-------", "----");
    for (index, info) in catalog::all().iter().enumerate() {
        println!(
            "  {:>3}  {:10}  {:22}  {:22}  {}",
            index,
            info.name,
            range(&info.param1),
            range(&info.param2),
            mode(index)
        );
    }
    println!();
    println!("Use `disyn algorithms <name>` for details.");
    Ok(())
}
