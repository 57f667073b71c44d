use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sapper_core::journal_file::load_journal_from_file;
use sapper_core::replay::replay;

/// Validate a recorded journal's hash chain, re-run it through a fresh
/// engine, and report the first divergence if any.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the journal JSONL file to replay
    #[arg(short, long)]
    journal: PathBuf,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let loaded = load_journal_from_file(&args.journal)
        .with_context(|| format!("loading journal {}", args.journal.display()))?;
    println!(
        "Loaded {} ticks (build {}), hash chain intact.",
        loaded.journal.ticks.len(),
        loaded.journal.build_id
    );

    let report = replay(&loaded.journal)
        .map_err(|e| anyhow::anyhow!("replay failed during execution: {e}"))?;

    match report.divergence {
        None => {
            println!("Replay complete: {} ticks, no divergence.", report.ticks_replayed);
            Ok(ExitCode::SUCCESS)
        }
        Some(divergence) => {
            println!("Replay DIVERGED at tick {}.", divergence.tick);
            println!(
                "  command: recorded {:?}, replayed {:?}",
                divergence.recorded_command, divergence.replayed_command
            );
            println!(
                "  state hash: recorded {:#018x}, replayed {:#018x}",
                divergence.recorded_hash, divergence.replayed_hash
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
