mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use softinput_core::{Config, ReplaceJob};

/// Replay a recorded IME session headlessly and print what the engine receives.
#[derive(Parser)]
struct Args {
    /// JSON script to replay
    script: PathBuf,

    /// TOML session config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full replay as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn print_job(job: &ReplaceJob) {
    println!("    replace {} +{} with {:?}", job.start, job.removed, job.text);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_toml(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let content = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let script: script::Script = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", args.script.display()))?;

    let replay = script::replay(&script, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&replay)?);
        return Ok(());
    }

    for (i, (op, outcome)) in script.ops.iter().zip(&replay.outcomes).enumerate() {
        println!("{:>3}. {:?} -> {}", i + 1, op, outcome);
    }
    println!();
    for (i, batch) in replay.batches.iter().enumerate() {
        println!("batch {} ({} jobs)", i + 1, batch.len());
        batch.iter().for_each(print_job);
    }
    println!();
    match &replay.final_text {
        Some(text) => println!("text:   {text:?}"),
        None => println!("text:   <session closed>"),
    }
    println!("mirror: {:?}", replay.mirror);
    if replay.ended {
        println!("editor action signalled end of editing");
    }
    Ok(())
}
