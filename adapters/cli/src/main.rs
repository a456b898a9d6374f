#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line driver for the Lasius foraging simulation.

mod config_file;
mod logging;

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use config_file::Overrides;
use lasius_system_scheduler::Simulation;

/// Runs the simulation for a number of ticks and reports the outcome.
#[derive(Debug, Parser)]
#[command(name = "lasius", version)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of ticks to run.
    #[arg(short, long, default_value_t = 100)]
    ticks: u64,
    /// Seed for the random source, replacing the file value.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of foragers, replacing the file value.
    #[arg(long)]
    foragers: Option<u32>,
    /// Number of predators, replacing the file value.
    #[arg(long)]
    predators: Option<u32>,
    /// Print a census every N ticks in addition to the final one.
    #[arg(long, value_name = "N")]
    report_every: Option<u64>,
    /// Print the final snapshot as JSON instead of a census.
    #[arg(long)]
    json: bool,
    /// Log filter directive, e.g. `debug` or `lasius_system_scheduler=trace`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

/// Entry point for the Lasius command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    let mut config = config_file::load(cli.config.as_deref())?;
    Overrides {
        seed: cli.seed,
        foragers: cli.foragers,
        predators: cli.predators,
    }
    .apply(&mut config);

    let mut simulation =
        Simulation::initialize(config).context("failed to initialize the simulation")?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for tick in 1..=cli.ticks {
        let _ = simulation.tick();
        if let Some(every) = cli.report_every.filter(|every| *every > 0) {
            if tick % every == 0 && tick != cli.ticks && !cli.json {
                write!(out, "{}", simulation.census())?;
            }
        }
    }

    if cli.json {
        serde_json::to_writer_pretty(&mut out, &simulation.snapshot())
            .context("failed to encode snapshot")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", simulation.census())?;
    }
    Ok(())
}
