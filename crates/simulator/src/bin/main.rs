//! Red/Blue Simulator CLI
//!
//! Run a built-in red/blue scenario, stepped or paced.
//!
//! # Example
//!
//! ```bash
//! # Reproducible stepped run up to logical time 10s
//! redblue-sim --seed 42 --until 10
//!
//! # Paced run: 5 wall-clock seconds at 2x speed, final state as JSON
//! redblue-sim --mode paced --duration 5 --speed 2 --json
//!
//! # Settings from a file, seed overridden on the command line
//! redblue-sim --config sim.toml --seed 7
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use redblue_simulator::{RunMode, Simulator, SimulatorConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Red/Blue Simulator
///
/// Runs a deterministic red-team vs blue-team network simulation.
/// Reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "redblue-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file. Command-line flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Stepped runs as fast as possible; paced follows the wall clock
    #[arg(short, long, value_enum)]
    mode: Option<RunMode>,

    /// Logical deadline in seconds (stepped mode)
    #[arg(short, long)]
    until: Option<f64>,

    /// Wall-clock duration in seconds (paced mode)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Logical seconds per wall-clock second (paced mode)
    #[arg(long)]
    speed: Option<f64>,

    /// Number of log records to keep and print
    #[arg(long)]
    history: Option<usize>,

    /// Print the final report as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Result<(SimulatorConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SimulatorConfig::default(),
        };

        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if let Some(until) = self.until {
            config = config.with_until(until);
        }
        if let Some(duration) = self.duration {
            config = config.with_duration(duration);
        }
        if let Some(speed) = self.speed {
            config = config.with_speed(speed);
        }
        if let Some(history) = self.history {
            config = config.with_history(history);
        }
        Ok((config, self.json))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,redblue=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, json) = Args::parse().into_config()?;
    let simulator = Simulator::new(config).context("Invalid simulator configuration")?;

    info!(seed = simulator.seed(), "Starting simulation (replay with --seed)");
    let report = simulator.run().await.context("Simulation failed")?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        report.print();
    }
    Ok(())
}
