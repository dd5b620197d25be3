use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fleet_core::config::EngineConfig;
use fleet_core::engine::FleetEngine;
use fleet_core::filter::DisplayMode;
use tracing::info;

mod feed;
mod logging;
mod sample;
mod surface;

use feed::{read_feed, replay};
use sample::sample_snapshots;
use surface::LoggingSurface;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "fleet_replay",
    about = "Replays recorded fleet streams through the presence engine",
    long_about = "Feeds a JSON-lines capture of driver, ride and passenger snapshots\n\
                  through the engine against a logging map surface and prints the\n\
                  final dashboard summary as JSON."
)]
struct Cli {
    /// Engine configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true, env = "FLEET_CONFIG")]
    config: Option<PathBuf>,
    /// Initial display mode
    #[arg(long, global = true, value_enum, default_value_t = Mode::All)]
    mode: Mode,
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured feed
    Replay {
        /// JSON-lines feed file
        feed: PathBuf,
        /// Keep the clock running this long after the last event (ms)
        #[arg(long, default_value_t = 0)]
        settle_ms: u64,
        /// Show the sample dataset if the feed never delivered a snapshot
        #[arg(long)]
        sample_fallback: bool,
    },
    /// Run the engine over the built-in sample dataset
    Sample {
        /// Engine start time in epoch ms
        #[arg(long, default_value_t = 1_700_000_000_000)]
        now_ms: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    All,
    Drivers,
    Rides,
}

impl From<Mode> for DisplayMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => DisplayMode::All,
            Mode::Drivers => DisplayMode::Drivers,
            Mode::Rides => DisplayMode::Rides,
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn start_engine(config: EngineConfig, mode: Mode, now_ms: u64) -> Result<FleetEngine> {
    FleetEngine::builder(Box::new(LoggingSurface::new()))
        .config(config)
        .display_mode(mode.into())
        .start(now_ms)
        .context("starting engine")
}

fn show_sample(engine: &mut FleetEngine) {
    let center = engine.config().city_center;
    let now = engine.now();
    for snapshot in sample_snapshots(center, now) {
        engine.ingest(snapshot);
    }
    engine.advance_to(now);
}

fn print_summary(engine: &FleetEngine) -> Result<()> {
    let summary = engine
        .summary()
        .context("engine never published a summary")?;
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn run_replay(cli: &Cli, feed_path: &Path, settle_ms: u64, sample_fallback: bool) -> Result<()> {
    let file = File::open(feed_path)
        .with_context(|| format!("opening feed {}", feed_path.display()))?;
    let events = read_feed(BufReader::new(file))
        .with_context(|| format!("reading feed {}", feed_path.display()))?;
    let Some(first) = events.first() else {
        anyhow::bail!("feed {} has no events", feed_path.display());
    };

    let config = load_config(cli.config.as_deref())?;
    let mut engine = start_engine(config, cli.mode, first.at_ms)?;
    let stats = replay(&mut engine, &events);

    if sample_fallback && !engine.has_received_any() && engine.is_empty() {
        info!("no stream delivered data; showing the sample dataset");
        show_sample(&mut engine);
    }
    if settle_ms > 0 {
        let until = engine.now().saturating_add(settle_ms);
        engine.advance_to(until);
    }

    info!(
        events = stats.events,
        rejected = stats.rejected,
        passes = stats.passes,
        total_passes = engine.passes(),
        "replay finished"
    );
    print_summary(&engine)
}

fn run_sample(cli: &Cli, now_ms: u64) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut engine = start_engine(config, cli.mode, now_ms)?;
    show_sample(&mut engine);
    print_summary(&engine)
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    match &cli.command {
        Commands::Replay {
            feed,
            settle_ms,
            sample_fallback,
        } => run_replay(&cli, feed, *settle_ms, *sample_fallback),
        Commands::Sample { now_ms } => run_sample(&cli, *now_ms),
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        exit(1);
    }
}
