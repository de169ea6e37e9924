#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line front-end for generating track content and replaying adaptive sessions.

mod report;
mod simulation;

use std::path::{Path, PathBuf};

use adaptive_runner_session::{JsonFileStore, Session, SessionConfig};
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::simulation::SimulationParams;

#[derive(Debug, Parser)]
#[command(name = "adaptive-runner")]
#[command(about = "Adaptive level generation for endless runners", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plays a seeded synthetic player through an adaptive session.
    Simulate(SimulateArgs),
    /// Generates one stretch of track with a fresh session.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the configured generator seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// JSON preference store loaded at start and written at the end.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Simulated seconds to play.
    #[arg(long, default_value_t = 120)]
    seconds: u32,
    /// Track generated per request, in world units.
    #[arg(long, default_value_t = 150.0)]
    segment_length: f32,
    /// Skill of the synthetic player in `[0, 1]`.
    #[arg(long, default_value_t = 0.6)]
    player_skill: f32,
    /// Running speed of the synthetic player in units per second.
    #[arg(long, default_value_t = 12.0)]
    speed: f32,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// Longitudinal start of the segment.
    #[arg(long, default_value_t = 0.0)]
    start: f32,
    /// Length of the segment.
    #[arg(long, default_value_t = 150.0)]
    length: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => simulate(args),
        Command::Generate(args) => generate(args),
    }
}

fn simulate(args: SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.segment_length.is_finite() && args.segment_length > 0.0,
        "segment length must be positive, got {}",
        args.segment_length
    );
    anyhow::ensure!(
        args.speed.is_finite() && args.speed >= 0.0,
        "speed must be non-negative, got {}",
        args.speed
    );

    let config = load_config(&args.session)?;
    let params = SimulationParams {
        seed: config.seed,
        seconds: args.seconds,
        segment_length: args.segment_length,
        player_skill: args.player_skill,
        run_speed: args.speed,
    };

    let mut session = Session::new(config);
    if let Some(path) = &args.store {
        let store = JsonFileStore::open(path)
            .with_context(|| format!("failed to open store: {}", path.display()))?;
        log::info!("using preference store {}", store.path().display());
        session = session.with_store(Box::new(store));
        session.load_profile();
    }

    let report = simulation::run(session, &params).context("failed to persist session state")?;
    match args.session.format {
        Format::Text => print!("{report}"),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        ),
    }
    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let config = load_config(&args.session)?;
    let mut session = Session::new(config);
    let chunks = session.generate_chunks(args.start, args.length);
    log::info!(
        "generated {} chunks for [{}, {})",
        chunks.len(),
        args.start,
        args.start + args.length
    );

    match args.session.format {
        Format::Text => print!("{}", report::render_chunks(&chunks)),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&chunks).context("failed to serialize chunks")?
        ),
    }
    Ok(())
}

fn load_config(args: &SessionArgs) -> anyhow::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<SessionConfig> {
    SessionConfig::load(path)
        .with_context(|| format!("failed to load configuration: {}", path.display()))
}
