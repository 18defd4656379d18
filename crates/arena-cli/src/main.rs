//! # arena-cli
//!
//! Binary entry point for running one arena match.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - Configuration loading and command-line overrides
//! - Ctrl-C handling that stops the simulation engine cleanly
//! - Operator-facing diagnostics and process exit codes

mod diagnostics;

use anyhow::{Context, Result};
use arena_adapters::{EngineCommand, EngineSupervisor, probe_engine};
use arena_core::{
    ArenaConfig, CollatedResult, MatchOrchestrator, MatchSpec, TeamId, cancel_pair,
};
use clap::{ColorChoice, Parser};
use std::io::{IsTerminal, stderr};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Run a single arena match: stage team code, run the simulator, collate results.
#[derive(Parser, Debug)]
#[command(name = "run-match", version, about)]
struct Cli {
    /// The directory containing the teams' robot code, as Zip archives named
    /// for the teams' TLAs. This directory is also the root for storing the
    /// resulting logs and recordings.
    archives_dir: PathBuf,

    /// The number of the match to run.
    match_num: u32,

    /// TLA of the team in each zone, in order from zone 0. Use dash (-) for
    /// an empty zone. Must specify all zones.
    #[arg(required = true, num_args = 1..)]
    tla: Vec<String>,

    /// The duration of the match (in seconds).
    #[arg(long)]
    duration: Option<u32>,

    /// Path to configuration file
    #[arg(short, long, default_value = "arena.yml")]
    config: PathBuf,

    /// Repository root holding the world files (default: current directory)
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Stop the simulator after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Simulator executable to run instead of the configured one
    #[arg(long)]
    engine: Option<String>,

    /// Show what would be run without touching the filesystem
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// When to color diagnostics (auto, always, never)
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(stderr)
        .init();

    colored::control::set_override(colors_enabled(cli.color));

    let repo_root = match cli.repo_root.clone() {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let config = load_config(&cli, &repo_root)?;
    let spec = build_match_spec(&cli, &config)?;

    let command = EngineCommand::from_config(&config.engine, &repo_root);
    if cli.dry_run {
        print_plan(&cli.archives_dir, &spec, &command, &config).await;
        return Ok(());
    }

    let supervisor = EngineSupervisor::new(command)
        .with_timeout(config.engine.timeout())
        .with_grace(config.engine.termination_grace());
    let orchestrator = MatchOrchestrator::new(supervisor, &cli.archives_dir);

    let (cancel_handle, cancel_signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the match");
            cancel_handle.cancel();
        }
    });

    match orchestrator.run(&spec, cancel_signal).await {
        Ok(result) => {
            report_success(&spec, &result);
            Ok(())
        }
        Err(err) => {
            debug!(error = ?err, "Match failed");
            diagnostics::print_failure(&err);
            // Use explicit exit to ensure proper exit status
            std::process::exit(err.exit_code());
        }
    }
}

/// Diagnostics go to stderr, so `auto` follows whether stderr is a terminal.
fn colors_enabled(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => stderr().is_terminal(),
    }
}

/// Loads the configuration file and applies command-line overrides.
fn load_config(cli: &Cli, repo_root: &Path) -> Result<ArenaConfig> {
    let mut config = if cli.config.exists() {
        ArenaConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load config from {:?}", cli.config))?
    } else {
        debug!("Config file {:?} not found, using defaults", cli.config);
        ArenaConfig::default()
    };

    if let Some(engine) = &cli.engine {
        config.engine.command.clone_from(engine);
    }
    if let Some(timeout) = cli.timeout {
        config.engine.timeout_seconds = Some(timeout);
    }
    if let Some(duration) = cli.duration {
        config.default_duration = duration;
    }

    let warnings = config
        .validate(repo_root)
        .context("Configuration validation failed")?;
    for warning in &warnings {
        warn!("{warning}");
    }

    Ok(config)
}

fn build_match_spec(cli: &Cli, config: &ArenaConfig) -> Result<MatchSpec> {
    let zones = cli
        .tla
        .iter()
        .map(|token| TeamId::parse_slot(token))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid team TLA")?;

    MatchSpec::new(
        cli.match_num,
        zones,
        config.zones,
        config.default_duration,
        config.recording.clone(),
    )
    .with_context(|| {
        format!(
            "Must specify a TLA (or '-') for each of the {} zones",
            config.zones
        )
    })
}

async fn print_plan(
    archives_dir: &Path,
    spec: &MatchSpec,
    command: &EngineCommand,
    config: &ArenaConfig,
) {
    println!("Dry run mode - match plan:");
    println!("  Match: {} ({})", spec.match_number(), spec.label());
    println!("  Archives: {}", archives_dir.display());
    println!("  Zones: {}", spec.num_zones());
    for (zone_id, team) in spec.zone_assignments().iter().enumerate() {
        match team {
            Some(team) => {
                let archive = archives_dir.join(team.archive_file_name());
                let status = if archive.is_file() { "found" } else { "MISSING" };
                println!("  Zone {zone_id}: {team} ({status}: {})", archive.display());
            }
            None => println!("  Zone {zone_id}: (empty)"),
        }
    }
    println!("  Duration: {}s", spec.duration_seconds());
    println!("  Engine: {command}");
    println!("  Engine available: {}", probe_engine(&command.command).await);
    match config.engine.timeout_seconds {
        Some(secs) => println!("  Timeout: {secs}s"),
        None => println!("  Timeout: none"),
    }
    println!("  Match file: matches/{}.yaml", spec.padded_number());
}

fn report_success(spec: &MatchSpec, result: &CollatedResult) {
    info!(
        match_number = spec.match_number(),
        match_file = %result.match_file.display(),
        "Match archived"
    );
    for log in &result.logs {
        info!(path = %log.display(), "Team log");
    }
    for recording in &result.recordings {
        info!(path = %recording.display(), "Recording");
    }
    if !result.textures_copied {
        debug!("Recording textures were already archived");
    }
}
