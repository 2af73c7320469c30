//! Headless serenity runner.
//!
//! Runs the simulation without any presentation layer, for balance batches,
//! CI determinism checks and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Play one seeded run and print its metrics as JSON
//! cargo run -p serenity_headless -- run --seed 7 --strategy balanced
//!
//! # Run a balance batch
//! cargo run -p serenity_headless -- batch --count 500 --output results/batch.json
//!
//! # Check the same seed always ends in the same state
//! cargo run -p serenity_headless -- verify --seed 12345 --runs 5
//!
//! # Re-simulate a saved replay
//! cargo run -p serenity_headless -- replay --file runs/seed7.replay --verify
//! ```
//!
//! Results go to stdout, logs to stderr.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use serenity_core::config::SimConfig;
use serenity_core::replay::ReplayPlayer;
use serenity_core::simulation::{Simulation, TICK_RATE};
use serenity_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    config_loader::{load_or_default, save_config},
    runner::{load_replay, save_replay, HeadlessConfig, HeadlessRunner, DEFAULT_MAX_TICKS},
    strategies::UpgradeStrategy,
};

#[derive(Parser)]
#[command(name = "serenity_headless")]
#[command(about = "Headless wave-defense runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON simulation config (defaults to built-in tuning)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one run and print its metrics
    Run {
        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Upgrade strategy: none, cheapest, balanced or focused:<ability>,...
        #[arg(short, long, default_value = "balanced")]
        strategy: String,

        /// Tick limit (0 = until serenity runs out)
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Write the replay here
        #[arg(long)]
        replay_out: Option<PathBuf>,
    },

    /// Run a batch of seeds for balance testing
    Batch {
        /// Number of runs
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Upgrade strategy for every run
        #[arg(short, long, default_value = "balanced")]
        strategy: String,

        /// Tick limit per run (0 = until serenity runs out)
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Re-simulate every run from its replay
        #[arg(long)]
        verify_replays: bool,

        /// Output JSON file
        #[arg(short, long, default_value = "results/batch_results.json")]
        output: PathBuf,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value = "3600")]
        max_ticks: u64,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify the replay reproduces the recorded final hash
        #[arg(long)]
        verify: bool,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Print the effective config as RON
    DumpConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let config = load_config_or_exit(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            seed,
            strategy,
            max_ticks,
            replay_out,
        } => cmd_run(config, seed, &strategy, max_ticks, replay_out),
        Commands::Batch {
            count,
            parallel,
            seed,
            strategy,
            max_ticks,
            verify_replays,
            output,
        } => {
            let batch = BatchConfig {
                run_count: count,
                parallel_runs: parallel,
                seed_start: seed,
                max_ticks,
                strategy: parse_strategy_or_exit(&strategy),
                verify_replays,
            };
            cmd_batch(&config, batch, &output);
        }
        Commands::Verify {
            seed,
            runs,
            max_ticks,
        } => cmd_verify(&config, seed, runs, max_ticks),
        Commands::Replay { file, verify } => cmd_replay(&file, verify),
        Commands::Benchmark { ticks, seed } => cmd_benchmark(config, ticks, seed),
        Commands::DumpConfig { output } => cmd_dump_config(&config, output.as_deref()),
    }
}

fn load_config_or_exit(path: Option<&Path>) -> SimConfig {
    match load_or_default(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
    }
}

fn parse_strategy_or_exit(name: &str) -> UpgradeStrategy {
    // A path to a RON file works as well as a strategy name.
    let parsed = if Path::new(name).is_file() {
        UpgradeStrategy::load(name)
    } else {
        name.parse()
    };
    match parsed {
        Ok(strategy) => strategy,
        Err(e) => {
            tracing::error!(error = %e, "Invalid strategy");
            std::process::exit(1);
        }
    }
}

/// Play a single run
fn cmd_run(config: SimConfig, seed: u64, strategy: &str, max_ticks: u64, replay_out: Option<PathBuf>) {
    let headless = HeadlessConfig {
        seed,
        max_ticks,
        strategy: parse_strategy_or_exit(strategy),
        ..HeadlessConfig::default()
    };
    tracing::info!(seed, strategy = %headless.strategy.name(), max_ticks, "Starting run");

    let outcome = match HeadlessRunner::new(config, headless).run() {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            std::process::exit(1);
        }
    };

    if let Some(path) = replay_out {
        if let Err(e) = save_replay(&path, &outcome.replay) {
            tracing::error!(error = %e, path = %path.display(), "Failed to save replay");
            std::process::exit(1);
        }
        tracing::info!(path = %path.display(), inputs = outcome.replay.input_count(), "Replay saved");
    }

    match serde_json::to_string_pretty(&outcome.metrics) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            std::process::exit(1);
        }
    }
}

/// Run batch of seeds for balance testing
fn cmd_batch(config: &SimConfig, batch: BatchConfig, output: &Path) {
    let num_cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    tracing::info!(
        count = batch.run_count,
        parallel = batch.parallel_runs,
        seed = batch.seed_start,
        strategy = %batch.strategy.name(),
        max_ticks = batch.max_ticks,
        cpus_available = num_cpus,
        output = %output.display(),
        "Batch configuration"
    );

    let results = run_batch(config, batch);

    if let Err(e) = results.save(output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to save results");
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Runs played: {}", results.runs.len());
    if !results.errors.is_empty() {
        eprintln!("Runs FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} runs/sec",
        results.runs.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!(
        "Waves reached: mean {:.2}, min {}, max {}",
        summary.mean_waves_reached, summary.min_waves_reached, summary.max_waves_reached
    );
    eprintln!("Survived tick limit: {:.1}%", summary.survival_rate * 100.0);
    eprintln!("Mean upgrades: {:.1}", summary.mean_upgrades);
    eprintln!("\nDefeats by cause:");
    for (cause, count) in &summary.defeats_by_cause {
        eprintln!("  {cause}: {count}");
    }

    if !results.errors.is_empty() {
        eprintln!("\nRUN FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!("  Run {} (seed {}): {}", error.run_index, error.seed, error.message);
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", output.display());
}

/// Verify determinism
fn cmd_verify(config: &SimConfig, seed: u64, runs: u32, max_ticks: u64) {
    tracing::info!("Verifying determinism with seed {} ({} runs)", seed, runs);

    if verify_determinism(config, seed, runs, max_ticks) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Play back a recorded replay
fn cmd_replay(file: &Path, verify: bool) {
    let replay = match load_replay(file) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, path = %file.display(), "Failed to load replay");
            std::process::exit(1);
        }
    };

    eprintln!("Loaded replay:");
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Inputs: {}", replay.input_count());
    eprintln!("  Duration: {} ticks", replay.final_tick);

    let mut player = match ReplayPlayer::new(replay) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create replay player");
            std::process::exit(1);
        }
    };

    if verify {
        match player.verify() {
            Ok(()) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Hash: {:016x}", player.replay().final_hash);
            }
            Err(e) => {
                eprintln!("FAIL: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut last_decile = 0;
    while player.advance() {
        let decile = (player.progress_percent() / 10.0) as u32;
        if decile > last_decile {
            eprintln!("Progress: {}%", decile * 10);
            last_decile = decile;
        }
    }

    let sim = player.simulation();
    let run = sim.run_state();
    eprintln!("Replay complete at tick {}", player.current_tick());
    eprintln!("  Wave: {}", run.wave);
    eprintln!("  Serenity: {:.1}/{:.1}", run.serenity, run.max_serenity);
    eprintln!("  Insight: {}", run.insight);
    eprintln!("  Stressors alive: {}", sim.stressors().alive().count());
    eprintln!("  State hash: {:016x}", sim.state_hash());
}

/// Run benchmark
fn cmd_benchmark(config: SimConfig, ticks: u64, seed: u64) {
    tracing::info!("Running {} tick benchmark", ticks);

    let mut sim = match Simulation::new(config, seed) {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create simulation");
            std::process::exit(1);
        }
    };

    // Warmup
    for _ in 0..100 {
        sim.tick();
    }

    let start = Instant::now();
    let mut processed = 0u64;
    for _ in 0..ticks {
        if !sim.is_running() {
            break;
        }
        sim.tick();
        processed += 1;
    }
    let elapsed = start.elapsed();
    let tps = processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {processed}");
    if processed < ticks {
        eprintln!("  (stopped early: serenity ran out at wave {})", sim.run_state().wave);
    }
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {tps:.1}");
    eprintln!("Realtime factor: {:.1}x", tps / f64::from(TICK_RATE));
    eprintln!("Final stressors: {}", sim.stressors().alive().count());
    eprintln!("State hash: {:016x}", sim.state_hash());
}

/// Print the effective config
fn cmd_dump_config(config: &SimConfig, output: Option<&Path>) {
    if let Some(path) = output {
        if let Err(e) = save_config(path, config) {
            tracing::error!(error = %e, "Failed to write config");
            std::process::exit(1);
        }
        eprintln!("Config written to: {}", path.display());
        return;
    }
    match config.to_ron_string() {
        Ok(text) => println!("{text}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode config");
            std::process::exit(1);
        }
    }
}
