//! Batch runner for balance testing.
//!
//! Runs many seeded runs in parallel using rayon and aggregates their
//! metrics.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serenity_core::config::SimConfig;
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, RunMetrics};
use crate::runner::{HeadlessConfig, HeadlessRunner, DEFAULT_MAX_TICKS};
use crate::strategies::UpgradeStrategy;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of runs
    pub run_count: u32,
    /// Maximum parallel runs (0 = use rayon default)
    pub parallel_runs: u32,
    /// Seed of the first run; run `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum ticks per run (0 = until game over)
    pub max_ticks: u64,
    /// Upgrade policy for every run
    pub strategy: UpgradeStrategy,
    /// Re-simulate each run from its replay and flag divergence
    pub verify_replays: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            run_count: 100,
            parallel_runs: 0,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            strategy: UpgradeStrategy::default(),
            verify_replays: false,
        }
    }
}

impl BatchConfig {
    /// Config for `run_count` runs
    pub fn new(run_count: u32) -> Self {
        Self {
            run_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set strategy
    pub fn with_strategy(mut self, strategy: UpgradeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual run metrics, in seed order
    pub runs: Vec<RunMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index
    pub run_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

fn run_single(sim_config: &SimConfig, config: &BatchConfig, index: u32) -> Result<RunMetrics, BatchError> {
    let seed = config.seed_start.wrapping_add(u64::from(index));
    let fail = |message: String| BatchError {
        run_index: index,
        seed,
        message,
    };
    let runner = HeadlessRunner::new(
        sim_config.clone(),
        HeadlessConfig {
            seed,
            max_ticks: config.max_ticks,
            strategy: config.strategy.clone(),
            ..HeadlessConfig::default()
        },
    );
    let outcome = runner.run().map_err(|e| fail(e.to_string()))?;
    if config.verify_replays {
        outcome.verify().map_err(|e| fail(e.to_string()))?;
    }
    Ok(outcome.metrics)
}

/// Run a batch of runs in parallel
pub fn run_batch(sim_config: &SimConfig, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        runs = config.run_count,
        seed_start = config.seed_start,
        strategy = %config.strategy.name(),
        "Starting batch run"
    );

    let work = || -> Vec<Result<RunMetrics, BatchError>> {
        (0..config.run_count)
            .into_par_iter()
            .map(|i| {
                let result = run_single(sim_config, &config, i);
                if let Err(e) = &result {
                    warn!(run = i, seed = e.seed, error = %e.message, "Run failed");
                }
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 {
                    debug!("Progress: {}/{}", done, config.run_count);
                }
                result
            })
            .collect()
    };

    let results = if config.parallel_runs > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_runs as usize)
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global one");
                work()
            }
        }
    } else {
        work()
    };

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunMetrics> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} runs in {:.1}s ({:.1} runs/sec)",
        runs.len(),
        duration_seconds,
        runs.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed `runs` times in parallel and compare final hashes.
pub fn verify_determinism(sim_config: &SimConfig, seed: u64, runs: u32, max_ticks: u64) -> bool {
    let config = BatchConfig {
        run_count: runs,
        seed_start: seed,
        max_ticks,
        ..BatchConfig::default()
    };
    let hashes: Vec<Option<u64>> = (0..runs)
        .into_par_iter()
        .map(|_| run_single(sim_config, &config, 0).ok().map(|m| m.final_state_hash))
        .collect();

    let Some(Some(first)) = hashes.first().copied() else {
        return false;
    };
    let deterministic = hashes.iter().all(|hash| *hash == Some(first));
    if !deterministic {
        warn!(seed, ?hashes, "Non-determinism detected");
    }
    deterministic
}
