//! Headless run driver for balance testing and CI verification.
//!
//! Plays seeded serenity runs without any presentation layer:
//!
//! - **Balance batches**: many seeds in parallel, aggregated into a summary
//! - **CI verification**: the same seed must always end in the same state
//! - **Replay verification**: recorded runs re-simulate to the same hash
//!
//! Insight is spent by a scripted [`UpgradeStrategy`]; every purchase is
//! recorded as a replay input.
//!
//! # Example
//!
//! ```bash
//! # One run, metrics as JSON on stdout
//! cargo run -p serenity_headless -- run --seed 7
//!
//! # A batch with a custom config
//! cargo run -p serenity_headless -- --config tuning.ron batch --count 200
//! ```

pub mod batch;
pub mod config_loader;
pub mod metrics;
pub mod runner;
pub mod strategies;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use config_loader::{load_config, load_or_default, ConfigLoadError};
pub use metrics::{BatchSummary, MetricsCollector, RunMetrics};
pub use runner::{load_replay, save_replay, HeadlessConfig, HeadlessRunner, RunOutcome};
pub use strategies::UpgradeStrategy;
