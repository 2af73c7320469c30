//! Single headless run.
//!
//! Drives one seeded [`Simulation`] to game over or a tick limit, letting
//! an [`UpgradeStrategy`] spend insight along the way. Every upgrade goes
//! through a [`ReplayRecorder`], so a run can always be re-verified.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serenity_core::config::SimConfig;
use serenity_core::error::{GameError, Result};
use serenity_core::replay::{Replay, ReplayPlayer, ReplayRecorder};
use serenity_core::simulation::{SimInput, Simulation, TICK_RATE};

use thiserror::Error;

use crate::metrics::{MetricsCollector, RunMetrics};
use crate::strategies::UpgradeStrategy;

/// Default tick limit: 10 minutes at 60 ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 10 * 60 * TICK_RATE as u64;

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessConfig {
    /// Seed.
    pub seed: u64,
    /// Stop after this many ticks (0 = until game over).
    pub max_ticks: u64,
    /// Upgrade policy.
    pub strategy: UpgradeStrategy,
    /// Ticks between upgrade decisions.
    pub upgrade_interval: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            strategy: UpgradeStrategy::default(),
            upgrade_interval: u64::from(TICK_RATE),
        }
    }
}

/// Metrics plus the recorded replay.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Collected metrics.
    pub metrics: RunMetrics,
    /// Recording of the run.
    pub replay: Replay,
}

impl RunOutcome {
    /// Re-simulate the replay and check it ends in the same state.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay cannot be restored or diverges.
    pub fn verify(&self) -> Result<()> {
        ReplayPlayer::new(self.replay.clone())?.verify()
    }
}

/// Errors reading or writing replay files.
#[derive(Debug, Error)]
pub enum ReplayFileError {
    /// File could not be read or written.
    #[error("Replay file IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Bytes are not a usable replay.
    #[error("Invalid replay: {0}")]
    Decode(#[from] GameError),
}

/// Write `replay` to `path` in its binary encoding.
pub fn save_replay(path: &Path, replay: &Replay) -> std::result::Result<(), ReplayFileError> {
    let bytes = replay.to_bytes()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read a replay written by [`save_replay`].
pub fn load_replay(path: &Path) -> std::result::Result<Replay, ReplayFileError> {
    let bytes = std::fs::read(path)?;
    Ok(Replay::from_bytes(&bytes)?)
}

/// Runs one simulation to completion.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim_config: SimConfig,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Runner for `sim_config` with run settings `config`.
    #[must_use]
    pub fn new(sim_config: SimConfig, config: HeadlessConfig) -> Self {
        Self { sim_config, config }
    }

    /// Run settings.
    #[must_use]
    pub const fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Play the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the starting snapshot
    /// cannot be recorded.
    pub fn run(&self) -> Result<RunOutcome> {
        let seed = self.config.seed;
        let sim = Simulation::new(self.sim_config.clone(), seed)?;
        let mut recorder = ReplayRecorder::new(sim)?;
        let mut collector = MetricsCollector::new(seed, self.config.strategy.name());
        let interval = self.config.upgrade_interval.max(1);

        tracing::debug!(seed, strategy = %self.config.strategy.name(), max_ticks = self.config.max_ticks, "Run started");

        loop {
            let sim = recorder.simulation();
            if !sim.is_running() {
                break;
            }
            if self.config.max_ticks > 0 && sim.get_tick() >= self.config.max_ticks {
                break;
            }
            if sim.get_tick() % interval == 0 {
                self.spend_insight(&mut recorder, &mut collector);
            }
            let events = recorder.tick();
            collector.observe(&events);
        }

        let (replay, sim) = recorder.finish();
        let metrics = collector.finish(&sim);
        tracing::debug!(
            seed,
            waves = metrics.waves_reached,
            ticks = metrics.ticks_survived,
            game_over = metrics.game_over,
            "Run finished"
        );
        Ok(RunOutcome { metrics, replay })
    }

    fn spend_insight(&self, recorder: &mut ReplayRecorder, collector: &mut MetricsCollector) {
        while let Some(kind) = self.config.strategy.choose(recorder.simulation()) {
            let level = recorder.simulation().progression().level(kind);
            recorder.apply(SimInput::UpgradeAbility(kind));
            if recorder.simulation().progression().level(kind) == level {
                break;
            }
            collector.record_upgrade(kind);
        }
    }
}
