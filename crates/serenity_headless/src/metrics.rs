//! Run metrics collection for balance analysis.
//!
//! [`MetricsCollector`] watches [`TickEvents`] as a run progresses and
//! produces a [`RunMetrics`] record; [`BatchSummary`] aggregates many of
//! them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serenity_core::abilities::{AbilityEventKind, AbilityKind};
use serenity_core::effects::DefeatCause;
use serenity_core::simulation::{Simulation, TickEvents};

/// Complete metrics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Random seed used.
    pub seed: u64,
    /// Upgrade strategy name.
    pub strategy: String,
    /// Highest wave started.
    pub waves_reached: u32,
    /// Ticks processed.
    pub ticks_survived: u64,
    /// Serenity ran out before the tick limit.
    pub game_over: bool,
    /// Serenity at the end.
    pub final_serenity: f64,
    /// Unspent insight at the end.
    pub final_insight: u32,
    /// Stressors spawned.
    pub spawned: u32,
    /// Defeats by archetype name.
    pub defeats_by_kind: BTreeMap<String, u32>,
    /// Defeats by cause (ability name, `collision` or `external`).
    pub defeats_by_cause: BTreeMap<String, u32>,
    /// Collisions with the defender.
    pub collisions: u32,
    /// Serenity lost to collisions.
    pub serenity_lost: f64,
    /// Serenity restored by abilities.
    pub serenity_restored: f64,
    /// Ability damage dealt.
    pub damage_dealt: f64,
    /// Activations (or firings) per ability.
    pub activations: BTreeMap<String, u32>,
    /// Final level per ability.
    pub ability_levels: BTreeMap<String, u8>,
    /// Upgrades bought.
    pub upgrades_bought: u32,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl RunMetrics {
    /// Total defeats.
    #[must_use]
    pub fn total_defeats(&self) -> u32 {
        self.defeats_by_kind.values().sum()
    }
}

/// Accumulates [`RunMetrics`] tick by tick.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    metrics: RunMetrics,
}

impl MetricsCollector {
    /// Collector for a run with `seed` and `strategy`.
    #[must_use]
    pub fn new(seed: u64, strategy: impl Into<String>) -> Self {
        Self {
            metrics: RunMetrics {
                seed,
                strategy: strategy.into(),
                ..RunMetrics::default()
            },
        }
    }

    /// Fold one tick's events in.
    pub fn observe(&mut self, events: &TickEvents) {
        let m = &mut self.metrics;
        if let Some(wave) = events.wave_started {
            m.waves_reached = m.waves_reached.max(wave);
        }
        m.spawned += events.spawned.len() as u32;
        for defeat in &events.defeats {
            *m.defeats_by_kind.entry(defeat.kind.name().to_string()).or_default() += 1;
            let cause = match defeat.cause {
                DefeatCause::Ability(kind) => kind.name(),
                DefeatCause::Collision => "collision",
                DefeatCause::External => "external",
            };
            *m.defeats_by_cause.entry(cause.to_string()).or_default() += 1;
        }
        m.collisions += events.collisions.len() as u32;
        m.serenity_lost += events.collisions.iter().map(|c| c.serenity_damage).sum::<f64>();
        m.serenity_restored += events.serenity_restored;
        m.damage_dealt += events.damage_dealt;
        for event in &events.abilities {
            if matches!(event.kind, AbilityEventKind::Activated | AbilityEventKind::Fired) {
                *m.activations.entry(event.ability.name().to_string()).or_default() += 1;
            }
        }
    }

    /// Count a bought upgrade.
    pub fn record_upgrade(&mut self, kind: AbilityKind) {
        self.metrics.upgrades_bought += 1;
        tracing::debug!(ability = kind.name(), total = self.metrics.upgrades_bought, "Upgrade bought");
    }

    /// Fill in the end state and return the metrics.
    #[must_use]
    pub fn finish(mut self, sim: &Simulation) -> RunMetrics {
        let run = sim.run_state();
        let m = &mut self.metrics;
        m.waves_reached = m.waves_reached.max(run.wave);
        m.ticks_survived = sim.get_tick();
        m.game_over = run.game_over;
        m.final_serenity = run.serenity;
        m.final_insight = run.insight;
        m.ability_levels = AbilityKind::ALL
            .into_iter()
            .map(|kind| (kind.name().to_string(), sim.progression().level(kind)))
            .collect();
        m.final_state_hash = sim.state_hash();
        self.metrics
    }
}

/// Aggregate over a batch of runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs aggregated.
    pub runs: u32,
    /// Mean highest wave.
    pub mean_waves_reached: f64,
    /// Lowest highest wave.
    pub min_waves_reached: u32,
    /// Best highest wave.
    pub max_waves_reached: u32,
    /// Fraction of runs that hit the tick limit without game over.
    pub survival_rate: f64,
    /// Mean ticks processed.
    pub mean_ticks_survived: f64,
    /// Mean defeats per run.
    pub mean_defeats: f64,
    /// Mean upgrades bought per run.
    pub mean_upgrades: f64,
    /// Total defeats per cause across the batch.
    pub defeats_by_cause: BTreeMap<String, u32>,
}

impl BatchSummary {
    /// Summarize `runs`.
    #[must_use]
    pub fn from_runs(runs: &[RunMetrics]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }
        let n = runs.len() as f64;
        let mean = |f: fn(&RunMetrics) -> f64| runs.iter().map(f).sum::<f64>() / n;

        let mut defeats_by_cause = BTreeMap::new();
        for run in runs {
            for (cause, count) in &run.defeats_by_cause {
                *defeats_by_cause.entry(cause.clone()).or_default() += count;
            }
        }

        Self {
            runs: runs.len() as u32,
            mean_waves_reached: mean(|r| f64::from(r.waves_reached)),
            min_waves_reached: runs.iter().map(|r| r.waves_reached).min().unwrap_or(0),
            max_waves_reached: runs.iter().map(|r| r.waves_reached).max().unwrap_or(0),
            survival_rate: runs.iter().filter(|r| !r.game_over).count() as f64 / n,
            mean_ticks_survived: mean(|r| r.ticks_survived as f64),
            mean_defeats: mean(|r| f64::from(r.total_defeats())),
            mean_upgrades: mean(|r| f64::from(r.upgrades_bought)),
            defeats_by_cause,
        }
    }
}
