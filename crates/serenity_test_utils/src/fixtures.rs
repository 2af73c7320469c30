//! Test fixtures and helpers.
//!
//! Pre-built configs, simulations and a phase-by-phase harness for
//! consistent testing.

use serenity_core::abilities::{AbilityContext, AbilityKind, AbilityOrchestrator, AbilityProgression};
use serenity_core::config::SimConfig;
use serenity_core::effects::{ApplyContext, ApplyReport, EffectApplier};
use serenity_core::math::Vec2;
use serenity_core::rng::SimRng;
use serenity_core::simulation::{RunStateDelta, Simulation, TICK_SECONDS};
use serenity_core::status_effects::StatusEffectResolver;
use serenity_core::stressors::{StressorId, StressorKind, StressorManager};

/// Default tuning with every ability disabled.
#[must_use]
pub fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.abilities = config.abilities.all_disabled();
    config
}

/// Default tuning with only `kind` enabled.
#[must_use]
pub fn ability_only(kind: AbilityKind) -> SimConfig {
    let mut config = quiet_config();
    let a = &mut config.abilities;
    match kind {
        AbilityKind::Breath => a.breath.enabled = true,
        AbilityKind::Ripple => a.ripple.enabled = true,
        AbilityKind::Focus => a.focus.enabled = true,
        AbilityKind::Echo => a.echo.enabled = true,
        AbilityKind::Barrier => a.barrier.enabled = true,
        AbilityKind::Beam => a.beam.enabled = true,
        AbilityKind::Field => a.field.enabled = true,
        AbilityKind::Release => a.release.enabled = true,
        AbilityKind::Rhythm => a.rhythm.enabled = true,
    }
    config
}

/// Simulation with default tuning.
///
/// # Panics
///
/// Panics if the default config fails validation.
#[must_use]
pub fn default_simulation(seed: u64) -> Simulation {
    Simulation::new(SimConfig::default(), seed).expect("default config is valid")
}

/// Simulation ticked `ticks` times.
#[must_use]
pub fn simulation_after(seed: u64, ticks: u64) -> Simulation {
    let mut sim = default_simulation(seed);
    for _ in 0..ticks {
        sim.tick();
    }
    sim
}

/// Simulation with `insight` to spend.
#[must_use]
pub fn wealthy_simulation(seed: u64, insight: u32) -> Simulation {
    let mut sim = default_simulation(seed);
    sim.apply_state_delta(RunStateDelta {
        insight: Some(insight),
        ..RunStateDelta::default()
    });
    sim
}

/// Drives the ability and effect phases by hand around hand-placed
/// stressors.
///
/// Runs expiry, abilities and effects in tick order but skips movement, so
/// stressors stay exactly where they were put.
#[derive(Debug)]
pub struct AbilityHarness {
    /// Tuning.
    pub config: SimConfig,
    /// Ability state machines.
    pub abilities: AbilityOrchestrator,
    /// Ability levels.
    pub levels: AbilityProgression,
    /// Stressors.
    pub stressors: StressorManager,
    /// Status effects.
    pub effects: StatusEffectResolver,
    /// Effect applier.
    pub applier: EffectApplier,
    /// Randomness.
    pub rng: SimRng,
    /// Serenity ratio fed to the abilities.
    pub serenity_ratio: f64,
}

impl AbilityHarness {
    /// Harness for `config` at full serenity.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            abilities: AbilityOrchestrator::new(&config),
            levels: AbilityProgression::new(),
            stressors: StressorManager::new(),
            effects: StatusEffectResolver::new(),
            applier: EffectApplier::new(),
            rng: SimRng::new(0x5EED),
            serenity_ratio: 1.0,
            config,
        }
    }

    /// Spawn a wave-1 stressor at `offset` from the defender.
    pub fn spawn(&mut self, kind: StressorKind, offset: Vec2) -> StressorId {
        let position = self.config.center() + offset;
        self.stressors
            .spawn(kind, position, 1, &self.config, &mut self.rng, 0.0)
    }

    /// One tick of expiry, abilities and effects.
    pub fn step(&mut self) -> ApplyReport {
        self.step_by(TICK_SECONDS)
    }

    /// Same as [`AbilityHarness::step`] with a custom `dt`.
    pub fn step_by(&mut self, dt: f64) -> ApplyReport {
        self.effects.update(dt);
        let mut ctx = AbilityContext {
            dt,
            serenity_ratio: self.serenity_ratio,
            config: &self.config,
            levels: &self.levels,
            stressors: &self.stressors,
            rng: &mut self.rng,
        };
        self.abilities.update(&mut ctx);
        let apply_ctx = ApplyContext {
            config: &self.config,
            abilities: &self.abilities,
            levels: &self.levels,
            dt,
        };
        self.applier
            .apply(&apply_ctx, &mut self.stressors, &mut self.effects)
    }

    /// Health of `id`, zero when gone.
    #[must_use]
    pub fn health(&self, id: StressorId) -> f64 {
        self.stressors.get(id).map_or(0.0, |s| s.health)
    }
}
