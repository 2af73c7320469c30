//! Core simulation loop.
//!
//! The simulation runs at a fixed tick rate and owns every piece of run
//! state: serenity, wave progression, stressors, status effects, ability
//! state machines and progression.
//!
//! # Tick order
//!
//! Each processed tick runs, in this exact order:
//! 1. **Waves** - start wave 1, or advance on timer expiry / early clear
//! 2. **Expiry** - drop timed status effects that ran out
//! 3. **Abilities** - advance the nine state machines
//! 4. **Effects** - apply ability damage and status effects
//! 5. **Movement** - move stressors and resolve defender collisions
//! 6. **Cleanup** - remove the dead, award insight, charge collisions, regenerate
//! 7. **Game over** - end the run at zero serenity
//!
//! Expiry runs before new effects are computed, and lethal ability damage
//! lands before the victim gets to move or collide.
//!
//! # Determinism
//!
//! - All randomness comes from the seeded [`SimRng`]
//! - Stressors are processed in id order; maps are ordered
//! - Same seed, config and inputs always produce the same [`Simulation::state_hash`]
//!
//! # Example
//!
//! ```
//! use serenity_core::config::SimConfig;
//! use serenity_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimConfig::default(), 42).unwrap();
//! let events = sim.tick();
//! assert_eq!(events.wave_started, Some(1));
//! assert_eq!(sim.run_state().wave, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::abilities::{
    AbilityContext, AbilityEvent, AbilityKind, AbilityOrchestrator, AbilityProgression, AbilityState, Branch,
};
use crate::config::SimConfig;
use crate::effects::{ApplyContext, Defeat, DefeatCause, EffectApplier};
use crate::error::{GameError, Result};
use crate::math::quantize;
use crate::movement::MovementRegistry;
use crate::rng::SimRng;
use crate::status_effects::StatusEffectResolver;
use crate::stressors::{Collision, HitResult, StressorId, StressorManager, StressorUpdateContext};

/// Ticks per second.
pub const TICK_RATE: u32 = 60;

/// Duration of one tick in seconds at pace 1.
pub const TICK_SECONDS: f64 = 1.0 / TICK_RATE as f64;

/// Top-level resources of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Current serenity, within `[0, max_serenity]`.
    pub serenity: f64,
    /// Serenity cap.
    pub max_serenity: f64,
    /// Upgrade currency.
    pub insight: u32,
    /// Current wave; 0 before the first tick.
    pub wave: u32,
    /// Seconds into the current wave.
    pub wave_timer: f64,
    /// Simulation speed multiplier.
    pub pace: f64,
    /// Ticks are skipped while paused.
    pub paused: bool,
    /// Serenity ran out.
    pub game_over: bool,
    /// Seed the run was started with.
    pub seed: u64,
}

impl RunState {
    fn new(config: &SimConfig, seed: u64) -> Self {
        Self {
            serenity: config.run.max_serenity,
            max_serenity: config.run.max_serenity,
            insight: config.run.starting_insight,
            wave: 0,
            wave_timer: 0.0,
            pace: config.run.pace,
            paused: false,
            game_over: false,
            seed,
        }
    }

    /// Serenity as a fraction of the cap.
    #[must_use]
    pub fn serenity_ratio(&self) -> f64 {
        if self.max_serenity > 0.0 {
            self.serenity / self.max_serenity
        } else {
            0.0
        }
    }
}

/// Partial update to [`RunState`]; `None` fields are left alone.
///
/// Serenity is clamped to `[0, max_serenity]` and a non-positive pace is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStateDelta {
    /// New serenity.
    pub serenity: Option<f64>,
    /// New insight.
    pub insight: Option<u32>,
    /// New wave number.
    pub wave: Option<u32>,
    /// New wave timer.
    pub wave_timer: Option<f64>,
    /// New pace.
    pub pace: Option<f64>,
    /// New pause flag.
    pub paused: Option<bool>,
    /// New game-over flag.
    pub game_over: Option<bool>,
}

/// An external input, as recorded by replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimInput {
    /// [`Simulation::upgrade_ability`].
    UpgradeAbility(AbilityKind),
    /// [`Simulation::choose_branch`].
    ChooseBranch {
        /// Ability.
        ability: AbilityKind,
        /// Threshold index (0, 1 or 2).
        threshold: usize,
        /// Chosen side.
        branch: Branch,
    },
    /// [`Simulation::damage_entity`].
    DamageEntity {
        /// Target.
        id: StressorId,
        /// Raw damage.
        amount: f64,
    },
    /// [`Simulation::apply_state_delta`].
    ApplyStateDelta(RunStateDelta),
    /// [`Simulation::set_paused`].
    SetPaused(bool),
}

/// Events generated during a simulation tick.
///
/// These are for the game layer (effects, sounds, UI); the simulation never
/// reads them back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Tick number after this tick.
    pub tick: u64,
    /// Wave that started this tick.
    pub wave_started: Option<u32>,
    /// Stressors spawned this tick.
    pub spawned: Vec<StressorId>,
    /// Stressors removed this tick.
    pub defeats: Vec<Defeat>,
    /// Stressors that reached the defender.
    pub collisions: Vec<Collision>,
    /// Ability transitions.
    pub abilities: Vec<AbilityEvent>,
    /// Serenity restored by abilities.
    pub serenity_restored: f64,
    /// Ability damage dealt.
    pub damage_dealt: f64,
    /// The run ended this tick.
    pub game_over: bool,
}

/// The core game simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    config: SimConfig,
    run: RunState,
    tick: u64,
    elapsed_ms: f64,
    rng: SimRng,
    stressors: StressorManager,
    effects: StatusEffectResolver,
    abilities: AbilityOrchestrator,
    progression: AbilityProgression,
    applier: EffectApplier,
    pending_defeats: Vec<Defeat>,
    #[serde(skip)]
    movement: MovementRegistry,
}

impl Simulation {
    /// Create a simulation for `config` seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the config fails validation.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, seed))
    }

    fn build(config: SimConfig, seed: u64) -> Self {
        Self {
            run: RunState::new(&config, seed),
            tick: 0,
            elapsed_ms: 0.0,
            rng: SimRng::new(seed),
            stressors: StressorManager::new(),
            effects: StatusEffectResolver::new(),
            abilities: AbilityOrchestrator::new(&config),
            progression: AbilityProgression::new(),
            applier: EffectApplier::new(),
            pending_defeats: Vec::new(),
            movement: MovementRegistry::standard(),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run resources.
    #[must_use]
    pub const fn run_state(&self) -> &RunState {
        &self.run
    }

    /// Number of processed ticks.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }

    /// Stressors.
    #[must_use]
    pub const fn stressors(&self) -> &StressorManager {
        &self.stressors
    }

    /// Status effects.
    #[must_use]
    pub const fn effects(&self) -> &StatusEffectResolver {
        &self.effects
    }

    /// Ability state machines.
    #[must_use]
    pub const fn abilities(&self) -> &AbilityOrchestrator {
        &self.abilities
    }

    /// Ability levels and branches.
    #[must_use]
    pub const fn progression(&self) -> &AbilityProgression {
        &self.progression
    }

    /// Movement strategies in use.
    #[must_use]
    pub const fn movement(&self) -> &MovementRegistry {
        &self.movement
    }

    /// Replace the movement strategies, e.g. to register a custom pattern.
    pub fn set_movement(&mut self, movement: MovementRegistry) {
        self.movement = movement;
    }

    /// Whether a tick would do anything.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.run.paused && !self.run.game_over
    }

    /// Advance the simulation by one tick.
    ///
    /// Paused or finished runs are left untouched and return empty events.
    pub fn tick(&mut self) -> TickEvents {
        if !self.is_running() {
            return TickEvents {
                tick: self.tick,
                ..TickEvents::default()
            };
        }

        let dt = TICK_SECONDS * self.run.pace;
        self.tick += 1;
        self.elapsed_ms += dt * 1000.0;
        let mut events = TickEvents {
            tick: self.tick,
            defeats: std::mem::take(&mut self.pending_defeats),
            ..TickEvents::default()
        };

        // 1. Waves
        self.run_wave_progression(dt, &mut events);

        // 2. Expiry
        self.effects.update(dt);

        // 3. Abilities
        let mut ability_ctx = AbilityContext {
            dt,
            serenity_ratio: self.run.serenity_ratio(),
            config: &self.config,
            levels: &self.progression,
            stressors: &self.stressors,
            rng: &mut self.rng,
        };
        events.abilities = self.abilities.update(&mut ability_ctx);

        // 4. Effects
        let apply_ctx = ApplyContext {
            config: &self.config,
            abilities: &self.abilities,
            levels: &self.progression,
            dt,
        };
        let report = self.applier.apply(&apply_ctx, &mut self.stressors, &mut self.effects);
        events.defeats.extend(report.defeats);
        events.damage_dealt = report.damage_dealt;
        if report.serenity_restored > 0.0 {
            events.serenity_restored = report.serenity_restored;
            self.apply_state_delta(RunStateDelta {
                serenity: Some(self.run.serenity + report.serenity_restored),
                ..RunStateDelta::default()
            });
        }

        // 5. Movement
        let update_ctx = StressorUpdateContext {
            config: &self.config,
            effects: &self.effects,
            movement: &self.movement,
            now: self.elapsed_ms / 1000.0,
            serenity: self.run.serenity,
            max_serenity: self.run.max_serenity,
            collision_scale: self.abilities.collision_scale(&self.config),
        };
        events.collisions = self.stressors.update(dt, &update_ctx, &mut self.rng);

        // 6. Cleanup
        self.run_cleanup(dt, &mut events);

        // 7. Game over
        if self.run.serenity <= 0.0 {
            self.apply_state_delta(RunStateDelta {
                game_over: Some(true),
                ..RunStateDelta::default()
            });
            events.game_over = true;
            tracing::info!(tick = self.tick, wave = self.run.wave, "Serenity depleted, run over");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn run_wave_progression(&mut self, dt: f64, events: &mut TickEvents) {
        if self.run.wave == 0 {
            self.start_wave(1, events);
            return;
        }
        let timer = self.run.wave_timer + dt;
        self.apply_state_delta(RunStateDelta {
            wave_timer: Some(timer),
            ..RunStateDelta::default()
        });

        let run = &self.config.run;
        let expired = timer >= run.wave_duration_seconds;
        let cleared = run.early_advance
            && timer >= run.early_advance_min_seconds
            && self.stressors.alive_count() == 0;
        if expired || cleared {
            self.start_wave(self.run.wave + 1, events);
        }
    }

    fn start_wave(&mut self, wave: u32, events: &mut TickEvents) {
        self.apply_state_delta(RunStateDelta {
            wave: Some(wave),
            wave_timer: Some(0.0),
            ..RunStateDelta::default()
        });
        let now = self.elapsed_ms / 1000.0;
        let spawned = self.stressors.spawn_wave(wave, &self.config, &mut self.rng, now);
        tracing::info!(wave, spawned = spawned.len(), tick = self.tick, "Wave started");
        events.wave_started = Some(wave);
        events.spawned.extend(spawned);
    }

    fn run_cleanup(&mut self, dt: f64, events: &mut TickEvents) {
        let known: BTreeSet<StressorId> = events.defeats.iter().map(|d| d.id).collect();
        for dead in self.stressors.remove_dead() {
            self.effects.clear_target(dead.id);
            if !known.contains(&dead.id) {
                events.defeats.push(Defeat {
                    id: dead.id,
                    kind: dead.kind,
                    cause: DefeatCause::Collision,
                });
            }
        }

        let reward: u32 = events
            .defeats
            .iter()
            .filter(|d| d.cause != DefeatCause::Collision)
            .map(|d| self.config.stressors.get(d.kind).insight_reward)
            .sum();

        let collision_damage: f64 = events.collisions.iter().map(|c| c.serenity_damage).sum();
        let mut serenity = self.run.serenity - collision_damage;
        if serenity > 0.0 {
            serenity += self.config.run.regen_per_second * dt;
        }

        self.apply_state_delta(RunStateDelta {
            serenity: Some(serenity),
            insight: (reward > 0).then(|| self.run.insight.saturating_add(reward)),
            ..RunStateDelta::default()
        });
    }

    /// The single write path for [`RunState`].
    pub fn apply_state_delta(&mut self, delta: RunStateDelta) {
        tracing::trace!(tick = self.tick, ?delta, "Run state delta");
        let run = &mut self.run;
        if let Some(serenity) = delta.serenity {
            run.serenity = if serenity.is_nan() {
                0.0
            } else {
                serenity.clamp(0.0, run.max_serenity)
            };
        }
        if let Some(insight) = delta.insight {
            run.insight = insight;
        }
        if let Some(wave) = delta.wave {
            run.wave = wave;
        }
        if let Some(timer) = delta.wave_timer {
            run.wave_timer = timer.max(0.0);
        }
        if let Some(pace) = delta.pace.filter(|p| *p > 0.0 && p.is_finite()) {
            run.pace = pace;
        }
        if let Some(paused) = delta.paused {
            run.paused = paused;
        }
        if let Some(game_over) = delta.game_over {
            run.game_over = game_over;
        }
    }

    /// Pause or resume the run.
    pub fn set_paused(&mut self, paused: bool) {
        self.apply_state_delta(RunStateDelta {
            paused: Some(paused),
            ..RunStateDelta::default()
        });
    }

    /// Deal raw `amount` damage to a stressor from outside the simulation.
    ///
    /// A kill is reported in the next tick's defeats and earns insight then.
    pub fn damage_entity(&mut self, id: StressorId, amount: f64) -> HitResult {
        let result = self.stressors.damage_stressor(id, amount);
        if result.is_lethal() {
            if let Some(stressor) = self.stressors.get(id) {
                self.pending_defeats.push(Defeat {
                    id,
                    kind: stressor.kind,
                    cause: DefeatCause::External,
                });
            }
        }
        result
    }

    /// Insight cost of the next level of `kind`, `None` at max level.
    #[must_use]
    pub fn upgrade_cost(&self, kind: AbilityKind) -> Option<u32> {
        self.progression.next_cost(kind, &self.config.progression)
    }

    /// Buy the next level of `kind`.
    ///
    /// Returns `false` and changes nothing when the ability is at max level
    /// or insight is short.
    pub fn upgrade_ability(&mut self, kind: AbilityKind) -> bool {
        let Some(cost) = self.upgrade_cost(kind) else {
            tracing::debug!(ability = kind.name(), "Upgrade rejected: max level");
            return false;
        };
        if cost > self.run.insight {
            tracing::debug!(ability = kind.name(), cost, insight = self.run.insight, "Upgrade rejected: insufficient insight");
            return false;
        }
        self.apply_state_delta(RunStateDelta {
            insight: Some(self.run.insight - cost),
            ..RunStateDelta::default()
        });
        self.progression.level_up(kind);
        tracing::debug!(ability = kind.name(), level = self.progression.level(kind), cost, "Ability upgraded");
        true
    }

    /// Choose a branch for `kind` at threshold `threshold` (0, 1 or 2).
    ///
    /// Returns `false` when the threshold level is not reached or the
    /// branch was already chosen.
    pub fn choose_branch(&mut self, kind: AbilityKind, threshold: usize, branch: Branch) -> bool {
        let chosen = self.progression.choose_branch(kind, threshold, branch);
        tracing::debug!(ability = kind.name(), threshold, ?branch, chosen, "Branch choice");
        chosen
    }

    /// Apply a recorded external input.
    pub fn apply_input(&mut self, input: &SimInput) {
        match *input {
            SimInput::UpgradeAbility(kind) => {
                self.upgrade_ability(kind);
            }
            SimInput::ChooseBranch {
                ability,
                threshold,
                branch,
            } => {
                self.choose_branch(ability, threshold, branch);
            }
            SimInput::DamageEntity { id, amount } => {
                self.damage_entity(id, amount);
            }
            SimInput::ApplyStateDelta(ref delta) => self.apply_state_delta(delta.clone()),
            SimInput::SetPaused(paused) => self.set_paused(paused),
        }
    }

    /// Swap in new tuning and rebuild the stateless components.
    ///
    /// Runtime state (stressors, timers, resources) is kept.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] and keeps the old config if the
    /// new one fails validation.
    pub fn reconfigure(&mut self, config: SimConfig) -> Result<()> {
        config.validate()?;
        self.run.max_serenity = config.run.max_serenity;
        self.run.serenity = self.run.serenity.min(self.run.max_serenity);
        self.config = config;
        self.movement = MovementRegistry::standard();
        tracing::info!(tick = self.tick, "Configuration replaced");
        Ok(())
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Floats are quantized to fixed-point before hashing. Two simulations
    /// with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        quantize(self.elapsed_ms).hash(&mut hasher);
        self.rng.state().hash(&mut hasher);

        let run = &self.run;
        quantize(run.serenity).hash(&mut hasher);
        quantize(run.max_serenity).hash(&mut hasher);
        run.insight.hash(&mut hasher);
        run.wave.hash(&mut hasher);
        quantize(run.wave_timer).hash(&mut hasher);
        quantize(run.pace).hash(&mut hasher);
        run.paused.hash(&mut hasher);
        run.game_over.hash(&mut hasher);

        self.stressors.all().len().hash(&mut hasher);
        for s in self.stressors.all() {
            s.id.hash(&mut hasher);
            s.kind.hash(&mut hasher);
            s.position.quantized().hash(&mut hasher);
            s.velocity.quantized().hash(&mut hasher);
            quantize(s.health).hash(&mut hasher);
            quantize(s.retreat_remaining).hash(&mut hasher);
            if let Some(orbit) = s.orbit {
                quantize(orbit.radius).hash(&mut hasher);
                quantize(orbit.dash_cooldown).hash(&mut hasher);
            }
        }

        for (target, list) in self.effects.iter() {
            target.hash(&mut hasher);
            for effect in list {
                effect.id.hash(&mut hasher);
                quantize(effect.value).hash(&mut hasher);
            }
        }

        for state in self.abilities.states() {
            hash_ability(state, &mut hasher);
        }
        self.progression.hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the simulation state for snapshots or replays.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize simulation: {e}")))
    }

    /// Deserialize simulation state from bytes.
    ///
    /// The movement registry is rebuilt with the standard strategies.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize simulation: {e}")))
    }
}

fn hash_ability(state: &AbilityState, hasher: &mut DefaultHasher) {
    state.kind().hash(hasher);
    state.is_active().hash(hasher);
    quantize(state.cooldown_remaining()).hash(hasher);
    match state {
        AbilityState::Breath(s) => quantize(s.progress()).hash(hasher),
        AbilityState::Ripple(s) => {
            s.activation().hash(hasher);
            quantize(s.radius()).hash(hasher);
        }
        AbilityState::Focus(s) => quantize(s.active_remaining()).hash(hasher),
        AbilityState::Echo(s) => {
            s.burst().hash(hasher);
            for wave in s.waves() {
                quantize(wave.radius).hash(hasher);
                quantize(wave.prev_radius).hash(hasher);
                quantize(wave.delay).hash(hasher);
            }
        }
        AbilityState::Barrier(s) => quantize(s.active_remaining()).hash(hasher),
        AbilityState::Beam(s) => s.target().hash(hasher),
        AbilityState::Field(s) => s.position().map(|p| p.quantized()).hash(hasher),
        AbilityState::Release(s) => s.times_fired().hash(hasher),
        AbilityState::Rhythm(s) => {
            s.phase().hash(hasher);
            quantize(s.phase_progress()).hash(hasher);
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::build(SimConfig::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::stressors::StressorKind;

    fn quiet_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.abilities = config.abilities.all_disabled();
        config
    }

    #[test]
    fn test_first_tick_starts_wave_one() {
        let mut sim = Simulation::new(SimConfig::default(), 7).unwrap();
        assert_eq!(sim.run_state().wave, 0);
        let events = sim.tick();
        assert_eq!(events.wave_started, Some(1));
        assert_eq!(events.spawned.len(), 5);
        assert_eq!(sim.get_tick(), 1);
        assert!(sim.stressors().all().iter().all(|s| s.kind == StressorKind::Worry));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimConfig::default();
        config.playfield.width = -1.0;
        assert!(Simulation::new(config, 1).is_err());
    }

    #[test]
    fn test_paused_tick_is_noop() {
        let mut sim = Simulation::new(SimConfig::default(), 7).unwrap();
        sim.tick();
        sim.set_paused(true);
        let hash = sim.state_hash();
        let events = sim.tick();
        assert_eq!(events, TickEvents { tick: 1, ..TickEvents::default() });
        assert_eq!(sim.state_hash(), hash);
        sim.set_paused(false);
        sim.tick();
        assert_eq!(sim.get_tick(), 2);
    }

    #[test]
    fn test_delta_clamps_serenity() {
        let mut sim = Simulation::default();
        sim.apply_state_delta(RunStateDelta {
            serenity: Some(500.0),
            pace: Some(-3.0),
            ..RunStateDelta::default()
        });
        assert_eq!(sim.run_state().serenity, 100.0);
        assert_eq!(sim.run_state().pace, 1.0);
        sim.apply_state_delta(RunStateDelta {
            serenity: Some(-5.0),
            ..RunStateDelta::default()
        });
        assert_eq!(sim.run_state().serenity, 0.0);
    }

    #[test]
    fn test_upgrade_requires_insight() {
        let mut sim = Simulation::default();
        assert!(!sim.upgrade_ability(AbilityKind::Ripple));
        assert_eq!(sim.progression().level(AbilityKind::Ripple), 0);

        sim.apply_state_delta(RunStateDelta {
            insight: Some(25),
            ..RunStateDelta::default()
        });
        assert!(sim.upgrade_ability(AbilityKind::Ripple));
        assert!(sim.upgrade_ability(AbilityKind::Ripple));
        assert_eq!(sim.run_state().insight, 0);
        assert_eq!(sim.progression().level(AbilityKind::Ripple), 2);
        assert!(!sim.upgrade_ability(AbilityKind::Ripple));
    }

    #[test]
    fn test_upgrade_stops_at_max_level() {
        let mut config = SimConfig::default();
        config.progression.max_level = 1;
        let mut sim = Simulation::new(config, 1).unwrap();
        sim.apply_state_delta(RunStateDelta {
            insight: Some(1_000),
            ..RunStateDelta::default()
        });
        assert!(sim.upgrade_ability(AbilityKind::Beam));
        assert!(!sim.upgrade_ability(AbilityKind::Beam));
        assert_eq!(sim.run_state().insight, 990);
    }

    #[test]
    fn test_branch_choice_after_threshold() {
        let mut sim = Simulation::default();
        sim.apply_state_delta(RunStateDelta {
            insight: Some(1_000),
            ..RunStateDelta::default()
        });
        assert!(!sim.choose_branch(AbilityKind::Field, 0, Branch::Left));
        for _ in 0..3 {
            assert!(sim.upgrade_ability(AbilityKind::Field));
        }
        assert!(sim.choose_branch(AbilityKind::Field, 0, Branch::Right));
        assert!(!sim.choose_branch(AbilityKind::Field, 0, Branch::Left));
        assert_eq!(sim.progression().record(AbilityKind::Field).branch(0), Some(Branch::Right));
    }

    #[test]
    fn test_external_kill_awards_insight_next_tick() {
        let mut sim = Simulation::new(quiet_config(), 3).unwrap();
        sim.tick();
        let id = sim.stressors().all()[0].id;
        assert_eq!(sim.damage_entity(id, 1_000.0), HitResult::Killed);
        assert_eq!(sim.damage_entity(id, 1_000.0), HitResult::AlreadyDead);
        let events = sim.tick();
        assert_eq!(events.defeats.len(), 1);
        assert_eq!(events.defeats[0].cause, DefeatCause::External);
        assert_eq!(sim.run_state().insight, 1);
        assert!(sim.stressors().get(id).is_none());
    }

    #[test]
    fn test_collision_drains_serenity_and_ends_run() {
        let mut config = quiet_config();
        config.run.max_serenity = 5.0;
        config.run.regen_per_second = 0.0;
        config.waves.base_speed = 300.0;
        let mut sim = Simulation::new(config, 11).unwrap();
        let mut ticks = 0;
        while sim.is_running() && ticks < 10_000 {
            sim.tick();
            ticks += 1;
        }
        assert!(sim.run_state().game_over);
        assert_eq!(sim.run_state().serenity, 0.0);
        let frozen = sim.state_hash();
        sim.tick();
        assert_eq!(sim.state_hash(), frozen);
    }

    #[test]
    fn test_wave_advances_early_when_clear() {
        let mut sim = Simulation::new(quiet_config(), 3).unwrap();
        sim.tick();
        let ids: Vec<_> = sim.stressors().all().iter().map(|s| s.id).collect();
        for id in ids {
            sim.damage_entity(id, 1_000.0);
        }
        let min_ticks = (sim.config().run.early_advance_min_seconds / TICK_SECONDS).ceil() as u64 + 2;
        for _ in 0..min_ticks {
            sim.tick();
        }
        assert_eq!(sim.run_state().wave, 2);
    }

    #[test]
    fn test_reconfigure_keeps_runtime_state() {
        let mut sim = Simulation::new(SimConfig::default(), 5).unwrap();
        for _ in 0..30 {
            sim.tick();
        }
        let alive = sim.stressors().alive_count();
        let mut config = sim.config().clone();
        config.abilities.beam.enabled = false;
        sim.reconfigure(config).unwrap();
        assert!(!sim.config().abilities.beam.enabled);
        assert_eq!(sim.stressors().alive_count(), alive);

        let mut bad = sim.config().clone();
        bad.run.pace = 0.0;
        assert!(sim.reconfigure(bad).is_err());
        assert!(!sim.config().abilities.beam.enabled);
    }

    #[test]
    fn test_serialize_roundtrip_preserves_hash() {
        let mut sim = Simulation::new(SimConfig::default(), 9).unwrap();
        for _ in 0..120 {
            sim.tick();
        }
        let bytes = sim.serialize().unwrap();
        let mut restored = Simulation::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), sim.state_hash());
        sim.tick();
        restored.tick();
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_release_restores_serenity() {
        let mut config = quiet_config();
        config.abilities.release.enabled = true;
        config.run.regen_per_second = 0.0;
        let mut sim = Simulation::new(config, 2).unwrap();
        sim.tick();
        sim.apply_state_delta(RunStateDelta {
            serenity: Some(20.0),
            ..RunStateDelta::default()
        });
        let events = sim.tick();
        assert_eq!(events.serenity_restored, 30.0);
        assert_eq!(sim.run_state().serenity, 50.0);
        assert!(events.defeats.iter().all(|d| d.cause == DefeatCause::Ability(AbilityKind::Release)));
    }

    #[test]
    fn test_stressors_stay_in_bounds() {
        let mut sim = Simulation::new(quiet_config(), 21).unwrap();
        let playfield = sim.config().playfield.clone();
        for _ in 0..600 {
            sim.tick();
            for s in sim.stressors().all() {
                let p: Vec2 = s.position;
                assert!(p.x >= playfield.padding && p.x <= playfield.width - playfield.padding);
                assert!(p.y >= playfield.padding && p.y <= playfield.height - playfield.padding);
            }
        }
    }
}
