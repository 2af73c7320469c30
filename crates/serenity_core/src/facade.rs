//! Single mediator between the simulation and its consumers.
//!
//! Rendering, audio and UI talk to the simulation only through
//! [`GameFacade`]: read-only snapshots of resources, stressors and
//! abilities, plus a deliberately small mutation surface
//! ([`GameFacade::damage_entity`] and [`GameFacade::apply_state_delta`]).
//!
//! Snapshots are owned copies so a consumer can hold them across ticks
//! without borrowing the simulation.

use crate::abilities::{AbilityKind, AbilityState, BreathPhase, EchoWave, RhythmPhase};
use crate::error::{GameError, Result};
use crate::math::Vec2;
use crate::simulation::{RunState, RunStateDelta, Simulation};
use crate::stressors::{HitResult, Stressor, StressorId, StressorKind};

/// Read-only view of one stressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressorView {
    /// Stressor id.
    pub id: StressorId,
    /// Archetype.
    pub kind: StressorKind,
    /// Current position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Current health.
    pub health: f64,
    /// Health at spawn.
    pub max_health: f64,
    /// Collision radius.
    pub size: f64,
    /// Speed after status effects.
    pub speed: f64,
    /// Currently fleeing.
    pub retreating: bool,
}

/// Read-only view of one ability.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityView {
    /// Ability.
    pub kind: AbilityKind,
    /// Enabled in the current config.
    pub enabled: bool,
    /// Doing something this tick.
    pub active: bool,
    /// Purchased level.
    pub level: u8,
    /// Cooldown left in seconds.
    pub cooldown_remaining: f64,
    /// Area radius, for abilities with one area that is currently shown.
    pub radius: Option<f64>,
    /// Area center when it is not the defender.
    pub position: Option<Vec2>,
    /// Locked target.
    pub target: Option<StressorId>,
    /// Cycle or phase progress in `0..1`.
    pub progress: Option<f64>,
}

/// Everything a consumer may see or do.
pub trait GameFacade {
    /// Current resources.
    fn resources(&self) -> RunState;

    /// Processed ticks.
    fn current_tick(&self) -> u64;

    /// Every live stressor, in id order.
    fn stressor_snapshot(&self) -> Vec<StressorView>;

    /// One stressor.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StressorNotFound`] if `id` is not alive.
    fn stressor(&self, id: StressorId) -> Result<StressorView>;

    /// One ability.
    fn ability(&self, kind: AbilityKind) -> AbilityView;

    /// All abilities, in [`AbilityKind::ALL`] order.
    fn ability_snapshot(&self) -> Vec<AbilityView> {
        AbilityKind::ALL.iter().map(|&kind| self.ability(kind)).collect()
    }

    /// Breath direction.
    fn breath_phase(&self) -> Option<BreathPhase>;

    /// Rhythm half-cycle.
    fn rhythm_phase(&self) -> Option<RhythmPhase>;

    /// Echo rings currently in flight.
    fn echo_waves(&self) -> Vec<EchoWave>;

    /// Deal damage from outside the simulation.
    fn damage_entity(&mut self, id: StressorId, amount: f64) -> HitResult;

    /// Patch the run resources.
    fn apply_state_delta(&mut self, delta: RunStateDelta);
}

impl Simulation {
    fn view_of(&self, stressor: &Stressor) -> StressorView {
        StressorView {
            id: stressor.id,
            kind: stressor.kind,
            position: stressor.position,
            velocity: stressor.velocity,
            health: stressor.health,
            max_health: stressor.max_health,
            size: stressor.size,
            speed: self.effects().effective_speed(stressor.base_speed, stressor.id),
            retreating: stressor.is_retreating(),
        }
    }
}

impl GameFacade for Simulation {
    fn resources(&self) -> RunState {
        self.run_state().clone()
    }

    fn current_tick(&self) -> u64 {
        self.get_tick()
    }

    fn stressor_snapshot(&self) -> Vec<StressorView> {
        self.stressors().alive().map(|s| self.view_of(s)).collect()
    }

    fn stressor(&self, id: StressorId) -> Result<StressorView> {
        self.stressors()
            .get(id)
            .filter(|s| s.is_alive())
            .map(|s| self.view_of(s))
            .ok_or(GameError::StressorNotFound(id))
    }

    fn ability(&self, kind: AbilityKind) -> AbilityView {
        let config = self.config();
        let state = self.abilities().state(kind);
        let mut view = AbilityView {
            kind,
            enabled: kind.enabled(config),
            active: state.is_active(),
            level: self.progression().level(kind),
            cooldown_remaining: state.cooldown_remaining(),
            radius: None,
            position: None,
            target: None,
            progress: None,
        };
        match state {
            AbilityState::Breath(s) => {
                view.radius = Some(s.radius());
                view.progress = Some(s.progress());
            }
            AbilityState::Ripple(s) => view.radius = s.is_active().then(|| s.radius()),
            AbilityState::Barrier(s) => view.radius = s.is_active().then(|| s.radius()),
            AbilityState::Beam(s) => view.target = s.target(),
            AbilityState::Field(s) => {
                view.position = s.position();
                view.radius = s.position().map(|_| config.abilities.field.radius);
            }
            AbilityState::Release(s) => view.radius = s.fired().then_some(config.abilities.release.radius),
            AbilityState::Rhythm(s) => view.progress = Some(s.phase_progress()),
            AbilityState::Focus(_) | AbilityState::Echo(_) => {}
        }
        view
    }

    fn breath_phase(&self) -> Option<BreathPhase> {
        self.abilities().breath().map(|b| b.phase())
    }

    fn rhythm_phase(&self) -> Option<RhythmPhase> {
        self.abilities().rhythm().map(|r| r.phase())
    }

    fn echo_waves(&self) -> Vec<EchoWave> {
        self.abilities()
            .echo()
            .map(|e| e.waves().iter().filter(|w| w.is_expanding()).cloned().collect())
            .unwrap_or_default()
    }

    fn damage_entity(&mut self, id: StressorId, amount: f64) -> HitResult {
        Simulation::damage_entity(self, id, amount)
    }

    fn apply_state_delta(&mut self, delta: RunStateDelta) {
        Simulation::apply_state_delta(self, delta);
    }
}
