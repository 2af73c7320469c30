//! The nine ability state machines and their orchestrator.
//!
//! Each ability is one variant of [`AbilityState`] with its own transition
//! function. The [`AbilityOrchestrator`] holds them in a fixed array and
//! advances them uniformly once per tick; nothing else mutates their timers.
//! Other systems read them through the query methods.
//!
//! Values derived from the ability level (radius, amplifier, pre-scaled
//! damage) are captured when a state machine activates or updates, so the
//! query surface never needs the level.

mod barrier;
mod beam;
mod breath;
mod cycle;
mod echo;
mod field;
mod focus;
pub mod progression;
mod release;
mod rhythm;
mod ripple;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::rng::SimRng;
use crate::stressors::StressorManager;

pub use barrier::BarrierState;
pub use beam::BeamState;
pub use breath::{BreathPhase, BreathState};
pub use cycle::{ActivationCycle, CyclePhase};
pub use echo::{EchoState, EchoWave};
pub use field::FieldState;
pub use focus::FocusState;
pub use progression::{upgrade_cost, AbilityProgression, AbilityRecord, Branch, BRANCH_THRESHOLDS};
pub use release::ReleaseState;
pub use rhythm::{RhythmPhase, RhythmState};
pub use ripple::RippleState;

/// The nine abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Always-on inhale/exhale aura.
    Breath,
    /// Periodic expanding slow pulse.
    Ripple,
    /// Timed global damage amplifier.
    Focus,
    /// Staggered burst of expanding rings.
    Echo,
    /// Low-serenity barrier.
    Barrier,
    /// Channelled single-target beam.
    Beam,
    /// Randomly placed slowing field.
    Field,
    /// Low-serenity one-shot release.
    Release,
    /// Offense/defense oscillator.
    Rhythm,
}

impl AbilityKind {
    /// Every ability, in update order.
    pub const ALL: [AbilityKind; 9] = [
        AbilityKind::Breath,
        AbilityKind::Ripple,
        AbilityKind::Focus,
        AbilityKind::Echo,
        AbilityKind::Barrier,
        AbilityKind::Beam,
        AbilityKind::Field,
        AbilityKind::Release,
        AbilityKind::Rhythm,
    ];

    /// Position in [`AbilityKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, matching the config field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AbilityKind::Breath => "breath",
            AbilityKind::Ripple => "ripple",
            AbilityKind::Focus => "focus",
            AbilityKind::Echo => "echo",
            AbilityKind::Barrier => "barrier",
            AbilityKind::Beam => "beam",
            AbilityKind::Field => "field",
            AbilityKind::Release => "release",
            AbilityKind::Rhythm => "rhythm",
        }
    }

    /// Look up an ability by its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the config enables this ability.
    #[must_use]
    pub fn enabled(self, config: &SimConfig) -> bool {
        let a = &config.abilities;
        match self {
            AbilityKind::Breath => a.breath.enabled,
            AbilityKind::Ripple => a.ripple.enabled,
            AbilityKind::Focus => a.focus.enabled,
            AbilityKind::Echo => a.echo.enabled,
            AbilityKind::Barrier => a.barrier.enabled,
            AbilityKind::Beam => a.beam.enabled,
            AbilityKind::Field => a.field.enabled,
            AbilityKind::Release => a.release.enabled,
            AbilityKind::Rhythm => a.rhythm.enabled,
        }
    }
}

/// What happened to an ability this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityEventKind {
    /// Entered its active window.
    Activated,
    /// Left its active window.
    Ended,
    /// Breath reached full inhale.
    Peaked,
    /// A one-shot fired.
    Fired,
}

/// Ability transition reported to the game layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityEvent {
    /// Which ability.
    pub ability: AbilityKind,
    /// What happened.
    pub kind: AbilityEventKind,
}

impl AbilityEvent {
    pub(crate) const fn new(ability: AbilityKind, kind: AbilityEventKind) -> Self {
        Self { ability, kind }
    }
}

/// World state the state machines read while advancing.
pub struct AbilityContext<'a> {
    /// Seconds advanced this tick.
    pub dt: f64,
    /// Serenity / max serenity.
    pub serenity_ratio: f64,
    /// Full configuration.
    pub config: &'a SimConfig,
    /// Ability levels.
    pub levels: &'a AbilityProgression,
    /// Live stressors, for targeting.
    pub stressors: &'a StressorManager,
    /// Run RNG, for placement.
    pub rng: &'a mut SimRng,
}

/// Runtime state of one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbilityState {
    /// See [`BreathState`].
    Breath(BreathState),
    /// See [`RippleState`].
    Ripple(RippleState),
    /// See [`FocusState`].
    Focus(FocusState),
    /// See [`EchoState`].
    Echo(EchoState),
    /// See [`BarrierState`].
    Barrier(BarrierState),
    /// See [`BeamState`].
    Beam(BeamState),
    /// See [`FieldState`].
    Field(FieldState),
    /// See [`ReleaseState`].
    Release(ReleaseState),
    /// See [`RhythmState`].
    Rhythm(RhythmState),
}

impl AbilityState {
    /// Fresh state for `kind`.
    #[must_use]
    pub fn new(kind: AbilityKind, config: &SimConfig) -> Self {
        let a = &config.abilities;
        match kind {
            AbilityKind::Breath => Self::Breath(BreathState::new(&a.breath)),
            AbilityKind::Ripple => Self::Ripple(RippleState::new(&a.ripple)),
            AbilityKind::Focus => Self::Focus(FocusState::new(&a.focus)),
            AbilityKind::Echo => Self::Echo(EchoState::new(&a.echo)),
            AbilityKind::Barrier => Self::Barrier(BarrierState::new()),
            AbilityKind::Beam => Self::Beam(BeamState::new(&a.beam)),
            AbilityKind::Field => Self::Field(FieldState::new(&a.field)),
            AbilityKind::Release => Self::Release(ReleaseState::new()),
            AbilityKind::Rhythm => Self::Rhythm(RhythmState::new(&a.rhythm)),
        }
    }

    /// Which ability this is.
    #[must_use]
    pub const fn kind(&self) -> AbilityKind {
        match self {
            Self::Breath(_) => AbilityKind::Breath,
            Self::Ripple(_) => AbilityKind::Ripple,
            Self::Focus(_) => AbilityKind::Focus,
            Self::Echo(_) => AbilityKind::Echo,
            Self::Barrier(_) => AbilityKind::Barrier,
            Self::Beam(_) => AbilityKind::Beam,
            Self::Field(_) => AbilityKind::Field,
            Self::Release(_) => AbilityKind::Release,
            Self::Rhythm(_) => AbilityKind::Rhythm,
        }
    }

    /// Currently doing something to the world.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::Breath(_) | Self::Rhythm(_) => true,
            Self::Ripple(s) => s.is_active(),
            Self::Focus(s) => s.is_active(),
            Self::Echo(s) => s.is_active(),
            Self::Barrier(s) => s.is_active(),
            Self::Beam(s) => s.is_active(),
            Self::Field(s) => s.is_active(),
            Self::Release(s) => s.fired(),
        }
    }

    /// Cooldown left in seconds; zero for continuous abilities.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f64 {
        match self {
            Self::Breath(_) | Self::Rhythm(_) => 0.0,
            Self::Ripple(s) => s.cooldown_remaining(),
            Self::Focus(s) => s.cooldown_remaining(),
            Self::Echo(s) => s.cooldown_remaining(),
            Self::Barrier(s) => s.cooldown_remaining(),
            Self::Beam(s) => s.cooldown_remaining(),
            Self::Field(s) => s.cooldown_remaining(),
            Self::Release(s) => s.cooldown_remaining(),
        }
    }

    fn update(&mut self, ctx: &mut AbilityContext<'_>, events: &mut Vec<AbilityEvent>) {
        let level = ctx.levels.level(self.kind());
        let config = ctx.config;
        let a = &config.abilities;
        let (dt, ratio) = (ctx.dt, ctx.serenity_ratio);
        match self {
            Self::Breath(s) => s.update(&a.breath, level, dt, events),
            Self::Ripple(s) => s.update(&a.ripple, level, dt, events),
            Self::Focus(s) => s.update(&a.focus, level, dt, events),
            Self::Echo(s) => s.update(&a.echo, level, dt, ratio, events),
            Self::Barrier(s) => s.update(&a.barrier, level, dt, ratio, events),
            Self::Beam(s) => s.update(&a.beam, level, dt, ctx.stressors, config.center(), events),
            Self::Field(s) => s.update(config, dt, ctx.rng, events),
            Self::Release(s) => s.update(&a.release, dt, ratio, events),
            Self::Rhythm(s) => s.update(&a.rhythm, level, dt),
        }
    }
}

macro_rules! state_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(&self) -> Option<&$ty> {
            match self.state(AbilityKind::$variant) {
                AbilityState::$variant(state) => Some(state),
                _ => None,
            }
        }
    };
}

/// Owner and driver of all nine ability state machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityOrchestrator {
    states: [AbilityState; 9],
}

impl AbilityOrchestrator {
    /// Fresh state for every ability.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            states: AbilityKind::ALL.map(|kind| AbilityState::new(kind, config)),
        }
    }

    /// Advance every enabled ability by one tick.
    ///
    /// A disabled ability is frozen; if it was active it is reset and an
    /// [`AbilityEventKind::Ended`] is reported.
    pub fn update(&mut self, ctx: &mut AbilityContext<'_>) -> Vec<AbilityEvent> {
        let mut events = Vec::new();
        for state in &mut self.states {
            let kind = state.kind();
            if kind.enabled(ctx.config) {
                state.update(ctx, &mut events);
            } else if state.is_active() && !matches!(state, AbilityState::Breath(_) | AbilityState::Rhythm(_)) {
                *state = AbilityState::new(kind, ctx.config);
                events.push(AbilityEvent::new(kind, AbilityEventKind::Ended));
            }
        }
        for event in &events {
            tracing::debug!(ability = event.ability.name(), event = ?event.kind, "Ability transition");
        }
        events
    }

    /// State of `kind`.
    #[must_use]
    pub fn state(&self, kind: AbilityKind) -> &AbilityState {
        &self.states[kind.index()]
    }

    /// All states, in [`AbilityKind::ALL`] order.
    #[must_use]
    pub fn states(&self) -> &[AbilityState] {
        &self.states
    }

    /// Whether `kind` is doing something this tick.
    #[must_use]
    pub fn is_active(&self, kind: AbilityKind) -> bool {
        self.state(kind).is_active()
    }

    /// Cooldown left on `kind`.
    #[must_use]
    pub fn cooldown_remaining(&self, kind: AbilityKind) -> f64 {
        self.state(kind).cooldown_remaining()
    }

    state_accessor!(
        /// Breath state.
        breath, Breath, BreathState
    );
    state_accessor!(
        /// Ripple state.
        ripple, Ripple, RippleState
    );
    state_accessor!(
        /// Focus state.
        focus, Focus, FocusState
    );
    state_accessor!(
        /// Echo state.
        echo, Echo, EchoState
    );
    state_accessor!(
        /// Barrier state.
        barrier, Barrier, BarrierState
    );
    state_accessor!(
        /// Beam state.
        beam, Beam, BeamState
    );
    state_accessor!(
        /// Field state.
        field, Field, FieldState
    );
    state_accessor!(
        /// Release state.
        release, Release, ReleaseState
    );
    state_accessor!(
        /// Rhythm state.
        rhythm, Rhythm, RhythmState
    );

    /// Global damage multiplier (Focus), 1.0 when inactive.
    #[must_use]
    pub fn amplifier(&self, config: &SimConfig) -> f64 {
        match self.focus() {
            Some(focus) if config.abilities.focus.enabled => focus.amplifier(),
            _ => 1.0,
        }
    }

    /// Damage bonus while Rhythm is in its offense phase.
    #[must_use]
    pub fn phase_bonus(&self, config: &SimConfig) -> Option<f64> {
        if !config.abilities.rhythm.enabled {
            return None;
        }
        self.rhythm()
            .filter(|rhythm| rhythm.phase() == RhythmPhase::Offense)
            .map(RhythmState::bonus)
    }

    /// Multiplier on collision damage from Barrier and Rhythm's defense phase.
    #[must_use]
    pub fn collision_scale(&self, config: &SimConfig) -> f64 {
        let mut scale = 1.0;
        if self.barrier().is_some_and(BarrierState::is_active) {
            scale *= 1.0 - config.abilities.barrier.absorb;
        }
        if config.abilities.rhythm.enabled {
            if let Some(rhythm) = self.rhythm().filter(|r| r.phase() == RhythmPhase::Defense) {
                scale *= 1.0 - rhythm.bonus();
            }
        }
        scale.clamp(0.0, 1.0)
    }
}
