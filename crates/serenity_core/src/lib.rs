//! # Serenity Core
//!
//! Deterministic simulation core for the Serenity wave-defense game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No wall clock
//! - No system randomness (everything flows from one seeded [`rng::SimRng`])
//!
//! This separation enables:
//! - Headless batch runs and balance sweeps
//! - Replays and snapshots
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Run orchestrator and fixed tick loop
//! - [`stressors`] - Hostile entities, spawning and collisions
//! - [`movement`] - Pluggable movement strategies
//! - [`abilities`] - The nine ability state machines and progression
//! - [`effects`] - Turns ability state into damage and status effects
//! - [`status_effects`] - Stackable, expiring modifiers
//! - [`modifiers`] - Damage calculator
//! - [`facade`] - Read/mutate surface for consumers
//! - [`replay`] - Input recording and verified playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod config;
pub mod effects;
pub mod error;
pub mod facade;
pub mod math;
pub mod modifiers;
pub mod movement;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod status_effects;
pub mod stressors;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::{AbilityEvent, AbilityEventKind, AbilityKind, AbilityOrchestrator, Branch};
    pub use crate::config::SimConfig;
    pub use crate::effects::{Defeat, DefeatCause};
    pub use crate::error::{GameError, Result};
    pub use crate::facade::{AbilityView, GameFacade, StressorView};
    pub use crate::math::Vec2;
    pub use crate::replay::{Replay, ReplayPlayer, ReplayRecorder};
    pub use crate::rng::SimRng;
    pub use crate::simulation::{RunState, RunStateDelta, SimInput, Simulation, TickEvents, TICK_RATE};
    pub use crate::status_effects::{EffectKind, EffectSource, StackingRule, StatusEffect, StatusEffectResolver};
    pub use crate::stressors::{HitResult, Stressor, StressorId, StressorKind};
}
