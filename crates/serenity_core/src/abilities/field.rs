use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::{FieldConfig, SimConfig};
use crate::math::Vec2;
use crate::rng::SimRng;
use crate::stressors::clamp_to_playfield;

/// Slowing field dropped at a random spot in a ring around the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    cycle: ActivationCycle,
    position: Option<Vec2>,
}

impl FieldState {
    pub(super) fn new(config: &FieldConfig) -> Self {
        Self {
            cycle: ActivationCycle::cooling(config.cooldown_seconds),
            position: None,
        }
    }

    pub(super) fn update(
        &mut self,
        sim: &SimConfig,
        dt: f64,
        rng: &mut SimRng,
        events: &mut Vec<AbilityEvent>,
    ) {
        let config = &sim.abilities.field;
        self.cycle.tick(dt);
        if self.cycle.expired() {
            self.cycle.start_cooldown(config.cooldown_seconds);
            self.position = None;
            events.push(AbilityEvent::new(AbilityKind::Field, AbilityEventKind::Ended));
        }
        if self.cycle.is_ready() {
            let angle = rng.range_f64(0.0, TAU);
            let distance = rng.range_f64(config.min_distance, config.max_distance);
            let position = sim.center() + Vec2::from_angle(angle) * distance;
            self.position = Some(clamp_to_playfield(position, &sim.playfield));
            self.cycle.activate(config.duration_seconds);
            events.push(AbilityEvent::new(AbilityKind::Field, AbilityEventKind::Activated));
        }
    }

    /// Field is down.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cycle.is_active()
    }

    /// Field center, while active.
    #[must_use]
    pub const fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Lifetime left.
    #[must_use]
    pub fn active_remaining(&self) -> f64 {
        if self.is_active() {
            self.cycle.remaining()
        } else {
            0.0
        }
    }

    /// Cooldown left.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f64 {
        self.cycle.cooldown_remaining()
    }
}
