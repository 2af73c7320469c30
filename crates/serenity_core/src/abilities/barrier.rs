use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::BarrierConfig;

/// Reactive barrier raised when serenity runs low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierState {
    cycle: ActivationCycle,
    just_activated: bool,
    radius: f64,
    health_fraction: f64,
}

impl BarrierState {
    pub(super) fn new() -> Self {
        Self {
            cycle: ActivationCycle::ready(),
            just_activated: false,
            radius: 0.0,
            health_fraction: 0.0,
        }
    }

    pub(super) fn update(
        &mut self,
        config: &BarrierConfig,
        level: u8,
        dt: f64,
        serenity_ratio: f64,
        events: &mut Vec<AbilityEvent>,
    ) {
        self.just_activated = false;
        self.cycle.tick(dt);
        if self.cycle.expired() {
            self.cycle.start_cooldown(config.cooldown_seconds);
            events.push(AbilityEvent::new(AbilityKind::Barrier, AbilityEventKind::Ended));
        }
        if self.cycle.is_ready() && serenity_ratio <= config.trigger_ratio {
            let level = f64::from(level);
            self.cycle.activate(config.duration_seconds);
            self.just_activated = true;
            self.radius = config.radius + level * config.radius_per_level;
            self.health_fraction = (config.health_fraction + level * config.fraction_per_level).clamp(0.0, 1.0);
            events.push(AbilityEvent::new(AbilityKind::Barrier, AbilityEventKind::Activated));
        }
    }

    /// Barrier is up.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cycle.is_active()
    }

    /// Barrier rose this tick.
    #[must_use]
    pub const fn just_activated(&self) -> bool {
        self.just_activated
    }

    /// Radius of the current (or last) barrier.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Fraction of current health dealt on activation.
    #[must_use]
    pub const fn health_fraction(&self) -> f64 {
        self.health_fraction
    }

    /// Active window left.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dormant_until_serenity_drops() {
        let config = BarrierConfig::default();
        let mut state = BarrierState::new();
        let mut events = Vec::new();
        state.update(&config, 0, 0.1, 0.9, &mut events);
        assert!(!state.is_active());

        state.update(&config, 2, 0.1, 0.35, &mut events);
        assert!(state.is_active());
        assert!(state.just_activated());
        assert_eq!(state.radius(), 136.0);
        assert!((state.health_fraction() - 0.36).abs() < 1e-9);

        state.update(&config, 2, 0.1, 0.35, &mut events);
        assert!(!state.just_activated());
    }

    #[test]
    fn test_cooldown_blocks_immediate_retrigger() {
        let config = BarrierConfig {
            duration_seconds: 0.5,
            ..BarrierConfig::default()
        };
        let mut state = BarrierState::new();
        let mut events = Vec::new();
        state.update(&config, 0, 0.1, 0.1, &mut events);
        for _ in 0..10 {
            state.update(&config, 0, 0.1, 0.1, &mut events);
        }
        assert!(!state.is_active());
        assert!(state.cooldown_remaining() > 0.0);
        assert_eq!(events.len(), 2);
    }
}
