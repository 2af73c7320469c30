use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::RippleConfig;

/// Periodic pulse whose radius grows linearly over its active window.
///
/// Every activation gets a new number so the applier can remember which
/// stressors the current pulse already hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RippleState {
    cycle: ActivationCycle,
    activation: u64,
    radius: f64,
    max_radius: f64,
    slow: f64,
}

impl RippleState {
    pub(super) fn new(config: &RippleConfig) -> Self {
        Self {
            cycle: ActivationCycle::cooling(config.cooldown_seconds),
            activation: 0,
            radius: 0.0,
            max_radius: config.max_radius,
            slow: config.slow,
        }
    }

    pub(super) fn update(
        &mut self,
        config: &RippleConfig,
        level: u8,
        dt: f64,
        events: &mut Vec<AbilityEvent>,
    ) {
        self.cycle.tick(dt);
        if self.cycle.expired() {
            self.cycle.start_cooldown(config.cooldown_seconds);
            self.radius = 0.0;
            events.push(AbilityEvent::new(AbilityKind::Ripple, AbilityEventKind::Ended));
        }
        if self.cycle.is_ready() {
            let level = f64::from(level);
            self.cycle.activate(config.duration_seconds);
            self.activation += 1;
            self.max_radius = config.max_radius + level * config.radius_per_level;
            self.slow = (config.slow - level * config.slow_per_level).max(config.min_slow);
            events.push(AbilityEvent::new(AbilityKind::Ripple, AbilityEventKind::Activated));
        }
        if self.cycle.is_active() {
            let t = (self.cycle.elapsed() / config.duration_seconds).clamp(0.0, 1.0);
            self.radius = self.max_radius * t;
        }
    }

    /// Pulse is expanding.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cycle.is_active()
    }

    /// Current pulse radius, zero between pulses.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Slow multiplier of the current pulse.
    #[must_use]
    pub const fn slow(&self) -> f64 {
        self.slow
    }

    /// Number of the current (or last) pulse; 0 before the first.
    #[must_use]
    pub const fn activation(&self) -> u64 {
        self.activation
    }

    /// Cooldown left.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f64 {
        self.cycle.cooldown_remaining()
    }
}
