use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::FocusConfig;

/// Timed global damage amplifier that re-arms itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusState {
    cycle: ActivationCycle,
    amplifier: f64,
}

impl FocusState {
    pub(super) fn new(config: &FocusConfig) -> Self {
        Self {
            cycle: ActivationCycle::cooling(config.cooldown_seconds),
            amplifier: config.amplifier,
        }
    }

    pub(super) fn update(
        &mut self,
        config: &FocusConfig,
        level: u8,
        dt: f64,
        events: &mut Vec<AbilityEvent>,
    ) {
        self.cycle.tick(dt);
        if self.cycle.expired() {
            self.cycle.start_cooldown(config.cooldown_seconds);
            events.push(AbilityEvent::new(AbilityKind::Focus, AbilityEventKind::Ended));
        }
        if self.cycle.is_ready() {
            self.cycle.activate(config.duration_seconds);
            self.amplifier = config.amplifier + f64::from(level) * config.amplifier_per_level;
            events.push(AbilityEvent::new(AbilityKind::Focus, AbilityEventKind::Activated));
        }
    }

    /// Amplifier window is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cycle.is_active()
    }

    /// Damage multiplier now: the level-scaled amplifier while active, 1.0 otherwise.
    #[must_use]
    pub fn amplifier(&self) -> f64 {
        if self.is_active() {
            self.amplifier
        } else {
            1.0
        }
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
    fn test_retriggers_after_cooldown() {
        let config = FocusConfig {
            cooldown_seconds: 1.0,
            duration_seconds: 1.0,
            ..FocusConfig::default()
        };
        let mut state = FocusState::new(&config);
        let mut events = Vec::new();
        let mut activations = 0;
        for _ in 0..40 {
            state.update(&config, 4, 0.1, &mut events);
        }
        for event in &events {
            if event.kind == AbilityEventKind::Activated {
                activations += 1;
            }
        }
        assert_eq!(activations, 2);
    }

    #[test]
    fn test_amplifier_scales_with_level_only_while_active() {
        let config = FocusConfig {
            cooldown_seconds: 0.0,
            ..FocusConfig::default()
        };
        let mut state = FocusState::new(&config);
        assert_eq!(state.amplifier(), 1.0);
        state.update(&config, 4, 0.1, &mut Vec::new());
        assert!((state.amplifier() - 1.7).abs() < 1e-9);
        assert_eq!(state.active_remaining(), config.duration_seconds);
    }
}
