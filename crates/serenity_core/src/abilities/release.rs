use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::ReleaseConfig;

/// One-shot release that fires when serenity runs low.
///
/// `fired` is true for exactly the tick it goes off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseState {
    cycle: ActivationCycle,
    fired: bool,
    times_fired: u32,
}

impl ReleaseState {
    pub(super) fn new() -> Self {
        Self {
            cycle: ActivationCycle::ready(),
            fired: false,
            times_fired: 0,
        }
    }

    pub(super) fn update(
        &mut self,
        config: &ReleaseConfig,
        dt: f64,
        serenity_ratio: f64,
        events: &mut Vec<AbilityEvent>,
    ) {
        self.fired = false;
        self.cycle.tick(dt);
        if self.cycle.is_ready() && serenity_ratio <= config.trigger_ratio {
            self.fired = true;
            self.times_fired += 1;
            self.cycle.start_cooldown(config.cooldown_seconds);
            events.push(AbilityEvent::new(AbilityKind::Release, AbilityEventKind::Fired));
        }
    }

    /// Went off this tick.
    #[must_use]
    pub const fn fired(&self) -> bool {
        self.fired
    }

    /// Times fired this run.
    #[must_use]
    pub const fn times_fired(&self) -> u32 {
        self.times_fired
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
    fn test_fires_only_at_low_serenity() {
        let config = ReleaseConfig::default();
        let mut state = ReleaseState::new();
        let mut events = Vec::new();

        state.update(&config, 0.1, 0.9, &mut events);
        assert!(!state.fired());
        assert!(events.is_empty());

        state.update(&config, 0.1, config.trigger_ratio, &mut events);
        assert!(state.fired());
        assert_eq!(state.times_fired(), 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AbilityEventKind::Fired);
    }

    #[test]
    fn test_fired_lasts_one_tick() {
        let config = ReleaseConfig::default();
        let mut state = ReleaseState::new();
        let mut events = Vec::new();
        state.update(&config, 0.1, 0.1, &mut events);
        assert!(state.fired());
        state.update(&config, 0.1, 0.1, &mut events);
        assert!(!state.fired());
    }

    #[test]
    fn test_cooldown_blocks_refire() {
        let config = ReleaseConfig {
            cooldown_seconds: 1.0,
            ..ReleaseConfig::default()
        };
        let mut state = ReleaseState::new();
        let mut events = Vec::new();
        state.update(&config, 0.1, 0.1, &mut events);
        assert_eq!(state.cooldown_remaining(), 1.0);

        for _ in 0..5 {
            state.update(&config, 0.1, 0.1, &mut events);
        }
        assert_eq!(state.times_fired(), 1);

        state.update(&config, 0.6, 0.1, &mut events);
        assert!(state.fired());
        assert_eq!(state.times_fired(), 2);
        assert_eq!(events.len(), 2);
    }
}
