use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::BeamConfig;
use crate::math::Vec2;
use crate::modifiers::ScalingMode;
use crate::stressors::{StressorId, StressorManager};

/// Channelled beam locked onto the stressor nearest the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamState {
    cycle: ActivationCycle,
    target: Option<StressorId>,
    damage_per_second: f64,
}

impl BeamState {
    pub(super) fn new(config: &BeamConfig) -> Self {
        Self {
            cycle: ActivationCycle::cooling(config.cooldown_seconds),
            target: None,
            damage_per_second: 0.0,
        }
    }

    pub(super) fn update(
        &mut self,
        config: &BeamConfig,
        level: u8,
        dt: f64,
        stressors: &StressorManager,
        center: Vec2,
        events: &mut Vec<AbilityEvent>,
    ) {
        self.cycle.tick(dt);
        if self.cycle.expired() {
            self.end(config, events);
        } else if self.cycle.is_active() {
            let target_alive = self
                .target
                .and_then(|id| stressors.get(id))
                .is_some_and(|s| s.is_alive());
            if !target_alive {
                match stressors.nearest_to(center) {
                    Some(next) => {
                        tracing::trace!(from = ?self.target, to = next.id, "Beam retargeted");
                        self.target = Some(next.id);
                    }
                    None => self.end(config, events),
                }
            }
        }

        if self.cycle.is_ready() {
            if let Some(target) = stressors.nearest_to(center) {
                self.cycle.activate(config.duration_seconds);
                self.target = Some(target.id);
                self.damage_per_second =
                    ScalingMode::Additive.scale(config.damage_per_second, level, config.dps_per_level);
                events.push(AbilityEvent::new(AbilityKind::Beam, AbilityEventKind::Activated));
            }
        }
    }

    fn end(&mut self, config: &BeamConfig, events: &mut Vec<AbilityEvent>) {
        self.cycle.start_cooldown(config.cooldown_seconds);
        self.target = None;
        events.push(AbilityEvent::new(AbilityKind::Beam, AbilityEventKind::Ended));
    }

    /// Beam is channelling.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cycle.is_active()
    }

    /// Current target, while channelling.
    #[must_use]
    pub const fn target(&self) -> Option<StressorId> {
        self.target
    }

    /// Damage per second, level scaling already applied.
    #[must_use]
    pub const fn damage_per_second(&self) -> f64 {
        self.damage_per_second
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
    use crate::config::SimConfig;
    use crate::rng::SimRng;
    use crate::stressors::StressorKind;

    fn ready() -> BeamConfig {
        BeamConfig {
            cooldown_seconds: 0.0,
            ..BeamConfig::default()
        }
    }

    #[test]
    fn test_waits_for_a_target() {
        let config = ready();
        let mut state = BeamState::new(&config);
        let mut events = Vec::new();
        state.update(&config, 0, 0.1, &StressorManager::new(), Vec2::ZERO, &mut events);
        assert!(!state.is_active());
        assert!(events.is_empty());
    }

    #[test]
    fn test_acquires_nearest_and_retargets_on_death() {
        let sim_config = SimConfig::default();
        let center = sim_config.center();
        let mut rng = SimRng::new(1);
        let mut stressors = StressorManager::new();
        let near = stressors.spawn(StressorKind::Worry, center + Vec2::new(80.0, 0.0), 1, &sim_config, &mut rng, 0.0);
        let far = stressors.spawn(StressorKind::Worry, center + Vec2::new(200.0, 0.0), 1, &sim_config, &mut rng, 0.0);

        let config = ready();
        let mut state = BeamState::new(&config);
        let mut events = Vec::new();
        state.update(&config, 3, 0.1, &stressors, center, &mut events);
        assert_eq!(state.target(), Some(near));
        assert_eq!(state.damage_per_second(), 32.0);

        stressors.damage_stressor(near, 1_000.0);
        state.update(&config, 3, 0.1, &stressors, center, &mut events);
        assert_eq!(state.target(), Some(far));

        stressors.damage_stressor(far, 1_000.0);
        state.update(&config, 3, 0.1, &stressors, center, &mut events);
        assert!(!state.is_active());
        assert_eq!(state.target(), None);
        assert_eq!(events.last().map(|e| e.kind), Some(AbilityEventKind::Ended));
    }
}
