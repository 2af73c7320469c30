use serde::{Deserialize, Serialize};

use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::BreathConfig;

/// Half of the breath cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreathPhase {
    /// Radius growing.
    Inhale,
    /// Radius shrinking.
    Exhale,
}

/// Continuous aura whose radius follows a smooth inhale/exhale cycle.
///
/// Progress runs `0..1` over one cycle; the radius peaks at `0.5`, where a
/// one-tick peak pulse is raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathState {
    elapsed: f64,
    progress: f64,
    radius: f64,
    peaked: bool,
}

impl BreathState {
    pub(super) fn new(config: &BreathConfig) -> Self {
        Self {
            elapsed: 0.0,
            progress: 0.0,
            radius: config.min_radius,
            peaked: false,
        }
    }

    pub(super) fn update(
        &mut self,
        config: &BreathConfig,
        level: u8,
        dt: f64,
        events: &mut Vec<AbilityEvent>,
    ) {
        let cycle = config.cycle_seconds;
        let peaks_before = ((self.elapsed + cycle / 2.0) / cycle).floor();
        self.elapsed += dt;
        let peaks_after = ((self.elapsed + cycle / 2.0) / cycle).floor();
        self.progress = (self.elapsed % cycle) / cycle;

        self.peaked = peaks_after > peaks_before;
        if self.peaked {
            events.push(AbilityEvent::new(AbilityKind::Breath, AbilityEventKind::Peaked));
        }

        let full = config.max_radius + f64::from(level) * config.radius_per_level;
        let fullness = (1.0 - (std::f64::consts::TAU * self.progress).cos()) / 2.0;
        self.radius = config.min_radius + (full - config.min_radius) * fullness;
    }

    /// Cycle progress in `0..1`.
    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> BreathPhase {
        if self.progress < 0.5 {
            BreathPhase::Inhale
        } else {
            BreathPhase::Exhale
        }
    }

    /// Current aura radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Peak was reached this tick.
    #[must_use]
    pub const fn peaked(&self) -> bool {
        self.peaked
    }
}
