use serde::{Deserialize, Serialize};

use crate::config::RhythmConfig;

/// Half of the rhythm cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmPhase {
    /// Ability damage boosted.
    Offense,
    /// Collision damage reduced.
    Defense,
}

/// Always-on offense/defense oscillator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmState {
    phase: RhythmPhase,
    timer: f64,
    phase_length: f64,
    bonus: f64,
}

impl RhythmState {
    pub(super) fn new(config: &RhythmConfig) -> Self {
        Self {
            phase: RhythmPhase::Offense,
            timer: 0.0,
            phase_length: config.cycle_seconds,
            bonus: config.bonus,
        }
    }

    pub(super) fn update(&mut self, config: &RhythmConfig, level: u8, dt: f64) {
        let level = f64::from(level);
        self.phase_length = config.cycle_seconds + level * config.cycle_per_level;
        self.bonus = config.bonus + level * config.bonus_per_level;
        if self.phase_length <= 0.0 {
            return;
        }
        self.timer += dt;
        while self.timer >= self.phase_length {
            self.timer -= self.phase_length;
            self.phase = match self.phase {
                RhythmPhase::Offense => RhythmPhase::Defense,
                RhythmPhase::Defense => RhythmPhase::Offense,
            };
            tracing::trace!(phase = ?self.phase, "Rhythm phase flipped");
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RhythmPhase {
        self.phase
    }

    /// Progress through the current phase, `0..1`.
    #[must_use]
    pub fn phase_progress(&self) -> f64 {
        (self.timer / self.phase_length).clamp(0.0, 1.0)
    }

    /// Bonus fraction for the current level.
    #[must_use]
    pub const fn bonus(&self) -> f64 {
        self.bonus
    }
}
