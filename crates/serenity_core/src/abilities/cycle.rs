//! Cooldown / active timer shared by the timed abilities.

use serde::{Deserialize, Serialize};

/// Where an ability is in its activation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CyclePhase {
    /// Cooldown done; waiting for a trigger.
    Ready,
    /// Counting down to ready.
    Cooldown,
    /// Running its active window.
    Active,
}

/// Cooldown -> active -> cooldown timer.
///
/// The owning state machine decides when to activate and what cooldown to
/// start; the cycle only counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationCycle {
    phase: CyclePhase,
    remaining: f64,
    elapsed: f64,
}

impl ActivationCycle {
    /// Ready to fire immediately.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            phase: CyclePhase::Ready,
            remaining: 0.0,
            elapsed: 0.0,
        }
    }

    /// Cooling down for `seconds`.
    #[must_use]
    pub fn cooling(seconds: f64) -> Self {
        let mut cycle = Self::ready();
        cycle.start_cooldown(seconds);
        cycle
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Seconds left in the current cooldown or active window.
    #[must_use]
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Seconds since activation, while active.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Cooldown finished.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == CyclePhase::Ready
    }

    /// In the active window.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == CyclePhase::Active
    }

    /// Active window used up; the owner should start the cooldown.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.is_active() && self.remaining <= 0.0
    }

    /// Cooldown left, zero unless cooling down.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f64 {
        if self.phase == CyclePhase::Cooldown {
            self.remaining
        } else {
            0.0
        }
    }

    /// Advance by `dt` seconds. A finished cooldown becomes [`CyclePhase::Ready`].
    pub fn tick(&mut self, dt: f64) {
        match self.phase {
            CyclePhase::Ready => {}
            CyclePhase::Cooldown => {
                self.remaining -= dt;
                if self.remaining <= 0.0 {
                    self.phase = CyclePhase::Ready;
                    self.remaining = 0.0;
                }
            }
            CyclePhase::Active => {
                self.remaining -= dt;
                self.elapsed += dt;
            }
        }
    }

    /// Enter the active window for `duration` seconds.
    pub fn activate(&mut self, duration: f64) {
        self.phase = CyclePhase::Active;
        self.remaining = duration;
        self.elapsed = 0.0;
    }

    /// Start a cooldown; a non-positive cooldown is immediately ready.
    pub fn start_cooldown(&mut self, seconds: f64) {
        self.elapsed = 0.0;
        if seconds > 0.0 {
            self.phase = CyclePhase::Cooldown;
            self.remaining = seconds;
        } else {
            self.phase = CyclePhase::Ready;
            self.remaining = 0.0;
        }
    }
}
