use serde::{Deserialize, Serialize};

use super::cycle::ActivationCycle;
use super::{AbilityEvent, AbilityEventKind, AbilityKind};
use crate::config::EchoConfig;
use crate::modifiers::ScalingMode;

/// One expanding ring of a burst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoWave {
    /// Position in its burst, from 0.
    pub index: u32,
    /// Seconds until the ring starts expanding.
    pub delay: f64,
    /// Current ring radius.
    pub radius: f64,
    /// Radius before this tick's expansion. The ring sweeps
    /// `prev_radius..=radius` each tick.
    pub prev_radius: f64,
    /// Radius at which the ring expires.
    pub max_radius: f64,
    /// Damage per hit, level scaling already applied.
    pub damage: f64,
}

impl EchoWave {
    /// Ring has started expanding.
    #[must_use]
    pub fn is_expanding(&self) -> bool {
        self.delay <= 0.0
    }
}

/// Burst of staggered expanding rings.
///
/// The cooldown only runs while no rings are out, and runs faster while
/// serenity is below the early-trigger threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoState {
    cycle: ActivationCycle,
    burst: u64,
    waves: Vec<EchoWave>,
}

impl EchoState {
    pub(super) fn new(config: &EchoConfig) -> Self {
        Self {
            cycle: ActivationCycle::cooling(config.cooldown_seconds),
            burst: 0,
            waves: Vec::new(),
        }
    }

    /// Rings per burst at `level`.
    #[must_use]
    pub fn wave_count(config: &EchoConfig, level: u8) -> u32 {
        let extra = if config.levels_per_extra_wave == 0 {
            0
        } else {
            u32::from(level / config.levels_per_extra_wave)
        };
        config.wave_count + extra
    }

    pub(super) fn update(
        &mut self,
        config: &EchoConfig,
        level: u8,
        dt: f64,
        serenity_ratio: f64,
        events: &mut Vec<AbilityEvent>,
    ) {
        if !self.waves.is_empty() {
            for wave in &mut self.waves {
                if wave.delay > 0.0 {
                    wave.delay -= dt;
                    continue;
                }
                wave.prev_radius = wave.radius;
                wave.radius = (wave.radius + config.expansion_speed * dt).min(wave.max_radius);
            }
            // A ring that reached max_radius this tick still strikes once.
            self.waves.retain(|wave| wave.prev_radius < wave.max_radius);
            if self.waves.is_empty() {
                events.push(AbilityEvent::new(AbilityKind::Echo, AbilityEventKind::Ended));
            }
            return;
        }

        let rate = if serenity_ratio < config.early_threshold {
            config.early_rate
        } else {
            1.0
        };
        self.cycle.tick(dt * rate);
        if self.cycle.is_ready() {
            self.spawn_burst(config, level);
            self.cycle.start_cooldown(config.cooldown_seconds);
            events.push(AbilityEvent::new(AbilityKind::Echo, AbilityEventKind::Activated));
        }
    }

    fn spawn_burst(&mut self, config: &EchoConfig, level: u8) {
        self.burst += 1;
        let damage = ScalingMode::Additive.scale(config.damage, level, config.damage_per_level);
        let count = Self::wave_count(config, level);
        self.waves = (0..count)
            .map(|index| EchoWave {
                index,
                delay: f64::from(index) * config.stagger_seconds,
                radius: 0.0,
                prev_radius: 0.0,
                max_radius: config.max_radius + f64::from(index) * config.radius_step,
                damage,
            })
            .collect();
    }

    /// Rings are out.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.waves.is_empty()
    }

    /// Rings of the current burst, including ones still delayed.
    #[must_use]
    pub fn waves(&self) -> &[EchoWave] {
        &self.waves
    }

    /// Number of the current (or last) burst; 0 before the first.
    #[must_use]
    pub const fn burst(&self) -> u64 {
        self.burst
    }

    /// Cooldown left, in unscaled seconds.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f64 {
        self.cycle.cooldown_remaining()
    }
}
