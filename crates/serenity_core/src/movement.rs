//! Movement strategies, one per stressor movement pattern.
//!
//! Each strategy maps `(stressor, dt, context, effective_speed)` to a
//! velocity. `effective_speed` already has slows applied; strategies never
//! look at status effects. The only side effect a strategy may have is
//! drawing from the run RNG.
//!
//! Strategies are looked up through a [`MovementRegistry`] so a new pattern
//! is one new type plus one registration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MovementConfig;
use crate::math::Vec2;
use crate::rng::SimRng;
use crate::stressors::{OrbitState, Stressor};

/// How a stressor archetype moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Straight at the center.
    Direct,
    /// Inward with a sinusoidal sideways drift.
    Wobble,
    /// Orbit, then dash in.
    OrbitDash,
    /// Hesitate, lunge with jitter, flee when startled.
    Erratic,
    /// Faster as serenity runs low.
    TimePressure,
    /// Faster near the center and in crowds.
    Accelerating,
}

/// World state a strategy may read.
pub struct MovementContext<'a> {
    /// Defender position.
    pub center: Vec2,
    /// Simulation time in seconds.
    pub now: f64,
    /// Serenity / max serenity.
    pub serenity_ratio: f64,
    /// Same-kind stressors within the cascade radius (excluding self).
    pub kin_nearby: usize,
    /// Tuning.
    pub config: &'a MovementConfig,
    /// Run RNG.
    pub rng: &'a mut SimRng,
}

/// A movement strategy.
pub trait MovementBehavior: Send + Sync {
    /// Velocity for this tick.
    fn velocity(
        &self,
        stressor: &Stressor,
        dt: f64,
        ctx: &mut MovementContext<'_>,
        effective_speed: f64,
    ) -> Vec2;
}

fn inward(stressor: &Stressor, center: Vec2) -> Vec2 {
    (center - stressor.position).normalize()
}

/// Straight at the defender.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl MovementBehavior for Direct {
    fn velocity(&self, stressor: &Stressor, _dt: f64, ctx: &mut MovementContext<'_>, speed: f64) -> Vec2 {
        inward(stressor, ctx.center) * speed
    }
}

/// Inward with an oscillating perpendicular drift.
///
/// The inward component is always the full speed, so the drift never stalls
/// the approach.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wobble;

impl MovementBehavior for Wobble {
    fn velocity(&self, stressor: &Stressor, _dt: f64, ctx: &mut MovementContext<'_>, speed: f64) -> Vec2 {
        let dir = inward(stressor, ctx.center);
        let age = ctx.now - stressor.spawned_at;
        let phase = stressor.spawned_at * 1.7;
        let offset = (ctx.config.wobble_frequency * age + phase).sin() * ctx.config.wobble_amplitude;
        (dir + dir.perpendicular() * offset) * speed
    }
}

/// Phase of an orbit-dash stressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitPhase {
    /// Closing in on the orbit.
    Approach,
    /// Circling at the orbit radius.
    Orbit,
    /// Backing off after getting too close early.
    Recoil,
    /// Committed straight inward.
    Dash,
}

/// Band above the orbit radius still counted as orbiting.
const ORBIT_BAND: f64 = 1.1;

/// Current orbit phase, from distance and dash cooldown.
#[must_use]
pub fn orbit_phase(orbit: &OrbitState, distance: f64, config: &MovementConfig) -> OrbitPhase {
    if orbit.dash_cooldown <= 0.0 {
        OrbitPhase::Dash
    } else if distance > orbit.radius * ORBIT_BAND {
        OrbitPhase::Approach
    } else if distance < orbit.radius * config.orbit_too_close_fraction {
        OrbitPhase::Recoil
    } else {
        OrbitPhase::Orbit
    }
}

/// Orbit at a fixed radius, then dash in.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrbitDash;

impl MovementBehavior for OrbitDash {
    fn velocity(&self, stressor: &Stressor, _dt: f64, ctx: &mut MovementContext<'_>, speed: f64) -> Vec2 {
        let dir = inward(stressor, ctx.center);
        let Some(orbit) = stressor.orbit.as_ref() else {
            return dir * speed;
        };
        let distance = stressor.position.distance(ctx.center);
        match orbit_phase(orbit, distance, ctx.config) {
            OrbitPhase::Approach => dir * speed,
            OrbitPhase::Dash => dir * (speed * ctx.config.dash_multiplier),
            OrbitPhase::Recoil => -dir * speed,
            OrbitPhase::Orbit => {
                let tangent = if orbit.clockwise {
                    -dir.perpendicular()
                } else {
                    dir.perpendicular()
                };
                let correction = ((distance - orbit.radius) / orbit.radius).clamp(-1.0, 1.0);
                (tangent + dir * correction).normalize() * speed
            }
        }
    }
}

/// Hesitate, then lunge with a random heading jitter; flee while retreating.
#[derive(Debug, Clone, Copy, Default)]
pub struct Erratic;

impl MovementBehavior for Erratic {
    fn velocity(&self, stressor: &Stressor, _dt: f64, ctx: &mut MovementContext<'_>, speed: f64) -> Vec2 {
        let dir = inward(stressor, ctx.center);
        if stressor.is_retreating() {
            return -dir * speed;
        }
        let cfg = ctx.config;
        let age = (ctx.now - stressor.spawned_at).max(0.0);
        if age % cfg.erratic_cycle_seconds < cfg.erratic_hesitation_seconds {
            return dir * (speed * cfg.erratic_hesitation_speed);
        }
        let deviation = ctx
            .rng
            .range_f64(-cfg.erratic_max_deviation, cfg.erratic_max_deviation);
        dir.rotate(deviation) * speed
    }
}

/// Direct approach that speeds up as serenity drops below a threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimePressure;

/// Speed multiplier for a serenity ratio.
#[must_use]
pub fn pressure_multiplier(serenity_ratio: f64, config: &MovementConfig) -> f64 {
    let threshold = config.pressure_threshold;
    if threshold <= 0.0 || serenity_ratio >= threshold {
        return 1.0;
    }
    let urgency = ((threshold - serenity_ratio) / threshold).clamp(0.0, 1.0);
    1.0 + (config.pressure_max_multiplier - 1.0) * urgency
}

impl MovementBehavior for TimePressure {
    fn velocity(&self, stressor: &Stressor, _dt: f64, ctx: &mut MovementContext<'_>, speed: f64) -> Vec2 {
        let multiplier = pressure_multiplier(ctx.serenity_ratio, ctx.config);
        inward(stressor, ctx.center) * (speed * multiplier)
    }
}

/// Direct approach that speeds up near the center and among kin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accelerating;

/// Speed multiplier for a distance to center and a kin count.
#[must_use]
pub fn acceleration_multiplier(distance: f64, kin_nearby: usize, config: &MovementConfig) -> f64 {
    let proximity = if config.accel_ramp_distance > 0.0 {
        (1.0 - distance / config.accel_ramp_distance).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let ramp = 1.0 + (config.accel_max_multiplier - 1.0) * proximity;
    let cascade = (config.cascade_bonus_per_neighbor * kin_nearby as f64).min(config.cascade_max_bonus);
    ramp + cascade
}

impl MovementBehavior for Accelerating {
    fn velocity(&self, stressor: &Stressor, _dt: f64, ctx: &mut MovementContext<'_>, speed: f64) -> Vec2 {
        let distance = stressor.position.distance(ctx.center);
        let multiplier = acceleration_multiplier(distance, ctx.kin_nearby, ctx.config);
        inward(stressor, ctx.center) * (speed * multiplier)
    }
}

/// Lookup from movement pattern to strategy.
#[derive(Clone)]
pub struct MovementRegistry {
    behaviors: BTreeMap<MovementPattern, Arc<dyn MovementBehavior>>,
}

impl MovementRegistry {
    /// Empty registry; every pattern falls back to [`Direct`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            behaviors: BTreeMap::new(),
        }
    }

    /// Registry with the built-in strategy for every pattern.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(MovementPattern::Direct, Direct);
        registry.register(MovementPattern::Wobble, Wobble);
        registry.register(MovementPattern::OrbitDash, OrbitDash);
        registry.register(MovementPattern::Erratic, Erratic);
        registry.register(MovementPattern::TimePressure, TimePressure);
        registry.register(MovementPattern::Accelerating, Accelerating);
        registry
    }

    /// Register or replace the strategy for `pattern`.
    pub fn register(&mut self, pattern: MovementPattern, behavior: impl MovementBehavior + 'static) {
        self.behaviors.insert(pattern, Arc::new(behavior));
    }

    /// Whether `pattern` has a registered strategy.
    #[must_use]
    pub fn contains(&self, pattern: MovementPattern) -> bool {
        self.behaviors.contains_key(&pattern)
    }

    /// Velocity from the strategy registered for `pattern`.
    pub fn velocity(
        &self,
        pattern: MovementPattern,
        stressor: &Stressor,
        dt: f64,
        ctx: &mut MovementContext<'_>,
        effective_speed: f64,
    ) -> Vec2 {
        match self.behaviors.get(&pattern) {
            Some(behavior) => behavior.velocity(stressor, dt, ctx, effective_speed),
            None => Direct.velocity(stressor, dt, ctx, effective_speed),
        }
    }
}

impl Default for MovementRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for MovementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementRegistry")
            .field("patterns", &self.behaviors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stressors::StressorKind;

    const CENTER: Vec2 = Vec2::new(600.0, 400.0);

    fn stressor_at(kind: StressorKind, position: Vec2) -> Stressor {
        Stressor::new(1, kind, position, 10.0, 40.0, 12.0, 0.0)
    }

    fn ctx<'a>(config: &'a MovementConfig, rng: &'a mut SimRng) -> MovementContext<'a> {
        MovementContext {
            center: CENTER,
            now: 1.0,
            serenity_ratio: 1.0,
            kin_nearby: 0,
            config,
            rng,
        }
    }

    #[test]
    fn test_direct_points_at_center() {
        let config = MovementConfig::default();
        let mut rng = SimRng::new(1);
        let s = stressor_at(StressorKind::Worry, Vec2::new(100.0, 400.0));
        let v = Direct.velocity(&s, 0.016, &mut ctx(&config, &mut rng), 40.0);
        assert!((v.x - 40.0).abs() < 1e-9);
        assert!(v.y.abs() < 1e-9);
    }

    #[test]
    fn test_wobble_keeps_full_inward_component() {
        let config = MovementConfig::default();
        let mut rng = SimRng::new(1);
        let s = stressor_at(StressorKind::Anxiety, Vec2::new(100.0, 100.0));
        let dir = (CENTER - s.position).normalize();
        let mut c = ctx(&config, &mut rng);
        for step in 0..50 {
            c.now = f64::from(step) * 0.1;
            let v = Wobble.velocity(&s, 0.1, &mut c, 40.0);
            assert!((v.dot(dir) - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_orbit_phases() {
        let config = MovementConfig::default();
        let orbit = OrbitState {
            radius: 200.0,
            clockwise: false,
            dash_cooldown: 1.0,
        };
        assert_eq!(orbit_phase(&orbit, 400.0, &config), OrbitPhase::Approach);
        assert_eq!(orbit_phase(&orbit, 200.0, &config), OrbitPhase::Orbit);
        assert_eq!(orbit_phase(&orbit, 50.0, &config), OrbitPhase::Recoil);
        let ready = OrbitState {
            dash_cooldown: 0.0,
            ..orbit
        };
        assert_eq!(orbit_phase(&ready, 200.0, &config), OrbitPhase::Dash);
    }

    #[test]
    fn test_orbit_direction_follows_flag() {
        let config = MovementConfig::default();
        let mut rng = SimRng::new(1);
        let mut s = stressor_at(StressorKind::Rumination, CENTER + Vec2::new(200.0, 0.0));
        s.orbit = Some(OrbitState {
            radius: 200.0,
            clockwise: false,
            dash_cooldown: 2.0,
        });
        let ccw = OrbitDash.velocity(&s, 0.1, &mut ctx(&config, &mut rng), 40.0);
        if let Some(orbit) = s.orbit.as_mut() {
            orbit.clockwise = true;
        }
        let cw = OrbitDash.velocity(&s, 0.1, &mut ctx(&config, &mut rng), 40.0);
        assert!(ccw.y * cw.y < 0.0);
    }

    #[test]
    fn test_erratic_hesitates_then_retreats() {
        let config = MovementConfig::default();
        let mut rng = SimRng::new(1);
        let mut s = stressor_at(StressorKind::Panic, Vec2::new(100.0, 400.0));
        let mut c = ctx(&config, &mut rng);
        c.now = 0.1;
        let hesitating = Erratic.velocity(&s, 0.1, &mut c, 40.0);
        assert!(hesitating.length() < 40.0 * 0.1);

        s.retreat_remaining = 1.0;
        let fleeing = Erratic.velocity(&s, 0.1, &mut c, 40.0);
        assert!(fleeing.x < 0.0);
    }

    #[test]
    fn test_pressure_ramp() {
        let config = MovementConfig::default();
        assert_eq!(pressure_multiplier(1.0, &config), 1.0);
        assert_eq!(pressure_multiplier(0.5, &config), 1.0);
        assert!((pressure_multiplier(0.25, &config) - 1.5).abs() < 1e-12);
        assert!((pressure_multiplier(0.0, &config) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_acceleration_ramp_and_cascade() {
        let config = MovementConfig::default();
        assert_eq!(acceleration_multiplier(1000.0, 0, &config), 1.0);
        assert!((acceleration_multiplier(200.0, 0, &config) - 1.5).abs() < 1e-12);
        assert!((acceleration_multiplier(1000.0, 2, &config) - 1.2).abs() < 1e-12);
        assert!((acceleration_multiplier(1000.0, 50, &config) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_registry_falls_back_to_direct() {
        let config = MovementConfig::default();
        let mut rng = SimRng::new(1);
        let registry = MovementRegistry::empty();
        assert!(!registry.contains(MovementPattern::Wobble));
        let s = stressor_at(StressorKind::Anxiety, Vec2::new(100.0, 400.0));
        let v = registry.velocity(MovementPattern::Wobble, &s, 0.1, &mut ctx(&config, &mut rng), 40.0);
        assert!((v.x - 40.0).abs() < 1e-9);
        assert!(MovementRegistry::standard().contains(MovementPattern::Accelerating));
    }
}
