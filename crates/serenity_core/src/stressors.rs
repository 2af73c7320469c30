//! Stressor lifecycle: wave spawning, movement, collisions and death.
//!
//! Stressors are stored in spawn order, which is also id order, so every
//! pass over them is deterministic.
//!
//! # Per-tick update
//!
//! For each live stressor, in id order:
//! 1. Collision with the defender is checked *before* moving. A colliding
//!    stressor costs serenity (only while serenity remains), dies, and does
//!    not move this tick.
//! 2. Otherwise the movement strategy for its archetype produces a velocity
//!    from the slowed effective speed.
//! 3. Velocity magnitude is capped, then the position is integrated and
//!    clamped inside the padded playfield.
//!
//! Dead stressors are filtered out at the end of the tick by
//! [`StressorManager::remove_dead`].

use serde::{Deserialize, Serialize};

use crate::config::{PlayfieldConfig, SimConfig, WaveConfig};
use crate::math::Vec2;
use crate::movement::{orbit_phase, MovementContext, MovementPattern, MovementRegistry, OrbitPhase};
use crate::rng::SimRng;
use crate::status_effects::StatusEffectResolver;

/// Unique identifier for a spawned stressor.
pub type StressorId = u64;

/// Stressor archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StressorKind {
    /// Plain direct approach.
    Worry,
    /// Wobbling approach.
    Anxiety,
    /// Orbits, then dashes.
    Rumination,
    /// Erratic, startles easily.
    Panic,
    /// Rushes when serenity is low.
    Deadline,
    /// Accelerates near the center and in crowds.
    Overwhelm,
    /// Resistant and shields its kin.
    Doubt,
    /// Heavy and shields its kin.
    Dread,
}

impl StressorKind {
    /// Every archetype, in unlock order.
    pub const ALL: [StressorKind; 8] = [
        StressorKind::Worry,
        StressorKind::Anxiety,
        StressorKind::Rumination,
        StressorKind::Panic,
        StressorKind::Deadline,
        StressorKind::Overwhelm,
        StressorKind::Doubt,
        StressorKind::Dread,
    ];

    /// Movement strategy for this archetype.
    #[must_use]
    pub const fn movement(self) -> MovementPattern {
        match self {
            StressorKind::Worry | StressorKind::Doubt | StressorKind::Dread => {
                MovementPattern::Direct
            }
            StressorKind::Anxiety => MovementPattern::Wobble,
            StressorKind::Rumination => MovementPattern::OrbitDash,
            StressorKind::Panic => MovementPattern::Erratic,
            StressorKind::Deadline => MovementPattern::TimePressure,
            StressorKind::Overwhelm => MovementPattern::Accelerating,
        }
    }

    /// Lowercase name, matching the config table field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            StressorKind::Worry => "worry",
            StressorKind::Anxiety => "anxiety",
            StressorKind::Rumination => "rumination",
            StressorKind::Panic => "panic",
            StressorKind::Deadline => "deadline",
            StressorKind::Overwhelm => "overwhelm",
            StressorKind::Doubt => "doubt",
            StressorKind::Dread => "dread",
        }
    }
}

/// Orbit-dash bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitState {
    /// Orbit radius around the center.
    pub radius: f64,
    /// Orbit direction.
    pub clockwise: bool,
    /// Orbiting time left before the dash.
    pub dash_cooldown: f64,
}

/// A hostile entity converging on the defender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stressor {
    /// Unique id.
    pub id: StressorId,
    /// Archetype.
    pub kind: StressorKind,
    /// World position.
    pub position: Vec2,
    /// Velocity from the last update.
    pub velocity: Vec2,
    /// Current health.
    pub health: f64,
    /// Health at spawn.
    pub max_health: f64,
    /// Collision radius.
    pub size: f64,
    /// Speed before slows.
    pub base_speed: f64,
    /// Simulation time at spawn, in seconds.
    pub spawned_at: f64,
    /// Orbit-dash state, for orbiting archetypes.
    pub orbit: Option<OrbitState>,
    /// Seconds of retreat left.
    pub retreat_remaining: f64,
}

impl Stressor {
    /// Create a stressor at rest.
    #[must_use]
    pub fn new(
        id: StressorId,
        kind: StressorKind,
        position: Vec2,
        health: f64,
        base_speed: f64,
        size: f64,
        spawned_at: f64,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            health,
            max_health: health,
            size,
            base_speed,
            spawned_at,
            orbit: None,
            retreat_remaining: 0.0,
        }
    }

    /// Still in play.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Fleeing from the center.
    #[must_use]
    pub fn is_retreating(&self) -> bool {
        self.retreat_remaining > 0.0
    }
}

/// Outcome of a damage call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitResult {
    /// Damage applied, stressor still alive.
    Survived {
        /// Health left.
        remaining: f64,
    },
    /// This hit was lethal.
    Killed,
    /// Target was already dead or gone; nothing changed.
    AlreadyDead,
}

impl HitResult {
    /// Target is dead after the call.
    #[must_use]
    pub const fn is_dead(self) -> bool {
        !matches!(self, HitResult::Survived { .. })
    }

    /// This call caused the death.
    #[must_use]
    pub const fn is_lethal(self) -> bool {
        matches!(self, HitResult::Killed)
    }
}

/// A stressor reaching the defender.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Colliding stressor.
    pub id: StressorId,
    /// Its archetype.
    pub kind: StressorKind,
    /// Serenity lost.
    pub serenity_damage: f64,
}

/// Read-only inputs to a movement pass.
pub struct StressorUpdateContext<'a> {
    /// Full configuration.
    pub config: &'a SimConfig,
    /// Slow lookup.
    pub effects: &'a StatusEffectResolver,
    /// Strategy lookup.
    pub movement: &'a MovementRegistry,
    /// Simulation time in seconds.
    pub now: f64,
    /// Current serenity.
    pub serenity: f64,
    /// Maximum serenity.
    pub max_serenity: f64,
    /// Multiplier on collision damage (barrier, defense phase).
    pub collision_scale: f64,
}

/// Wave spawn count: `floor(base_count * count_multiplier^(wave - 1))`.
#[must_use]
pub fn wave_spawn_count(config: &WaveConfig, wave: u32) -> usize {
    if wave == 0 {
        return 0;
    }
    let exponent = i32::try_from(wave - 1).unwrap_or(i32::MAX);
    let count = (config.base_count * config.count_multiplier.powi(exponent)).floor();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}

/// Per-wave growth factor `scaling^(wave - 1)`.
#[must_use]
pub fn wave_scale(scaling: f64, wave: u32) -> f64 {
    let exponent = i32::try_from(wave.saturating_sub(1)).unwrap_or(i32::MAX);
    scaling.powi(exponent)
}

/// Owner of every live stressor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressorManager {
    stressors: Vec<Stressor>,
    next_id: StressorId,
}

impl StressorManager {
    /// Empty manager; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stressors: Vec::new(),
            next_id: 1,
        }
    }

    /// Live and just-killed stressors, in id order.
    #[must_use]
    pub fn all(&self) -> &[Stressor] {
        &self.stressors
    }

    /// Stressors with health above zero.
    pub fn alive(&self) -> impl Iterator<Item = &Stressor> {
        self.stressors.iter().filter(|s| s.is_alive())
    }

    /// Number of stressors with health above zero.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    /// Look up a stressor.
    #[must_use]
    pub fn get(&self, id: StressorId) -> Option<&Stressor> {
        self.index_of(id).map(|index| &self.stressors[index])
    }

    /// Live stressor nearest to `point`; ties go to the lower id.
    #[must_use]
    pub fn nearest_to(&self, point: Vec2) -> Option<&Stressor> {
        self.alive().fold(None, |best: Option<&Stressor>, s| match best {
            Some(b) if b.position.distance_squared(point) <= s.position.distance_squared(point) => Some(b),
            _ => Some(s),
        })
    }

    /// Ids of live stressors within `radius` of `point`, in id order.
    #[must_use]
    pub fn ids_within(&self, point: Vec2, radius: f64) -> Vec<StressorId> {
        let radius_sq = radius * radius;
        self.alive()
            .filter(|s| s.position.distance_squared(point) <= radius_sq)
            .map(|s| s.id)
            .collect()
    }

    /// Mutable access to a stressor.
    pub fn get_mut(&mut self, id: StressorId) -> Option<&mut Stressor> {
        self.index_of(id).map(|index| &mut self.stressors[index])
    }

    fn index_of(&self, id: StressorId) -> Option<usize> {
        self.stressors.binary_search_by_key(&id, |s| s.id).ok()
    }

    /// Spawn the stressors for `wave` on the playfield edges.
    pub fn spawn_wave(&mut self, wave: u32, config: &SimConfig, rng: &mut SimRng, now: f64) -> Vec<StressorId> {
        let unlocked = config.stressors.unlocked(wave);
        if unlocked.is_empty() {
            return Vec::new();
        }
        let count = wave_spawn_count(&config.waves, wave);
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = unlocked[rng.index(unlocked.len())];
            let position = edge_spawn_point(&config.playfield, rng);
            spawned.push(self.spawn(kind, position, wave, config, rng, now));
        }
        tracing::debug!(wave, count = spawned.len(), "Spawned wave");
        spawned
    }

    /// Spawn a single stressor of `kind` at `position` with `wave` scaling.
    pub fn spawn(
        &mut self,
        kind: StressorKind,
        position: Vec2,
        wave: u32,
        config: &SimConfig,
        rng: &mut SimRng,
        now: f64,
    ) -> StressorId {
        let archetype = config.stressors.get(kind);
        let waves = &config.waves;
        let health = waves.base_health * archetype.health * wave_scale(waves.health_scaling, wave);
        let speed = waves.base_speed * archetype.speed * wave_scale(waves.speed_scaling, wave);
        let size = waves.base_size * archetype.size;

        let id = self.next_id.max(1);
        self.next_id = id + 1;

        let mut stressor = Stressor::new(id, kind, position, health, speed, size, now);
        stressor.velocity = (config.center() - position).normalize() * speed;
        if kind.movement() == MovementPattern::OrbitDash {
            let movement = &config.movement;
            stressor.orbit = Some(OrbitState {
                radius: rng.range_f64(movement.orbit_radius_min, movement.orbit_radius_max),
                clockwise: id % 2 == 1,
                dash_cooldown: movement.dash_interval_seconds,
            });
        }
        self.stressors.push(stressor);
        id
    }

    /// Apply `amount` damage. Dead or missing targets are left untouched.
    pub fn damage_stressor(&mut self, id: StressorId, amount: f64) -> HitResult {
        let Some(index) = self.index_of(id) else {
            return HitResult::AlreadyDead;
        };
        let stressor = &mut self.stressors[index];
        if !stressor.is_alive() {
            return HitResult::AlreadyDead;
        }
        stressor.health = (stressor.health - amount.max(0.0)).max(0.0);
        if stressor.is_alive() {
            HitResult::Survived {
                remaining: stressor.health,
            }
        } else {
            HitResult::Killed
        }
    }

    /// Make an erratic stressor flee for `seconds`. Other archetypes ignore it.
    pub fn trigger_retreat(&mut self, id: StressorId, seconds: f64) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let stressor = &mut self.stressors[index];
        if stressor.is_alive() && stressor.kind.movement() == MovementPattern::Erratic {
            stressor.retreat_remaining = stressor.retreat_remaining.max(seconds);
        }
    }

    /// Move every live stressor and resolve defender collisions.
    pub fn update(&mut self, dt: f64, ctx: &StressorUpdateContext<'_>, rng: &mut SimRng) -> Vec<Collision> {
        let config = ctx.config;
        let center = config.center();
        let kin_counts = self.kin_counts(config.movement.cascade_radius);
        let serenity_ratio = if ctx.max_serenity > 0.0 {
            ctx.serenity / ctx.max_serenity
        } else {
            0.0
        };
        let mut serenity_left = ctx.serenity;
        let mut collisions = Vec::new();

        for (stressor, kin_nearby) in self.stressors.iter_mut().zip(kin_counts) {
            if !stressor.is_alive() {
                continue;
            }

            let distance = stressor.position.distance(center);
            if distance <= config.playfield.defender_radius + stressor.size {
                let damage = config.stressors.get(stressor.kind).collision_damage * ctx.collision_scale;
                if serenity_left > 0.0 {
                    serenity_left -= damage;
                    collisions.push(Collision {
                        id: stressor.id,
                        kind: stressor.kind,
                        serenity_damage: damage,
                    });
                }
                stressor.health = 0.0;
                stressor.velocity = Vec2::ZERO;
                continue;
            }

            advance_timers(stressor, distance, dt, config);

            let speed = ctx.effects.effective_speed(stressor.base_speed, stressor.id);
            let mut movement_ctx = MovementContext {
                center,
                now: ctx.now,
                serenity_ratio,
                kin_nearby,
                config: &config.movement,
                rng: &mut *rng,
            };
            let velocity = ctx
                .movement
                .velocity(stressor.kind.movement(), stressor, dt, &mut movement_ctx, speed);

            stressor.velocity = velocity.clamp_length(config.playfield.max_velocity);
            stressor.position = clamp_to_playfield(
                stressor.position + stressor.velocity * dt,
                &config.playfield,
            );
        }

        collisions
    }

    /// Drop every stressor with health at or below zero.
    pub fn remove_dead(&mut self) -> Vec<Stressor> {
        let (dead, alive): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.stressors).into_iter().partition(|s| !s.is_alive());
        self.stressors = alive;
        dead
    }

    /// Same-kind live neighbours within `radius`, per stressor in storage order.
    fn kin_counts(&self, radius: f64) -> Vec<usize> {
        let radius_sq = radius * radius;
        self.stressors
            .iter()
            .map(|s| {
                if !s.is_alive() || s.kind.movement() != MovementPattern::Accelerating {
                    return 0;
                }
                self.stressors
                    .iter()
                    .filter(|other| {
                        other.id != s.id
                            && other.is_alive()
                            && other.kind == s.kind
                            && other.position.distance_squared(s.position) <= radius_sq
                    })
                    .count()
            })
            .collect()
    }
}

fn advance_timers(stressor: &mut Stressor, distance: f64, dt: f64, config: &SimConfig) {
    if stressor.retreat_remaining > 0.0 {
        stressor.retreat_remaining = (stressor.retreat_remaining - dt).max(0.0);
    }
    if let Some(orbit) = stressor.orbit.as_mut() {
        if matches!(
            orbit_phase(orbit, distance, &config.movement),
            OrbitPhase::Orbit | OrbitPhase::Recoil
        ) {
            orbit.dash_cooldown = (orbit.dash_cooldown - dt).max(0.0);
        }
    }
}

/// Random point on one of the four padded playfield edges.
fn edge_spawn_point(playfield: &PlayfieldConfig, rng: &mut SimRng) -> Vec2 {
    let pad = playfield.padding;
    let (w, h) = (playfield.width, playfield.height);
    match rng.index(4) {
        0 => Vec2::new(rng.range_f64(pad, w - pad), pad),
        1 => Vec2::new(w - pad, rng.range_f64(pad, h - pad)),
        2 => Vec2::new(rng.range_f64(pad, w - pad), h - pad),
        _ => Vec2::new(pad, rng.range_f64(pad, h - pad)),
    }
}

/// Clamp a position into `[padding, dimension - padding]` on both axes.
#[must_use]
pub fn clamp_to_playfield(position: Vec2, playfield: &PlayfieldConfig) -> Vec2 {
    let pad = playfield.padding;
    Vec2::new(
        position.x.clamp(pad, playfield.width - pad),
        position.y.clamp(pad, playfield.height - pad),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_ctx<'a>(
        config: &'a SimConfig,
        effects: &'a StatusEffectResolver,
        movement: &'a MovementRegistry,
        serenity: f64,
    ) -> StressorUpdateContext<'a> {
        StressorUpdateContext {
            config,
            effects,
            movement,
            now: 0.0,
            serenity,
            max_serenity: 100.0,
            collision_scale: 1.0,
        }
    }

    #[test]
    fn test_spawn_count_formula() {
        let waves = WaveConfig::default();
        assert_eq!(wave_spawn_count(&waves, 0), 0);
        assert_eq!(wave_spawn_count(&waves, 1), 5);
        assert_eq!(wave_spawn_count(&waves, 5), (5.0 * 1.2f64.powi(4)).floor() as usize);
        assert_eq!(wave_spawn_count(&waves, 5), 10);
        assert_eq!(wave_spawn_count(&waves, 10), 25);
    }

    #[test]
    fn test_spawn_wave_one_is_worry_on_edges() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let ids = manager.spawn_wave(1, &config, &mut rng, 0.0);
        assert_eq!(ids.len(), 5);
        let pad = config.playfield.padding;
        for s in manager.all() {
            assert_eq!(s.kind, StressorKind::Worry);
            let on_edge = s.position.x == pad
                || s.position.y == pad
                || s.position.x == config.playfield.width - pad
                || s.position.y == config.playfield.height - pad;
            assert!(on_edge, "spawned off-edge at {:?}", s.position);
            assert_eq!(s.health, config.waves.base_health);
        }
    }

    #[test]
    fn test_wave_scaling_of_health_and_speed() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Dread, Vec2::new(20.0, 20.0), 3, &config, &mut rng, 0.0);
        let s = manager.get(id).unwrap();
        let expected_health = 20.0 * 3.0 * 1.15f64.powi(2);
        let expected_speed = 40.0 * 0.6 * 1.03f64.powi(2);
        assert!((s.health - expected_health).abs() < 1e-9);
        assert!((s.base_speed - expected_speed).abs() < 1e-9);
    }

    #[test]
    fn test_damage_is_idempotent_after_death() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Worry, Vec2::new(20.0, 20.0), 1, &config, &mut rng, 0.0);

        assert_eq!(manager.damage_stressor(id, 5.0), HitResult::Survived { remaining: 15.0 });
        assert_eq!(manager.damage_stressor(id, 50.0), HitResult::Killed);
        assert_eq!(manager.get(id).unwrap().health, 0.0);
        assert_eq!(manager.damage_stressor(id, 50.0), HitResult::AlreadyDead);
        assert_eq!(manager.get(id).unwrap().health, 0.0);
        assert_eq!(manager.damage_stressor(999, 1.0), HitResult::AlreadyDead);
    }

    #[test]
    fn test_negative_damage_does_not_heal() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Worry, Vec2::new(20.0, 20.0), 1, &config, &mut rng, 0.0);
        manager.damage_stressor(id, -10.0);
        assert_eq!(manager.get(id).unwrap().health, 20.0);
    }

    #[test]
    fn test_collision_costs_serenity_and_kills() {
        let config = SimConfig::default();
        let effects = StatusEffectResolver::new();
        let movement = MovementRegistry::standard();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let start = config.center() + Vec2::new(30.0, 0.0);
        let id = manager.spawn(StressorKind::Worry, start, 1, &config, &mut rng, 0.0);

        let collisions = manager.update(0.1, &update_ctx(&config, &effects, &movement, 50.0), &mut rng);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].serenity_damage, 5.0);
        let s = manager.get(id).unwrap();
        assert!(!s.is_alive());
        assert_eq!(s.position, start);

        let removed = manager.remove_dead();
        assert_eq!(removed.len(), 1);
        assert!(manager.get(id).is_none());
    }

    #[test]
    fn test_collision_without_serenity_deals_nothing() {
        let config = SimConfig::default();
        let effects = StatusEffectResolver::new();
        let movement = MovementRegistry::standard();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        manager.spawn(StressorKind::Worry, config.center(), 1, &config, &mut rng, 0.0);
        let collisions = manager.update(0.1, &update_ctx(&config, &effects, &movement, 0.0), &mut rng);
        assert!(collisions.is_empty());
        assert_eq!(manager.alive_count(), 0);
    }

    #[test]
    fn test_movement_uses_slowed_speed() {
        let config = SimConfig::default();
        let mut effects = StatusEffectResolver::new();
        let movement = MovementRegistry::standard();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Worry, Vec2::new(100.0, 400.0), 1, &config, &mut rng, 0.0);
        effects.apply(
            crate::status_effects::StatusEffect::persistent(
                "ripple.slow",
                crate::status_effects::EffectKind::Slow,
                crate::status_effects::EffectSource::Ability(crate::abilities::AbilityKind::Ripple),
                0.5,
                crate::status_effects::StackingRule::Multiplicative,
            ),
            id,
        );
        manager.update(1.0, &update_ctx(&config, &effects, &movement, 100.0), &mut rng);
        let s = manager.get(id).unwrap();
        assert!((s.position.x - 120.0).abs() < 1e-9);
        assert!((s.velocity.length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_clamped_to_playfield() {
        let mut config = SimConfig::default();
        config.playfield.max_velocity = 10_000.0;
        let effects = StatusEffectResolver::new();
        let movement = MovementRegistry::standard();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Panic, Vec2::new(25.0, 400.0), 1, &config, &mut rng, 0.0);
        manager.trigger_retreat(id, 5.0);
        manager.update(1.0, &update_ctx(&config, &effects, &movement, 100.0), &mut rng);
        let s = manager.get(id).unwrap();
        assert_eq!(s.position.x, config.playfield.padding);
    }

    #[test]
    fn test_retreat_only_affects_erratic() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let worry = manager.spawn(StressorKind::Worry, Vec2::new(20.0, 20.0), 1, &config, &mut rng, 0.0);
        let panic = manager.spawn(StressorKind::Panic, Vec2::new(20.0, 20.0), 1, &config, &mut rng, 0.0);
        manager.trigger_retreat(worry, 1.0);
        manager.trigger_retreat(panic, 1.0);
        assert!(!manager.get(worry).unwrap().is_retreating());
        assert!(manager.get(panic).unwrap().is_retreating());
    }

    #[test]
    fn test_nearest_prefers_lower_id_on_tie() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let center = config.center();
        let first = manager.spawn(StressorKind::Worry, center + Vec2::new(100.0, 0.0), 1, &config, &mut rng, 0.0);
        manager.spawn(StressorKind::Worry, center - Vec2::new(100.0, 0.0), 1, &config, &mut rng, 0.0);
        let far = manager.spawn(StressorKind::Worry, center + Vec2::new(300.0, 0.0), 1, &config, &mut rng, 0.0);
        assert_eq!(manager.nearest_to(center).map(|s| s.id), Some(first));
        assert_eq!(manager.ids_within(center, 150.0).len(), 2);
        assert!(!manager.ids_within(center, 150.0).contains(&far));
    }

    #[test]
    fn test_orbiters_get_orbit_state() {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Rumination, Vec2::new(20.0, 20.0), 3, &config, &mut rng, 0.0);
        let orbit = manager.get(id).unwrap().orbit.unwrap();
        assert!(orbit.radius >= config.movement.orbit_radius_min);
        assert!(orbit.radius < config.movement.orbit_radius_max);
        assert!(orbit.clockwise);
    }
}
