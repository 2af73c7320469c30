//! Turns ability state into damage and status effects.
//!
//! Runs once per tick, after the orchestrator and before movement. Every
//! damage number goes through [`calculate_damage`] with the current
//! amplifier (Focus), phase bonus (Rhythm offense) and the target's
//! resistance, vulnerability and crowd aura.
//!
//! Zone slows are persistent effects keyed by ability: entering a zone
//! applies (or refreshes) the effect, leaving it removes only that ability's
//! contribution, and an ability that ends clears its source everywhere.
//!
//! Ripple and Echo damage each stressor once per pulse or ring. The hit sets
//! live here, keyed by the activation number the orchestrator hands out.
//!
//! The crowd aura is computed from the living stressors at the start of the
//! pass and recomputed whenever an ability kills something.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityKind, AbilityOrchestrator, AbilityProgression};
use crate::config::SimConfig;
use crate::math::Vec2;
use crate::modifiers::{calculate_damage, DamageInput, ScalingMode, TargetModifiers};
use crate::status_effects::{EffectKind, EffectSource, StackingRule, StatusEffect, StatusEffectResolver};
use crate::stressors::{HitResult, StressorId, StressorKind, StressorManager};

const BREATH_SLOW: &str = "breath.slow";
const RIPPLE_SLOW: &str = "ripple.slow";
const ECHO_SLOW: &str = "echo.slow";
const BEAM_SLOW: &str = "beam.slow";
const BEAM_VULNERABILITY: &str = "beam.vulnerability";
const FIELD_SLOW: &str = "field.slow";
const CROWD_AURA: &str = "crowd.aura";

/// Why a stressor died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefeatCause {
    /// Killed by an ability.
    Ability(AbilityKind),
    /// Reached the defender.
    Collision,
    /// Killed through the external damage entry point.
    External,
}

/// A stressor killed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Defeat {
    /// Stressor id.
    pub id: StressorId,
    /// Its archetype.
    pub kind: StressorKind,
    /// What killed it.
    pub cause: DefeatCause,
}

/// Outcome of one applier pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Stressors killed by abilities.
    pub defeats: Vec<Defeat>,
    /// Serenity to restore (Release), before clamping.
    pub serenity_restored: f64,
    /// Total damage dealt.
    pub damage_dealt: f64,
}

/// Read-only inputs to the applier.
pub struct ApplyContext<'a> {
    /// Full configuration.
    pub config: &'a SimConfig,
    /// Ability states after this tick's update.
    pub abilities: &'a AbilityOrchestrator,
    /// Ability levels.
    pub levels: &'a AbilityProgression,
    /// Seconds advanced this tick.
    pub dt: f64,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    id: StressorId,
    kind: StressorKind,
    position: Vec2,
}

/// Per-pulse hit bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectApplier {
    ripple_activation: u64,
    ripple_hits: BTreeSet<StressorId>,
    echo_burst: u64,
    echo_hits: BTreeMap<u32, BTreeSet<StressorId>>,
}

/// Mutable world the applier writes to.
struct World<'w> {
    stressors: &'w mut StressorManager,
    effects: &'w mut StatusEffectResolver,
    report: ApplyReport,
}

impl EffectApplier {
    /// Applier with no remembered hits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stressors already hit by the current Ripple pulse.
    #[must_use]
    pub fn ripple_hits(&self) -> &BTreeSet<StressorId> {
        &self.ripple_hits
    }

    /// Apply every enabled ability's effects for this tick.
    pub fn apply(
        &mut self,
        ctx: &ApplyContext<'_>,
        stressors: &mut StressorManager,
        effects: &mut StatusEffectResolver,
    ) -> ApplyReport {
        let mut targets: Vec<Target> = stressors
            .alive()
            .map(|s| Target {
                id: s.id,
                kind: s.kind,
                position: s.position,
            })
            .collect();
        let mut world = World {
            stressors,
            effects,
            report: ApplyReport::default(),
        };

        refresh_crowd_aura(ctx.config, &targets, world.effects);
        for kind in AbilityKind::ALL {
            if !kind.enabled(ctx.config) {
                world.effects.clear_source(EffectSource::Ability(kind));
                continue;
            }
            let defeated = world.report.defeats.len();
            match kind {
                AbilityKind::Breath => apply_breath(ctx, &targets, &mut world),
                AbilityKind::Ripple => self.apply_ripple(ctx, &targets, &mut world),
                AbilityKind::Echo => self.apply_echo(ctx, &targets, &mut world),
                AbilityKind::Barrier => apply_barrier(ctx, &targets, &mut world),
                AbilityKind::Beam => apply_beam(ctx, &targets, &mut world),
                AbilityKind::Field => apply_field(ctx, &targets, &mut world),
                AbilityKind::Release => apply_release(ctx, &targets, &mut world),
                AbilityKind::Focus | AbilityKind::Rhythm => {}
            }
            if world.report.defeats.len() > defeated {
                // Fallen kin stop shielding their neighbours for the rest of the pass.
                let stressors = &*world.stressors;
                targets.retain(|t| stressors.get(t.id).is_some_and(|s| s.is_alive()));
                refresh_crowd_aura(ctx.config, &targets, world.effects);
            }
        }
        world.report
    }

    fn apply_ripple(&mut self, ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
        let source = EffectSource::Ability(AbilityKind::Ripple);
        let Some(ripple) = ctx.abilities.ripple().filter(|r| r.is_active()) else {
            world.effects.clear_source(source);
            return;
        };
        if ripple.activation() != self.ripple_activation {
            self.ripple_activation = ripple.activation();
            self.ripple_hits.clear();
        }
        let config = &ctx.config.abilities.ripple;
        let center = ctx.config.center();
        let level = ctx.levels.level(AbilityKind::Ripple);

        for target in targets {
            if target.position.distance(center) > ripple.radius() {
                world.effects.remove(RIPPLE_SLOW, target.id);
                continue;
            }
            world.effects.apply(
                StatusEffect::persistent(RIPPLE_SLOW, EffectKind::Slow, source, ripple.slow(), StackingRule::Multiplicative),
                target.id,
            );
            if self.ripple_hits.insert(target.id) {
                let input = DamageInput::new(config.damage).with_level(level, config.damage_per_level, ScalingMode::Additive);
                world.strike(ctx, target, AbilityKind::Ripple, input);
                startle(ctx, target, world);
            }
        }
    }

    fn apply_echo(&mut self, ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
        let Some(echo) = ctx.abilities.echo().filter(|e| e.is_active()) else {
            self.echo_hits.clear();
            return;
        };
        if echo.burst() != self.echo_burst {
            self.echo_burst = echo.burst();
            self.echo_hits.clear();
        }
        let config = &ctx.config.abilities.echo;
        let center = ctx.config.center();
        let source = EffectSource::Ability(AbilityKind::Echo);

        // The band covers everything the ring swept this tick, so large
        // steps cannot skip over a stressor.
        for wave in echo.waves().iter().filter(|w| w.is_expanding()) {
            let inner = wave.prev_radius - config.band_thickness;
            let hits = self.echo_hits.entry(wave.index).or_default();
            for target in targets {
                let distance = target.position.distance(center);
                if distance > wave.radius || distance < inner || !hits.insert(target.id) {
                    continue;
                }
                // Damage was level-scaled when the ring spawned.
                world.strike(ctx, target, AbilityKind::Echo, DamageInput::new(wave.damage));
                world.effects.apply(
                    StatusEffect::timed(
                        ECHO_SLOW,
                        EffectKind::Slow,
                        source,
                        config.slow,
                        config.slow_seconds,
                        StackingRule::Multiplicative,
                    ),
                    target.id,
                );
            }
        }
        let live: BTreeSet<u32> = echo.waves().iter().map(|w| w.index).collect();
        self.echo_hits.retain(|index, _| live.contains(index));
    }
}

impl World<'_> {
    /// Run `input` through the modifier pipeline against `target` and deal it.
    fn strike(&mut self, ctx: &ApplyContext<'_>, target: &Target, ability: AbilityKind, input: DamageInput) -> HitResult {
        let archetype = ctx.config.stressors.get(target.kind);
        let modifiers = TargetModifiers {
            resistance: archetype.resistance,
            vulnerability: archetype.vulnerability
                * self.effects.effective_value(EffectKind::Vulnerability, target.id),
            aura: self.effects.effective_value(EffectKind::DamageReduction, target.id),
        };
        let input = input
            .with_amplifier(ctx.abilities.amplifier(ctx.config))
            .with_phase_bonus(ctx.abilities.phase_bonus(ctx.config))
            .against(modifiers);
        let damage = calculate_damage(&input);
        let result = self.stressors.damage_stressor(target.id, damage);
        if result != HitResult::AlreadyDead {
            self.report.damage_dealt += damage;
        }
        if result.is_lethal() {
            self.report.defeats.push(Defeat {
                id: target.id,
                kind: target.kind,
                cause: DefeatCause::Ability(ability),
            });
        }
        result
    }
}

/// Erratic stressors flee when struck by a pulse.
fn startle(ctx: &ApplyContext<'_>, target: &Target, world: &mut World<'_>) {
    if target.kind == StressorKind::Panic {
        world
            .stressors
            .trigger_retreat(target.id, ctx.config.movement.retreat_seconds);
    }
}

fn refresh_crowd_aura(config: &SimConfig, targets: &[Target], effects: &mut StatusEffectResolver) {
    let crowd = &config.crowd;
    let radius_sq = crowd.aura_radius * crowd.aura_radius;
    for target in targets {
        let neighbours = if config.stressors.get(target.kind).projects_aura {
            targets
                .iter()
                .filter(|other| {
                    other.id != target.id
                        && other.kind == target.kind
                        && other.position.distance_squared(target.position) <= radius_sq
                })
                .count()
        } else {
            0
        };
        if neighbours == 0 {
            effects.remove_by_source(EffectSource::Crowd, target.id);
            continue;
        }
        let reduction = (crowd.aura_per_neighbor * neighbours as f64).min(crowd.aura_cap);
        effects.apply(
            StatusEffect::persistent(
                CROWD_AURA,
                EffectKind::DamageReduction,
                EffectSource::Crowd,
                reduction,
                StackingRule::Additive,
            ),
            target.id,
        );
    }
}

fn apply_breath(ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
    let Some(breath) = ctx.abilities.breath() else {
        return;
    };
    let config = &ctx.config.abilities.breath;
    let center = ctx.config.center();
    let level = ctx.levels.level(AbilityKind::Breath);
    let source = EffectSource::Ability(AbilityKind::Breath);

    for target in targets {
        if target.position.distance(center) > breath.radius() {
            world.effects.remove(BREATH_SLOW, target.id);
            continue;
        }
        world.effects.apply(
            StatusEffect::persistent(BREATH_SLOW, EffectKind::Slow, source, config.slow, StackingRule::Multiplicative),
            target.id,
        );
        if breath.peaked() {
            let input = DamageInput::new(config.peak_damage).with_level(level, config.damage_per_level, ScalingMode::Additive);
            world.strike(ctx, target, AbilityKind::Breath, input);
        }
    }
}

fn apply_barrier(ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
    let Some(barrier) = ctx.abilities.barrier().filter(|b| b.just_activated()) else {
        return;
    };
    let center = ctx.config.center();
    for target in targets {
        if target.position.distance(center) > barrier.radius() {
            continue;
        }
        let Some(health) = world.stressors.get(target.id).map(|s| s.health) else {
            continue;
        };
        let input = DamageInput::new(health * barrier.health_fraction());
        world.strike(ctx, target, AbilityKind::Barrier, input);
    }
}

fn apply_beam(ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
    let source = EffectSource::Ability(AbilityKind::Beam);
    let locked = ctx
        .abilities
        .beam()
        .filter(|b| b.is_active())
        .and_then(|b| b.target().map(|id| (b, id)));
    let Some((beam, target_id)) = locked else {
        world.effects.clear_source(source);
        return;
    };
    let config = &ctx.config.abilities.beam;

    for target in targets {
        if target.id != target_id {
            world.effects.remove_by_source(source, target.id);
            continue;
        }
        world.effects.apply(
            StatusEffect::persistent(BEAM_SLOW, EffectKind::Slow, source, config.slow, StackingRule::Multiplicative),
            target.id,
        );
        world.effects.apply(
            StatusEffect::persistent(
                BEAM_VULNERABILITY,
                EffectKind::Vulnerability,
                source,
                config.vulnerability,
                StackingRule::Multiplicative,
            ),
            target.id,
        );
        // Damage per second was level-scaled at acquisition.
        let input = DamageInput::new(beam.damage_per_second() * ctx.dt);
        world.strike(ctx, target, AbilityKind::Beam, input);
    }
}

fn apply_field(ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
    let source = EffectSource::Ability(AbilityKind::Field);
    let Some(position) = ctx.abilities.field().filter(|f| f.is_active()).and_then(|f| f.position()) else {
        world.effects.clear_source(source);
        return;
    };
    let config = &ctx.config.abilities.field;
    let level = ctx.levels.level(AbilityKind::Field);

    for target in targets {
        if target.position.distance(position) > config.radius {
            world.effects.remove(FIELD_SLOW, target.id);
            continue;
        }
        world.effects.apply(
            StatusEffect::persistent(FIELD_SLOW, EffectKind::Slow, source, config.slow, StackingRule::Multiplicative),
            target.id,
        );
        let input = DamageInput::new(config.damage_per_second * ctx.dt).with_level(
            level,
            config.scaling,
            ScalingMode::Multiplicative,
        );
        world.strike(ctx, target, AbilityKind::Field, input);
    }
}

fn apply_release(ctx: &ApplyContext<'_>, targets: &[Target], world: &mut World<'_>) {
    if !ctx.abilities.release().is_some_and(|r| r.fired()) {
        return;
    }
    let config = &ctx.config.abilities.release;
    let center = ctx.config.center();
    let level = ctx.levels.level(AbilityKind::Release);

    for target in targets {
        if target.position.distance(center) > config.radius {
            continue;
        }
        let input = DamageInput::new(config.damage).with_level(level, config.scaling, ScalingMode::Multiplicative);
        world.strike(ctx, target, AbilityKind::Release, input);
        startle(ctx, target, world);
    }
    world.report.serenity_restored += ScalingMode::Multiplicative.scale(config.restore, level, config.restore_scaling);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityContext;
    use crate::rng::SimRng;

    struct Rig {
        config: SimConfig,
        abilities: AbilityOrchestrator,
        levels: AbilityProgression,
        stressors: StressorManager,
        effects: StatusEffectResolver,
        applier: EffectApplier,
        rng: SimRng,
    }

    impl Rig {
        fn new(config: SimConfig) -> Self {
            Self {
                abilities: AbilityOrchestrator::new(&config),
                levels: AbilityProgression::new(),
                stressors: StressorManager::new(),
                effects: StatusEffectResolver::new(),
                applier: EffectApplier::new(),
                rng: SimRng::new(5),
                config,
            }
        }

        fn spawn(&mut self, kind: StressorKind, offset: Vec2) -> StressorId {
            let position = self.config.center() + offset;
            self.stressors.spawn(kind, position, 1, &self.config, &mut self.rng, 0.0)
        }

        fn step(&mut self, ratio: f64, dt: f64) -> ApplyReport {
            let mut ctx = AbilityContext {
                dt,
                serenity_ratio: ratio,
                config: &self.config,
                levels: &self.levels,
                stressors: &self.stressors,
                rng: &mut self.rng,
            };
            self.abilities.update(&mut ctx);
            self.effects.update(dt);
            let apply_ctx = ApplyContext {
                config: &self.config,
                abilities: &self.abilities,
                levels: &self.levels,
                dt,
            };
            self.applier.apply(&apply_ctx, &mut self.stressors, &mut self.effects)
        }
    }

    fn only(f: impl FnOnce(&mut SimConfig)) -> SimConfig {
        let mut config = SimConfig::default();
        config.abilities = config.abilities.all_disabled();
        f(&mut config);
        config
    }

    #[test]
    fn test_release_damages_in_radius_and_restores() {
        let mut rig = Rig::new(only(|c| c.abilities.release.enabled = true));
        let inside = rig.spawn(StressorKind::Worry, Vec2::new(100.0, 0.0));
        let panic = rig.spawn(StressorKind::Panic, Vec2::new(0.0, 150.0));

        let report = rig.step(0.2, 0.1);
        assert_eq!(report.serenity_restored, 30.0);
        assert_eq!(rig.stressors.get(inside).unwrap().health, 0.0);
        assert_eq!(report.defeats.len(), 2);
        assert!(report.defeats.iter().all(|d| d.cause == DefeatCause::Ability(AbilityKind::Release)));
        assert!(rig.stressors.get(panic).is_some());
    }

    #[test]
    fn test_ripple_hits_once_and_slows_once() {
        let mut rig = Rig::new(only(|c| {
            c.abilities.ripple.enabled = true;
            c.abilities.ripple.cooldown_seconds = 0.1;
            c.waves.base_health = 1_000.0;
        }));
        let id = rig.spawn(StressorKind::Worry, Vec2::new(50.0, 0.0));
        let mut total = 0.0;
        for _ in 0..30 {
            total += rig.step(1.0, 0.05).damage_dealt;
            let slows = rig
                .effects
                .effects_on(id)
                .iter()
                .filter(|e| e.source == EffectSource::Ability(AbilityKind::Ripple))
                .count();
            assert!(slows <= 1);
        }
        assert_eq!(total, 8.0);
        assert_eq!(rig.applier.ripple_hits().len(), 1);
    }

    #[test]
    fn test_beam_effects_follow_target() {
        let mut rig = Rig::new(only(|c| {
            c.abilities.beam.enabled = true;
            c.abilities.beam.cooldown_seconds = 0.0;
            c.waves.base_health = 1_000.0;
        }));
        let near = rig.spawn(StressorKind::Worry, Vec2::new(100.0, 0.0));
        let far = rig.spawn(StressorKind::Worry, Vec2::new(300.0, 0.0));

        rig.step(1.0, 0.1);
        let beam = EffectSource::Ability(AbilityKind::Beam);
        assert!(rig.effects.has_source(beam, near));
        assert!(!rig.effects.has_source(beam, far));
        assert_eq!(rig.effects.effective_value(EffectKind::Vulnerability, near), 1.25);
        // First hit lands after the vulnerability is applied.
        let health = rig.stressors.get(near).unwrap().health;
        assert!((1_000.0 - health - 20.0 * 0.1 * 1.25).abs() < 1e-9);

        rig.config.abilities.beam.enabled = false;
        rig.step(1.0, 0.1);
        assert!(!rig.effects.has_source(beam, near));
    }

    #[test]
    fn test_field_slow_removed_on_leaving() {
        let mut rig = Rig::new(only(|c| {
            c.abilities.field.enabled = true;
            c.abilities.field.cooldown_seconds = 0.0;
        }));
        rig.step(1.0, 0.01);
        let position = rig.abilities.field().and_then(|f| f.position()).unwrap();
        let offset = position - rig.config.center();
        let id = rig.spawn(StressorKind::Worry, offset);
        rig.step(1.0, 0.01);
        assert!(rig.effects.has_source(EffectSource::Ability(AbilityKind::Field), id));

        rig.stressors.get_mut(id).unwrap().position = rig.config.center() - offset;
        rig.step(1.0, 0.01);
        assert!(!rig.effects.has_source(EffectSource::Ability(AbilityKind::Field), id));
    }

    #[test]
    fn test_crowd_aura_between_projecting_kin() {
        let mut rig = Rig::new(only(|_| {}));
        let a = rig.spawn(StressorKind::Doubt, Vec2::new(300.0, 0.0));
        let b = rig.spawn(StressorKind::Doubt, Vec2::new(330.0, 0.0));
        let lone = rig.spawn(StressorKind::Worry, Vec2::new(300.0, 20.0));
        rig.step(1.0, 0.1);
        assert!((rig.effects.effective_value(EffectKind::DamageReduction, a) - 0.05).abs() < 1e-12);
        assert!((rig.effects.effective_value(EffectKind::DamageReduction, b) - 0.05).abs() < 1e-12);
        assert_eq!(rig.effects.effective_value(EffectKind::DamageReduction, lone), 0.0);
    }

    #[test]
    fn test_echo_prescaled_damage_not_rescaled() {
        let mut rig = Rig::new(only(|c| {
            c.abilities.echo.enabled = true;
            c.abilities.echo.cooldown_seconds = 0.0;
            c.abilities.echo.wave_count = 1;
            c.waves.base_health = 1_000.0;
        }));
        rig.levels.level_up(AbilityKind::Echo);
        rig.levels.level_up(AbilityKind::Echo);
        let id = rig.spawn(StressorKind::Worry, Vec2::new(60.0, 0.0));
        let mut total = 0.0;
        for _ in 0..40 {
            total += rig.step(1.0, 1.0 / 60.0).damage_dealt;
        }
        assert!(rig.stressors.get(id).is_some());
        assert_eq!(total, 15.0);
    }

    fn single_echo() -> SimConfig {
        only(|c| {
            c.abilities.echo.enabled = true;
            c.abilities.echo.cooldown_seconds = 0.0;
            c.abilities.echo.wave_count = 1;
            c.waves.base_health = 1_000.0;
        })
    }

    #[test]
    fn test_echo_large_step_hits_every_swept_stressor() {
        let mut rig = Rig::new(single_echo());
        // Ring moves 20 units per tick at 4x pace; both sit between samples
        // of the old trailing band.
        let near = rig.spawn(StressorKind::Worry, Vec2::new(21.0, 0.0));
        let far = rig.spawn(StressorKind::Worry, Vec2::new(0.0, -41.0));
        for _ in 0..6 {
            rig.step(1.0, 4.0 / 60.0);
        }
        for id in [near, far] {
            let stressor = rig.stressors.get(id).unwrap();
            assert!(stressor.health < stressor.max_health);
        }
        assert_eq!(rig.applier.echo_hits.get(&0).map(BTreeSet::len), Some(2));
    }

    #[test]
    fn test_echo_reaches_stressor_at_edge_of_range() {
        let config = single_echo();
        let edge = config.abilities.echo.max_radius - 1.0;
        let mut rig = Rig::new(config);
        let id = rig.spawn(StressorKind::Worry, Vec2::new(edge, 0.0));
        let mut dealt = 0.0;
        for _ in 0..70 {
            dealt += rig.step(1.0, 1.0 / 60.0).damage_dealt;
        }
        let stressor = rig.stressors.get(id).unwrap();
        assert!(stressor.health < stressor.max_health);
        assert_eq!(dealt, 10.0);
    }

    #[test]
    fn test_kin_killed_mid_pass_stop_shielding() {
        let mut rig = Rig::new(only(|c| {
            c.abilities.ripple.enabled = true;
            c.abilities.ripple.cooldown_seconds = 0.0;
            c.abilities.release.enabled = true;
            c.waves.base_health = 1_000.0;
        }));
        // Ripple (radius 0 on its first tick) kills the doubt at the centre,
        // then Release strikes its neighbour and a lone doubt.
        let fallen = rig.spawn(StressorKind::Doubt, Vec2::ZERO);
        let neighbour = rig.spawn(StressorKind::Doubt, Vec2::new(30.0, 0.0));
        let lone = rig.spawn(StressorKind::Doubt, Vec2::new(-300.0, 0.0));
        rig.stressors.get_mut(fallen).unwrap().health = 1.0;

        let report = rig.step(0.2, 0.1);
        assert!(report
            .defeats
            .iter()
            .any(|d| d.id == fallen && d.cause == DefeatCause::Ability(AbilityKind::Ripple)));
        let lost = |id| {
            let s = rig.stressors.get(id).unwrap();
            s.max_health - s.health
        };
        assert!(lost(lone) > 0.0);
        assert!((lost(neighbour) - lost(lone)).abs() < 1e-9);
        assert_eq!(rig.effects.effective_value(EffectKind::DamageReduction, neighbour), 0.0);
    }

    #[test]
    fn test_crowd_aura_ignores_dead_kin() {
        let mut rig = Rig::new(only(|_| {}));
        let a = rig.spawn(StressorKind::Doubt, Vec2::new(300.0, 0.0));
        let b = rig.spawn(StressorKind::Doubt, Vec2::new(330.0, 0.0));
        rig.step(1.0, 0.1);
        assert!(rig.effects.effective_value(EffectKind::DamageReduction, a) > 0.0);

        let health = rig.stressors.get(b).unwrap().health;
        assert!(rig.stressors.damage_stressor(b, health).is_lethal());
        rig.step(1.0, 0.1);
        assert_eq!(rig.effects.effective_value(EffectKind::DamageReduction, a), 0.0);
    }
}
