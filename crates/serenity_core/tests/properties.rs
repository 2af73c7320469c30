//! Property tests for the simulation invariants.

use proptest::prelude::*;
use serenity_core::config::{SimConfig, WaveConfig};
use serenity_core::modifiers::{calculate_damage, DamageInput, ScalingMode, TargetModifiers};
use serenity_core::status_effects::{EffectKind, EffectSource, StackingRule, StatusEffect, StatusEffectResolver};
use serenity_core::stressors::{wave_spawn_count, HitResult, StressorKind, StressorManager};
use serenity_core::rng::SimRng;
use serenity_test_utils::fixtures::default_simulation;
use serenity_test_utils::strategies;

#[test]
fn spawn_counts_follow_geometric_growth() {
    let waves = WaveConfig::default();
    assert_eq!(wave_spawn_count(&waves, 1), 5);
    assert_eq!(wave_spawn_count(&waves, 5), 10);
    assert_eq!(wave_spawn_count(&waves, 10), 25);
}

#[test]
fn two_slows_multiply() {
    let mut resolver = StatusEffectResolver::new();
    for (id, value) in [("a", 0.5), ("b", 0.8)] {
        resolver.apply(
            StatusEffect::persistent(id, EffectKind::Slow, EffectSource::Crowd, value, StackingRule::Multiplicative),
            1,
        );
    }
    assert!((resolver.effective_value(EffectKind::Slow, 1) - 0.4).abs() < 1e-12);
    assert!((resolver.effective_speed(100.0, 1) - 40.0).abs() < 1e-9);
}

#[test]
fn calculator_applies_modifiers_in_order() {
    let input = DamageInput::new(10.0)
        .with_level(2, 0.1, ScalingMode::Multiplicative)
        .with_amplifier(1.5)
        .with_phase_bonus(Some(0.2))
        .against(TargetModifiers {
            resistance: 0.5,
            vulnerability: 2.0,
            aura: 0.1,
        });
    let expected = 10.0 * 1.2 * 1.5 * 1.2 * 0.5 * 2.0 * 0.9;
    assert!((calculate_damage(&input) - expected).abs() < 1e-9);
    assert!((expected - 19.44).abs() < 1e-9);
}

#[test]
fn damage_after_death_is_idempotent() {
    let config = SimConfig::default();
    let mut rng = SimRng::new(1);
    let mut manager = StressorManager::new();
    let id = manager.spawn(StressorKind::Worry, config.center(), 1, &config, &mut rng, 0.0);

    assert_eq!(manager.damage_stressor(id, 1_000.0), HitResult::Killed);
    let after_first = manager.get(id).unwrap().health;
    assert_eq!(manager.damage_stressor(id, 1_000.0), HitResult::AlreadyDead);
    assert_eq!(manager.get(id).unwrap().health, after_first);
    assert_eq!(after_first, 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn effective_speed_never_negative(
        stack in strategies::arb_slow_stack(8),
        base in 0.0f64..500.0,
    ) {
        let mut resolver = StatusEffectResolver::new();
        for effect in stack {
            resolver.apply(effect, 7);
        }
        let speed = resolver.effective_speed(base, 7);
        prop_assert!(speed >= 0.0);
        prop_assert!(speed <= base + 1e-9);
    }

    #[test]
    fn damage_never_leaves_negative_health(amounts in prop::collection::vec(strategies::arb_damage(), 1..10)) {
        let config = SimConfig::default();
        let mut rng = SimRng::new(3);
        let mut manager = StressorManager::new();
        let id = manager.spawn(StressorKind::Dread, config.center(), 4, &config, &mut rng, 0.0);
        let mut dead = false;
        for amount in amounts {
            let result = manager.damage_stressor(id, amount);
            if dead {
                prop_assert_eq!(result, HitResult::AlreadyDead);
            }
            dead = result.is_dead();
            prop_assert!(manager.get(id).unwrap().health >= 0.0);
        }
    }

    #[test]
    fn stressors_never_escape_playfield(seed in strategies::arb_seed()) {
        let mut sim = default_simulation(seed);
        let field = sim.config().playfield.clone();
        for _ in 0..400 {
            sim.tick();
            for s in sim.stressors().all() {
                prop_assert!(s.position.x >= field.padding && s.position.x <= field.width - field.padding);
                prop_assert!(s.position.y >= field.padding && s.position.y <= field.height - field.padding);
            }
        }
    }

    #[test]
    fn serenity_stays_in_range(seed in strategies::arb_seed()) {
        let mut sim = default_simulation(seed);
        for _ in 0..600 {
            sim.tick();
            let run = sim.run_state();
            prop_assert!(run.serenity >= 0.0 && run.serenity <= run.max_serenity);
        }
    }
}
