//! Per-stressor status effects and their stacking math.
//!
//! The resolver owns every timed or persistent modifier attached to a
//! stressor. Abilities insert effects keyed by an effect id (re-applying
//! replaces), movement reads the folded slow multiplier, and the damage
//! pipeline reads vulnerability and damage reduction.
//!
//! # Lifetimes
//!
//! - Effects with a duration expire once `(now - started_at_ms) / 1000 >= duration`.
//! - Effects without a duration persist until removed ("while in zone").
//! - A target whose collection becomes empty is dropped from the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityKind;
use crate::stressors::StressorId;

/// What a status effect modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Movement speed multiplier (lower is slower).
    Slow,
    /// Incoming damage multiplier (higher takes more).
    Vulnerability,
    /// Incoming damage reduction fraction.
    DamageReduction,
}

impl EffectKind {
    /// Folded value when a target has no effect of this kind.
    #[must_use]
    pub const fn neutral(self) -> f64 {
        match self {
            EffectKind::Slow | EffectKind::Vulnerability => 1.0,
            EffectKind::DamageReduction => 0.0,
        }
    }
}

/// How effects of one kind on one target combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackingRule {
    /// Product of all values.
    Multiplicative,
    /// Smallest value wins.
    StrongestWins,
    /// Sum of all values.
    Additive,
}

/// Who applied an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSource {
    /// An ability.
    Ability(AbilityKind),
    /// Shielding from nearby aura-projecting kin.
    Crowd,
}

/// A timed or persistent modifier on one stressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Identity within the target's collection; re-applying replaces.
    pub id: String,
    /// What the effect modifies.
    pub kind: EffectKind,
    /// Who applied it.
    pub source: EffectSource,
    /// Magnitude, interpreted per [`EffectKind`].
    pub value: f64,
    /// Lifetime in seconds; `None` persists until removed.
    pub duration: Option<f64>,
    /// Resolver clock when the effect was applied.
    pub started_at_ms: f64,
    /// Combination policy.
    pub stacking: StackingRule,
}

impl StatusEffect {
    /// An effect that persists until removed.
    #[must_use]
    pub fn persistent(
        id: impl Into<String>,
        kind: EffectKind,
        source: EffectSource,
        value: f64,
        stacking: StackingRule,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            source,
            value,
            duration: None,
            started_at_ms: 0.0,
            stacking,
        }
    }

    /// An effect that expires after `duration` seconds.
    #[must_use]
    pub fn timed(
        id: impl Into<String>,
        kind: EffectKind,
        source: EffectSource,
        value: f64,
        duration: f64,
        stacking: StackingRule,
    ) -> Self {
        Self {
            duration: Some(duration),
            ..Self::persistent(id, kind, source, value, stacking)
        }
    }

    /// Whether the effect is still live at `now_ms`.
    #[must_use]
    pub fn is_live(&self, now_ms: f64) -> bool {
        match self.duration {
            Some(duration) => (now_ms - self.started_at_ms) / 1000.0 < duration,
            None => true,
        }
    }
}

/// Owner of all status effects, keyed by target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectResolver {
    effects: BTreeMap<StressorId, Vec<StatusEffect>>,
    now_ms: f64,
}

impl StatusEffectResolver {
    /// Create an empty resolver at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver clock in milliseconds.
    #[must_use]
    pub const fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Insert `effect` on `target`, replacing any effect with the same id.
    ///
    /// The start time is stamped from the resolver clock.
    pub fn apply(&mut self, mut effect: StatusEffect, target: StressorId) {
        effect.started_at_ms = self.now_ms;
        let list = self.effects.entry(target).or_default();
        match list.iter_mut().find(|existing| existing.id == effect.id) {
            Some(existing) => *existing = effect,
            None => list.push(effect),
        }
    }

    /// Remove one effect by id.
    pub fn remove(&mut self, effect_id: &str, target: StressorId) {
        self.remove_where(target, |effect| effect.id == effect_id);
    }

    /// Remove every effect from `source` on `target`.
    pub fn remove_by_source(&mut self, source: EffectSource, target: StressorId) {
        self.remove_where(target, |effect| effect.source == source);
    }

    /// Remove every effect of `kind` on `target`.
    pub fn remove_by_type(&mut self, kind: EffectKind, target: StressorId) {
        self.remove_where(target, |effect| effect.kind == kind);
    }

    /// Remove every effect from `source` on every target.
    pub fn clear_source(&mut self, source: EffectSource) {
        for list in self.effects.values_mut() {
            list.retain(|effect| effect.source != source);
        }
        self.effects.retain(|_, list| !list.is_empty());
    }

    /// Drop everything attached to `target`.
    pub fn clear_target(&mut self, target: StressorId) {
        self.effects.remove(&target);
    }

    fn remove_where(&mut self, target: StressorId, predicate: impl Fn(&StatusEffect) -> bool) {
        let Some(list) = self.effects.get_mut(&target) else {
            return;
        };
        list.retain(|effect| !predicate(effect));
        if list.is_empty() {
            self.effects.remove(&target);
        }
    }

    /// Fold every effect of `kind` on `target`.
    ///
    /// The stacking rule of the first matching effect applies to all of
    /// them. Returns [`EffectKind::neutral`] when none match.
    #[must_use]
    pub fn effective_value(&self, kind: EffectKind, target: StressorId) -> f64 {
        let Some(list) = self.effects.get(&target) else {
            return kind.neutral();
        };
        let mut matching = list.iter().filter(|effect| effect.kind == kind).peekable();
        let Some(rule) = matching.peek().map(|effect| effect.stacking) else {
            return kind.neutral();
        };
        match rule {
            StackingRule::Multiplicative => matching.map(|effect| effect.value).product(),
            StackingRule::StrongestWins => matching
                .map(|effect| effect.value)
                .fold(f64::INFINITY, f64::min),
            StackingRule::Additive => matching.map(|effect| effect.value).sum(),
        }
    }

    /// `base_speed` after slows, with the slow clamped to `[0, 1]`. Never negative.
    #[must_use]
    pub fn effective_speed(&self, base_speed: f64, target: StressorId) -> f64 {
        (base_speed.max(0.0) * self.effective_value(EffectKind::Slow, target).clamp(0.0, 1.0)).max(0.0)
    }

    /// Advance the clock by `dt` seconds and drop expired effects.
    pub fn update(&mut self, dt: f64) {
        self.now_ms += dt * 1000.0;
        let now_ms = self.now_ms;
        for list in self.effects.values_mut() {
            list.retain(|effect| effect.is_live(now_ms));
        }
        self.effects.retain(|_, list| !list.is_empty());
    }

    /// Effects currently on `target`.
    #[must_use]
    pub fn effects_on(&self, target: StressorId) -> &[StatusEffect] {
        self.effects.get(&target).map_or(&[], Vec::as_slice)
    }

    /// Whether `target` carries an effect from `source`.
    #[must_use]
    pub fn has_source(&self, source: EffectSource, target: StressorId) -> bool {
        self.effects_on(target)
            .iter()
            .any(|effect| effect.source == source)
    }

    /// Number of targets with at least one effect.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.effects.len()
    }

    /// Iterate targets and their effects in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&StressorId, &Vec<StatusEffect>)> {
        self.effects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIPPLE: EffectSource = EffectSource::Ability(AbilityKind::Ripple);
    const FIELD: EffectSource = EffectSource::Ability(AbilityKind::Field);

    fn slow(id: &str, source: EffectSource, value: f64) -> StatusEffect {
        StatusEffect::persistent(id, EffectKind::Slow, source, value, StackingRule::Multiplicative)
    }

    #[test]
    fn test_absent_values_are_neutral() {
        let resolver = StatusEffectResolver::new();
        assert_eq!(resolver.effective_value(EffectKind::Slow, 1), 1.0);
        assert_eq!(resolver.effective_value(EffectKind::Vulnerability, 1), 1.0);
        assert_eq!(resolver.effective_value(EffectKind::DamageReduction, 1), 0.0);
    }

    #[test]
    fn test_multiplicative_slows_combine() {
        let mut resolver = StatusEffectResolver::new();
        resolver.apply(slow("ripple.slow", RIPPLE, 0.5), 1);
        resolver.apply(slow("field.slow", FIELD, 0.8), 1);
        assert!((resolver.effective_value(EffectKind::Slow, 1) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_strongest_wins_takes_minimum() {
        let mut resolver = StatusEffectResolver::new();
        for (id, value) in [("a", 0.7), ("b", 0.3), ("c", 0.9)] {
            resolver.apply(
                StatusEffect::persistent(
                    id,
                    EffectKind::Slow,
                    RIPPLE,
                    value,
                    StackingRule::StrongestWins,
                ),
                4,
            );
        }
        assert_eq!(resolver.effective_value(EffectKind::Slow, 4), 0.3);
    }

    #[test]
    fn test_additive_sums() {
        let mut resolver = StatusEffectResolver::new();
        for (id, value) in [("a", 0.05), ("b", 0.1)] {
            resolver.apply(
                StatusEffect::persistent(
                    id,
                    EffectKind::DamageReduction,
                    EffectSource::Crowd,
                    value,
                    StackingRule::Additive,
                ),
                2,
            );
        }
        let total = resolver.effective_value(EffectKind::DamageReduction, 2);
        assert!((total - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_apply_replaces_same_id() {
        let mut resolver = StatusEffectResolver::new();
        resolver.apply(slow("ripple.slow", RIPPLE, 0.5), 1);
        resolver.apply(slow("ripple.slow", RIPPLE, 0.6), 1);
        assert_eq!(resolver.effects_on(1).len(), 1);
        assert_eq!(resolver.effective_value(EffectKind::Slow, 1), 0.6);
    }

    #[test]
    fn test_remove_variants_drop_empty_targets() {
        let mut resolver = StatusEffectResolver::new();
        resolver.apply(slow("ripple.slow", RIPPLE, 0.5), 1);
        resolver.apply(slow("field.slow", FIELD, 0.8), 1);

        resolver.remove_by_source(RIPPLE, 1);
        assert_eq!(resolver.effects_on(1).len(), 1);
        assert!(!resolver.has_source(RIPPLE, 1));

        resolver.remove("field.slow", 1);
        assert_eq!(resolver.target_count(), 0);

        resolver.apply(slow("field.slow", FIELD, 0.8), 3);
        resolver.remove_by_type(EffectKind::Slow, 3);
        assert_eq!(resolver.target_count(), 0);
    }

    #[test]
    fn test_timed_effects_expire() {
        let mut resolver = StatusEffectResolver::new();
        resolver.apply(
            StatusEffect::timed(
                "echo.slow",
                EffectKind::Slow,
                EffectSource::Ability(AbilityKind::Echo),
                0.7,
                1.0,
                StackingRule::Multiplicative,
            ),
            9,
        );
        resolver.apply(slow("field.slow", FIELD, 0.5), 9);

        resolver.update(0.5);
        assert_eq!(resolver.effects_on(9).len(), 2);

        resolver.update(0.5);
        assert_eq!(resolver.effects_on(9).len(), 1);
        assert_eq!(resolver.effective_value(EffectKind::Slow, 9), 0.5);
    }

    #[test]
    fn test_expiry_removes_empty_target() {
        let mut resolver = StatusEffectResolver::new();
        resolver.apply(
            StatusEffect::timed(
                "t",
                EffectKind::Vulnerability,
                EffectSource::Ability(AbilityKind::Beam),
                1.5,
                0.1,
                StackingRule::Multiplicative,
            ),
            1,
        );
        resolver.update(0.2);
        assert_eq!(resolver.target_count(), 0);
    }

    #[test]
    fn test_clear_source_across_targets() {
        let mut resolver = StatusEffectResolver::new();
        for target in 1..=3 {
            resolver.apply(slow("field.slow", FIELD, 0.5), target);
        }
        resolver.apply(slow("ripple.slow", RIPPLE, 0.5), 2);
        resolver.clear_source(FIELD);
        assert_eq!(resolver.target_count(), 1);
        assert!(resolver.has_source(RIPPLE, 2));
    }

    #[test]
    fn test_effective_speed_never_negative() {
        let mut resolver = StatusEffectResolver::new();
        resolver.apply(slow("bad", RIPPLE, -0.5), 1);
        assert_eq!(resolver.effective_speed(40.0, 1), 0.0);
    }
}
