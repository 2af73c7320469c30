//! Unified damage modifier pipeline.
//!
//! Every point of ability damage flows through [`calculate_damage`]. The
//! stages are applied in a fixed order:
//!
//! ```text
//! level scale -> global amplifier -> phase bonus -> resistance
//!             -> vulnerability -> crowd aura -> clamp to >= 0
//! ```
//!
//! Balance numbers are tuned against this exact order; reordering changes
//! results in the last bits and is a balance change.

use serde::{Deserialize, Serialize};

/// Upper bound on crowd aura damage reduction.
pub const MAX_AURA_REDUCTION: f64 = 0.25;

/// How ability level scales base damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ScalingMode {
    /// `base + level * scaling`
    #[default]
    Additive,
    /// `base * (1 + level * scaling)`
    Multiplicative,
}

impl ScalingMode {
    /// Apply level scaling to `base`.
    #[must_use]
    pub fn scale(self, base: f64, level: u8, scaling: f64) -> f64 {
        let level = f64::from(level);
        match self {
            ScalingMode::Additive => base + level * scaling,
            ScalingMode::Multiplicative => base * (1.0 + level * scaling),
        }
    }
}

/// Inputs to one damage calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    /// Damage before any modifier.
    pub base: f64,
    /// Ability level (use 0 for pre-scaled damage).
    pub level: u8,
    /// Per-level scaling amount.
    pub scaling: f64,
    /// How `scaling` applies.
    pub mode: ScalingMode,
    /// Global amplification (1.0 when none).
    pub amplifier: f64,
    /// Phase bonus fraction, present only when the matching phase is active.
    pub phase_bonus: Option<f64>,
    /// Target resistance fraction in `[0, 1]`.
    pub resistance: f64,
    /// Target vulnerability multiplier.
    pub vulnerability: f64,
    /// Aggregated crowd aura reduction (capped at [`MAX_AURA_REDUCTION`]).
    pub aura: f64,
}

impl DamageInput {
    /// Unmodified damage: no scaling, no amplifier, neutral target.
    #[must_use]
    pub const fn new(base: f64) -> Self {
        Self {
            base,
            level: 0,
            scaling: 0.0,
            mode: ScalingMode::Additive,
            amplifier: 1.0,
            phase_bonus: None,
            resistance: 0.0,
            vulnerability: 1.0,
            aura: 0.0,
        }
    }

    /// Set level scaling.
    #[must_use]
    pub const fn with_level(mut self, level: u8, scaling: f64, mode: ScalingMode) -> Self {
        self.level = level;
        self.scaling = scaling;
        self.mode = mode;
        self
    }

    /// Set the global amplifier.
    #[must_use]
    pub const fn with_amplifier(mut self, amplifier: f64) -> Self {
        self.amplifier = amplifier;
        self
    }

    /// Set the phase bonus.
    #[must_use]
    pub const fn with_phase_bonus(mut self, bonus: Option<f64>) -> Self {
        self.phase_bonus = bonus;
        self
    }

    /// Set target-side modifiers.
    #[must_use]
    pub const fn against(mut self, target: TargetModifiers) -> Self {
        self.resistance = target.resistance;
        self.vulnerability = target.vulnerability;
        self.aura = target.aura;
        self
    }
}

/// Target-side inputs gathered per stressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetModifiers {
    /// Archetype resistance fraction.
    pub resistance: f64,
    /// Archetype vulnerability times status vulnerability.
    pub vulnerability: f64,
    /// Crowd aura reduction.
    pub aura: f64,
}

impl Default for TargetModifiers {
    fn default() -> Self {
        Self {
            resistance: 0.0,
            vulnerability: 1.0,
            aura: 0.0,
        }
    }
}

/// Final damage after the full modifier pipeline.
#[must_use]
pub fn calculate_damage(input: &DamageInput) -> f64 {
    let mut damage = input.mode.scale(input.base, input.level, input.scaling);
    damage *= input.amplifier;
    if let Some(bonus) = input.phase_bonus {
        damage *= 1.0 + bonus;
    }
    damage *= 1.0 - input.resistance.clamp(0.0, 1.0);
    damage *= input.vulnerability;
    damage *= 1.0 - input.aura.clamp(0.0, MAX_AURA_REDUCTION);
    damage.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_modes() {
        assert_eq!(ScalingMode::Additive.scale(10.0, 3, 2.0), 16.0);
        assert!((ScalingMode::Multiplicative.scale(10.0, 2, 0.1) - 12.0).abs() < 1e-12);
        assert_eq!(ScalingMode::Multiplicative.scale(10.0, 0, 0.5), 10.0);
    }

    #[test]
    fn test_full_pipeline_order() {
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
        assert!((calculate_damage(&input) - 19.44).abs() < 1e-9);
    }

    #[test]
    fn test_phase_bonus_only_when_present() {
        let without = calculate_damage(&DamageInput::new(10.0));
        let with = calculate_damage(&DamageInput::new(10.0).with_phase_bonus(Some(0.5)));
        assert_eq!(without, 10.0);
        assert_eq!(with, 15.0);
    }

    #[test]
    fn test_aura_is_capped() {
        let input = DamageInput::new(100.0).against(TargetModifiers {
            aura: 0.9,
            ..TargetModifiers::default()
        });
        assert!((calculate_damage(&input) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_negative() {
        let input = DamageInput::new(-5.0);
        assert_eq!(calculate_damage(&input), 0.0);
        let full_resist = DamageInput::new(50.0).against(TargetModifiers {
            resistance: 1.0,
            ..TargetModifiers::default()
        });
        assert_eq!(calculate_damage(&full_resist), 0.0);
    }

    #[test]
    fn test_prescaled_damage_not_scaled_twice() {
        let prescaled = ScalingMode::Additive.scale(10.0, 4, 2.5);
        let input = DamageInput::new(prescaled).with_level(0, 2.5, ScalingMode::Additive);
        assert_eq!(calculate_damage(&input), 20.0);
    }
}
