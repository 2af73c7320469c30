//! Immutable simulation configuration.
//!
//! Every tunable the simulation reads lives here. A [`SimConfig`] is built
//! once (from defaults or a RON document), validated, and handed to the
//! [`Simulation`](crate::simulation::Simulation). Changing tuning mid-run goes
//! through [`Simulation::reconfigure`](crate::simulation::Simulation::reconfigure),
//! never through field mutation.
//!
//! All structs use `#[serde(default)]` so partial documents work:
//!
//! ```ron
//! SimConfig(
//!     waves: (base_count: 8.0),
//!     abilities: (beam: (enabled: false)),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Vec2;
use crate::stressors::StressorKind;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Playfield geometry.
    pub playfield: PlayfieldConfig,
    /// Run-level resources and wave timing.
    pub run: RunConfig,
    /// Wave spawn scaling.
    pub waves: WaveConfig,
    /// Per-archetype stressor stats.
    pub stressors: StressorTable,
    /// Movement strategy tuning.
    pub movement: MovementConfig,
    /// Crowd aura tuning.
    pub crowd: CrowdConfig,
    /// Ability upgrade costs and limits.
    pub progression: ProgressionConfig,
    /// Per-ability parameters.
    pub abilities: AbilitiesConfig,
}

impl SimConfig {
    /// Parse a RON document and validate it.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(source).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty RON document.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Reject values that would break simulation invariants.
    pub fn validate(&self) -> Result<()> {
        let p = &self.playfield;
        positive("playfield.width", p.width)?;
        positive("playfield.height", p.height)?;
        non_negative("playfield.padding", p.padding)?;
        if p.padding * 2.0 >= p.width.min(p.height) {
            return Err(GameError::invalid_config(
                "playfield.padding",
                "must be smaller than half of the shortest playfield side",
            ));
        }
        positive("playfield.defender_radius", p.defender_radius)?;
        positive("playfield.max_velocity", p.max_velocity)?;

        positive("run.max_serenity", self.run.max_serenity)?;
        non_negative("run.regen_per_second", self.run.regen_per_second)?;
        positive("run.wave_duration_seconds", self.run.wave_duration_seconds)?;
        non_negative(
            "run.early_advance_min_seconds",
            self.run.early_advance_min_seconds,
        )?;
        positive("run.pace", self.run.pace)?;

        let w = &self.waves;
        positive("waves.base_count", w.base_count)?;
        positive("waves.count_multiplier", w.count_multiplier)?;
        positive("waves.health_scaling", w.health_scaling)?;
        positive("waves.speed_scaling", w.speed_scaling)?;
        positive("waves.base_health", w.base_health)?;
        positive("waves.base_speed", w.base_speed)?;
        positive("waves.base_size", w.base_size)?;

        for kind in StressorKind::ALL {
            let a = self.stressors.get(kind);
            let name = kind.name();
            positive(&format!("stressors.{name}.health"), a.health)?;
            non_negative(&format!("stressors.{name}.speed"), a.speed)?;
            positive(&format!("stressors.{name}.size"), a.size)?;
            fraction(&format!("stressors.{name}.resistance"), a.resistance)?;
            positive(&format!("stressors.{name}.vulnerability"), a.vulnerability)?;
            non_negative(&format!("stressors.{name}.collision_damage"), a.collision_damage)?;
            if a.unlock_wave == 0 {
                return Err(GameError::invalid_config(
                    format!("stressors.{name}.unlock_wave"),
                    "waves are numbered from 1",
                ));
            }
        }
        if self.stressors.get(StressorKind::Worry).unlock_wave != 1 {
            return Err(GameError::invalid_config(
                "stressors.worry.unlock_wave",
                "wave 1 needs at least one archetype",
            ));
        }

        fraction("crowd.aura_cap", self.crowd.aura_cap)?;
        non_negative("crowd.aura_per_neighbor", self.crowd.aura_per_neighbor)?;

        positive("progression.cost_growth", self.progression.cost_growth)?;
        if self.progression.max_level == 0 {
            return Err(GameError::invalid_config(
                "progression.max_level",
                "must allow at least one level",
            ));
        }

        self.abilities.validate()
    }

    /// Playfield center, where the defender stands.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.playfield.width / 2.0, self.playfield.height / 2.0)
    }
}

fn positive(field: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GameError::invalid_config(field, format!("must be > 0, got {value}")))
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GameError::invalid_config(field, format!("must be >= 0, got {value}")))
    }
}

fn fraction(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GameError::invalid_config(field, format!("must be within [0, 1], got {value}")))
    }
}

/// Playfield geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    /// Width in world units.
    pub width: f64,
    /// Height in world units.
    pub height: f64,
    /// Inset from every edge that stressors never cross.
    pub padding: f64,
    /// Collision radius of the defender.
    pub defender_radius: f64,
    /// Hard cap on stressor velocity magnitude.
    pub max_velocity: f64,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 20.0,
            defender_radius: 40.0,
            max_velocity: 400.0,
        }
    }
}

/// Run-level resources and wave timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum (and starting) serenity.
    pub max_serenity: f64,
    /// Insight available at the start of a run.
    pub starting_insight: u32,
    /// Passive serenity regeneration while above zero.
    pub regen_per_second: f64,
    /// Length of a wave before the next one starts.
    pub wave_duration_seconds: f64,
    /// Advance early once the field is clear.
    pub early_advance: bool,
    /// Minimum wave age before an early advance.
    pub early_advance_min_seconds: f64,
    /// Initial pace multiplier.
    pub pace: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_serenity: 100.0,
            starting_insight: 0,
            regen_per_second: 0.5,
            wave_duration_seconds: 30.0,
            early_advance: true,
            early_advance_min_seconds: 5.0,
            pace: 1.0,
        }
    }
}

/// Wave spawn scaling.
///
/// Wave `n` spawns `floor(base_count * count_multiplier^(n-1))` stressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Stressors in wave 1.
    pub base_count: f64,
    /// Growth of the count per wave.
    pub count_multiplier: f64,
    /// Growth of health per wave.
    pub health_scaling: f64,
    /// Growth of speed per wave.
    pub speed_scaling: f64,
    /// Health before archetype and wave modifiers.
    pub base_health: f64,
    /// Speed before archetype and wave modifiers (units per second).
    pub base_speed: f64,
    /// Radius before archetype modifiers.
    pub base_size: f64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_count: 5.0,
            count_multiplier: 1.2,
            health_scaling: 1.15,
            speed_scaling: 1.03,
            base_health: 20.0,
            base_speed: 40.0,
            base_size: 12.0,
        }
    }
}

/// Stats for one stressor archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeConfig {
    /// First wave this archetype can appear in.
    pub unlock_wave: u32,
    /// Health modifier.
    pub health: f64,
    /// Speed modifier.
    pub speed: f64,
    /// Size modifier.
    pub size: f64,
    /// Damage resistance fraction in `[0, 1]`.
    pub resistance: f64,
    /// Incoming damage multiplier (`> 1` means vulnerable).
    pub vulnerability: f64,
    /// Whether this archetype shields nearby kin with a crowd aura.
    pub projects_aura: bool,
    /// Serenity lost when it reaches the defender.
    pub collision_damage: f64,
    /// Insight granted when defeated.
    pub insight_reward: u32,
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            unlock_wave: 1,
            health: 1.0,
            speed: 1.0,
            size: 1.0,
            resistance: 0.0,
            vulnerability: 1.0,
            projects_aura: false,
            collision_damage: 5.0,
            insight_reward: 1,
        }
    }
}

impl ArchetypeConfig {
    fn unlocked_at(wave: u32) -> Self {
        Self {
            unlock_wave: wave,
            ..Self::default()
        }
    }
}

/// Per-archetype table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressorTable {
    /// Direct movers.
    pub worry: ArchetypeConfig,
    /// Wobbling movers.
    pub anxiety: ArchetypeConfig,
    /// Orbit-then-dash movers.
    pub rumination: ArchetypeConfig,
    /// Erratic movers.
    pub panic: ArchetypeConfig,
    /// Speed up as serenity drops.
    pub deadline: ArchetypeConfig,
    /// Speed up near the center and in crowds.
    pub overwhelm: ArchetypeConfig,
    /// Resistant, aura-projecting.
    pub doubt: ArchetypeConfig,
    /// Heavy, aura-projecting, vulnerable.
    pub dread: ArchetypeConfig,
}

impl StressorTable {
    /// Stats for an archetype.
    #[must_use]
    pub fn get(&self, kind: StressorKind) -> &ArchetypeConfig {
        match kind {
            StressorKind::Worry => &self.worry,
            StressorKind::Anxiety => &self.anxiety,
            StressorKind::Rumination => &self.rumination,
            StressorKind::Panic => &self.panic,
            StressorKind::Deadline => &self.deadline,
            StressorKind::Overwhelm => &self.overwhelm,
            StressorKind::Doubt => &self.doubt,
            StressorKind::Dread => &self.dread,
        }
    }

    /// Archetypes available in `wave`, in declaration order.
    #[must_use]
    pub fn unlocked(&self, wave: u32) -> Vec<StressorKind> {
        StressorKind::ALL
            .into_iter()
            .filter(|&kind| self.get(kind).unlock_wave <= wave)
            .collect()
    }
}

impl Default for StressorTable {
    fn default() -> Self {
        Self {
            worry: ArchetypeConfig::unlocked_at(1),
            anxiety: ArchetypeConfig {
                health: 0.9,
                speed: 1.1,
                ..ArchetypeConfig::unlocked_at(2)
            },
            rumination: ArchetypeConfig {
                health: 1.2,
                speed: 1.2,
                collision_damage: 7.0,
                insight_reward: 2,
                ..ArchetypeConfig::unlocked_at(3)
            },
            panic: ArchetypeConfig {
                health: 0.7,
                speed: 1.4,
                size: 0.8,
                insight_reward: 2,
                ..ArchetypeConfig::unlocked_at(4)
            },
            deadline: ArchetypeConfig {
                health: 1.1,
                collision_damage: 6.0,
                insight_reward: 2,
                ..ArchetypeConfig::unlocked_at(5)
            },
            overwhelm: ArchetypeConfig {
                health: 0.8,
                speed: 0.9,
                size: 0.9,
                insight_reward: 2,
                ..ArchetypeConfig::unlocked_at(6)
            },
            doubt: ArchetypeConfig {
                health: 1.5,
                speed: 0.8,
                size: 1.2,
                resistance: 0.3,
                projects_aura: true,
                collision_damage: 8.0,
                insight_reward: 3,
                ..ArchetypeConfig::unlocked_at(7)
            },
            dread: ArchetypeConfig {
                health: 3.0,
                speed: 0.6,
                size: 1.6,
                vulnerability: 1.25,
                projects_aura: true,
                collision_damage: 15.0,
                insight_reward: 5,
                ..ArchetypeConfig::unlocked_at(8)
            },
        }
    }
}

/// Movement strategy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Perpendicular wobble amplitude relative to speed.
    pub wobble_amplitude: f64,
    /// Wobble angular frequency (radians per second).
    pub wobble_frequency: f64,
    /// Smallest orbit radius assigned at spawn.
    pub orbit_radius_min: f64,
    /// Largest orbit radius assigned at spawn.
    pub orbit_radius_max: f64,
    /// Time spent orbiting before a dash.
    pub dash_interval_seconds: f64,
    /// Speed multiplier while dashing.
    pub dash_multiplier: f64,
    /// Fraction of the orbit radius below which an orbiting stressor backs off.
    pub orbit_too_close_fraction: f64,
    /// Length of one erratic hesitate/approach cycle.
    pub erratic_cycle_seconds: f64,
    /// Hesitation part of each erratic cycle.
    pub erratic_hesitation_seconds: f64,
    /// Speed multiplier while hesitating.
    pub erratic_hesitation_speed: f64,
    /// Largest random heading deviation (radians).
    pub erratic_max_deviation: f64,
    /// How long a startled erratic stressor retreats.
    pub retreat_seconds: f64,
    /// Serenity ratio below which time-pressure kicks in.
    pub pressure_threshold: f64,
    /// Speed multiplier at zero serenity.
    pub pressure_max_multiplier: f64,
    /// Distance at which acceleration starts ramping.
    pub accel_ramp_distance: f64,
    /// Speed multiplier at the center.
    pub accel_max_multiplier: f64,
    /// Radius for counting cascading kin.
    pub cascade_radius: f64,
    /// Bonus per nearby kin.
    pub cascade_bonus_per_neighbor: f64,
    /// Cap on the cascade bonus.
    pub cascade_max_bonus: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            wobble_amplitude: 0.6,
            wobble_frequency: 3.0,
            orbit_radius_min: 160.0,
            orbit_radius_max: 240.0,
            dash_interval_seconds: 3.0,
            dash_multiplier: 2.5,
            orbit_too_close_fraction: 0.5,
            erratic_cycle_seconds: 2.0,
            erratic_hesitation_seconds: 0.6,
            erratic_hesitation_speed: 0.05,
            erratic_max_deviation: 0.5,
            retreat_seconds: 1.0,
            pressure_threshold: 0.5,
            pressure_max_multiplier: 2.0,
            accel_ramp_distance: 400.0,
            accel_max_multiplier: 2.0,
            cascade_radius: 80.0,
            cascade_bonus_per_neighbor: 0.1,
            cascade_max_bonus: 0.5,
        }
    }
}

/// Crowd aura tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdConfig {
    /// Radius within which aura-projecting kin shield each other.
    pub aura_radius: f64,
    /// Damage reduction granted per projecting neighbour.
    pub aura_per_neighbor: f64,
    /// Upper bound on the aggregated reduction.
    pub aura_cap: f64,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            aura_radius: 100.0,
            aura_per_neighbor: 0.05,
            aura_cap: 0.25,
        }
    }
}

/// Ability upgrade costs and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Highest ability level.
    pub max_level: u8,
    /// Insight cost of the first upgrade.
    pub base_cost: f64,
    /// Cost growth per level.
    pub cost_growth: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            max_level: 10,
            base_cost: 10.0,
            cost_growth: 1.5,
        }
    }
}

/// Per-ability parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilitiesConfig {
    /// Continuous inhale/exhale aura.
    pub breath: BreathConfig,
    /// Periodic expanding slow pulse.
    pub ripple: RippleConfig,
    /// Timed global damage amplifier.
    pub focus: FocusConfig,
    /// Staggered burst waves.
    pub echo: EchoConfig,
    /// Low-serenity reactive barrier.
    pub barrier: BarrierConfig,
    /// Channelled single-target beam.
    pub beam: BeamConfig,
    /// Randomly placed slowing field.
    pub field: FieldConfig,
    /// Low-serenity one-shot release.
    pub release: ReleaseConfig,
    /// Offense/defense phase oscillator.
    pub rhythm: RhythmConfig,
}

impl AbilitiesConfig {
    /// Copy of this config with every ability disabled.
    #[must_use]
    pub fn all_disabled(&self) -> Self {
        let mut out = self.clone();
        out.breath.enabled = false;
        out.ripple.enabled = false;
        out.focus.enabled = false;
        out.echo.enabled = false;
        out.barrier.enabled = false;
        out.beam.enabled = false;
        out.field.enabled = false;
        out.release.enabled = false;
        out.rhythm.enabled = false;
        out
    }

    fn validate(&self) -> Result<()> {
        positive("abilities.breath.cycle_seconds", self.breath.cycle_seconds)?;
        fraction("abilities.breath.slow", self.breath.slow)?;
        positive("abilities.ripple.duration_seconds", self.ripple.duration_seconds)?;
        non_negative("abilities.ripple.cooldown_seconds", self.ripple.cooldown_seconds)?;
        fraction("abilities.ripple.slow", self.ripple.slow)?;
        fraction("abilities.ripple.min_slow", self.ripple.min_slow)?;
        positive("abilities.focus.duration_seconds", self.focus.duration_seconds)?;
        non_negative("abilities.focus.cooldown_seconds", self.focus.cooldown_seconds)?;
        positive("abilities.focus.amplifier", self.focus.amplifier)?;
        non_negative("abilities.echo.cooldown_seconds", self.echo.cooldown_seconds)?;
        positive("abilities.echo.expansion_speed", self.echo.expansion_speed)?;
        positive("abilities.echo.early_rate", self.echo.early_rate)?;
        fraction("abilities.echo.early_threshold", self.echo.early_threshold)?;
        fraction("abilities.echo.slow", self.echo.slow)?;
        fraction("abilities.barrier.trigger_ratio", self.barrier.trigger_ratio)?;
        fraction("abilities.barrier.absorb", self.barrier.absorb)?;
        positive("abilities.barrier.duration_seconds", self.barrier.duration_seconds)?;
        non_negative("abilities.barrier.cooldown_seconds", self.barrier.cooldown_seconds)?;
        positive("abilities.beam.duration_seconds", self.beam.duration_seconds)?;
        non_negative("abilities.beam.cooldown_seconds", self.beam.cooldown_seconds)?;
        fraction("abilities.beam.slow", self.beam.slow)?;
        positive("abilities.field.duration_seconds", self.field.duration_seconds)?;
        non_negative("abilities.field.cooldown_seconds", self.field.cooldown_seconds)?;
        fraction("abilities.field.slow", self.field.slow)?;
        if self.field.max_distance < self.field.min_distance {
            return Err(GameError::invalid_config(
                "abilities.field.max_distance",
                "must not be below min_distance",
            ));
        }
        fraction("abilities.release.trigger_ratio", self.release.trigger_ratio)?;
        non_negative("abilities.release.cooldown_seconds", self.release.cooldown_seconds)?;
        positive("abilities.rhythm.cycle_seconds", self.rhythm.cycle_seconds)?;
        non_negative("abilities.rhythm.cycle_per_level", self.rhythm.cycle_per_level)?;
        Ok(())
    }
}

/// Continuous two-phase aura.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Full inhale + exhale duration.
    pub cycle_seconds: f64,
    /// Radius at an empty breath.
    pub min_radius: f64,
    /// Radius at a full breath, before level scaling.
    pub max_radius: f64,
    /// Extra full radius per level.
    pub radius_per_level: f64,
    /// Slow multiplier inside the aura.
    pub slow: f64,
    /// Damage dealt at each peak.
    pub peak_damage: f64,
    /// Additive damage per level.
    pub damage_per_level: f64,
}

impl Default for BreathConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cycle_seconds: 8.0,
            min_radius: 60.0,
            max_radius: 140.0,
            radius_per_level: 8.0,
            slow: 0.85,
            peak_damage: 5.0,
            damage_per_level: 1.5,
        }
    }
}

/// Periodic expanding pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Time between pulses.
    pub cooldown_seconds: f64,
    /// Time for the pulse to reach full radius.
    pub duration_seconds: f64,
    /// Full radius before level scaling.
    pub max_radius: f64,
    /// Extra radius per level.
    pub radius_per_level: f64,
    /// Slow multiplier at level 0.
    pub slow: f64,
    /// Slow strengthening per level (subtracted from the multiplier).
    pub slow_per_level: f64,
    /// Strongest slow the pulse can reach.
    pub min_slow: f64,
    /// Damage on first contact.
    pub damage: f64,
    /// Additive damage per level.
    pub damage_per_level: f64,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_seconds: 6.0,
            duration_seconds: 1.5,
            max_radius: 220.0,
            radius_per_level: 15.0,
            slow: 0.6,
            slow_per_level: 0.03,
            min_slow: 0.2,
            damage: 8.0,
            damage_per_level: 2.0,
        }
    }
}

/// Timed global amplifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Time between activations.
    pub cooldown_seconds: f64,
    /// Active window.
    pub duration_seconds: f64,
    /// Damage multiplier while active.
    pub amplifier: f64,
    /// Additive amplifier per level.
    pub amplifier_per_level: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_seconds: 12.0,
            duration_seconds: 5.0,
            amplifier: 1.5,
            amplifier_per_level: 0.05,
        }
    }
}

/// Staggered burst waves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Time between bursts.
    pub cooldown_seconds: f64,
    /// Serenity ratio below which the cooldown runs faster.
    pub early_threshold: f64,
    /// Cooldown speed-up below the threshold.
    pub early_rate: f64,
    /// Waves per burst at level 0.
    pub wave_count: u32,
    /// Levels per extra wave.
    pub levels_per_extra_wave: u8,
    /// Delay between consecutive waves.
    pub stagger_seconds: f64,
    /// Ring expansion speed.
    pub expansion_speed: f64,
    /// Max radius of the first wave.
    pub max_radius: f64,
    /// Extra max radius for each later wave.
    pub radius_step: f64,
    /// Thickness of the ring front that hits stressors.
    pub band_thickness: f64,
    /// Damage per wave hit.
    pub damage: f64,
    /// Additive damage per level.
    pub damage_per_level: f64,
    /// Slow multiplier applied on hit.
    pub slow: f64,
    /// Duration of the slow.
    pub slow_seconds: f64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_seconds: 10.0,
            early_threshold: 0.4,
            early_rate: 2.0,
            wave_count: 3,
            levels_per_extra_wave: 3,
            stagger_seconds: 0.4,
            expansion_speed: 300.0,
            max_radius: 260.0,
            radius_step: 40.0,
            band_thickness: 18.0,
            damage: 10.0,
            damage_per_level: 2.5,
            slow: 0.7,
            slow_seconds: 1.5,
        }
    }
}

/// Low-serenity reactive barrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Serenity ratio at or below which the barrier rises.
    pub trigger_ratio: f64,
    /// Time before it can rise again.
    pub cooldown_seconds: f64,
    /// Active window.
    pub duration_seconds: f64,
    /// Radius before level scaling.
    pub radius: f64,
    /// Extra radius per level.
    pub radius_per_level: f64,
    /// Fraction of current health dealt to stressors inside on activation.
    pub health_fraction: f64,
    /// Additive fraction per level.
    pub fraction_per_level: f64,
    /// Fraction of collision damage absorbed while active.
    pub absorb: f64,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_ratio: 0.35,
            cooldown_seconds: 20.0,
            duration_seconds: 4.0,
            radius: 120.0,
            radius_per_level: 8.0,
            health_fraction: 0.3,
            fraction_per_level: 0.03,
            absorb: 1.0,
        }
    }
}

/// Channelled beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Time between channels.
    pub cooldown_seconds: f64,
    /// Channel length.
    pub duration_seconds: f64,
    /// Damage per second.
    pub damage_per_second: f64,
    /// Additive damage per second per level.
    pub dps_per_level: f64,
    /// Slow on the target.
    pub slow: f64,
    /// Vulnerability multiplier on the target.
    pub vulnerability: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_seconds: 4.0,
            duration_seconds: 3.0,
            damage_per_second: 20.0,
            dps_per_level: 4.0,
            slow: 0.5,
            vulnerability: 1.25,
        }
    }
}

/// Randomly placed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Time between fields.
    pub cooldown_seconds: f64,
    /// Field lifetime.
    pub duration_seconds: f64,
    /// Field radius.
    pub radius: f64,
    /// Closest spawn distance from center.
    pub min_distance: f64,
    /// Farthest spawn distance from center.
    pub max_distance: f64,
    /// Slow inside the field.
    pub slow: f64,
    /// Damage per second inside the field.
    pub damage_per_second: f64,
    /// Multiplicative damage per level.
    pub scaling: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_seconds: 9.0,
            duration_seconds: 5.0,
            radius: 90.0,
            min_distance: 150.0,
            max_distance: 320.0,
            slow: 0.5,
            damage_per_second: 6.0,
            scaling: 0.1,
        }
    }
}

/// Low-serenity one-shot release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Serenity ratio at or below which it fires.
    pub trigger_ratio: f64,
    /// Time before it can fire again.
    pub cooldown_seconds: f64,
    /// Reach of the release.
    pub radius: f64,
    /// Damage to everything in reach.
    pub damage: f64,
    /// Multiplicative damage per level.
    pub scaling: f64,
    /// Serenity restored.
    pub restore: f64,
    /// Multiplicative restore per level.
    pub restore_scaling: f64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_ratio: 0.25,
            cooldown_seconds: 30.0,
            radius: 400.0,
            damage: 40.0,
            scaling: 0.1,
            restore: 30.0,
            restore_scaling: 0.1,
        }
    }
}

/// Offense/defense oscillator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    /// Whether the ability runs.
    pub enabled: bool,
    /// Length of each phase at level 0.
    pub cycle_seconds: f64,
    /// Extra phase length per level.
    pub cycle_per_level: f64,
    /// Phase bonus fraction at level 0.
    pub bonus: f64,
    /// Additive bonus per level.
    pub bonus_per_level: f64,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cycle_seconds: 6.0,
            cycle_per_level: 0.5,
            bonus: 0.2,
            bonus_per_level: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimConfig::from_ron_str("(waves: (base_count: 8.0))").unwrap();
        assert_eq!(config.waves.base_count, 8.0);
        assert_eq!(config.waves.count_multiplier, WaveConfig::default().count_multiplier);
        assert!(config.abilities.beam.enabled);
    }

    #[test]
    fn test_ron_roundtrip_preserves_config() {
        let config = SimConfig::default();
        let text = config.to_ron_string().unwrap();
        assert_eq!(SimConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_oversized_padding() {
        let mut config = SimConfig::default();
        config.playfield.padding = 500.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig { ref field, .. } if field == "playfield.padding"));
    }

    #[test]
    fn test_rejects_resistance_over_one() {
        let mut config = SimConfig::default();
        config.stressors.doubt.resistance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            SimConfig::from_ron_str("(waves: 12"),
            Err(GameError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_unlock_table_is_monotone() {
        let table = StressorTable::default();
        assert_eq!(table.unlocked(1), vec![StressorKind::Worry]);
        let mut previous = 0;
        for wave in 1..=10 {
            let count = table.unlocked(wave).len();
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(table.unlocked(8).len(), StressorKind::ALL.len());
    }

    #[test]
    fn test_all_disabled() {
        let abilities = AbilitiesConfig::default().all_disabled();
        assert!(!abilities.breath.enabled);
        assert!(!abilities.rhythm.enabled);
    }
}
