//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays, snapshots and batch balance runs all rely on the simulation
//! being 100% deterministic. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The core only uses ordered maps and iterates stressors in id order.
//!
//! - **System randomness**: No calls to `rand()` without explicit seeds.
//!   All "random" behavior uses the seeded [`serenity_core::rng::SimRng`].
//!
//! - **Floating-point formatting**: State hashes quantize every float to
//!   fixed-point first, so the hash only depends on the values.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual component determinism (movement, abilities)
//! 2. **Property tests**: Random seeds and inputs must still reproduce
//! 3. **Integration tests**: Full runs are reproducible
//! 4. **Parallel tests**: Running N simulations on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use serenity_core::replay::{ReplayPlayer, ReplayRecorder};
use serenity_core::simulation::{SimInput, Simulation};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use serenity_core::config::SimConfig;
/// use serenity_core::simulation::Simulation;
/// use serenity_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     120,
///     || Simulation::new(SimConfig::default(), 42).unwrap(),
///     |sim| {
///         sim.tick();
///     },
///     Simulation::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run two identically seeded simulations and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        tracing::warn!("Simulations differ before the first tick");
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        let (a, b) = (sim1.state_hash(), sim2.state_hash());
        if a != b {
            tracing::warn!(tick, a, b, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot round trip preserves state and future ticks.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.tick();
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for _ in 0..num_ticks.min(60) {
        sim.tick();
        restored.tick();
    }
    restored.state_hash() == sim.state_hash()
}

/// Record a run with `inputs` (applied at their tick) and verify the replay.
///
/// # Errors
///
/// Returns the replay error when recording or verification fails.
pub fn verify_replay(
    sim: Simulation,
    inputs: &[(u64, SimInput)],
    num_ticks: u64,
) -> serenity_core::error::Result<()> {
    let mut recorder = ReplayRecorder::new(sim)?;
    let mut pending = inputs.iter().peekable();
    for tick in 0..num_ticks {
        while let Some((_, input)) = pending.next_if(|(at, _)| *at <= tick) {
            recorder.apply(input.clone());
        }
        recorder.tick();
    }
    let (replay, _) = recorder.finish();
    ReplayPlayer::new(replay)?.verify()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulation.
pub mod strategies {
    use proptest::prelude::*;
    use serenity_core::abilities::{AbilityKind, Branch};
    use serenity_core::math::Vec2;
    use serenity_core::simulation::{RunStateDelta, SimInput};
    use serenity_core::status_effects::{EffectKind, EffectSource, StackingRule, StatusEffect};
    use serenity_core::stressors::StressorKind;

    /// Any seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Any ability.
    pub fn arb_ability() -> impl Strategy<Value = AbilityKind> {
        prop::sample::select(AbilityKind::ALL.to_vec())
    }

    /// Any stressor archetype.
    pub fn arb_stressor_kind() -> impl Strategy<Value = StressorKind> {
        prop::sample::select(StressorKind::ALL.to_vec())
    }

    /// Slow multiplier in `[0, 1]`.
    pub fn arb_slow_value() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    /// Damage amounts, including zero and negative inputs.
    pub fn arb_damage() -> impl Strategy<Value = f64> {
        -50.0f64..500.0
    }

    /// Offset from the defender within a 1200x900 field.
    pub fn arb_offset() -> impl Strategy<Value = Vec2> {
        (-700.0f64..700.0, -500.0f64..500.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Persistent multiplicative slows with distinct ids.
    pub fn arb_slow_stack(max_len: usize) -> impl Strategy<Value = Vec<StatusEffect>> {
        prop::collection::vec(arb_slow_value(), 0..=max_len).prop_map(|values| {
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    StatusEffect::persistent(
                        format!("test.slow.{i}"),
                        EffectKind::Slow,
                        EffectSource::Crowd,
                        value,
                        StackingRule::Multiplicative,
                    )
                })
                .collect()
        })
    }

    /// One external input that is always structurally valid.
    pub fn arb_input() -> impl Strategy<Value = SimInput> {
        prop_oneof![
            arb_ability().prop_map(SimInput::UpgradeAbility),
            (arb_ability(), 0usize..3, any::<bool>()).prop_map(|(ability, threshold, left)| {
                SimInput::ChooseBranch {
                    ability,
                    threshold,
                    branch: if left { Branch::Left } else { Branch::Right },
                }
            }),
            (1u64..40, arb_damage()).prop_map(|(id, amount)| SimInput::DamageEntity { id, amount }),
            (0u32..200).prop_map(|insight| SimInput::ApplyStateDelta(RunStateDelta {
                insight: Some(insight),
                ..RunStateDelta::default()
            })),
        ]
    }

    /// Inputs paired with the tick they are applied at, sorted by tick.
    pub fn arb_input_schedule(max_len: usize, max_tick: u64) -> impl Strategy<Value = Vec<(u64, SimInput)>> {
        prop::collection::vec((0..max_tick, arb_input()), 0..=max_len).prop_map(|mut schedule| {
            schedule.sort_by_key(|(tick, _)| *tick);
            schedule
        })
    }
}
