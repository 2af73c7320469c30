//! Simulation benchmarks for serenity_core.
//!
//! Run with: `cargo bench -p serenity_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use serenity_core::config::SimConfig;
use serenity_core::simulation::{RunStateDelta, Simulation};

/// A simulation a few waves in, with a crowded field and every ability on.
fn crowded_simulation() -> Simulation {
    let mut config = SimConfig::default();
    config.waves.base_count = 60.0;
    config.run.regen_per_second = 50.0;
    let mut sim = Simulation::new(config, 0xBEEF).expect("default config is valid");
    sim.apply_state_delta(RunStateDelta {
        wave: Some(8),
        ..RunStateDelta::default()
    });
    for _ in 0..120 {
        sim.tick();
    }
    sim
}

/// Runs simulation benchmarks for the serenity_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_crowded_wave", |b| {
        b.iter_batched(
            crowded_simulation,
            |mut sim| {
                for _ in 0..60 {
                    black_box(sim.tick());
                }
                sim
            },
            BatchSize::LargeInput,
        );
    });

    let sim = crowded_simulation();
    c.bench_function("state_hash", |b| b.iter(|| black_box(sim.state_hash())));
    c.bench_function("snapshot_roundtrip", |b| {
        b.iter(|| {
            let bytes = sim.serialize().expect("serializes");
            black_box(Simulation::deserialize(&bytes).expect("deserializes"))
        });
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
