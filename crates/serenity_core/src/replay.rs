//! Replay system for recording and playing back runs.
//!
//! A replay stores the starting snapshot (which carries the seed and the
//! config) and the stream of external inputs issued during the run. Because
//! the simulation is deterministic, that is enough to recreate every tick.
//!
//! An input recorded at tick `t` is applied when the simulation has
//! processed exactly `t` ticks, before tick `t + 1` runs.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::simulation::{SimInput, Simulation, TickEvents};

/// A single input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayInput {
    /// Ticks processed when the input was applied.
    pub tick: u64,
    /// The input.
    pub input: SimInput,
}

/// Replay format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Seed the run was started with.
    pub seed: u64,
    /// Serialized starting simulation.
    pub initial_state: Vec<u8>,
    /// Inputs in tick order.
    pub inputs: Vec<ReplayInput>,
    /// Last processed tick.
    pub final_tick: u64,
    /// State hash at `final_tick`.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from `initial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized.
    pub fn new(initial: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            seed: initial.run_state().seed,
            initial_state: initial.serialize()?,
            inputs: Vec::new(),
            final_tick: initial.get_tick(),
            final_hash: initial.state_hash(),
        })
    }

    /// Record an input applied after `tick` processed ticks.
    pub fn record(&mut self, tick: u64, input: SimInput) {
        self.inputs.push(ReplayInput { tick, input });
    }

    /// Store the end state.
    pub fn finalize(&mut self, final_tick: u64, final_hash: u64) {
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Serialization(format!("Failed to serialize replay: {e}")))
    }

    /// Decode from bincode, rejecting other format versions.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the version does not match.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize replay: {e}")))?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }
        Ok(replay)
    }

    /// Starting simulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be decoded.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::deserialize(&self.initial_state)
    }

    /// Inputs applied at `tick`.
    #[must_use]
    pub fn inputs_at_tick(&self, tick: u64) -> Vec<&ReplayInput> {
        self.inputs.iter().filter(|record| record.tick == tick).collect()
    }

    /// Number of recorded inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

/// Drives a simulation while writing every input into a [`Replay`].
#[derive(Debug)]
pub struct ReplayRecorder {
    simulation: Simulation,
    replay: Replay,
}

impl ReplayRecorder {
    /// Start recording from the current state of `simulation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the starting snapshot cannot be serialized.
    pub fn new(simulation: Simulation) -> Result<Self> {
        let replay = Replay::new(&simulation)?;
        Ok(Self { simulation, replay })
    }

    /// Apply and record an input.
    pub fn apply(&mut self, input: SimInput) {
        self.simulation.apply_input(&input);
        self.replay.record(self.simulation.get_tick(), input);
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> TickEvents {
        self.simulation.tick()
    }

    /// Simulation being recorded.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Finalize and hand back the replay and the simulation.
    #[must_use]
    pub fn finish(mut self) -> (Replay, Simulation) {
        self.replay
            .finalize(self.simulation.get_tick(), self.simulation.state_hash());
        (self.replay, self.simulation)
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    input_index: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at the start of `replay`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            simulation,
            input_index: 0,
        })
    }

    fn apply_due_inputs(&mut self) {
        let tick = self.simulation.get_tick();
        while let Some(record) = self.replay.inputs.get(self.input_index) {
            if record.tick > tick {
                break;
            }
            self.simulation.apply_input(&record.input);
            self.input_index += 1;
        }
    }

    /// Apply due inputs and advance one tick.
    ///
    /// Returns true while there are more ticks to play.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.apply_due_inputs();
        if !self.simulation.is_running() {
            return false;
        }
        self.simulation.tick();
        !self.is_finished()
    }

    /// Replay from the start up to `target_tick`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = self.replay.restore_initial_state()?;
        self.input_index = 0;
        let target = target_tick.min(self.replay.final_tick);
        while self.simulation.get_tick() < target {
            self.apply_due_inputs();
            if !self.simulation.is_running() {
                break;
            }
            self.simulation.tick();
        }
        Ok(())
    }

    /// Re-simulate the whole replay and compare the final hash.
    ///
    /// Inputs recorded at the final tick itself (after the last tick ran)
    /// are applied before hashing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ReplayDiverged`] on a hash mismatch, or an
    /// error if the initial state cannot be restored.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.final_tick)?;
        self.apply_due_inputs();
        let actual = self.simulation.state_hash();
        if actual == self.replay.final_hash {
            Ok(())
        } else {
            Err(GameError::ReplayDiverged {
                tick: self.simulation.get_tick(),
                expected: self.replay.final_hash,
                actual,
            })
        }
    }

    /// Processed ticks of the replayed simulation.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.simulation.get_tick()
    }

    /// Replayed simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Reached the recorded end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.simulation.get_tick() >= self.replay.final_tick
    }

    /// Progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.final_tick == 0 {
            100.0
        } else {
            (self.current_tick() as f64 / self.replay.final_tick as f64) * 100.0
        }
    }
}
