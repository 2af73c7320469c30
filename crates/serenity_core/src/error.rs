//! Error types for the simulation core.
//!
//! The simulation itself never fails: logical anomalies (dead targets,
//! rejected upgrades, out-of-range values) degrade to safe defaults. Errors
//! only surface at the edges, when loading configuration or moving state
//! in and out of bytes.

use thiserror::Error;

use crate::stressors::StressorId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum GameError {
    /// A configuration value is out of its valid range.
    #[error("Invalid config value for '{field}': {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Failed to parse a configuration document.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// A stressor id does not refer to a live stressor.
    #[error("Stressor not found: {0}")]
    StressorNotFound(StressorId),

    /// Snapshot or replay encoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Replay was recorded with an incompatible format version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the replay.
        found: u32,
    },

    /// Replayed simulation diverged from the recording.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayDiverged {
        /// Tick where the comparison was made.
        tick: u64,
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by re-simulation.
        actual: u64,
    },
}

impl GameError {
    /// Shorthand for an [`GameError::InvalidConfig`] error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
