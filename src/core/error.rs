//! Error taxonomy.
//!
//! Each kind is a separate type so callers can branch on it without matching
//! message strings. Guard-triggered stops are not errors; they end a run with
//! status `Stopped`.

use thiserror::Error;

use crate::generation::GenerationStatus;

/// An invalid configuration value. Raised at the setter, never clamped.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("desired series count {value} outside {min}..={max}")]
    CountOutOfRange { value: usize, min: usize, max: usize },

    #[error("{name} threshold {value} outside {min}..={max}")]
    ThresholdOutOfRange {
        name: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    #[error("{name} guard {value} below minimum {min}")]
    GuardTooSmall {
        name: &'static str,
        value: u64,
        min: u64,
    },
}

/// An operation that is not legal in the controller's current state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidStateError {
    #[error("controller is not fully configured")]
    NotConfigured,

    #[error("generation already running (status {0})")]
    AlreadyRunning(GenerationStatus),

    #[error("desired count {desired} already reached (list holds {current} series)")]
    CountReached { desired: usize, current: usize },

    #[error("no generation worker is alive (status {0})")]
    NoWorker(GenerationStatus),

    #[error("no worker to join (status {0})")]
    NothingToJoin(GenerationStatus),

    #[error("cannot lower {name} threshold from {current} to {requested} once series exist")]
    ThresholdDecrease {
        name: &'static str,
        current: u8,
        requested: u8,
    },

    #[error("cannot change {0} while generation is running")]
    Busy(&'static str),
}

/// A repair loop exceeded its fixed iteration guard.
///
/// Indicates a structurally unsatisfiable request; fatal to the run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{stage} did not converge within {iterations} iterations")]
pub struct GenerationDeadlockError {
    /// Which repair step gave up.
    pub stage: &'static str,
    /// Iterations spent before giving up.
    pub iterations: u64,
}

/// A card or series violates the row/tens-group or partition invariants.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidCardError {
    #[error("number {number} at position {position} outside 1..=90")]
    NumberOutOfRange { position: usize, number: u8 },

    #[error("number {number} appears more than once")]
    DuplicateNumber { number: u8 },

    #[error("row {row} holds {first} and {second} from the same tens-group")]
    RowTensConflict { row: usize, first: u8, second: u8 },

    #[error("jolly index {0} outside 0..15")]
    JollyOutOfRange(usize),

    #[error("number {number} missing from series")]
    SeriesMissingNumber { number: u8 },
}

/// Errors returned by controller setters and lifecycle operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// The OS refused to create the worker thread.
    #[error("failed to spawn generation worker: {0}")]
    WorkerSpawn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConfigurationError::ThresholdOutOfRange {
            name: "max equal per card",
            value: 3,
            min: 5,
            max: 15,
        };
        assert_eq!(
            err.to_string(),
            "max equal per card threshold 3 outside 5..=15"
        );

        let err = GenerationDeadlockError {
            stage: "tens-conflict repair",
            iterations: 5_000_001,
        };
        assert!(err.to_string().contains("tens-conflict repair"));
    }

    #[test]
    fn test_controller_error_from() {
        let err: ControllerError = InvalidStateError::NotConfigured.into();
        assert!(matches!(
            err,
            ControllerError::InvalidState(InvalidStateError::NotConfigured)
        ));
    }
}
