//! Core building blocks: RNG, configuration, errors, logging.
//!
//! Nothing here knows about cards; the card and series modules build on it.

pub mod rng;
pub mod config;
pub mod error;
pub mod log;

pub use rng::{SeriesRng, MAX_NUMBER, MIN_NUMBER};
pub use config::{
    GenerationConfig, Thresholds, MAX_EQUAL_PER_CARD, MAX_EQUAL_PER_ROW, MAX_SERIES_COUNT,
    MIN_EQUAL_PER_CARD, MIN_EQUAL_PER_ROW, MIN_ITERATION_GUARD, MIN_SERIES_COUNT,
    MIN_TIME_GUARD_MS,
};
pub use error::{
    ConfigurationError, ControllerError, GenerationDeadlockError, InvalidCardError,
    InvalidStateError,
};
pub use self::log::{GameLogRecord, GenerationLog, LogLevel, MemoryLog, StandardLog};
