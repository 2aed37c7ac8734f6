//! # tombola-series
//!
//! Generator for Tombola card series with a cancellable background
//! controller.
//!
//! ## Design Principles
//!
//! 1. **Invariants by Construction**: every card keeps the row rule (no two
//!    numbers of one tens-group on a row) and every series uses 1..=90 exactly
//!    once. Builders produce valid series; validating constructors reject
//!    anything else.
//!
//! 2. **Deterministic Streams**: builders draw from a seeded ChaCha8 stream.
//!    The same seed yields the same sequence of series.
//!
//! 3. **Injected Capabilities**: the controller owns a builder, a list, and a
//!    logger handed to it by the caller. Acceptance is a pluggable strategy.
//!
//! ## Modules
//!
//! - `core`: RNG, configuration, errors, logging capability
//! - `cards`: card layout, construction, similarity comparison
//! - `series`: six-card series, builders, series lists
//! - `generation`: controller state machine and acceptance strategies
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tombola_series::{
//!     GenerationConfig, GenerationController, PerfectSwapBuilder, SeriesList, StandardLog,
//! };
//!
//! let controller = GenerationController::quality_controlled();
//! controller.set_builder(PerfectSwapBuilder::new(7))?;
//! controller.set_list(SeriesList::new("evening"))?;
//! controller.set_logger(Arc::new(StandardLog::default()))?;
//! controller.configure(&GenerationConfig::recommended())?;
//!
//! controller.start()?;
//! let status = controller.join()?;
//! println!("{status}: {} series", controller.list_len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod core;
pub mod cards;
pub mod series;
pub mod generation;

// Re-export commonly used types
pub use crate::core::{
    SeriesRng,
    GenerationConfig, Thresholds,
    ConfigurationError, ControllerError, GenerationDeadlockError, InvalidCardError,
    InvalidStateError,
    GameLogRecord, GenerationLog, LogLevel, MemoryLog, StandardLog,
};

pub use crate::cards::{tens_group, Card, CardCheck};

pub use crate::series::{
    PerfectSwapBuilder, Series, SeriesBuilder, SeriesList, Similarity,
    SimilarityDistribution, SERIES_CARDS,
};

pub use crate::generation::{
    GenerationController, GenerationStatus, GenerationStrategy,
    QualityControlled, Unconstrained,
};
