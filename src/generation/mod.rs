//! Cancellable background generation.
//!
//! ## Key Types
//!
//! - `GenerationController`: state machine owning one worker thread
//! - `GenerationStatus`: lifecycle states
//! - `GenerationStrategy`: acceptance policy (`Unconstrained`, `QualityControlled`)

pub mod controller;
pub mod status;
pub mod strategy;

pub use controller::{GenerationController, WORKER_THREAD_NAME};
pub use status::GenerationStatus;
pub use strategy::{GenerationStrategy, QualityControlled, Unconstrained};
