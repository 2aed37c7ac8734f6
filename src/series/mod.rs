//! Series: six-card partitions of 1..=90, their builders, and lists.
//!
//! ## Key Types
//!
//! - `Series`: six cards using every number once
//! - `SeriesBuilder`: trait for seeded series producers
//! - `PerfectSwapBuilder`: buffer-permutation heuristic
//! - `SeriesList`: accepted series with statistics and provenance

pub mod builder;
pub mod list;
#[allow(clippy::module_inception)]
pub mod series;

pub use builder::{PerfectSwapBuilder, SeriesBuilder, BUFFER_LEN, REPAIR_GUARD, SHAKE_BASE};
pub use list::{now_ms, SeriesList, SimilarityDistribution, SORTED_COMMENT};
pub use series::{Series, Similarity, SERIES_CARDS};
