//! Acceptance strategies plugged into the generation controller.

use crate::core::config::Thresholds;
use crate::series::Series;

/// Decides whether a candidate series joins the list.
///
/// Implementations must not mutate accepted series: a rejected candidate
/// leaves no statistics behind.
pub trait GenerationStrategy: Send + Sync {
    /// Name recorded as the list's controller method.
    fn name(&self) -> &'static str;

    /// Accept or reject `candidate` given the series accepted so far.
    fn accept(&self, candidate: &Series, accepted: &[Series], thresholds: Thresholds) -> bool;
}

/// Accepts every candidate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconstrained;

impl GenerationStrategy for Unconstrained {
    fn name(&self) -> &'static str {
        "Unconstrained"
    }

    fn accept(&self, _candidate: &Series, _accepted: &[Series], _thresholds: Thresholds) -> bool {
        true
    }
}

/// Accepts a candidate only if, against every accepted series, no card pair
/// and no row pair exceeds the thresholds.
#[derive(Clone, Copy, Debug, Default)]
pub struct QualityControlled;

impl GenerationStrategy for QualityControlled {
    fn name(&self) -> &'static str {
        "QualityControlled"
    }

    fn accept(&self, candidate: &Series, accepted: &[Series], thresholds: Thresholds) -> bool {
        accepted.iter().all(|series| {
            candidate.compatible_with(
                series,
                thresholds.max_equal_per_card,
                thresholds.max_equal_per_row,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{PerfectSwapBuilder, SeriesBuilder};

    fn thresholds(card: u8, row: u8) -> Thresholds {
        Thresholds {
            max_equal_per_card: card,
            max_equal_per_row: row,
        }
    }

    #[test]
    fn test_unconstrained_accepts_duplicates() {
        let series = PerfectSwapBuilder::new(1).build_series().unwrap();
        let accepted = vec![series.clone()];
        assert!(Unconstrained.accept(&series, &accepted, thresholds(5, 2)));
        assert_eq!(Unconstrained.name(), "Unconstrained");
    }

    #[test]
    fn test_quality_rejects_duplicate() {
        let series = PerfectSwapBuilder::new(2).build_series().unwrap();
        let accepted = vec![series.clone()];
        assert!(!QualityControlled.accept(&series, &accepted, thresholds(14, 5)));
        assert!(QualityControlled.accept(&series, &[], thresholds(5, 2)));
    }

    #[test]
    fn test_quality_matches_similarity() {
        let mut builder = PerfectSwapBuilder::new(3);
        let first = builder.build_series().unwrap();
        let second = builder.build_series().unwrap();
        let sim = second.similarity(&first);
        let accepted = vec![first];

        assert!(QualityControlled.accept(
            &second,
            &accepted,
            thresholds(sim.max_equal_card.max(5), sim.max_equal_row.max(2))
        ));
        if sim.max_equal_card > 5 {
            assert!(!QualityControlled.accept(
                &second,
                &accepted,
                thresholds(sim.max_equal_card - 1, 5)
            ));
        }
        // No counters touched
        assert_eq!(accepted[0].max_equal_card(), 0);
    }
}
