//! Ordered collection of accepted series plus generation metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::series::{Series, SERIES_CARDS};
use crate::cards::{Card, CARD_NUMBERS, ROW_LEN};
use crate::core::error::InvalidCardError;

/// Comment appended once a list has been sorted by similarity.
pub const SORTED_COMMENT: &str = "Series sorted best-to-worst by card similarity";

/// Milliseconds since the UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// How many card pairs / row pairs share N numbers.
///
/// Only pairs from different series are counted; cards of one series never
/// share a number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityDistribution {
    /// Index N: card pairs with exactly N equal numbers.
    pub card_pairs: [u64; CARD_NUMBERS + 1],
    /// Index N: row pairs with exactly N equal numbers.
    pub row_pairs: [u64; ROW_LEN + 1],
}

impl SimilarityDistribution {
    /// Largest N with a non-zero card-pair count.
    #[must_use]
    pub fn worst_card(&self) -> usize {
        self.card_pairs.iter().rposition(|&c| c > 0).unwrap_or(0)
    }

    /// Largest N with a non-zero row-pair count.
    #[must_use]
    pub fn worst_row(&self) -> usize {
        self.row_pairs.iter().rposition(|&c| c > 0).unwrap_or(0)
    }

    #[must_use]
    pub fn total_card_pairs(&self) -> u64 {
        self.card_pairs.iter().sum()
    }
}

/// Accepted series in acceptance (or sorted) order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesList {
    name: String,
    created_ms: u64,
    series: Vec<Series>,
    cards_generated: u64,
    builder_seed: Option<u64>,
    builder_method: String,
    controller_method: String,
    elapsed_ms: u64,
    comments: Vec<String>,
    distribution: SimilarityDistribution,
}

impl SeriesList {
    /// Create an empty list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_ms: now_ms(),
            series: Vec::new(),
            cards_generated: 0,
            builder_seed: None,
            builder_method: String::new(),
            controller_method: String::new(),
            elapsed_ms: 0,
            comments: Vec::new(),
            distribution: SimilarityDistribution::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn created_ms(&self) -> u64 {
        self.created_ms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Series> {
        self.series.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Series> {
        self.series.iter()
    }

    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Every card, series by series.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.series.iter().flat_map(|s| s.cards().iter())
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.series.len() * SERIES_CARDS
    }

    /// Append an accepted series.
    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Total cards the builder produced, rejected ones included.
    #[must_use]
    pub fn cards_generated(&self) -> u64 {
        self.cards_generated
    }

    #[must_use]
    pub fn builder_seed(&self) -> Option<u64> {
        self.builder_seed
    }

    #[must_use]
    pub fn builder_method(&self) -> &str {
        &self.builder_method
    }

    #[must_use]
    pub fn controller_method(&self) -> &str {
        &self.controller_method
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Record where the list came from.
    pub fn set_provenance(
        &mut self,
        builder_seed: u64,
        builder_method: impl Into<String>,
        controller_method: impl Into<String>,
    ) {
        self.builder_seed = Some(builder_seed);
        self.builder_method = builder_method.into();
        self.controller_method = controller_method.into();
    }

    /// Record generation counters.
    pub fn set_counters(&mut self, cards_generated: u64, elapsed_ms: u64) {
        self.cards_generated = cards_generated;
        self.elapsed_ms = elapsed_ms;
    }

    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Append a comment unless an identical one exists. Returns true if added.
    pub fn add_comment_once(&mut self, comment: &str) -> bool {
        if self.has_comment(comment) {
            return false;
        }
        self.comments.push(comment.to_string());
        true
    }

    #[must_use]
    pub fn has_comment(&self, comment: &str) -> bool {
        self.comments.iter().any(|c| c == comment)
    }

    /// Cached distribution from the last [`compare_all`](Self::compare_all).
    #[must_use]
    pub fn distribution(&self) -> &SimilarityDistribution {
        &self.distribution
    }

    /// Reset and recompute every counter by comparing all series pairs.
    pub fn compare_all(&mut self) -> &SimilarityDistribution {
        for series in &mut self.series {
            series.reset_statistics();
        }

        let mut distribution = SimilarityDistribution::default();
        for i in 0..self.series.len() {
            let (head, tail) = self.series.split_at_mut(i + 1);
            let current = &mut head[i];
            for other in tail.iter_mut() {
                for a in current.cards() {
                    for b in other.cards() {
                        distribution.card_pairs[a.equal_numbers(b) as usize] += 1;
                        for row in a.row_overlaps(b) {
                            for equal in row {
                                distribution.row_pairs[equal as usize] += 1;
                            }
                        }
                    }
                }
                current.compare(other);
            }
        }

        self.distribution = distribution;
        &self.distribution
    }

    /// Stable sort: lowest card similarity first, row similarity breaks ties.
    pub fn sort_best_to_worst(&mut self) {
        self.series
            .sort_by_key(|s| (s.max_equal_card(), s.max_equal_row()));
    }

    /// Label cards sequentially from `0001`.
    pub fn relabel(&mut self) {
        let mut counter = 0usize;
        for series in &mut self.series {
            for card in series.cards_mut() {
                counter += 1;
                card.set_label(format!("{counter:04}"));
            }
        }
    }

    /// Clear game-check state on every card.
    pub fn reset_checks(&mut self) {
        for series in &mut self.series {
            for card in series.cards_mut() {
                card.reset_check();
            }
        }
    }

    /// Re-validate every card and series invariant.
    pub fn verify(&self) -> Result<(), InvalidCardError> {
        for series in &self.series {
            for card in series.cards() {
                Card::from_numbers(card.label(), *card.numbers(), card.jolly())?;
            }
            Series::new(series.cards().clone())?;
        }
        Ok(())
    }

    /// Worst card and row similarity across the list, from cached counters.
    #[must_use]
    pub fn worst_similarity(&self) -> (u8, u8) {
        self.series.iter().fold((0, 0), |(c, r), s| {
            (c.max(s.max_equal_card()), r.max(s.max_equal_row()))
        })
    }
}

impl<'a> IntoIterator for &'a SeriesList {
    type Item = &'a Series;
    type IntoIter = std::slice::Iter<'a, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::ROWS;
    use crate::series::{PerfectSwapBuilder, SeriesBuilder};

    const ROW_PAIRS: usize = ROWS * ROWS;

    fn list_of(count: usize, seed: u64) -> SeriesList {
        let mut builder = PerfectSwapBuilder::new(seed);
        let mut list = SeriesList::new("test");
        for _ in 0..count {
            list.push(builder.build_series().unwrap());
        }
        list
    }

    #[test]
    fn test_new_list() {
        let list = SeriesList::new("batch");
        assert_eq!(list.name(), "batch");
        assert!(list.is_empty());
        assert_eq!(list.card_count(), 0);
        assert!(list.created_ms() > 0);
        assert_eq!(list.builder_seed(), None);
    }

    #[test]
    fn test_compare_all_distribution() {
        let mut list = list_of(4, 10);
        let distribution = list.compare_all().clone();

        // 6 series pairs x 36 card pairs
        assert_eq!(distribution.total_card_pairs(), 6 * 36);
        assert_eq!(distribution.row_pairs.iter().sum::<u64>(), 6 * 36 * ROW_PAIRS as u64);

        // Each series pair shares 90 numbers over its 36 card pairs
        let weighted: u64 = distribution
            .card_pairs
            .iter()
            .enumerate()
            .map(|(n, &c)| n as u64 * c)
            .sum();
        assert_eq!(weighted, 6 * 90);

        let (worst_card, worst_row) = list.worst_similarity();
        assert_eq!(worst_card as usize, distribution.worst_card());
        assert_eq!(worst_row as usize, distribution.worst_row());
    }

    #[test]
    fn test_compare_all_is_repeatable() {
        let mut list = list_of(3, 11);
        let first = list.compare_all().clone();
        let second = list.compare_all().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sort_best_to_worst() {
        let mut list = list_of(6, 12);
        list.compare_all();
        list.sort_best_to_worst();

        let keys: Vec<_> = list
            .iter()
            .map(|s| (s.max_equal_card(), s.max_equal_row()))
            .collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_relabel() {
        let mut list = list_of(2, 13);
        list.relabel();
        let labels: Vec<_> = list.cards().map(|c| c.label().to_string()).collect();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "0001");
        assert_eq!(labels[11], "0012");
    }

    #[test]
    fn test_comment_once() {
        let mut list = SeriesList::new("c");
        assert!(list.add_comment_once(SORTED_COMMENT));
        assert!(!list.add_comment_once(SORTED_COMMENT));
        list.add_comment("free text");
        assert_eq!(list.comments().len(), 2);
        assert!(list.has_comment(SORTED_COMMENT));
    }

    #[test]
    fn test_verify_and_reset_checks() {
        let mut list = list_of(3, 14);
        assert!(list.verify().is_ok());

        for series in list.series.iter_mut() {
            for card in series.cards_mut() {
                card.check_mut().mark(0);
            }
        }
        list.reset_checks();
        assert!(list.cards().all(|c| c.check().total() == 0));
    }

    #[test]
    fn test_provenance_and_serialization() {
        let mut list = list_of(1, 15);
        list.set_provenance(15, "PerfectSwap", "Unconstrained");
        list.set_counters(6, 12);

        let json = serde_json::to_string(&list).unwrap();
        let restored: SeriesList = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, list);
        assert_eq!(restored.builder_seed(), Some(15));
        assert_eq!(restored.controller_method(), "Unconstrained");
        assert_eq!(restored.elapsed_ms(), 12);
    }

    #[test]
    fn test_deserialize_rejects_invalid_card() {
        let list = list_of(2, 21);
        let mut value = serde_json::to_value(&list).unwrap();
        value["series"][1]["cards"][0]["jolly"] = serde_json::json!(15);
        assert!(serde_json::from_value::<SeriesList>(value).is_err());
    }
}
