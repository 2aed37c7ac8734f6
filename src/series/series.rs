//! A series: six cards jointly covering 1..=90 once each.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::core::error::InvalidCardError;
use crate::core::rng::{MAX_NUMBER, MIN_NUMBER};

/// Cards in a series.
pub const SERIES_CARDS: usize = 6;

/// Worst overlap found between two series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Similarity {
    /// Most numbers shared by one card of each series.
    pub max_equal_card: u8,
    /// Most numbers shared by one row of each series.
    pub max_equal_row: u8,
}

impl Similarity {
    /// Overlap of a single card pair.
    #[must_use]
    pub fn between(a: &Card, b: &Card) -> Self {
        Self {
            max_equal_card: a.equal_numbers(b),
            max_equal_row: a.equal_row_numbers(b),
        }
    }

    /// True if neither value exceeds its limit.
    #[must_use]
    pub fn within(&self, max_equal_card: u8, max_equal_row: u8) -> bool {
        self.max_equal_card <= max_equal_card && self.max_equal_row <= max_equal_row
    }
}

/// Six cards with no repeated number between them.
///
/// Deserialization runs the same partition check as [`Series::new`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRepr")]
pub struct Series {
    cards: [Card; SERIES_CARDS],
    max_equal_card: u8,
    max_equal_row: u8,
}

#[derive(Deserialize)]
struct SeriesRepr {
    cards: [Card; SERIES_CARDS],
    max_equal_card: u8,
    max_equal_row: u8,
}

impl TryFrom<SeriesRepr> for Series {
    type Error = InvalidCardError;

    fn try_from(repr: SeriesRepr) -> Result<Self, Self::Error> {
        let mut series = Series::new(repr.cards)?;
        series.max_equal_card = repr.max_equal_card;
        series.max_equal_row = repr.max_equal_row;
        Ok(series)
    }
}

impl Series {
    /// Bundle six cards, checking that they partition 1..=90.
    pub fn new(cards: [Card; SERIES_CARDS]) -> Result<Self, InvalidCardError> {
        let mut seen = 0u128;
        for card in &cards {
            for &n in card.numbers() {
                if seen & (1u128 << n) != 0 {
                    return Err(InvalidCardError::DuplicateNumber { number: n });
                }
                seen |= 1u128 << n;
            }
        }
        // 90 distinct in-range numbers cover the whole range, so this only
        // trips on a malformed card
        if let Some(number) = (MIN_NUMBER..=MAX_NUMBER).find(|&n| seen & (1u128 << n) == 0) {
            return Err(InvalidCardError::SeriesMissingNumber { number });
        }
        Ok(Self::from_cards_unchecked(cards))
    }

    pub(crate) fn from_cards_unchecked(cards: [Card; SERIES_CARDS]) -> Self {
        Self {
            cards,
            max_equal_card: 0,
            max_equal_row: 0,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[Card; SERIES_CARDS] {
        &self.cards
    }

    /// Card by position 0..6.
    #[must_use]
    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// Mutable access for labels, statistics and check state.
    ///
    /// Numbers on a card cannot be changed through `Card`'s API.
    pub fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        self.cards.iter_mut()
    }

    #[must_use]
    pub fn max_equal_card(&self) -> u8 {
        self.max_equal_card
    }

    #[must_use]
    pub fn max_equal_row(&self) -> u8 {
        self.max_equal_row
    }

    /// Reset the series' and its cards' running counters.
    pub fn reset_statistics(&mut self) {
        self.max_equal_card = 0;
        self.max_equal_row = 0;
        for card in &mut self.cards {
            card.reset_statistics();
        }
    }

    /// Worst overlap with `other` without touching any counter.
    #[must_use]
    pub fn similarity(&self, other: &Series) -> Similarity {
        let mut worst = Similarity::default();
        for mine in &self.cards {
            for theirs in &other.cards {
                let pair = Similarity::between(mine, theirs);
                worst.max_equal_card = worst.max_equal_card.max(pair.max_equal_card);
                worst.max_equal_row = worst.max_equal_row.max(pair.max_equal_row);
            }
        }
        worst
    }

    /// True if `other` stays within both limits, stopping at the first
    /// offending card pair.
    #[must_use]
    pub fn compatible_with(&self, other: &Series, max_equal_card: u8, max_equal_row: u8) -> bool {
        self.cards.iter().all(|mine| {
            other.cards.iter().all(|theirs| {
                Similarity::between(mine, theirs).within(max_equal_card, max_equal_row)
            })
        })
    }

    /// Compare every card pair by card and by row, raising the running
    /// counters of both series and their cards.
    pub fn compare(&mut self, other: &mut Series) -> Similarity {
        let mut worst = Similarity::default();
        for mine in self.cards.iter_mut() {
            for theirs in other.cards.iter_mut() {
                worst.max_equal_card = worst.max_equal_card.max(mine.compare_by_card(theirs));
                worst.max_equal_row = worst.max_equal_row.max(mine.compare_by_row(theirs));
            }
        }
        for series in [&mut *self, &mut *other] {
            series.max_equal_card = series.max_equal_card.max(worst.max_equal_card);
            series.max_equal_row = series.max_equal_row.max(worst.max_equal_row);
        }
        worst
    }

    /// Combined checksum of the six cards, in card order.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.cards
            .iter()
            .fold(0u32, |acc, card| acc.rotate_left(5) ^ card.checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{PerfectSwapBuilder, SeriesBuilder};

    fn built(seed: u64) -> Series {
        PerfectSwapBuilder::new(seed).build_series().unwrap()
    }

    #[test]
    fn test_new_accepts_partition() {
        let series = built(1);
        let again = Series::new(series.cards().clone()).unwrap();
        assert_eq!(again.checksum(), series.checksum());
    }

    #[test]
    fn test_new_rejects_overlap() {
        let series = built(2);
        let mut cards = series.cards().clone();
        cards[1] = cards[0].clone();
        assert!(matches!(
            Series::new(cards),
            Err(InvalidCardError::DuplicateNumber { .. })
        ));
    }

    #[test]
    fn test_similarity_with_self() {
        let series = built(3);
        let sim = series.similarity(&series);
        assert_eq!(sim.max_equal_card, 15);
        assert_eq!(sim.max_equal_row, 5);
        assert!(!series.compatible_with(&series, 14, 5));
        // Pure comparison leaves counters untouched
        assert_eq!(series.max_equal_card(), 0);
    }

    #[test]
    fn test_compare_updates_counters() {
        let mut a = built(4);
        let mut b = built(5);
        let expected = a.similarity(&b);

        let sim = a.compare(&mut b);
        assert_eq!(sim, expected);
        assert_eq!(a.max_equal_card(), sim.max_equal_card);
        assert_eq!(b.max_equal_row(), sim.max_equal_row);
        assert!(a.cards().iter().any(|c| c.max_equal_card() == sim.max_equal_card));

        assert!(a.compatible_with(&b, sim.max_equal_card, sim.max_equal_row));
        if sim.max_equal_card > 0 {
            assert!(!a.compatible_with(&b, sim.max_equal_card - 1, 5));
        }

        a.reset_statistics();
        assert_eq!(a.max_equal_card(), 0);
        assert!(a.cards().iter().all(|c| c.max_equal_card() == 0));
    }

    #[test]
    fn test_similarity_within() {
        let sim = Similarity {
            max_equal_card: 6,
            max_equal_row: 2,
        };
        assert!(sim.within(6, 2));
        assert!(!sim.within(5, 2));
        assert!(!sim.within(6, 1));
    }

    #[test]
    fn test_deserialize_checks_partition() {
        let series = built(6);
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(serde_json::from_str::<Series>(&json).unwrap(), series);

        let mut value = serde_json::to_value(&series).unwrap();
        value["cards"][1] = value["cards"][0].clone();
        let err = serde_json::from_value::<Series>(value).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }
}
