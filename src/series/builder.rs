//! Series builders.
//!
//! A [`SeriesBuilder`] turns a seeded stream into one [`Series`] per call.
//! [`PerfectSwapBuilder`] permutes a 90-slot buffer until every row of five
//! is free of tens-group conflicts, then slices it into six cards.

use crate::cards::{tens_group, Card, CARD_NUMBERS, ROW_LEN, TENS_GROUPS};
use crate::core::error::GenerationDeadlockError;
use crate::core::rng::{SeriesRng, MAX_NUMBER};

use super::series::{Series, SERIES_CARDS};

/// Slots in the buffer: every number once.
pub const BUFFER_LEN: usize = MAX_NUMBER as usize;

/// Swaps allowed in one repair step before reporting a deadlock.
pub const REPAIR_GUARD: u64 = 5_000_000;

/// Baseline random swaps per shake; the seed adds up to 89 more.
pub const SHAKE_BASE: u64 = 180;

/// Produces one conflict-free series per call.
///
/// Builders run on the generation worker, hence `Send`.
pub trait SeriesBuilder: Send {
    /// Build the next series.
    fn build_series(&mut self) -> Result<Series, GenerationDeadlockError>;

    /// Seed the stream was created from.
    fn seed(&self) -> u64;

    /// Cards produced so far, including those of rejected series.
    fn cards_produced(&self) -> u64;

    /// Whether every card is repaired to use all nine tens-groups.
    fn avoid_empty_column(&self) -> bool;

    /// Short method name recorded in a list's provenance.
    fn method_name(&self) -> &'static str;
}

/// The "PerfectSwap" heuristic.
#[derive(Clone, Debug)]
pub struct PerfectSwapBuilder {
    rng: SeriesRng,
    buffer: [u8; BUFFER_LEN],
    cards_produced: u64,
    avoid_empty_column: bool,
    sort_rows: bool,
    jolly: bool,
}

impl PerfectSwapBuilder {
    /// Create a builder with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SeriesRng::new(seed))
    }

    /// Create a builder with a freshly drawn seed; see [`SeriesBuilder::seed`].
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::with_rng(SeriesRng::from_entropy())
    }

    fn with_rng(rng: SeriesRng) -> Self {
        let mut buffer = [0u8; BUFFER_LEN];
        for (slot, n) in buffer.iter_mut().zip(1..=MAX_NUMBER) {
            *slot = n;
        }
        Self {
            rng,
            buffer,
            cards_produced: 0,
            avoid_empty_column: false,
            sort_rows: true,
            jolly: true,
        }
    }

    /// Repair cards missing a tens-group. Fixed for the builder's lifetime.
    #[must_use]
    pub fn with_avoid_empty_column(mut self, avoid: bool) -> Self {
        self.avoid_empty_column = avoid;
        self
    }

    /// Sort every row ascending (default on).
    #[must_use]
    pub fn with_sorted_rows(mut self, sort: bool) -> Self {
        self.sort_rows = sort;
        self
    }

    /// Keep the drawn jolly on each card (default on). The index is drawn
    /// either way.
    #[must_use]
    pub fn with_jolly(mut self, jolly: bool) -> Self {
        self.jolly = jolly;
        self
    }

    fn swap_count(&self) -> u64 {
        SHAKE_BASE + self.rng.seed() % BUFFER_LEN as u64
    }

    fn shake(&mut self) {
        for _ in 0..self.swap_count() {
            let a = self.rng.gen_range_usize(0..BUFFER_LEN);
            let b = self.rng.gen_range_usize(0..BUFFER_LEN);
            self.buffer.swap(a, b);
        }
    }

    /// True if `pos` shares a tens-group with another slot of its row.
    fn conflicts(&self, pos: usize) -> bool {
        let start = pos / ROW_LEN * ROW_LEN;
        let group = tens_group(self.buffer[pos]);
        (start..start + ROW_LEN)
            .any(|other| other != pos && tens_group(self.buffer[other]) == group)
    }

    fn repair_tens_conflicts(&mut self) -> Result<(), GenerationDeadlockError> {
        let mut swaps: u64 = 0;
        let mut pos = 0;
        while pos < BUFFER_LEN {
            if self.conflicts(pos) {
                swaps += 1;
                if swaps > REPAIR_GUARD {
                    return Err(GenerationDeadlockError {
                        stage: "tens-conflict repair",
                        iterations: swaps,
                    });
                }
                let target = self.rng.gen_range_usize(0..BUFFER_LEN);
                self.buffer.swap(pos, target);
                pos = 0;
            } else {
                pos += 1;
            }
        }
        Ok(())
    }

    fn card_misses_group(&self, card: usize) -> bool {
        let start = card * CARD_NUMBERS;
        let mut present = [false; TENS_GROUPS];
        for &n in &self.buffer[start..start + CARD_NUMBERS] {
            present[tens_group(n)] = true;
        }
        present.contains(&false)
    }

    /// Swap whole rows between cards until each card uses all nine groups.
    ///
    /// Rows move intact, so the row rule and the partition both survive.
    fn repair_empty_columns(&mut self) -> Result<(), GenerationDeadlockError> {
        const ROWS_PER_CARD: usize = CARD_NUMBERS / ROW_LEN;
        let mut swaps: u64 = 0;
        let mut card = 0;
        while card < SERIES_CARDS {
            if self.card_misses_group(card) {
                swaps += 1;
                if swaps > REPAIR_GUARD {
                    return Err(GenerationDeadlockError {
                        stage: "empty-column repair",
                        iterations: swaps,
                    });
                }
                let offset = 1 + self.rng.gen_range_usize(0..SERIES_CARDS - 1);
                let other = (card + offset) % SERIES_CARDS;
                let row = card * ROWS_PER_CARD + self.rng.gen_range_usize(0..ROWS_PER_CARD);
                let other_row = other * ROWS_PER_CARD + self.rng.gen_range_usize(0..ROWS_PER_CARD);
                self.swap_rows(row, other_row);
                card = 0;
            } else {
                card += 1;
            }
        }
        debug_assert!((0..BUFFER_LEN).all(|pos| !self.conflicts(pos)));
        Ok(())
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for i in 0..ROW_LEN {
            self.buffer.swap(a * ROW_LEN + i, b * ROW_LEN + i);
        }
    }

    fn slice_cards(&mut self) -> [Card; SERIES_CARDS] {
        std::array::from_fn(|card| {
            let mut numbers = [0u8; CARD_NUMBERS];
            numbers.copy_from_slice(&self.buffer[card * CARD_NUMBERS..(card + 1) * CARD_NUMBERS]);
            let jolly = self.rng.gen_range_usize(0..CARD_NUMBERS);
            Card::from_parts(String::new(), numbers, self.jolly.then_some(jolly))
        })
    }
}

impl SeriesBuilder for PerfectSwapBuilder {
    fn build_series(&mut self) -> Result<Series, GenerationDeadlockError> {
        self.shake();
        self.repair_tens_conflicts()?;
        if self.avoid_empty_column {
            self.repair_empty_columns()?;
        }
        if self.sort_rows {
            for row in self.buffer.chunks_mut(ROW_LEN) {
                row.sort_unstable();
            }
        }
        let cards = self.slice_cards();
        self.cards_produced += SERIES_CARDS as u64;
        Ok(Series::from_cards_unchecked(cards))
    }

    fn seed(&self) -> u64 {
        self.rng.seed()
    }

    fn cards_produced(&self) -> u64 {
        self.cards_produced
    }

    fn avoid_empty_column(&self) -> bool {
        self.avoid_empty_column
    }

    fn method_name(&self) -> &'static str {
        "PerfectSwap"
    }
}
