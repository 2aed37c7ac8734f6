//! Tombola cards.
//!
//! A card holds 15 numbers laid out as three rows of five. Linear index
//! `row * 5 + column` addresses a number; no row may hold two numbers from
//! the same tens-group.

use serde::{Deserialize, Serialize};

use super::check::CardCheck;
use crate::core::error::{GenerationDeadlockError, InvalidCardError};
use crate::core::rng::{SeriesRng, MAX_NUMBER, MIN_NUMBER};

/// Numbers on a card.
pub const CARD_NUMBERS: usize = 15;

/// Rows on a card.
pub const ROWS: usize = 3;

/// Numbers per row.
pub const ROW_LEN: usize = 5;

/// Tens-groups ("decine") 1-9, 10-19, ..., 80-90.
pub const TENS_GROUPS: usize = 9;

/// Draws allowed while filling a card before giving up.
pub const CARD_DRAW_GUARD: u64 = 1_000_000;

/// Tens-group of a number: `n / 10`, with 90 folded into group 8.
#[must_use]
pub const fn tens_group(n: u8) -> usize {
    if n >= MAX_NUMBER {
        TENS_GROUPS - 1
    } else {
        (n / 10) as usize
    }
}

/// Inclusive range of numbers belonging to a tens-group.
#[must_use]
pub fn tens_group_range(group: usize) -> std::ops::RangeInclusive<u8> {
    match group {
        0 => MIN_NUMBER..=9,
        g if g >= TENS_GROUPS - 1 => 80..=MAX_NUMBER,
        g => {
            let low = (g * 10) as u8;
            low..=low + 9
        }
    }
}

/// Bit set with bit `n` set for each number `n` in `numbers`.
pub(crate) fn number_mask(numbers: &[u8]) -> u128 {
    numbers.iter().fold(0u128, |mask, &n| mask | (1u128 << n))
}

/// A single tombola card.
///
/// Deserialization validates like [`Card::from_numbers`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CardRepr")]
pub struct Card {
    label: String,
    numbers: [u8; CARD_NUMBERS],
    jolly: Option<usize>,
    max_equal_card: u8,
    max_equal_row: u8,
    #[serde(default)]
    check: CardCheck,
}

#[derive(Deserialize)]
struct CardRepr {
    label: String,
    numbers: [u8; CARD_NUMBERS],
    jolly: Option<usize>,
    max_equal_card: u8,
    max_equal_row: u8,
    #[serde(default)]
    check: CardCheck,
}

impl TryFrom<CardRepr> for Card {
    type Error = InvalidCardError;

    fn try_from(repr: CardRepr) -> Result<Self, Self::Error> {
        let mut card = Card::from_numbers(repr.label, repr.numbers, repr.jolly)?;
        card.max_equal_card = repr.max_equal_card;
        card.max_equal_row = repr.max_equal_row;
        card.check = repr.check;
        Ok(card)
    }
}

impl Card {
    /// Generate a random card from its own seeded stream.
    pub fn random(
        label: impl Into<String>,
        seed: u64,
        avoid_empty_column: bool,
    ) -> Result<Self, GenerationDeadlockError> {
        let mut rng = SeriesRng::new(seed);
        Self::random_with(label, &mut rng, avoid_empty_column)
    }

    /// Generate a random card drawing from an existing stream.
    pub fn random_with(
        label: impl Into<String>,
        rng: &mut SeriesRng,
        avoid_empty_column: bool,
    ) -> Result<Self, GenerationDeadlockError> {
        let mut numbers = [0u8; CARD_NUMBERS];
        let mut draws: u64 = 0;

        for position in 0..CARD_NUMBERS {
            let row_start = position / ROW_LEN * ROW_LEN;
            loop {
                draws += 1;
                if draws > CARD_DRAW_GUARD {
                    return Err(GenerationDeadlockError {
                        stage: "card fill",
                        iterations: draws,
                    });
                }
                let n = rng.gen_number();
                let taken = numbers[..position].contains(&n);
                let clash = numbers[row_start..position]
                    .iter()
                    .any(|&m| tens_group(m) == tens_group(n));
                if !taken && !clash {
                    numbers[position] = n;
                    break;
                }
            }
        }

        // Drawn even when the caller discards it, keeping seeded streams aligned
        let jolly = rng.gen_range_usize(0..CARD_NUMBERS);

        if avoid_empty_column {
            fill_empty_groups(&mut numbers, rng);
        }

        let mut card = Self::from_parts(label, numbers, Some(jolly));
        card.sort_rows();
        Ok(card)
    }

    /// Import a card from a pre-built number array, validating its layout.
    pub fn from_numbers(
        label: impl Into<String>,
        numbers: [u8; CARD_NUMBERS],
        jolly: Option<usize>,
    ) -> Result<Self, InvalidCardError> {
        validate_numbers(&numbers)?;
        if let Some(index) = jolly {
            if index >= CARD_NUMBERS {
                return Err(InvalidCardError::JollyOutOfRange(index));
            }
        }
        Ok(Self::from_parts(label, numbers, jolly))
    }

    /// Build without validation. Callers guarantee the row invariant.
    pub(crate) fn from_parts(
        label: impl Into<String>,
        numbers: [u8; CARD_NUMBERS],
        jolly: Option<usize>,
    ) -> Self {
        debug_assert!(validate_numbers(&numbers).is_ok());
        Self {
            label: label.into(),
            numbers,
            jolly,
            max_equal_card: 0,
            max_equal_row: 0,
            check: CardCheck::default(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// All 15 numbers in linear order.
    #[must_use]
    pub fn numbers(&self) -> &[u8; CARD_NUMBERS] {
        &self.numbers
    }

    /// Number at a linear index, `None` past the end.
    #[must_use]
    pub fn number(&self, index: usize) -> Option<u8> {
        self.numbers.get(index).copied()
    }

    /// Number at (row, column), `None` outside the 3x5 grid.
    #[must_use]
    pub fn number_at(&self, row: usize, column: usize) -> Option<u8> {
        Self::index_of(row, column).map(|i| self.numbers[i])
    }

    /// Linear index of (row, column).
    #[must_use]
    pub fn index_of(row: usize, column: usize) -> Option<usize> {
        (row < ROWS && column < ROW_LEN).then_some(row * ROW_LEN + column)
    }

    /// (row, column) of a linear index.
    #[must_use]
    pub fn position_of(index: usize) -> Option<(usize, usize)> {
        (index < CARD_NUMBERS).then_some((index / ROW_LEN, index % ROW_LEN))
    }

    /// The five numbers of a row.
    ///
    /// Panics if `row >= 3`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[u8] {
        &self.numbers[row * ROW_LEN..(row + 1) * ROW_LEN]
    }

    #[must_use]
    pub fn contains(&self, n: u8) -> bool {
        self.numbers.contains(&n)
    }

    /// Linear index of a number on this card.
    #[must_use]
    pub fn position_of_number(&self, n: u8) -> Option<usize> {
        self.numbers.iter().position(|&m| m == n)
    }

    #[must_use]
    pub fn jolly(&self) -> Option<usize> {
        self.jolly
    }

    /// The number under the jolly position.
    #[must_use]
    pub fn jolly_number(&self) -> Option<u8> {
        self.jolly.map(|i| self.numbers[i])
    }

    /// Highest equal-number count seen against any compared card.
    #[must_use]
    pub fn max_equal_card(&self) -> u8 {
        self.max_equal_card
    }

    /// Highest same-row equal-number count seen against any compared card.
    #[must_use]
    pub fn max_equal_row(&self) -> u8 {
        self.max_equal_row
    }

    pub fn reset_statistics(&mut self) {
        self.max_equal_card = 0;
        self.max_equal_row = 0;
    }

    /// Game-check state owned by the gameplay engine.
    #[must_use]
    pub fn check(&self) -> &CardCheck {
        &self.check
    }

    pub fn check_mut(&mut self) -> &mut CardCheck {
        &mut self.check
    }

    pub fn reset_check(&mut self) {
        self.check.reset();
    }

    pub(crate) fn mask(&self) -> u128 {
        number_mask(&self.numbers)
    }

    pub(crate) fn row_masks(&self) -> [u128; ROWS] {
        [0, 1, 2].map(|r| number_mask(self.row(r)))
    }

    /// Count of numbers shared with `other`.
    #[must_use]
    pub fn equal_numbers(&self, other: &Card) -> u8 {
        (self.mask() & other.mask()).count_ones() as u8
    }

    /// Largest overlap between any row of this card and any row of `other`.
    #[must_use]
    pub fn equal_row_numbers(&self, other: &Card) -> u8 {
        self.row_overlaps(other).into_iter().flatten().max().unwrap_or(0)
    }

    /// Overlap of every row pair: `[mine][theirs]`.
    #[must_use]
    pub fn row_overlaps(&self, other: &Card) -> [[u8; ROWS]; ROWS] {
        let mine = self.row_masks();
        let theirs = other.row_masks();
        mine.map(|a| theirs.map(|b| (a & b).count_ones() as u8))
    }

    /// Count equal numbers and raise both cards' running maximum.
    pub fn compare_by_card(&mut self, other: &mut Card) -> u8 {
        let equal = self.equal_numbers(other);
        self.max_equal_card = self.max_equal_card.max(equal);
        other.max_equal_card = other.max_equal_card.max(equal);
        equal
    }

    /// Compare all 3x3 row pairs and raise both cards' running row maximum.
    pub fn compare_by_row(&mut self, other: &mut Card) -> u8 {
        let equal = self.equal_row_numbers(other);
        self.max_equal_row = self.max_equal_row.max(equal);
        other.max_equal_row = other.max_equal_row.max(equal);
        equal
    }

    /// Position-sensitive checksum over the 15 numbers.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.numbers
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &n)| {
                acc.wrapping_mul(31).wrapping_add((i as u32 + 1) * n as u32)
            })
    }

    /// Sort each row ascending, keeping the jolly on its number.
    pub fn sort_rows(&mut self) {
        let jolly_number = self.jolly_number();
        for row in self.numbers.chunks_mut(ROW_LEN) {
            row.sort_unstable();
        }
        if let Some(n) = jolly_number {
            self.jolly = self.position_of_number(n);
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.label)?;
        for row in 0..ROWS {
            let cells: Vec<String> = self.row(row).iter().map(u8::to_string).collect();
            write!(f, " [{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Check range, uniqueness and per-row tens-group distinctness.
pub(crate) fn validate_numbers(numbers: &[u8; CARD_NUMBERS]) -> Result<(), InvalidCardError> {
    let mut seen = 0u128;
    for (position, &n) in numbers.iter().enumerate() {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
            return Err(InvalidCardError::NumberOutOfRange { position, number: n });
        }
        if seen & (1u128 << n) != 0 {
            return Err(InvalidCardError::DuplicateNumber { number: n });
        }
        seen |= 1u128 << n;
    }
    for (row, chunk) in numbers.chunks(ROW_LEN).enumerate() {
        for (i, &a) in chunk.iter().enumerate() {
            if let Some(&b) = chunk[i + 1..].iter().find(|&&b| tens_group(a) == tens_group(b)) {
                return Err(InvalidCardError::RowTensConflict {
                    row,
                    first: a,
                    second: b,
                });
            }
        }
    }
    Ok(())
}

/// Per-group counts of the numbers on a card.
fn group_counts(numbers: &[u8]) -> [u8; TENS_GROUPS] {
    let mut counts = [0u8; TENS_GROUPS];
    for &n in numbers {
        counts[tens_group(n)] += 1;
    }
    counts
}

/// Give every tens-group at least one number on the card.
///
/// For each missing group a random row is tried first; within it a number
/// from a group present at least twice is replaced by an unused value from
/// the missing group. The row cannot already hold the missing group.
fn fill_empty_groups(numbers: &mut [u8; CARD_NUMBERS], rng: &mut SeriesRng) {
    while let Some(missing) = group_counts(numbers).iter().position(|&c| c == 0) {
        let counts = group_counts(numbers);
        let first_row = rng.gen_range_usize(0..ROWS);

        // Fewer than nine groups over fifteen numbers leaves a surplus group
        let Some(index) = (0..ROWS)
            .map(|offset| (first_row + offset) % ROWS)
            .flat_map(|row| row * ROW_LEN..(row + 1) * ROW_LEN)
            .find(|&i| counts[tens_group(numbers[i])] >= 2)
        else {
            return;
        };

        let replacement = loop {
            let candidate = rng.gen_number_in(tens_group_range(missing));
            if !numbers.contains(&candidate) {
                break candidate;
            }
        };
        numbers[index] = replacement;
    }
}
