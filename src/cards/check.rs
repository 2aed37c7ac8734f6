//! Game-check state attached to a card.
//!
//! The gameplay engine marks drawn numbers here while a match runs. The
//! generator never reads it; it only resets it when a list is (re)finalized.

use serde::{Deserialize, Serialize};

use super::card::{CARD_NUMBERS, ROWS, ROW_LEN};

/// Matched flags and per-row scores for one card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardCheck {
    matched: [bool; CARD_NUMBERS],
    row_scores: [u8; ROWS],
}

impl CardCheck {
    /// Mark a linear position as matched. Returns false if already marked
    /// or out of range.
    pub fn mark(&mut self, index: usize) -> bool {
        match self.matched.get_mut(index) {
            Some(flag) if !*flag => {
                *flag = true;
                self.row_scores[index / ROW_LEN] += 1;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_matched(&self, index: usize) -> bool {
        self.matched.get(index).copied().unwrap_or(false)
    }

    /// Matched numbers in a row.
    #[must_use]
    pub fn row_score(&self, row: usize) -> u8 {
        self.row_scores.get(row).copied().unwrap_or(0)
    }

    /// Matched numbers on the whole card.
    #[must_use]
    pub fn total(&self) -> u8 {
        self.row_scores.iter().sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
