//! Card model: layout, construction, comparison.
//!
//! ## Key Types
//!
//! - `Card`: 15 numbers on 3 rows of 5, with similarity counters
//! - `CardCheck`: game-check state owned by the gameplay engine
//!
//! ## Row Rule
//!
//! No row may hold two numbers from the same tens-group, see [`tens_group`].

pub mod card;
pub mod check;

pub use card::{
    tens_group, tens_group_range, Card, CARD_DRAW_GUARD, CARD_NUMBERS, ROWS, ROW_LEN,
    TENS_GROUPS,
};
pub use check::CardCheck;
