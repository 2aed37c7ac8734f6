//! Deterministic random number generation for card and series building.
//!
//! A seed fully determines the stream, so a builder's seed is enough to
//! reproduce a whole list. Entropy seeding draws a fresh seed and still
//! reports it.
//!
//! ```
//! use tombola_series::core::SeriesRng;
//!
//! let mut a = SeriesRng::new(42);
//! let mut b = SeriesRng::new(42);
//! assert_eq!(a.gen_number(), b.gen_number());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Lowest number printed on a tombola card.
pub const MIN_NUMBER: u8 = 1;

/// Highest number printed on a tombola card.
pub const MAX_NUMBER: u8 = 90;

/// Deterministic RNG driving card and series construction.
///
/// Uses ChaCha8 so a seed reproduces the same series on every platform.
#[derive(Clone, Debug)]
pub struct SeriesRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SeriesRng {
    /// Stream for a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an RNG seeded from the thread-local entropy source.
    ///
    /// The drawn seed is available through [`SeriesRng::seed`].
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw a card number in `1..=90`.
    pub fn gen_number(&mut self) -> u8 {
        self.inner.gen_range(MIN_NUMBER..=MAX_NUMBER)
    }

    /// Draw a number in the inclusive range.
    pub fn gen_number_in(&mut self, range: std::ops::RangeInclusive<u8>) -> u8 {
        self.inner.gen_range(range)
    }

    /// Draw an index in the half-open range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_numbers() {
        let mut rng1 = SeriesRng::new(42);
        let mut rng2 = SeriesRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_number(), rng2.gen_number());
        }
    }

    #[test]
    fn test_seeds_diverge() {
        let mut rng1 = SeriesRng::new(1);
        let mut rng2 = SeriesRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.gen_range_usize(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.gen_range_usize(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_numbers_in_range() {
        let mut rng = SeriesRng::new(7);
        for _ in 0..10_000 {
            let n = rng.gen_number();
            assert!((MIN_NUMBER..=MAX_NUMBER).contains(&n));
        }
    }

    #[test]
    fn test_entropy_reports_seed() {
        let rng = SeriesRng::from_entropy();
        let mut replay = SeriesRng::new(rng.seed());
        let mut original = rng.clone();
        assert_eq!(original.gen_number(), replay.gen_number());
    }
}
