//! Generation configuration.
//!
//! Every value is optional until set; a controller may only leave
//! `Initializing` once [`GenerationConfig::is_complete`] holds. Setters
//! validate and reject out-of-range values instead of clamping them.

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// Smallest accepted desired series count.
pub const MIN_SERIES_COUNT: usize = 1;

/// Largest accepted desired series count.
pub const MAX_SERIES_COUNT: usize = 166;

/// Smallest accepted max-equal-per-card threshold.
pub const MIN_EQUAL_PER_CARD: u8 = 5;

/// Largest meaningful max-equal-per-card threshold (a whole card).
pub const MAX_EQUAL_PER_CARD: u8 = 15;

/// Smallest accepted max-equal-per-row threshold.
pub const MIN_EQUAL_PER_ROW: u8 = 2;

/// Largest meaningful max-equal-per-row threshold (a whole row).
pub const MAX_EQUAL_PER_ROW: u8 = 5;

/// Smallest accepted iteration guard.
pub const MIN_ITERATION_GUARD: u64 = 1000;

/// Smallest accepted time guard in milliseconds.
pub const MIN_TIME_GUARD_MS: u64 = 1000;

/// Similarity limits a candidate series must respect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum equal numbers between two cards of different series.
    pub max_equal_per_card: u8,
    /// Maximum equal numbers between two rows of different series.
    pub max_equal_per_row: u8,
}

/// Configuration of a generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    desired_count: Option<usize>,
    max_equal_per_card: Option<u8>,
    max_equal_per_row: Option<u8>,
    iteration_guard: Option<u64>,
    time_guard_ms: Option<u64>,
}

impl GenerationConfig {
    /// Create an empty configuration (nothing set).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A complete configuration with conservative values.
    #[must_use]
    pub fn recommended() -> Self {
        Self {
            desired_count: Some(10),
            max_equal_per_card: Some(6),
            max_equal_per_row: Some(3),
            iteration_guard: Some(100_000),
            time_guard_ms: Some(60_000),
        }
    }

    /// True once every value has been set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.desired_count.is_some()
            && self.max_equal_per_card.is_some()
            && self.max_equal_per_row.is_some()
            && self.iteration_guard.is_some()
            && self.time_guard_ms.is_some()
    }

    #[must_use]
    pub fn desired_count(&self) -> Option<usize> {
        self.desired_count
    }

    #[must_use]
    pub fn max_equal_per_card(&self) -> Option<u8> {
        self.max_equal_per_card
    }

    #[must_use]
    pub fn max_equal_per_row(&self) -> Option<u8> {
        self.max_equal_per_row
    }

    #[must_use]
    pub fn iteration_guard(&self) -> Option<u64> {
        self.iteration_guard
    }

    #[must_use]
    pub fn time_guard_ms(&self) -> Option<u64> {
        self.time_guard_ms
    }

    /// Both thresholds, if set.
    #[must_use]
    pub fn thresholds(&self) -> Option<Thresholds> {
        Some(Thresholds {
            max_equal_per_card: self.max_equal_per_card?,
            max_equal_per_row: self.max_equal_per_row?,
        })
    }

    /// Set the number of series to generate.
    pub fn set_desired_count(&mut self, count: usize) -> Result<(), ConfigurationError> {
        if !(MIN_SERIES_COUNT..=MAX_SERIES_COUNT).contains(&count) {
            return Err(ConfigurationError::CountOutOfRange {
                value: count,
                min: MIN_SERIES_COUNT,
                max: MAX_SERIES_COUNT,
            });
        }
        self.desired_count = Some(count);
        Ok(())
    }

    /// Set the max-equal-per-card threshold.
    pub fn set_max_equal_per_card(&mut self, value: u8) -> Result<(), ConfigurationError> {
        check_threshold("max equal per card", value, MIN_EQUAL_PER_CARD, MAX_EQUAL_PER_CARD)?;
        self.max_equal_per_card = Some(value);
        Ok(())
    }

    /// Set the max-equal-per-row threshold.
    pub fn set_max_equal_per_row(&mut self, value: u8) -> Result<(), ConfigurationError> {
        check_threshold("max equal per row", value, MIN_EQUAL_PER_ROW, MAX_EQUAL_PER_ROW)?;
        self.max_equal_per_row = Some(value);
        Ok(())
    }

    /// Set the consecutive-rejection guard.
    pub fn set_iteration_guard(&mut self, value: u64) -> Result<(), ConfigurationError> {
        check_guard("iteration", value, MIN_ITERATION_GUARD)?;
        self.iteration_guard = Some(value);
        Ok(())
    }

    /// Set the wall-clock guard in milliseconds.
    pub fn set_time_guard_ms(&mut self, value: u64) -> Result<(), ConfigurationError> {
        check_guard("time", value, MIN_TIME_GUARD_MS)?;
        self.time_guard_ms = Some(value);
        Ok(())
    }

    /// Builder form of [`set_desired_count`](Self::set_desired_count).
    pub fn with_desired_count(mut self, count: usize) -> Result<Self, ConfigurationError> {
        self.set_desired_count(count)?;
        Ok(self)
    }

    /// Builder form of [`set_max_equal_per_card`](Self::set_max_equal_per_card).
    pub fn with_max_equal_per_card(mut self, value: u8) -> Result<Self, ConfigurationError> {
        self.set_max_equal_per_card(value)?;
        Ok(self)
    }

    /// Builder form of [`set_max_equal_per_row`](Self::set_max_equal_per_row).
    pub fn with_max_equal_per_row(mut self, value: u8) -> Result<Self, ConfigurationError> {
        self.set_max_equal_per_row(value)?;
        Ok(self)
    }

    /// Builder form of [`set_iteration_guard`](Self::set_iteration_guard).
    pub fn with_iteration_guard(mut self, value: u64) -> Result<Self, ConfigurationError> {
        self.set_iteration_guard(value)?;
        Ok(self)
    }

    /// Builder form of [`set_time_guard_ms`](Self::set_time_guard_ms).
    pub fn with_time_guard_ms(mut self, value: u64) -> Result<Self, ConfigurationError> {
        self.set_time_guard_ms(value)?;
        Ok(self)
    }
}

fn check_threshold(
    name: &'static str,
    value: u8,
    min: u8,
    max: u8,
) -> Result<(), ConfigurationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::ThresholdOutOfRange { name, value, min, max })
    }
}

fn check_guard(name: &'static str, value: u64, min: u64) -> Result<(), ConfigurationError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigurationError::GuardTooSmall { name, value, min })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_incomplete() {
        let config = GenerationConfig::new();
        assert!(!config.is_complete());
        assert_eq!(config.thresholds(), None);
    }

    #[test]
    fn test_recommended_is_complete() {
        let config = GenerationConfig::recommended();
        assert!(config.is_complete());
        assert_eq!(
            config.thresholds(),
            Some(Thresholds {
                max_equal_per_card: 6,
                max_equal_per_row: 3,
            })
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = GenerationConfig::new()
            .with_desired_count(20)
            .and_then(|c| c.with_max_equal_per_card(7))
            .and_then(|c| c.with_max_equal_per_row(2))
            .and_then(|c| c.with_iteration_guard(5000))
            .and_then(|c| c.with_time_guard_ms(2000))
            .unwrap();

        assert!(config.is_complete());
        assert_eq!(config.desired_count(), Some(20));
        assert_eq!(config.time_guard_ms(), Some(2000));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut config = GenerationConfig::new();

        assert!(matches!(
            config.set_desired_count(0),
            Err(ConfigurationError::CountOutOfRange { .. })
        ));
        assert!(config.set_desired_count(MAX_SERIES_COUNT + 1).is_err());
        assert!(config.set_max_equal_per_card(4).is_err());
        assert!(config.set_max_equal_per_card(16).is_err());
        assert!(config.set_max_equal_per_row(1).is_err());
        assert!(config.set_iteration_guard(999).is_err());
        assert!(config.set_time_guard_ms(10).is_err());

        // Rejected values leave the config untouched
        assert_eq!(config, GenerationConfig::new());
    }

    #[test]
    fn test_accepts_bounds() {
        let mut config = GenerationConfig::new();
        assert!(config.set_desired_count(MAX_SERIES_COUNT).is_ok());
        assert!(config.set_max_equal_per_card(MIN_EQUAL_PER_CARD).is_ok());
        assert!(config.set_max_equal_per_row(MAX_EQUAL_PER_ROW).is_ok());
        assert!(config.set_iteration_guard(MIN_ITERATION_GUARD).is_ok());
        assert!(config.set_time_guard_ms(MIN_TIME_GUARD_MS).is_ok());
        assert!(config.is_complete());
    }

    #[test]
    fn test_serialization() {
        let config = GenerationConfig::recommended();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: GenerationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
