//! Run and detection tuning
//!
//! All tunables live here; callers go through the validated constructors so
//! out-of-range operator input is clamped instead of propagated.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default values for run and detection tuning.
pub mod defaults {
    /// Default rows dispatched concurrently per batch
    pub const BATCH_SIZE: usize = 5;

    /// Upper bound on operator-tunable batch size
    pub const MAX_BATCH_SIZE: usize = 50;

    /// Default delay between batches in milliseconds (external rate limits)
    pub const INTER_BATCH_DELAY_MS: u64 = 350;

    /// Default capacity of the rolling operator log
    pub const LOG_CAPACITY: usize = 200;

    /// Smallest allowed rolling log capacity
    pub const MIN_LOG_CAPACITY: usize = 16;

    /// Service confidence below this marks the row for review
    pub const MIN_CONFIDENCE: f64 = 0.6;

    /// Jaccard similarity above this counts as a near-duplicate
    pub const NEAR_DUP_THRESHOLD: f64 = 0.85;

    /// Row count at or below which the near-text pass runs full pairwise
    pub const PAIRWISE_LIMIT: usize = 500;
}

/// Validated orchestrator tuning; construct via `from_unchecked` to clamp
/// raw operator input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRunConfig {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    pub log_capacity: usize,
    pub min_confidence: f64,
}

impl ValidatedRunConfig {
    /// Clamp raw values into their safe ranges.
    #[must_use]
    pub fn from_unchecked(
        batch_size: usize,
        inter_batch_delay_ms: u64,
        log_capacity: usize,
        min_confidence: f64,
    ) -> Self {
        Self {
            batch_size: batch_size.clamp(1, defaults::MAX_BATCH_SIZE),
            inter_batch_delay_ms,
            log_capacity: log_capacity.max(defaults::MIN_LOG_CAPACITY),
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }
}

impl Default for ValidatedRunConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            inter_batch_delay_ms: defaults::INTER_BATCH_DELAY_MS,
            log_capacity: defaults::LOG_CAPACITY,
            min_confidence: defaults::MIN_CONFIDENCE,
        }
    }
}

/// Duplicate detection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Similarity strictly above this value qualifies a near-duplicate pair.
    pub near_dup_threshold: f64,
    /// Row sets larger than this switch to fingerprint bucketing.
    pub pairwise_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            near_dup_threshold: defaults::NEAR_DUP_THRESHOLD,
            pairwise_limit: defaults::PAIRWISE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_values_are_clamped() {
        let config = ValidatedRunConfig::from_unchecked(0, 100, 2, 1.7);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.log_capacity, defaults::MIN_LOG_CAPACITY);
        assert_eq!(config.min_confidence, 1.0);

        let config = ValidatedRunConfig::from_unchecked(10_000, 0, 500, -0.2);
        assert_eq!(config.batch_size, defaults::MAX_BATCH_SIZE);
        assert_eq!(config.min_confidence, 0.0);
    }

    #[test]
    fn defaults_stay_in_range() {
        let config = ValidatedRunConfig::default();
        assert!(config.batch_size >= 1 && config.batch_size <= defaults::MAX_BATCH_SIZE);
        assert_eq!(config.inter_batch_delay().as_millis(), 350);
    }
}
