//! Queue configuration and its clamping discipline (§4.6, §8 property 1).
//!
//! Clamping happens on load *and* on save, per the spec: an out-of-range
//! value never reaches the rest of the pipeline, and never gets persisted
//! out of range either.

use crate::types::QueueConfig;

/// Declared bounds, default value, per §4.6.
#[derive(Debug, Clone, Copy)]
struct Bounds<T> {
    min: T,
    max: T,
    default: T,
}

const EXTRACTION_DELAY_MS: Bounds<u64> = Bounds {
    min: 1_000,
    max: 30_000,
    default: 3_000,
};

const MINIMUM_CONTENT_THRESHOLD: Bounds<usize> = Bounds {
    min: 50,
    max: 1_000,
    default: 100,
};

const MAX_RETRY_ATTEMPTS: Bounds<u32> = Bounds {
    min: 1,
    max: 5,
    default: 3,
};

const RETRY_BASE_DELAY_MS: Bounds<u64> = Bounds {
    min: 2_000,
    max: 30_000,
    default: 5_000,
};

/// Fixed, not clamped: the readiness gate's own timeout (§4.6).
pub const DOM_READINESS_TIMEOUT_MS: u64 = 30_000;

/// Checkpoint threshold bounds (§4.8).
pub const CHECKPOINT_THRESHOLD_MIN: u32 = 10;
pub const CHECKPOINT_THRESHOLD_MAX: u32 = 200;
pub const CHECKPOINT_THRESHOLD_DEFAULT: u32 = 50;

fn clamp_u64(v: u64, b: Bounds<u64>) -> u64 {
    v.clamp(b.min, b.max)
}

fn clamp_usize(v: usize, b: Bounds<usize>) -> usize {
    v.clamp(b.min, b.max)
}

fn clamp_u32(v: u32, b: Bounds<u32>) -> u32 {
    v.clamp(b.min, b.max)
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            extraction_delay_ms: EXTRACTION_DELAY_MS.default,
            minimum_content_threshold: MINIMUM_CONTENT_THRESHOLD.default,
            max_retry_attempts: MAX_RETRY_ATTEMPTS.default,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS.default,
            dom_readiness_timeout_ms: DOM_READINESS_TIMEOUT_MS,
        }
    }
}

impl QueueConfig {
    /// Build a config from raw (possibly out-of-range, possibly absent)
    /// input, clamping every field to its declared range. Never fails:
    /// out-of-range inputs clamp to the nearest bound rather than erroring.
    pub fn from_raw(
        extraction_delay_ms: Option<u64>,
        minimum_content_threshold: Option<usize>,
        max_retry_attempts: Option<u32>,
        retry_base_delay_ms: Option<u64>,
    ) -> Self {
        Self {
            extraction_delay_ms: clamp_u64(
                extraction_delay_ms.unwrap_or(EXTRACTION_DELAY_MS.default),
                EXTRACTION_DELAY_MS,
            ),
            minimum_content_threshold: clamp_usize(
                minimum_content_threshold.unwrap_or(MINIMUM_CONTENT_THRESHOLD.default),
                MINIMUM_CONTENT_THRESHOLD,
            ),
            max_retry_attempts: clamp_u32(
                max_retry_attempts.unwrap_or(MAX_RETRY_ATTEMPTS.default),
                MAX_RETRY_ATTEMPTS,
            ),
            retry_base_delay_ms: clamp_u64(
                retry_base_delay_ms.unwrap_or(RETRY_BASE_DELAY_MS.default),
                RETRY_BASE_DELAY_MS,
            ),
            dom_readiness_timeout_ms: DOM_READINESS_TIMEOUT_MS,
        }
    }

    /// Re-clamp an already-constructed config. Used before every save, so a
    /// config that was valid when constructed but mutated in place (e.g. via
    /// a UI form) cannot escape its bounds on persistence.
    pub fn clamped(mut self) -> Self {
        self.extraction_delay_ms = clamp_u64(self.extraction_delay_ms, EXTRACTION_DELAY_MS);
        self.minimum_content_threshold =
            clamp_usize(self.minimum_content_threshold, MINIMUM_CONTENT_THRESHOLD);
        self.max_retry_attempts = clamp_u32(self.max_retry_attempts, MAX_RETRY_ATTEMPTS);
        self.retry_base_delay_ms = clamp_u64(self.retry_base_delay_ms, RETRY_BASE_DELAY_MS);
        self.dom_readiness_timeout_ms = DOM_READINESS_TIMEOUT_MS;
        self
    }
}

/// Clamp a checkpoint export threshold. Non-numeric input is the caller's
/// responsibility to catch before calling this (e.g. a failed `parse::<u32>()`)
/// — on that path the caller should pass `None` and get the default.
pub fn clamp_checkpoint_threshold(raw: Option<u32>) -> u32 {
    raw.unwrap_or(CHECKPOINT_THRESHOLD_DEFAULT)
        .clamp(CHECKPOINT_THRESHOLD_MIN, CHECKPOINT_THRESHOLD_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        let c = QueueConfig::default();
        assert_eq!(c.extraction_delay_ms, 3_000);
        assert_eq!(c.minimum_content_threshold, 100);
        assert_eq!(c.max_retry_attempts, 3);
        assert_eq!(c.retry_base_delay_ms, 5_000);
        assert_eq!(c.dom_readiness_timeout_ms, 30_000);
    }

    #[test]
    fn valid_inputs_round_trip_exactly() {
        let c = QueueConfig::from_raw(Some(10_000), Some(500), Some(4), Some(8_000));
        assert_eq!(c.extraction_delay_ms, 10_000);
        assert_eq!(c.minimum_content_threshold, 500);
        assert_eq!(c.max_retry_attempts, 4);
        assert_eq!(c.retry_base_delay_ms, 8_000);
    }

    #[test]
    fn out_of_range_inputs_clamp_to_nearest_bound() {
        let low = QueueConfig::from_raw(Some(0), Some(1), Some(0), Some(0));
        assert_eq!(low.extraction_delay_ms, 1_000);
        assert_eq!(low.minimum_content_threshold, 50);
        assert_eq!(low.max_retry_attempts, 1);
        assert_eq!(low.retry_base_delay_ms, 2_000);

        let high = QueueConfig::from_raw(
            Some(1_000_000),
            Some(1_000_000),
            Some(1_000),
            Some(1_000_000),
        );
        assert_eq!(high.extraction_delay_ms, 30_000);
        assert_eq!(high.minimum_content_threshold, 1_000);
        assert_eq!(high.max_retry_attempts, 5);
        assert_eq!(high.retry_base_delay_ms, 30_000);
    }

    #[test]
    fn checkpoint_threshold_clamps_and_falls_back_to_default() {
        assert_eq!(clamp_checkpoint_threshold(None), 50);
        assert_eq!(clamp_checkpoint_threshold(Some(1)), 10);
        assert_eq!(clamp_checkpoint_threshold(Some(10_000)), 200);
        assert_eq!(clamp_checkpoint_threshold(Some(75)), 75);
    }

    proptest::proptest! {
        #[test]
        fn prop_config_clamping_always_in_range(
            delay in 0u64..1_000_000,
            threshold in 0usize..1_000_000,
            retries in 0u32..1_000,
            base in 0u64..1_000_000,
        ) {
            let c = QueueConfig::from_raw(Some(delay), Some(threshold), Some(retries), Some(base));
            proptest::prop_assert!((1_000..=30_000).contains(&c.extraction_delay_ms));
            proptest::prop_assert!((50..=1_000).contains(&c.minimum_content_threshold));
            proptest::prop_assert!((1..=5).contains(&c.max_retry_attempts));
            proptest::prop_assert!((2_000..=30_000).contains(&c.retry_base_delay_ms));
        }
    }
}
