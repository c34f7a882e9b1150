//! Failure Tracker (C7, §4.7): classifies an extraction attempt, enforces
//! the retry policy, and computes backoff delays for the retry sub-loop.
//!
//! The retry policy is a table lookup (`FailureReason::is_retryable`, in
//! `types.rs`) rather than ad-hoc conditionals, so retry scope cannot
//! accidentally widen. Backoff here is an exact deterministic formula with
//! no jitter — unlike a crawler polling a shared remote resource, this
//! pipeline's retries are a handful of same-host page loads, and a
//! reproducible delay sequence is what the invariant in §8 property 6 means
//! to measure.

use crate::dom::{DomResponse, ExtractActOptions};
use crate::types::FailureReason;

/// §4.3 "standard selectors followed by generic semantic containers and
/// finally body" — recorded with the attempt, never changing extraction
/// semantics, only where content is read from.
pub const BROADER_SELECTORS: &[&str] = &["article", "main", "[role=main]", "body"];

/// Build the options for a broader-selector retry (§4.6 step 3, §4.7 step 3).
pub fn broader_selector_options() -> ExtractActOptions {
    ExtractActOptions {
        use_broader_selectors: true,
        broader_selectors: Some(BROADER_SELECTORS.iter().map(|s| s.to_string()).collect()),
    }
}

/// §4.7 "Classify extraction result", decision order 1-6. `readiness_reason`
/// is the Readiness Gate's classification for this attempt, if the item
/// never reached the extractor at all because readiness failed first.
pub fn classify_extraction_result(
    response: &DomResponse,
    readiness_reason: Option<FailureReason>,
    minimum_content_threshold: usize,
) -> Result<(), FailureReason> {
    if !response.success {
        return Err(FailureReason::ExtractionError);
    }

    match &response.content {
        None => {
            if readiness_reason == Some(FailureReason::ContentSelectorMismatch) {
                Err(FailureReason::ContentSelectorMismatch)
            } else {
                Err(FailureReason::ContainerNotFound)
            }
        }
        Some(content) => {
            if content.is_empty() {
                Err(FailureReason::ContentEmpty)
            } else if content.len() < minimum_content_threshold {
                Err(FailureReason::ContentBelowThreshold)
            } else {
                Ok(())
            }
        }
    }
}

/// §8 property 6: `backoff = retry_base_delay_ms · 2^(attempt_number − 1)`.
/// `attempt_number` is 1-indexed, matching `Attempt::attempt_number`.
pub fn compute_backoff_ms(retry_base_delay_ms: u64, attempt_number: u32) -> u64 {
    let exponent = attempt_number.saturating_sub(1).min(63);
    retry_base_delay_ms.saturating_mul(1u64 << exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(success: bool, content: Option<&str>) -> DomResponse {
        DomResponse {
            success,
            content: content.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn unsuccessful_response_is_extraction_error() {
        assert_eq!(
            classify_extraction_result(&response(false, None), None, 100),
            Err(FailureReason::ExtractionError)
        );
    }

    #[test]
    fn missing_content_with_selector_mismatch_readiness_propagates_reason() {
        let result = classify_extraction_result(
            &response(true, None),
            Some(FailureReason::ContentSelectorMismatch),
            100,
        );
        assert_eq!(result, Err(FailureReason::ContentSelectorMismatch));
    }

    #[test]
    fn missing_content_without_selector_mismatch_readiness_is_container_not_found() {
        let result = classify_extraction_result(&response(true, None), None, 100);
        assert_eq!(result, Err(FailureReason::ContainerNotFound));
    }

    #[test]
    fn empty_content_is_content_empty() {
        let result = classify_extraction_result(&response(true, Some("")), None, 100);
        assert_eq!(result, Err(FailureReason::ContentEmpty));
    }

    #[test]
    fn short_content_is_below_threshold() {
        let result = classify_extraction_result(&response(true, Some("short")), None, 100);
        assert_eq!(result, Err(FailureReason::ContentBelowThreshold));
    }

    #[test]
    fn adequate_content_is_valid() {
        let long_content = "x".repeat(200);
        let result = classify_extraction_result(&response(true, Some(&long_content)), None, 100);
        assert!(result.is_ok());
    }

    /// §8 property 6.
    #[test]
    fn backoff_doubles_per_attempt_with_no_jitter() {
        assert_eq!(compute_backoff_ms(5_000, 1), 5_000);
        assert_eq!(compute_backoff_ms(5_000, 2), 10_000);
        assert_eq!(compute_backoff_ms(5_000, 3), 20_000);
        let a = compute_backoff_ms(5_000, 4);
        let b = compute_backoff_ms(5_000, 4);
        assert_eq!(a, b);
    }

    #[test]
    fn broader_selector_options_use_the_fallback_chain() {
        let options = broader_selector_options();
        assert!(options.use_broader_selectors);
        assert_eq!(options.broader_selectors.unwrap(), BROADER_SELECTORS.to_vec());
    }
}
