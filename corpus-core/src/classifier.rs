//! Page Classifier (C1, §4.1): a pure, deterministic mapping from a URL to
//! a `PageType`, plus the allowed-domain predicate.

use crate::types::PageType;
use url::Url;

/// The single allowed source domain (§6.5).
pub const ALLOWED_HOST: &str = "bdlaws.minlaw.gov.bd";

/// Base URL used for absolutizing relative catalog links (§4.2, §6.5).
pub const BASE_URL: &str = "http://bdlaws.minlaw.gov.bd";

/// Returns `true` iff `url`'s host matches the single allowed source domain.
pub fn is_allowed_domain(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(ALLOWED_HOST)))
        .unwrap_or(false)
}

/// Classify a URL into a `PageType` by pattern-matching its path structure.
/// Pure function: the same URL always yields the same variant, and nothing
/// here performs I/O.
pub fn classify(url: &str) -> PageType {
    let Ok(parsed) = Url::parse(url) else {
        return PageType::Invalid;
    };

    if !is_allowed_domain(url) {
        return PageType::Invalid;
    }

    let path = parsed.path();
    let file = path.rsplit('/').next().unwrap_or("");

    if matches_pattern(file, "volume-", ".html") {
        return PageType::Volume;
    }
    if matches_pattern(file, "act-summary-", ".html") {
        return PageType::ActSummary;
    }
    if matches_pattern(file, "act-details-", ".html") || matches_pattern(file, "act-", ".html") {
        return PageType::ActDetails;
    }
    if file == "chronological-index.html" || matches_pattern(file, "chronological-index", ".html")
    {
        return PageType::ChronologicalIndex;
    }
    if file == "alphabetical-index.html" || matches_pattern(file, "alphabetical-index", ".html") {
        return PageType::AlphabeticalIndex;
    }
    if matches_pattern(file, "laws-of-", ".html") || file == "range-index.html" {
        return PageType::RangeIndex;
    }

    PageType::Invalid
}

/// Extract the digit sequence from a URL matching `act(-details)?-<digits>.html`,
/// used as the `internal_id`. Returns `None` if the pattern does not match.
pub fn extract_internal_id(url: &str) -> Option<String> {
    let Ok(parsed) = Url::parse(url) else {
        return None;
    };
    let path = parsed.path();
    let file = path.rsplit('/').next().unwrap_or("");

    for prefix in ["act-details-", "act-"] {
        if let Some(rest) = file.strip_prefix(prefix) {
            if let Some(digits) = rest.strip_suffix(".html") {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    return Some(digits.to_string());
                }
            }
        }
    }
    None
}

/// §8 property 4 / GLOSSARY: extract the volume number from a
/// `/volume-<digits>.html` URL. Any other URL yields `"unknown"`. Total and
/// deterministic.
pub fn extract_volume_number(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "unknown".to_string();
    };
    let path = parsed.path();
    let file = path.rsplit('/').next().unwrap_or("");

    if let Some(rest) = file.strip_prefix("volume-") {
        if let Some(digits) = rest.strip_suffix(".html") {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return digits.to_string();
            }
        }
    }
    "unknown".to_string()
}

/// §8 property 5 / URL normalization: absolutize a relative URL against the
/// fixed base. Already-absolute URLs are preserved; no double slashes.
pub fn normalize_url(raw: &str) -> String {
    if let Ok(parsed) = Url::parse(raw) {
        // Already absolute.
        return parsed.to_string();
    }

    // A leading "//" is scheme-relative and would otherwise let `join`
    // resolve to a different host entirely — treat it as a path instead,
    // since every relative href on this site is path-relative.
    let raw = raw.trim_start_matches('/');

    let base = Url::parse(BASE_URL).expect("BASE_URL is a valid URL constant");
    match base.join(raw) {
        Ok(joined) => joined.to_string(),
        Err(_) => {
            // Fall back to a defensive concatenation that still avoids a
            // double slash, rather than propagating a parse error for a
            // pure, infallible-by-contract function.
            let trimmed = raw.trim_start_matches('/');
            format!("{}/{}", BASE_URL.trim_end_matches('/'), trimmed)
        }
    }
}

fn matches_pattern(file: &str, prefix: &str, suffix: &str) -> bool {
    file.starts_with(prefix) && file.ends_with(suffix) && file.len() > prefix.len() + suffix.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_volume_pages() {
        assert_eq!(
            classify("http://bdlaws.minlaw.gov.bd/volume-56.html"),
            PageType::Volume
        );
    }

    #[test]
    fn classifies_act_details_pages() {
        assert_eq!(
            classify("http://bdlaws.minlaw.gov.bd/act-details-123.html"),
            PageType::ActDetails
        );
    }

    #[test]
    fn classifies_act_summary_pages() {
        assert_eq!(
            classify("http://bdlaws.minlaw.gov.bd/act-summary-123.html"),
            PageType::ActSummary
        );
    }

    #[test]
    fn rejects_other_domains() {
        assert_eq!(
            classify("http://evil.example/volume-56.html"),
            PageType::Invalid
        );
        assert!(!is_allowed_domain("http://evil.example/volume-56.html"));
    }

    #[test]
    fn classification_is_deterministic() {
        let url = "http://bdlaws.minlaw.gov.bd/act-details-77.html";
        assert_eq!(classify(url), classify(url));
    }

    #[test]
    fn s1_volume_number_extraction() {
        assert_eq!(
            extract_volume_number("http://bdlaws.minlaw.gov.bd/volume-56.html"),
            "56"
        );
    }

    #[test]
    fn volume_number_is_unknown_for_other_urls() {
        assert_eq!(
            extract_volume_number("http://bdlaws.minlaw.gov.bd/act-details-1.html"),
            "unknown"
        );
        assert_eq!(extract_volume_number("not a url at all"), "unknown");
    }

    #[test]
    fn internal_id_extraction_matches_act_details_pattern() {
        assert_eq!(
            extract_internal_id("http://bdlaws.minlaw.gov.bd/act-details-456.html"),
            Some("456".to_string())
        );
        assert_eq!(
            extract_internal_id("http://bdlaws.minlaw.gov.bd/act-789.html"),
            Some("789".to_string())
        );
        assert_eq!(
            extract_internal_id("http://bdlaws.minlaw.gov.bd/volume-56.html"),
            None
        );
    }

    #[test]
    fn relative_urls_absolutize_against_fixed_base_without_double_slashes() {
        let out = normalize_url("act-details-123.html");
        assert!(out.starts_with(BASE_URL));
        assert!(!out.contains("//act-details"));
    }

    #[test]
    fn already_absolute_urls_are_preserved() {
        let abs = "http://bdlaws.minlaw.gov.bd/act-details-123.html";
        assert_eq!(normalize_url(abs), abs);
    }

    proptest::proptest! {
        #[test]
        fn prop_normalize_url_always_starts_with_base(path in "[a-z0-9/-]{0,40}\\.html") {
            let out = normalize_url(&path);
            proptest::prop_assert!(out.starts_with(BASE_URL));
            let after_scheme = out.trim_start_matches("http://");
            proptest::prop_assert!(!after_scheme.contains("//"));
        }

        #[test]
        fn prop_volume_number_is_total_and_deterministic(s in "[a-zA-Z0-9/:._-]{0,60}") {
            let a = extract_volume_number(&s);
            let b = extract_volume_number(&s);
            proptest::prop_assert_eq!(a, b);
        }
    }
}
