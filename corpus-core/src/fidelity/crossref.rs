//! Cross-reference (lexical reference) detection (§4.4 "Auxiliary
//! detections"). Pattern-matched citations to other acts, never asserted as
//! verified legal relations — see `trust_boundary` in `types.rs`.
//!
//! Confidence is a first-class field per the §9 Open Question resolution:
//! this module never collapses a detection down to a boolean, leaving
//! downstream consumers free to filter by confidence themselves.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{Confidence, LexicalReference};

const NEGATION_MARKERS: &[&str] = &["not applicable", "does not apply", "repealed", "নয়"];

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(the\s+[A-Z][A-Za-z,\s]{2,60}Act,?\s*\d{4})\b").unwrap()
    })
}

/// Detect cross-references to other legal acts in `content_raw`. Confidence
/// reflects how specific the citation text is (year present, repealed
/// language nearby), never a legal judgment about the relation's validity.
pub fn detect_cross_references(content: &str) -> Vec<LexicalReference> {
    citation_regex()
        .find_iter(content)
        .map(|m| {
            let citation_text = m.as_str().trim().to_string();
            let mut window_start = m.start().saturating_sub(80);
            while window_start > 0 && !content.is_char_boundary(window_start) {
                window_start -= 1;
            }
            let window = &content[window_start..m.end()];
            let negation_present = NEGATION_MARKERS.iter().any(|n| window.contains(n));

            let relation_type = if negation_present {
                "negated_reference".to_string()
            } else {
                "reference".to_string()
            };

            let confidence = classify_confidence(&citation_text, negation_present);

            LexicalReference {
                citation_text,
                relation_type,
                confidence,
                negation_present,
            }
        })
        .collect()
}

fn classify_confidence(citation_text: &str, negation_present: bool) -> Confidence {
    let has_year = citation_text
        .chars()
        .collect::<Vec<_>>()
        .windows(4)
        .any(|w| w.iter().all(|c| c.is_ascii_digit()));

    match (has_year, negation_present) {
        (true, false) => Confidence::High,
        (true, true) => Confidence::Medium,
        (false, _) => Confidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_dated_citation_with_high_confidence() {
        let refs = detect_cross_references("This section amends the Penal Code Act, 1971 in part.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].confidence, Confidence::High);
        assert!(!refs[0].negation_present);
    }

    #[test]
    fn negated_reference_is_detected_and_flagged() {
        let refs = detect_cross_references(
            "The Penal Code Act, 1971 does not apply to offences committed before this Act.",
        );
        assert_eq!(refs.len(), 1);
        assert!(refs[0].negation_present);
        assert_eq!(refs[0].relation_type, "negated_reference");
        assert_eq!(refs[0].confidence, Confidence::Medium);
    }

    #[test]
    fn text_without_citations_yields_no_references() {
        let refs = detect_cross_references("This Act shall extend to the whole of Bangladesh.");
        assert!(refs.is_empty());
    }

    #[test]
    fn never_asserts_legal_meaning_only_pattern_match() {
        let refs = detect_cross_references("See also the Evidence Act, 1872.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].relation_type, "reference");
    }

    #[test]
    fn does_not_panic_when_bengali_text_precedes_a_citation_within_the_window() {
        let bengali_prefix = "আইন সংক্রান্ত বিধান অনুযায়ী ব্যাখ্যা প্রদান করা হলো। ".repeat(3);
        let content = format!("{bengali_prefix}This section amends the Penal Code Act, 1971 in part.");
        let refs = detect_cross_references(&content);
        assert_eq!(refs.len(), 1);
    }
}
