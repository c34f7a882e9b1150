//! Text Fidelity Engine (C4, §4.4): builds the three parallel content
//! versions and every piece of provenance needed to defend them.

pub mod corrections;
pub mod crossref;
pub mod language;
pub mod numeric;
pub mod protected;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

use crate::types::{
    ContentHash, Language, LexicalReference, NumericRegion, ProtectedRegion, TransformationEntry,
};

/// Everything the Text Fidelity Engine produces for one act's `content_raw`.
/// `export.rs` and `storage` map this directly onto `ActRecord` fields.
#[derive(Debug, Clone)]
pub struct FidelityResult {
    pub content_raw: String,
    pub content_normalized: String,
    pub content_corrected: String,
    pub content_raw_sha256: ContentHash,
    pub content_language: Language,
    pub language_distribution: HashMap<String, f32>,
    pub editorial_content_present: bool,
    pub transformation_log: Vec<TransformationEntry>,
    pub protected_sections: Vec<ProtectedRegion>,
    pub numeric_regions: Vec<NumericRegion>,
    pub lexical_references: Vec<LexicalReference>,
}

/// Run the full fidelity pipeline over `content_raw`. `content_raw` is
/// immutable from this point on (§3.2); every other field is derived
/// deterministically from it.
pub fn build(content_raw: &str, captured_at: DateTime<Utc>) -> FidelityResult {
    let content_raw_sha256 = ContentHash::of(content_raw);

    // Step 1: NFC normalization only — no other change (§4.4 point 2).
    let content_normalized: String = content_raw.nfc().collect();

    // Regions are detected from content_raw at capture time and never
    // recomputed from a later version (§3.2).
    let protected_sections = protected::detect_protected_regions(content_raw);
    let numeric_regions = numeric::detect_numeric_regions(content_raw);

    let mut transformation_log = Vec::new();

    if content_raw != content_normalized {
        transformation_log.push(TransformationEntry {
            transformation_type: crate::types::TransformationType::UnicodeNormalization,
            original: content_raw.to_string(),
            corrected: content_normalized.clone(),
            position: 0,
            risk_level: crate::types::RiskLevel::NonSemantic,
            applied: true,
            timestamp: captured_at,
            reason: None,
        });
    }

    let proposals = corrections::propose_corrections(&content_normalized);
    let (content_corrected, correction_log) = corrections::apply_with_enforcement(
        &content_normalized,
        proposals,
        &protected_sections,
        &numeric_regions,
        captured_at,
    );
    transformation_log.extend(correction_log);

    let lexical_references = crossref::detect_cross_references(content_raw);
    let (language_distribution, content_language, editorial_content_present) =
        language::analyze_language(content_raw);

    FidelityResult {
        content_raw: content_raw.to_string(),
        content_normalized,
        content_corrected,
        content_raw_sha256,
        content_language,
        language_distribution,
        editorial_content_present,
        transformation_log,
        protected_sections,
        numeric_regions,
        lexical_references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_produces_three_versions_even_when_equal() {
        let result = build("Plain ASCII legal text.", Utc::now());
        assert_eq!(result.content_raw, "Plain ASCII legal text.");
        assert_eq!(result.content_normalized, result.content_raw);
    }

    #[test]
    fn content_hash_anchors_to_raw_not_normalized_or_corrected() {
        let content = "Terms &amp; Conditions with  double  spaces.";
        let result = build(content, Utc::now());
        assert_eq!(result.content_raw_sha256, ContentHash::of(content));
        assert_ne!(result.content_raw_sha256, ContentHash::of(&result.content_corrected));
    }

    #[test]
    fn transformation_log_entries_have_all_seven_required_fields_conceptually() {
        let content = "The  goverrnent shall pay Tk. 500 at once.";
        let result = build(content, Utc::now());
        for entry in &result.transformation_log {
            assert!(!entry.original.is_empty() || entry.transformation_type == crate::types::TransformationType::WhitespaceCleanup);
            assert!(matches!(
                entry.risk_level,
                crate::types::RiskLevel::NonSemantic | crate::types::RiskLevel::PotentialSemantic
            ));
        }
    }

    #[test]
    fn protected_and_numeric_regions_are_detected_from_raw_content() {
        let content = "Tax means an amount. Fee of Tk. 500 applies.";
        let result = build(content, Utc::now());
        assert!(!result.protected_sections.is_empty());
        assert!(!result.numeric_regions.is_empty());
    }

    #[test]
    fn cross_references_and_language_are_populated() {
        let content = "This amends the Penal Code Act, 1971 in full.";
        let result = build(content, Utc::now());
        assert_eq!(result.lexical_references.len(), 1);
        assert_eq!(result.content_language, crate::types::Language::English);
    }
}
