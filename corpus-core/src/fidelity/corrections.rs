//! Correction proposal and protected-region enforcement (§4.4 correction
//! class table, "Protected enforcement", §8 properties 9 and 10).
//!
//! Two phases, kept separate on purpose: `propose_corrections` never looks
//! at protected/numeric regions (so the candidate set is independent of
//! enforcement policy), and `apply_with_enforcement` is the single place
//! that decides whether a candidate is actually applied.

use chrono::{DateTime, Utc};

use super::numeric::position_is_numeric;
use super::protected::position_is_protected;
use crate::types::{NumericRegion, ProtectedRegion, RiskLevel, TransformationEntry, TransformationType};

/// A candidate correction before protected/numeric enforcement is applied.
#[derive(Debug, Clone)]
pub struct ProposedCorrection {
    pub transformation_type: TransformationType,
    pub original: String,
    pub corrected: String,
    pub position: usize,
}

/// HTML entities that sometimes survive a raw DOM text extraction verbatim,
/// plus a handful of common mojibake byte sequences. Both are non-semantic
/// encoding fixes (§4.4 table).
const ENTITY_FIXES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("Ã¢â‚¬â„¢", "'"),
    ("Ã¢â‚¬Å“", "\""),
    ("Ã¢â‚¬ï¿½", "\""),
];

/// A small fixed dictionary of common OCR/spelling confusions seen in
/// scanned legal gazettes. Potential-semantic: only applied outside
/// protected and numeric regions (§4.4 table).
const WORD_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("paymeot", "payment"),
    ("sectlon", "section"),
    ("goverrnent", "government"),
    ("shaIl", "shall"),
];

/// Propose whitespace-cleanup and encoding-fix corrections over
/// `content_normalized`. Does not decide whether they are applied — see
/// `apply_with_enforcement`.
pub fn propose_corrections(content_normalized: &str) -> Vec<ProposedCorrection> {
    let mut proposals = Vec::new();

    for (bad, good) in ENTITY_FIXES {
        for (start, _) in content_normalized.match_indices(bad) {
            proposals.push(ProposedCorrection {
                transformation_type: TransformationType::EncodingFix,
                original: bad.to_string(),
                corrected: good.to_string(),
                position: start,
            });
        }
    }

    for (bad, good) in WORD_SUBSTITUTIONS {
        for (start, _) in content_normalized.match_indices(bad) {
            proposals.push(ProposedCorrection {
                transformation_type: TransformationType::WordSubstitution,
                original: bad.to_string(),
                corrected: good.to_string(),
                position: start,
            });
        }
    }

    proposals.extend(propose_whitespace_cleanup(content_normalized));

    proposals.sort_by_key(|p| p.position);
    proposals
}

fn propose_whitespace_cleanup(content: &str) -> Vec<ProposedCorrection> {
    let mut proposals = Vec::new();
    let bytes = content.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b' ' {
            let start = i;
            let mut j = i;
            while j < bytes.len() && bytes[j] == b' ' {
                j += 1;
            }
            if j - start > 1 {
                proposals.push(ProposedCorrection {
                    transformation_type: TransformationType::WhitespaceCleanup,
                    original: " ".repeat(j - start),
                    corrected: " ".to_string(),
                    position: start,
                });
            }
            i = j;
        } else {
            i += 1;
        }
    }
    proposals
}

/// Apply proposed corrections to `content_normalized`, enforcing protected-
/// and numeric-region policy: any correction whose position falls inside
/// either kind of region is logged but not applied, and `content_corrected`
/// preserves the original text there (§4.4, §8 property 10).
///
/// Corrections are applied right-to-left by position so earlier byte
/// offsets stay valid as later ones are rewritten.
pub fn apply_with_enforcement(
    content_normalized: &str,
    proposals: Vec<ProposedCorrection>,
    protected_regions: &[ProtectedRegion],
    numeric_regions: &[NumericRegion],
    timestamp: DateTime<Utc>,
) -> (String, Vec<TransformationEntry>) {
    let mut log = Vec::with_capacity(proposals.len());
    let mut content_corrected = content_normalized.to_string();

    let mut ordered = proposals;
    ordered.sort_by_key(|p| p.position);

    for proposal in ordered.iter().rev() {
        let in_protected = position_is_protected(proposal.position, protected_regions);
        let in_numeric = position_is_numeric(proposal.position, numeric_regions);
        let risk_level = proposal.transformation_type.default_risk_level();

        let (applied, reason) = if risk_level == RiskLevel::PotentialSemantic && in_protected {
            (false, Some("protected_section_enforcement".to_string()))
        } else if risk_level == RiskLevel::PotentialSemantic && in_numeric {
            (false, Some("numeric_region_enforcement".to_string()))
        } else {
            (true, None)
        };

        if applied {
            let end = proposal.position + proposal.original.len();
            if end <= content_corrected.len() && content_corrected.is_char_boundary(proposal.position) && content_corrected.is_char_boundary(end) {
                content_corrected.replace_range(proposal.position..end, &proposal.corrected);
            }
        }

        log.push(TransformationEntry {
            transformation_type: proposal.transformation_type.clone(),
            original: proposal.original.clone(),
            corrected: proposal.corrected.clone(),
            position: proposal.position,
            risk_level,
            applied,
            timestamp,
            reason,
        });
    }

    log.sort_by_key(|e| e.position);
    (content_corrected, log)
}
