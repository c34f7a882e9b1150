//! Protected-region detection (§4.4): definitions, provisos, and
//! explanations. Corrections landing inside these spans are flagged but
//! never applied (§4.4 "Protected enforcement", §8 property 10).

use crate::types::{ProtectedRegion, ProtectedRegionType};

const DEFINITIONS_MARKERS: &[&str] = &["means", "definition", "সংজ্ঞা"];
const PROVISO_MARKERS: &[&str] = &["Provided that", "provided that", "তবে শর্ত"];
const EXPLANATION_MARKERS: &[&str] = &["Explanation", "explanation", "ব্যাখ্যা"];

/// Detect protected regions in `content_raw`. Each region spans from its
/// marker to the end of the sentence (next `.` or end of text) it appears
/// in — a conservative, auditable approximation rather than a legal parse.
/// Overlapping regions are merged per type-agnostic span (§4.4).
pub fn detect_protected_regions(content: &str) -> Vec<ProtectedRegion> {
    let mut regions = Vec::new();
    regions.extend(find_marker_regions(content, DEFINITIONS_MARKERS, ProtectedRegionType::Definitions));
    regions.extend(find_marker_regions(content, PROVISO_MARKERS, ProtectedRegionType::Proviso));
    regions.extend(find_marker_regions(content, EXPLANATION_MARKERS, ProtectedRegionType::Explanation));
    regions.sort_by_key(|r| r.start);
    merge_overlapping(regions)
}

fn find_marker_regions(
    content: &str,
    markers: &[&str],
    region_type: ProtectedRegionType,
) -> Vec<ProtectedRegion> {
    let mut found = Vec::new();
    for marker in markers {
        let mut search_from = 0usize;
        while let Some(rel_pos) = content[search_from..].find(marker) {
            let start = search_from + rel_pos;
            let end = sentence_end(content, start);
            found.push(ProtectedRegion {
                start,
                end,
                region_type,
                marker: marker.to_string(),
            });
            search_from = start + marker.len();
            if search_from >= content.len() {
                break;
            }
        }
    }
    found
}

/// Find the end of the sentence containing `start`: the next `.` at or
/// after `start`, or the end of the text if none exists.
fn sentence_end(content: &str, start: usize) -> usize {
    match content[start..].find('.') {
        Some(rel) => (start + rel + 1).min(content.len()),
        None => content.len(),
    }
}

/// §4.4 "Overlapping regions may be merged." Assumes `regions` is sorted by
/// `start`.
fn merge_overlapping(regions: Vec<ProtectedRegion>) -> Vec<ProtectedRegion> {
    let mut merged: Vec<ProtectedRegion> = Vec::with_capacity(regions.len());
    for region in regions {
        if let Some(last) = merged.last_mut() {
            if region.start <= last.end {
                last.end = last.end.max(region.end);
                continue;
            }
        }
        merged.push(region);
    }
    merged
}

/// §3.1 / §4.4: true if `position` falls inside any protected region.
pub fn position_is_protected(position: usize, regions: &[ProtectedRegion]) -> bool {
    regions.iter().any(|r| position >= r.start && position < r.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_definitions_marker_and_spans_to_sentence_end() {
        let content = "In this Act, \"authority\" means the body established under section 3. Other text follows.";
        let regions = detect_protected_regions(content);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].region_type, ProtectedRegionType::Definitions);
        assert!(regions[0].start < regions[0].end);
        assert!(regions[0].end <= content.len());
    }

    #[test]
    fn detects_proviso_marker() {
        let content = "The fee shall be paid in advance. Provided that no fee is payable by a minor.";
        let regions = detect_protected_regions(content);
        assert!(regions
            .iter()
            .any(|r| r.region_type == ProtectedRegionType::Proviso));
    }

    #[test]
    fn detects_explanation_marker() {
        let content = "Explanation. For the purposes of this section, \"day\" includes a holiday.";
        let regions = detect_protected_regions(content);
        assert!(regions
            .iter()
            .any(|r| r.region_type == ProtectedRegionType::Explanation));
    }

    #[test]
    fn overlapping_regions_merge() {
        let content = "This means the definition. Provided that it overlaps.";
        let regions = detect_protected_regions(content);
        for w in regions.windows(2) {
            assert!(w[1].start > w[0].end || w[0].end >= w[1].start);
        }
    }

    #[test]
    fn position_lookup_matches_detected_span() {
        let content = "Tax means an amount payable under this Act.";
        let regions = detect_protected_regions(content);
        assert!(position_is_protected(5, &regions));
        assert!(!position_is_protected(0, &regions));
    }
}
