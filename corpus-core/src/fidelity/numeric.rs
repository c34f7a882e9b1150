//! Numeric-sensitive region detection (§4.4): currency tokens, percentages,
//! tabular numeric lists, and rate expressions. Same enforcement as
//! protected regions — corrections here are flagged but never applied.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{NumericRegion, NumericRegionType};

fn currency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:Tk\.?|টাকা|৳|Rs\.?|\$)\s?[0-9,]+(?:\.[0-9]+)?").unwrap()
    })
}

fn percentage_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?\s?(?:%|per\s?cent|শতাংশ)").unwrap())
}

fn rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)rate of [0-9]+(?:\.[0-9]+)?|per annum|প্রতি বছর").unwrap())
}

fn tabular_numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A line carrying three or more distinct numeric tokens, as a heuristic
    // for a tabular numeric list rendered as plain text.
    RE.get_or_init(|| {
        Regex::new(r"(?:[0-9]+(?:\.[0-9]+)?[ \t]+){2,}[0-9]+(?:\.[0-9]+)?").unwrap()
    })
}

/// Detect numeric-sensitive regions in `content`. Regions from different
/// detectors are not merged (they already carry distinct `type`s, unlike
/// protected regions), but directly overlapping matches from the same
/// detector never occur since `find_iter` yields non-overlapping matches.
pub fn detect_numeric_regions(content: &str) -> Vec<NumericRegion> {
    let mut regions = Vec::new();

    for m in currency_regex().find_iter(content) {
        regions.push(NumericRegion {
            start: m.start(),
            end: m.end(),
            region_type: NumericRegionType::Currency,
        });
    }
    for m in percentage_regex().find_iter(content) {
        regions.push(NumericRegion {
            start: m.start(),
            end: m.end(),
            region_type: NumericRegionType::Percentage,
        });
    }
    for m in rate_regex().find_iter(content) {
        regions.push(NumericRegion {
            start: m.start(),
            end: m.end(),
            region_type: NumericRegionType::Rate,
        });
    }
    for m in tabular_numeric_regex().find_iter(content) {
        regions.push(NumericRegion {
            start: m.start(),
            end: m.end(),
            region_type: NumericRegionType::TabularNumericList,
        });
    }

    regions.sort_by_key(|r| r.start);
    regions
}

/// §3.1 / §4.4: true if `position` falls inside any numeric region.
pub fn position_is_numeric(position: usize, regions: &[NumericRegion]) -> bool {
    regions.iter().any(|r| position >= r.start && position < r.end)
}
