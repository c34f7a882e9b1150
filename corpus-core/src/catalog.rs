//! Catalog Extractor (C2, §4.2): maps the DOM reader's structural row list
//! for a volume/index page into an ordered sequence of `CatalogEntry`.
//!
//! This module never touches HTML or a live DOM directly — see
//! `dom::CatalogRow`, the §6.2 boundary the host-side DOM reader already
//! reduces a page down to.

use crate::classifier::{extract_internal_id, normalize_url};
use crate::dom::CatalogRow;
use crate::types::CatalogEntry;

/// A structural parse warning for a row that could not be mapped to a
/// `CatalogEntry`. Not a failure: an empty table is an empty sequence, not
/// an error (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogWarning {
    pub row_index: usize,
    pub reason: String,
}

/// Extract the ordered list of catalog entries from a volume/index page's
/// row list, preserving `row_index` and normalizing URLs against the fixed
/// base. Malformed rows are skipped and reported as warnings rather than
/// failing the whole extraction.
pub fn extract_catalog(rows: &[CatalogRow]) -> (Vec<CatalogEntry>, Vec<CatalogWarning>) {
    let mut entries = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        match build_entry(row, row_index) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warnings.push(CatalogWarning { row_index, reason }),
        }
    }

    (entries, warnings)
}

fn build_entry(row: &CatalogRow, row_index: usize) -> Result<CatalogEntry, String> {
    let title = row.title.trim();
    if title.is_empty() {
        return Err("row has no anchor title".to_string());
    }

    let href = row.href.trim();
    if href.is_empty() {
        return Err("row anchor has no href".to_string());
    }

    let url = normalize_url(href);
    let internal_id = extract_internal_id(&url)
        .ok_or_else(|| format!("href does not match act(-details)?-<digits>.html: {href}"))?;

    Ok(CatalogEntry {
        internal_id,
        title: title.to_string(),
        year: row.act_number_cell.as_ref().and_then(|c| extract_year(c)),
        url,
        row_index,
    })
}

/// The adjacent cell's text sometimes carries a trailing year in
/// parentheses, e.g. "Act No. 14 of 1973". Extract it if present; absence
/// is not an error (`year` is optional on `CatalogEntry`).
fn extract_year(cell_text: &str) -> Option<String> {
    let digits: String = cell_text
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let year: String = digits.chars().rev().collect();
    if year.len() == 4 {
        Some(year)
    } else {
        None
    }
}
