//! Act Extractor (C3, §4.3): turns an act-details page's DOM response into
//! title, text-only body, section rows, matrix-resolved tables, and marker
//! frequency counts.
//!
//! Broader-selector retries (requested by the Queue Processor, §4.6/§4.7)
//! change only *where* the DOM reader looked — this module's own logic
//! (text-only, whitespace normalization, marker counting) is identical on
//! every pass; see the GLOSSARY entry for "Broader selectors".

use crate::dom::{DomResponse, RawTableCell, SectionRow};
use crate::types::{MarkerCount, MarkerFrequency};

/// A resolved table cell. Spanned positions are empty strings; no cell is
/// ever shifted relative to its logical column (§8 property 12).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
}

/// A dense `row_count x col_count` table, with every `rowspan`/`colspan`
/// already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub row_count: usize,
    pub col_count: usize,
    pub cells: Vec<Vec<TableCell>>,
}

/// The extractor's output for an act-details page.
#[derive(Debug, Clone)]
pub struct ActExtraction {
    pub title: String,
    pub content_text: String,
    pub section_rows: Vec<SectionRow>,
    pub tables: Vec<ResolvedTable>,
    pub marker_frequency: MarkerFrequency,
}

/// Why an extraction response could not be turned into an `ActExtraction`.
/// The Queue Processor maps this, along with the readiness result, onto the
/// failure taxonomy via `failure::classify` (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActExtractionError {
    Unsuccessful,
    NoContentField,
    EmptyContent,
}

/// Extract an `ActExtraction` from a DOM reader response. Text is taken
/// purely from `response.content` / `section_rows` text content — no HTML
/// is reintroduced anywhere except the caller's own handling of the
/// `schedules.html_content` field (§6.1), which this module never touches.
pub fn extract_act(response: &DomResponse) -> Result<ActExtraction, ActExtractionError> {
    if !response.success {
        return Err(ActExtractionError::Unsuccessful);
    }

    let Some(content) = response.content.as_ref() else {
        return Err(ActExtractionError::NoContentField);
    };

    if content.is_empty() {
        return Err(ActExtractionError::EmptyContent);
    }

    let title = response.title.clone().unwrap_or_default();
    let section_rows = response.section_rows.clone().unwrap_or_default();
    let tables = response
        .tables
        .as_ref()
        .map(|raw_tables| raw_tables.iter().map(|t| resolve_table_matrix(t)).collect())
        .unwrap_or_default();

    let marker_frequency = count_markers(content);

    Ok(ActExtraction {
        title,
        content_text: content.clone(),
        section_rows,
        tables,
        marker_frequency,
    })
}

/// §4.3 "Tables are parsed with a matrix algorithm": a row/col cursor
/// accounts for `rowspan`/`colspan`. Cells are never shifted; spanned
/// positions appear as empty strings in the covered cells.
pub fn resolve_table_matrix(raw_rows: &[crate::dom::RawTableRow]) -> ResolvedTable {
    let row_count = raw_rows.len();
    if row_count == 0 {
        return ResolvedTable {
            row_count: 0,
            col_count: 0,
            cells: Vec::new(),
        };
    }

    // First pass: compute the column count by simulating placement, since a
    // cell's logical column depends on cells spanned down from prior rows.
    let mut occupied: Vec<Vec<bool>> = vec![Vec::new(); row_count];
    let mut col_count = 0usize;

    let mut placements: Vec<(usize, usize, &RawTableCell)> = Vec::new();

    for (row_idx, row) in raw_rows.iter().enumerate() {
        let mut col = 0usize;
        for cell in &row.cells {
            while is_occupied(&occupied, row_idx, col) {
                col += 1;
            }
            mark_occupied(&mut occupied, row_idx, col, cell.rowspan.max(1), cell.colspan.max(1));
            placements.push((row_idx, col, cell));
            col += cell.colspan.max(1);
        }
        col_count = col_count.max(col);
    }

    let mut matrix: Vec<Vec<TableCell>> = (0..row_count)
        .map(|_| {
            (0..col_count)
                .map(|_| TableCell {
                    text: String::new(),
                })
                .collect()
        })
        .collect();

    for (row_idx, col_idx, cell) in placements {
        if row_idx < row_count && col_idx < col_count {
            matrix[row_idx][col_idx] = TableCell {
                text: normalize_cell_whitespace(&cell.text),
            };
        }
    }

    ResolvedTable {
        row_count,
        col_count,
        cells: matrix,
    }
}

fn is_occupied(occupied: &[Vec<bool>], row: usize, col: usize) -> bool {
    occupied
        .get(row)
        .and_then(|r| r.get(col))
        .copied()
        .unwrap_or(false)
}

fn mark_occupied(occupied: &mut [Vec<bool>], row: usize, col: usize, rowspan: usize, colspan: usize) {
    for r in row..(row + rowspan) {
        if let Some(row_vec) = occupied.get_mut(r) {
            if row_vec.len() < col + colspan {
                row_vec.resize(col + colspan, false);
            }
            for c in col..(col + colspan) {
                row_vec[c] = true;
            }
        }
    }
}

/// §4.3: "whitespace inside cells is normalized (runs of whitespace → single
/// space; `NBSP` → space)". This is a table-cell-only normalization,
/// distinct from the NFC normalization of §4.4's `content_normalized`.
fn normalize_cell_whitespace(text: &str) -> String {
    let replaced = text.replace('\u{00A0}', " ");
    let mut normalized = String::with_capacity(replaced.len());
    let mut last_was_space = false;
    for ch in replaced.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                normalized.push(' ');
            }
            last_was_space = true;
        } else {
            normalized.push(ch);
            last_was_space = false;
        }
    }
    normalized.trim().to_string()
}

/// §4.3 `marker_frequency`: raw string occurrence counts of the three legal
/// markers, in both Bengali and English. Explicitly *not* a structural
/// section count (§8 property 2, GLOSSARY "Marker frequency").
fn count_markers(content: &str) -> MarkerFrequency {
    MarkerFrequency {
        section: marker_count(content, &["Section", "section", "ধারা"]),
        chapter: marker_count(content, &["Chapter", "chapter", "অধ্যায়"]),
        schedule: marker_count(content, &["Schedule", "schedule", "তফসিল"]),
    }
}

fn marker_count(content: &str, needles: &[&str]) -> MarkerCount {
    let count = needles
        .iter()
        .map(|needle| content.matches(needle).count())
        .sum();
    MarkerCount {
        count,
        method: "raw_string_frequency".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::RawTableRow;

    fn raw_cell(text: &str, rowspan: usize, colspan: usize) -> RawTableCell {
        RawTableCell {
            text: text.to_string(),
            rowspan,
            colspan,
        }
    }

    #[test]
    fn unsuccessful_response_is_rejected() {
        let response = DomResponse {
            success: false,
            ..Default::default()
        };
        assert_eq!(extract_act(&response), Err(ActExtractionError::Unsuccessful));
    }

    #[test]
    fn missing_content_field_is_rejected() {
        let response = DomResponse {
            success: true,
            content: None,
            ..Default::default()
        };
        assert_eq!(
            extract_act(&response),
            Err(ActExtractionError::NoContentField)
        );
    }

    #[test]
    fn empty_content_is_rejected() {
        let response = DomResponse {
            success: true,
            content: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(extract_act(&response), Err(ActExtractionError::EmptyContent));
    }

    #[test]
    fn marker_frequency_counts_raw_occurrences_in_both_languages() {
        let response = DomResponse {
            success: true,
            content: Some("Section 1. ... Section 2. ধারা ৩। Chapter I.".to_string()),
            title: Some("Test Act".to_string()),
            ..Default::default()
        };
        let extraction = extract_act(&response).unwrap();
        assert_eq!(extraction.marker_frequency.section.count, 3);
        assert_eq!(extraction.marker_frequency.chapter.count, 1);
        assert_eq!(extraction.marker_frequency.schedule.count, 0);
        assert_eq!(
            extraction.marker_frequency.section.method,
            "raw_string_frequency"
        );
    }

    /// §8 property 12: a 2x2 grid with one cell spanning both rows in
    /// column 0 resolves to a dense 2x2 matrix with the spanned position
    /// left empty, and no cell shifted relative to its logical column.
    #[test]
    fn matrix_algorithm_resolves_rowspan_without_shifting_cells() {
        let raw = vec![
            RawTableRow {
                cells: vec![raw_cell("A", 2, 1), raw_cell("B", 1, 1)],
            },
            RawTableRow {
                cells: vec![raw_cell("C", 1, 1)],
            },
        ];

        let table = resolve_table_matrix(&raw);
        assert_eq!(table.row_count, 2);
        assert_eq!(table.col_count, 2);
        assert_eq!(table.cells[0][0].text, "A");
        assert_eq!(table.cells[0][1].text, "B");
        assert_eq!(table.cells[1][0].text, "");
        assert_eq!(table.cells[1][1].text, "C");
    }

    #[test]
    fn matrix_algorithm_resolves_colspan() {
        let raw = vec![
            RawTableRow {
                cells: vec![raw_cell("Header", 1, 2)],
            },
            RawTableRow {
                cells: vec![raw_cell("L", 1, 1), raw_cell("R", 1, 1)],
            },
        ];

        let table = resolve_table_matrix(&raw);
        assert_eq!(table.col_count, 2);
        assert_eq!(table.cells[0][0].text, "Header");
        assert_eq!(table.cells[0][1].text, "");
        assert_eq!(table.cells[1][0].text, "L");
        assert_eq!(table.cells[1][1].text, "R");
    }

    #[test]
    fn cell_whitespace_runs_collapse_and_nbsp_becomes_space() {
        assert_eq!(
            normalize_cell_whitespace("  Taka\u{00A0}\u{00A0}500   only  "),
            "Taka 500 only"
        );
    }

    #[test]
    fn empty_table_resolves_to_empty_matrix() {
        let table = resolve_table_matrix(&[]);
        assert_eq!(table.row_count, 0);
        assert_eq!(table.col_count, 0);
        assert!(table.cells.is_empty());
    }
}
