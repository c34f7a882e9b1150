//! Extractor-facing interface (§6.2): the boundary this crate consumes from
//! the in-browser DOM reader. The DOM reader itself is out of scope — it
//! lives in the browser extension's content-script half — so this module is
//! only the request/response contract and the trait the Queue Processor and
//! Catalog/Act Extractors are written against.
//!
//! Response payloads carry more fields than this crate consumes (`sections`,
//! `structured_sections`, `amendments` on the wire); only the fields named
//! in §6.2 are read here, the rest are ignored on purpose.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::SelectorStrategy;

/// One row of a volume/index page's catalog table, already reduced by the
/// DOM reader to the structural fields C2 needs (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub title: String,
    pub href: String,
    pub act_number_cell: Option<String>,
}

/// `extractIndex{indexType}` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Chronological,
    Alphabetical,
    Range,
}

/// A raw table cell as the DOM reader hands it over: verbatim text plus the
/// `rowspan`/`colspan` attributes the matrix algorithm in `act_extractor`
/// needs to place it. Resolving spans into a dense matrix is this crate's
/// job (§4.3), not the DOM reader's — the reader only reports structural
/// hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableCell {
    pub text: String,
    pub rowspan: usize,
    pub colspan: usize,
}

/// A raw table row: an ordered sequence of cells, pre-span-resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableRow {
    pub cells: Vec<RawTableCell>,
}

/// One raw table, as a sequence of rows.
pub type RawTable = Vec<RawTableRow>;

/// One row of an act's body: a heading cell and a body cell, both verbatim
/// (§4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub heading: String,
    pub body: String,
    pub has_table: bool,
}

/// The response carried back for any of the three request messages.
/// Only the fields named in §6.2 are consumed by this crate; everything
/// else on the wire (`structured_sections`, `amendments`, …) is dropped at
/// the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomResponse {
    pub success: bool,
    pub title: Option<String>,
    pub content: Option<String>,
    pub section_rows: Option<Vec<SectionRow>>,
    pub tables: Option<Vec<RawTable>>,
    pub acts: Option<Vec<CatalogRow>>,
    pub selector_strategy_used: Option<SelectorStrategy>,
    pub error: Option<String>,
}

/// A request for broader-selector extraction (§4.3 "Broader selector
/// retry"): only changes *where* content is read from.
#[derive(Debug, Clone, Default)]
pub struct ExtractActOptions {
    pub use_broader_selectors: bool,
    pub broader_selectors: Option<Vec<String>>,
}

/// The three request messages a DOM reader must answer (§6.2). Implemented
/// by the host integration; a file-backed fixture reader and mocks for
/// tests live in `testing.rs`.
#[async_trait]
pub trait DomReader: Send + Sync {
    async fn extract_volume(&self) -> DomResponse;
    async fn extract_index(&self, index_type: IndexType) -> DomResponse;
    async fn extract_act(&self, options: ExtractActOptions) -> DomResponse;
}
