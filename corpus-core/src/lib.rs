//! `corpus-core`: the extraction/retry/persistence pipeline for a single
//! statutory corpus source, driven entirely through the two boundary
//! traits in [`dom`] and [`host`]. This crate performs no navigation and no
//! HTML parsing of its own — both are supplied by an embedder (a browser
//! extension background script, or the `corpus-cli` fixture harness).
//!
//! Component map:
//! - [`classifier`] — page classification and URL normalization (C1)
//! - [`catalog`] — catalog row → `CatalogEntry` mapping, queue enqueueing (C2)
//! - [`act_extractor`] — act content/table extraction (C3)
//! - [`fidelity`] — the three-version content model and its provenance (C4)
//! - [`readiness`] — DOM readiness polling policy (C5)
//! - [`queue`] — the main processing loop and retry sub-loop (C6)
//! - [`failure`] — failure classification and backoff (C7)
//! - [`storage`] — the persistence boundary and its two backends (C8)
//! - [`manifest`] — duplicate detection and corpus statistics (C9)
//! - [`export`] — per-act, failed-act, and batch corpus export (C10)

pub mod act_extractor;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod failure;
pub mod fidelity;
pub mod host;
pub mod manifest;
pub mod queue;
pub mod readiness;
pub mod storage;
pub mod testing;
pub mod types;

pub use error::{CorpusError, ExportError, ReadinessError, Result, StorageError};
