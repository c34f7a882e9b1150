//! Storage Layer (C8, §4.8): the durable persistence boundary.
//!
//! A persistent structured backend (SQLite, `sqlite.rs`) is preferred; an
//! in-memory backend (`memory.rs`) is required for environments without
//! one. Both present the same `Storage` trait so the rest of the pipeline
//! never depends on which is in use (§4.8 "Durability backends").
//!
//! The queue, failed-extractions list, captured acts list, manifest, and
//! WAL are exclusively owned by this layer (§3.2, §5) — every other
//! component mutates them only through the operations here.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ActRecord, CheckpointState, CorpusManifest, ExtractionReceipt, FailedExtraction,
    ProcessingState, QueueConfig, QueueItem, QueueItemId, WalEntry,
};

/// The persistence boundary for the whole pipeline.
#[async_trait]
pub trait Storage: Send + Sync {
    // Queue
    async fn enqueue(&self, item: QueueItem) -> Result<()>;
    async fn get_queue(&self) -> Result<Vec<QueueItem>>;
    async fn update_queue_item(&self, item: QueueItem) -> Result<()>;
    async fn remove_queue_item(&self, id: &QueueItemId) -> Result<()>;
    async fn queue_contains_internal_id(&self, internal_id: &str) -> Result<bool>;

    // Captured acts
    async fn store_act(&self, act: ActRecord) -> Result<()>;
    async fn get_act(&self, internal_id: &str) -> Result<Option<ActRecord>>;
    async fn list_acts(&self) -> Result<Vec<ActRecord>>;
    async fn captured_contains_internal_id(&self, internal_id: &str) -> Result<bool>;

    // Failed extractions
    async fn store_failed_extraction(&self, failed: FailedExtraction) -> Result<()>;
    async fn get_failed_extractions(&self) -> Result<Vec<FailedExtraction>>;
    async fn remove_failed_extraction(&self, act_id: &str) -> Result<()>;

    // Manifest
    async fn get_manifest(&self) -> Result<CorpusManifest>;
    async fn store_manifest(&self, manifest: CorpusManifest) -> Result<()>;

    // Write-ahead log
    async fn wal_append(&self, entry: WalEntry) -> Result<()>;
    async fn wal_entries_for_session(&self, session_id: &str) -> Result<Vec<WalEntry>>;
    /// §4.8 contract 2: acts with an `intent` but no matching `complete` in
    /// the same session.
    async fn get_incomplete_extractions(&self, session_id: &str) -> Result<Vec<String>>;

    // Extraction receipts (§4.8 contract 3, retained across sessions)
    async fn store_extraction_receipt(&self, receipt: ExtractionReceipt) -> Result<()>;
    async fn list_extraction_receipts(&self) -> Result<Vec<ExtractionReceipt>>;

    // Processing-state interruption record (§4.6)
    async fn store_processing_state(&self, state: ProcessingState) -> Result<()>;
    async fn get_processing_state(&self) -> Result<Option<ProcessingState>>;
    async fn clear_processing_state(&self) -> Result<()>;

    // Queue config and checkpoint state
    async fn get_queue_config(&self) -> Result<QueueConfig>;
    async fn store_queue_config(&self, config: QueueConfig) -> Result<()>;
    async fn get_checkpoint_state(&self) -> Result<CheckpointState>;
    async fn store_checkpoint_state(&self, state: CheckpointState) -> Result<()>;
}

/// Derive the set of act ids with an `intent` entry but no `complete` entry
/// in the same session. Shared by both backends so the §4.8 contract is
/// implemented identically regardless of storage medium.
pub(crate) fn incomplete_from_entries(entries: &[WalEntry]) -> Vec<String> {
    use crate::types::WalEntryType;
    use std::collections::HashSet;

    let completed: HashSet<&str> = entries
        .iter()
        .filter(|e| e.entry_type == WalEntryType::Complete)
        .map(|e| e.act_id.as_str())
        .collect();

    let mut incomplete: Vec<String> = entries
        .iter()
        .filter(|e| e.entry_type == WalEntryType::Intent && !completed.contains(e.act_id.as_str()))
        .map(|e| e.act_id.clone())
        .collect();
    incomplete.sort();
    incomplete.dedup();
    incomplete
}
