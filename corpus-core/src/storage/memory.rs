//! In-memory storage backend (§4.8 "a memory backend is required for
//! environments without one"). Data does not survive process restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{incomplete_from_entries, Storage};
use crate::error::Result;
use crate::types::{
    ActRecord, CheckpointState, CorpusManifest, ExtractionReceipt, FailedExtraction,
    ProcessingState, QueueConfig, QueueItem, QueueItemId, WalEntry,
};

/// In-memory implementation of the `Storage` trait, one `HashMap` per kind
/// behind an `RwLock`, matching the per-kind object-store shape the
/// persistent backend also presents (§4.8).
pub struct MemoryStorage {
    queue: RwLock<HashMap<QueueItemId, QueueItem>>,
    acts: RwLock<HashMap<String, ActRecord>>,
    failed: RwLock<HashMap<String, FailedExtraction>>,
    manifest: RwLock<CorpusManifest>,
    wal: RwLock<Vec<WalEntry>>,
    receipts: RwLock<Vec<ExtractionReceipt>>,
    processing_state: RwLock<Option<ProcessingState>>,
    queue_config: RwLock<QueueConfig>,
    checkpoint_state: RwLock<CheckpointState>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            queue: RwLock::new(HashMap::new()),
            acts: RwLock::new(HashMap::new()),
            failed: RwLock::new(HashMap::new()),
            manifest: RwLock::new(CorpusManifest::default()),
            wal: RwLock::new(Vec::new()),
            receipts: RwLock::new(Vec::new()),
            processing_state: RwLock::new(None),
            queue_config: RwLock::new(QueueConfig::default()),
            checkpoint_state: RwLock::new(CheckpointState {
                acts_since_export: 0,
                threshold: crate::config::CHECKPOINT_THRESHOLD_DEFAULT,
            }),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn enqueue(&self, item: QueueItem) -> Result<()> {
        self.queue.write().unwrap().insert(item.id.clone(), item);
        Ok(())
    }

    async fn get_queue(&self) -> Result<Vec<QueueItem>> {
        let mut items: Vec<QueueItem> = self.queue.read().unwrap().values().cloned().collect();
        items.sort_by_key(|i| i.added_at);
        Ok(items)
    }

    async fn update_queue_item(&self, item: QueueItem) -> Result<()> {
        self.queue.write().unwrap().insert(item.id.clone(), item);
        Ok(())
    }

    async fn remove_queue_item(&self, id: &QueueItemId) -> Result<()> {
        self.queue.write().unwrap().remove(id);
        Ok(())
    }

    async fn queue_contains_internal_id(&self, internal_id: &str) -> Result<bool> {
        Ok(self
            .queue
            .read()
            .unwrap()
            .values()
            .any(|i| i.internal_id == internal_id))
    }

    async fn store_act(&self, act: ActRecord) -> Result<()> {
        self.acts.write().unwrap().insert(act.internal_id.clone(), act);
        Ok(())
    }

    async fn get_act(&self, internal_id: &str) -> Result<Option<ActRecord>> {
        Ok(self.acts.read().unwrap().get(internal_id).cloned())
    }

    async fn list_acts(&self) -> Result<Vec<ActRecord>> {
        Ok(self.acts.read().unwrap().values().cloned().collect())
    }

    async fn captured_contains_internal_id(&self, internal_id: &str) -> Result<bool> {
        Ok(self.acts.read().unwrap().contains_key(internal_id))
    }

    async fn store_failed_extraction(&self, failed: FailedExtraction) -> Result<()> {
        self.failed
            .write()
            .unwrap()
            .insert(failed.act_id.clone(), failed);
        Ok(())
    }

    async fn get_failed_extractions(&self) -> Result<Vec<FailedExtraction>> {
        Ok(self.failed.read().unwrap().values().cloned().collect())
    }

    async fn remove_failed_extraction(&self, act_id: &str) -> Result<()> {
        self.failed.write().unwrap().remove(act_id);
        Ok(())
    }

    async fn get_manifest(&self) -> Result<CorpusManifest> {
        Ok(self.manifest.read().unwrap().clone())
    }

    async fn store_manifest(&self, manifest: CorpusManifest) -> Result<()> {
        *self.manifest.write().unwrap() = manifest;
        Ok(())
    }

    async fn wal_append(&self, entry: WalEntry) -> Result<()> {
        self.wal.write().unwrap().push(entry);
        Ok(())
    }

    async fn wal_entries_for_session(&self, session_id: &str) -> Result<Vec<WalEntry>> {
        Ok(self
            .wal
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn get_incomplete_extractions(&self, session_id: &str) -> Result<Vec<String>> {
        let entries = self.wal_entries_for_session(session_id).await?;
        Ok(incomplete_from_entries(&entries))
    }

    async fn store_extraction_receipt(&self, receipt: ExtractionReceipt) -> Result<()> {
        self.receipts.write().unwrap().push(receipt);
        Ok(())
    }

    async fn list_extraction_receipts(&self) -> Result<Vec<ExtractionReceipt>> {
        Ok(self.receipts.read().unwrap().clone())
    }

    async fn store_processing_state(&self, state: ProcessingState) -> Result<()> {
        *self.processing_state.write().unwrap() = Some(state);
        Ok(())
    }

    async fn get_processing_state(&self) -> Result<Option<ProcessingState>> {
        Ok(self.processing_state.read().unwrap().clone())
    }

    async fn clear_processing_state(&self) -> Result<()> {
        *self.processing_state.write().unwrap() = None;
        Ok(())
    }

    async fn get_queue_config(&self) -> Result<QueueConfig> {
        Ok(*self.queue_config.read().unwrap())
    }

    async fn store_queue_config(&self, config: QueueConfig) -> Result<()> {
        *self.queue_config.write().unwrap() = config.clamped();
        Ok(())
    }

    async fn get_checkpoint_state(&self) -> Result<CheckpointState> {
        Ok(*self.checkpoint_state.read().unwrap())
    }

    async fn store_checkpoint_state(&self, state: CheckpointState) -> Result<()> {
        *self.checkpoint_state.write().unwrap() = state;
        Ok(())
    }
}
