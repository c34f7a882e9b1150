//! Queue Processor (C6, §4.6): drives pending items through
//! navigate → wait → extract → validate → persist, with delay pacing and
//! selector-mismatch retries.
//!
//! Single-threaded cooperative scheduling (§5): this processor never
//! dispatches two navigations concurrently, and yields only at the three
//! suspension points the spec names — after navigation, inside the
//! readiness poll, and during the extraction delay — plus a fourth during
//! retry backoff.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use unicode_normalization::UnicodeNormalization;

use crate::act_extractor::{self};
use crate::dom::{DomReader, DomResponse, ExtractActOptions};
use crate::error::{CorpusError, Result};
use crate::failure;
use crate::fidelity::{self, FidelityResult};
use crate::host::Host;
use crate::manifest::{self, DuplicateDecision};
use crate::readiness;
use crate::storage::Storage;
use crate::types::{
    ActRecord, Attempt, AttemptOutcome, CatalogEntry, DataQuality, ExtractionReceipt,
    ExtractionRisk, FailedExtraction, FailureReason, ManifestEntry, MonotoneIdGenerator,
    ProcessingState, QueueConfig, QueueItem, QueueStatus, Schedules, SelectorStrategy, WalEntry,
    WalEntryType,
};

/// §8 property 3 / scenario S1: outcome of adding a catalog page's entries
/// to the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddActsResult {
    pub added: usize,
    pub skipped_in_queue: usize,
    pub skipped_captured: usize,
}

/// Add each catalog entry to the queue, rejecting anything whose
/// `internal_id` is already present in the live queue or the captured-acts
/// store (§8 property 3: the queue contains no duplicates). Checked against
/// both stores before any item is enqueued, so a run never partially
/// enqueues an entry it would also report as skipped.
pub async fn add_acts_to_queue(
    storage: &dyn Storage,
    id_gen: &MonotoneIdGenerator,
    entries: &[CatalogEntry],
    added_at: chrono::DateTime<Utc>,
) -> Result<AddActsResult> {
    let mut result = AddActsResult::default();

    for entry in entries {
        if storage.queue_contains_internal_id(&entry.internal_id).await? {
            result.skipped_in_queue += 1;
            continue;
        }
        if storage.captured_contains_internal_id(&entry.internal_id).await? {
            result.skipped_captured += 1;
            continue;
        }

        let item = QueueItem::new(
            id_gen.next_id(),
            entry.internal_id.clone(),
            entry.title.clone(),
            entry.url.clone(),
            None,
            added_at,
        );
        storage.enqueue(item).await?;
        result.added += 1;
    }

    Ok(result)
}

/// Tallies one `run()` call's outcome, for the UI counters named in §4.6
/// step 6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub errored: usize,
    pub retried: usize,
    pub duplicates_blocked: usize,
}

/// Whether a successful extraction was actually persisted, or blocked by
/// the language-aware duplicate policy (§4.9) — not a failure, but not a
/// new record either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistOutcome {
    Stored,
    Blocked(&'static str),
}

pub struct QueueProcessor {
    storage: Arc<dyn Storage>,
    host: Arc<dyn Host>,
    dom: Arc<dyn DomReader>,
    session_id: String,
}

impl QueueProcessor {
    pub fn new(
        storage: Arc<dyn Storage>,
        host: Arc<dyn Host>,
        dom: Arc<dyn DomReader>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            host,
            dom,
            session_id: session_id.into(),
        }
    }

    /// §4.6 "Interruption and resumption": on startup, return items stuck
    /// in `processing` to `pending` and report the interrupted record (if
    /// any) so the caller can offer the UI a resume action. Does not clear
    /// the record — that happens on the next normal completion.
    pub async fn recover_interrupted_processing(&self) -> Result<Option<ProcessingState>> {
        let Some(state) = self.storage.get_processing_state().await? else {
            return Ok(None);
        };

        for id in &state.pending_item_ids {
            if let Some(mut item) = self
                .storage
                .get_queue()
                .await?
                .into_iter()
                .find(|i| &i.id == id)
            {
                if item.status == QueueStatus::Processing {
                    item.status = QueueStatus::Pending;
                    self.storage.update_queue_item(item).await?;
                }
            }
        }

        tracing::warn!(
            items = state.pending_item_ids.len(),
            "recovered processing-state record from a prior interrupted session"
        );
        Ok(Some(state))
    }

    /// Run the full §4.6 main loop followed by the §4.7 retry sub-loop, then
    /// remove completed items from the queue.
    pub async fn run(&self, config: &QueueConfig, cancellation: &CancellationToken) -> Result<RunSummary> {
        let pending: Vec<QueueItem> = self
            .storage
            .get_queue()
            .await?
            .into_iter()
            .filter(|i| i.status == QueueStatus::Pending)
            .collect();

        self.storage
            .store_processing_state(ProcessingState {
                pending_item_ids: pending.iter().map(|i| i.id.clone()).collect(),
                started_at: Utc::now(),
            })
            .await?;

        let mut summary = RunSummary::default();

        for mut item in pending {
            if cancellation.is_cancelled() {
                break;
            }

            item.status = QueueStatus::Processing;
            self.storage.update_queue_item(item.clone()).await?;

            tracing::info!(internal_id = %item.internal_id, url = %item.url, "processing queue item");

            if self.host.navigate(&item.url).await.is_err() {
                self.fail_item(&mut item, FailureReason::NetworkError, config.max_retry_attempts)
                    .await?;
                summary.errored += 1;
                continue;
            }

            if cancellation.is_cancelled() {
                break;
            }

            let readiness_result = readiness::wait_for_readiness(
                self.host.as_ref(),
                config.dom_readiness_timeout_ms,
                config.minimum_content_threshold,
                cancellation,
            )
            .await;

            if let Err(reason) = readiness_result {
                self.fail_item(&mut item, reason, config.max_retry_attempts).await?;
                summary.errored += 1;
                continue;
            }

            if cancellation.is_cancelled() {
                break;
            }

            // §4.6 step 4: pacing only applies once a real extraction will
            // follow — never on the navigation or readiness-failure paths.
            tokio::time::sleep(tokio::time::Duration::from_millis(config.extraction_delay_ms)).await;

            if cancellation.is_cancelled() {
                break;
            }

            self.storage
                .wal_append(WalEntry {
                    entry_id: format!("{}-intent-{}", item.internal_id, Utc::now().timestamp_micros()),
                    session_id: self.session_id.clone(),
                    act_id: item.internal_id.clone(),
                    entry_type: WalEntryType::Intent,
                    timestamp: Utc::now(),
                    content_hash: None,
                    pruned: false,
                })
                .await?;

            let response = self.dom.extract_act(ExtractActOptions::default()).await;

            match failure::classify_extraction_result(&response, None, config.minimum_content_threshold) {
                Ok(()) => {
                    let outcome = self
                        .persist_successful_extraction(
                            &item.internal_id,
                            &item.internal_id,
                            &item.title,
                            &item.url,
                            item.volume_number.as_deref().unwrap_or("unknown"),
                            &response,
                        )
                        .await;

                    match outcome {
                        Ok(PersistOutcome::Stored) => {
                            item.status = QueueStatus::Completed;
                            summary.completed += 1;
                        }
                        Ok(PersistOutcome::Blocked(_)) => {
                            item.status = QueueStatus::Completed;
                            summary.duplicates_blocked += 1;
                        }
                        Err(_) => {
                            self.fail_item(&mut item, FailureReason::ExtractionError, config.max_retry_attempts)
                                .await?;
                            summary.errored += 1;
                            continue;
                        }
                    }
                }
                Err(reason) => {
                    self.fail_item(&mut item, reason, config.max_retry_attempts).await?;
                    summary.errored += 1;
                    continue;
                }
            }

            self.storage.update_queue_item(item).await?;
        }

        let retry_summary = self.run_retry_subloop(config, cancellation).await?;
        summary.retried += retry_summary.retried;
        summary.completed += retry_summary.completed;

        let queue = self.storage.get_queue().await?;
        for item in queue.into_iter().filter(|i| i.status == QueueStatus::Completed) {
            self.storage.remove_queue_item(&item.id).await?;
        }

        self.storage.clear_processing_state().await?;
        Ok(summary)
    }

    async fn fail_item(&self, item: &mut QueueItem, reason: FailureReason, max_retries: u32) -> Result<()> {
        let mut failed = FailedExtraction::new(
            item.internal_id.clone(),
            item.internal_id.clone(),
            item.url.clone(),
            item.title.clone(),
            reason,
            max_retries,
            Utc::now(),
        );
        failed.record_attempt(Attempt {
            attempt_number: 1,
            timestamp: Utc::now(),
            reason,
            outcome: AttemptOutcome::Failure,
            selector_strategy: SelectorStrategy::Standard,
        });
        tracing::warn!(internal_id = %item.internal_id, reason = ?reason, "extraction attempt failed");
        self.storage.store_failed_extraction(failed).await?;
        item.status = QueueStatus::Error;
        self.storage.update_queue_item(item.clone()).await?;
        Ok(())
    }

    /// §4.7 "Retry sub-loop": failed items are processed in the order they
    /// first failed (§5 ordering guarantee).
    async fn run_retry_subloop(&self, config: &QueueConfig, cancellation: &CancellationToken) -> Result<RunSummary> {
        let mut failed_entries = self.storage.get_failed_extractions().await?;
        failed_entries.sort_by_key(|f| f.failed_at);

        let mut summary = RunSummary::default();

        for mut failed in failed_entries {
            if cancellation.is_cancelled() {
                break;
            }
            if !failed.should_retry() {
                continue;
            }

            let attempt_number = failed.retry_count + 1;
            let backoff_ms = failure::compute_backoff_ms(config.retry_base_delay_ms, attempt_number);
            tracing::info!(act_id = %failed.act_id, attempt_number, backoff_ms, "retrying after backoff");
            tokio::time::sleep(tokio::time::Duration::from_millis(backoff_ms)).await;

            if cancellation.is_cancelled() {
                break;
            }

            let _ = self.host.navigate(&failed.url).await;
            let readiness_result = readiness::wait_for_readiness(
                self.host.as_ref(),
                config.dom_readiness_timeout_ms,
                config.minimum_content_threshold,
                cancellation,
            )
            .await;

            tokio::time::sleep(tokio::time::Duration::from_millis(config.extraction_delay_ms)).await;

            if cancellation.is_cancelled() {
                break;
            }

            self.storage
                .wal_append(WalEntry {
                    entry_id: format!("{}-intent-{}", failed.act_id, Utc::now().timestamp_micros()),
                    session_id: self.session_id.clone(),
                    act_id: failed.act_id.clone(),
                    entry_type: WalEntryType::Intent,
                    timestamp: Utc::now(),
                    content_hash: None,
                    pruned: false,
                })
                .await?;

            let readiness_reason = readiness_result.err();
            let response = self.dom.extract_act(failure::broader_selector_options()).await;
            let classification =
                failure::classify_extraction_result(&response, readiness_reason, config.minimum_content_threshold);

            match classification {
                Ok(()) => {
                    let outcome = self
                        .persist_successful_extraction(
                            &failed.act_id,
                            &failed.internal_id,
                            &failed.title,
                            &failed.url,
                            "unknown",
                            &response,
                        )
                        .await;

                    match outcome {
                        Ok(_) => {
                            self.storage.remove_failed_extraction(&failed.act_id).await?;
                            summary.completed += 1;
                            summary.retried += 1;
                        }
                        Err(_) => {
                            self.record_retry_attempt(&mut failed, attempt_number, FailureReason::ExtractionError)
                                .await?;
                            summary.retried += 1;
                        }
                    }
                }
                Err(reason) => {
                    self.record_retry_attempt(&mut failed, attempt_number, reason).await?;
                    summary.retried += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn record_retry_attempt(
        &self,
        failed: &mut FailedExtraction,
        attempt_number: u32,
        reason: FailureReason,
    ) -> Result<()> {
        failed.record_attempt(Attempt {
            attempt_number,
            timestamp: Utc::now(),
            reason,
            outcome: AttemptOutcome::Failure,
            selector_strategy: SelectorStrategy::BroaderSelectors,
        });
        if failed.max_retries_reached() {
            tracing::warn!(act_id = %failed.act_id, "max retries reached; failure is now permanent");
        }
        self.storage.store_failed_extraction(failed.clone()).await?;
        Ok(())
    }

    /// §4.8 "persist via storage": build the `ActRecord`, enforce the §4.9
    /// duplicate policy, write the WAL `complete` entry and extraction
    /// receipt, update the manifest, and advance the checkpoint counter.
    async fn persist_successful_extraction(
        &self,
        act_id: &str,
        internal_id: &str,
        title: &str,
        url: &str,
        volume_number: &str,
        response: &DomResponse,
    ) -> Result<PersistOutcome> {
        let extraction = act_extractor::extract_act(response)
            .map_err(|_| CorpusError::Validation { reason: "act_extraction_failed".to_string() })?;

        let captured_at = Utc::now();
        let fidelity_result = fidelity::build(&extraction.content_text, captured_at);

        let existing_manifest = self.storage.get_manifest().await?;
        let decision = manifest::check_duplicate(&existing_manifest, internal_id, fidelity_result.content_language);

        match decision {
            DuplicateDecision::BlockedSameLanguage => {
                tracing::warn!(internal_id, "duplicate_same_language_blocked");
                return Ok(PersistOutcome::Blocked("duplicate_same_language"));
            }
            DuplicateDecision::BlockedBengaliPreferred => {
                tracing::warn!(internal_id, "bengali_preferred_english_blocked");
                return Ok(PersistOutcome::Blocked("bengali_preferred_english_blocked"));
            }
            DuplicateDecision::NotDuplicate | DuplicateDecision::ReplaceExisting => {}
        }

        let act_record = build_act_record(
            internal_id,
            title,
            url,
            volume_number,
            &extraction,
            &fidelity_result,
            captured_at,
        );

        self.storage.store_act(act_record.clone()).await?;

        self.storage
            .wal_append(WalEntry {
                entry_id: format!("{act_id}-complete"),
                session_id: self.session_id.clone(),
                act_id: act_id.to_string(),
                entry_type: WalEntryType::Complete,
                timestamp: captured_at,
                content_hash: Some(act_record.content_raw_sha256.clone()),
                pruned: false,
            })
            .await?;

        self.storage
            .store_extraction_receipt(ExtractionReceipt {
                act_id: act_id.to_string(),
                session_id: self.session_id.clone(),
                content_hash: act_record.content_raw_sha256.clone(),
                completed_at: captured_at,
            })
            .await?;

        let manifest_entry = ManifestEntry {
            internal_id: internal_id.to_string(),
            title: act_record.title_raw.clone(),
            volume_number: volume_number.to_string(),
            capture_timestamp: captured_at,
            content_hash: act_record.content_raw_sha256.clone(),
            content_language: fidelity_result.content_language,
            cross_reference_count: act_record.lexical_references.len(),
        };

        let archive_reason = matches!(decision, DuplicateDecision::ReplaceExisting)
            .then_some("bengali_preferred_replacement");

        let mut manifest = existing_manifest;
        manifest::upsert_manifest_entry(&mut manifest, manifest_entry, archive_reason, captured_at);

        let all_acts = self.storage.list_acts().await?;
        let all_refs: Vec<_> = all_acts.iter().flat_map(|a| a.lexical_references.clone()).collect();
        manifest.cross_reference_coverage = manifest::compute_cross_reference_coverage(&manifest, &all_refs);

        self.storage.store_manifest(manifest).await?;

        let mut checkpoint = self.storage.get_checkpoint_state().await?;
        checkpoint.acts_since_export = checkpoint.acts_since_export.saturating_add(1);
        let should_export = checkpoint.acts_since_export >= checkpoint.threshold;
        self.storage.store_checkpoint_state(checkpoint).await?;
        if should_export {
            tracing::info!(threshold = checkpoint.threshold, "checkpoint threshold reached, export recommended");
        }

        Ok(PersistOutcome::Stored)
    }
}

/// Map a validated `ActExtraction` + `FidelityResult` onto the persisted
/// `ActRecord` shape. `export.rs` maps this in turn onto the exact §6.1
/// JSON schema.
fn build_act_record(
    internal_id: &str,
    fallback_title: &str,
    url: &str,
    volume_number: &str,
    extraction: &act_extractor::ActExtraction,
    fidelity_result: &FidelityResult,
    captured_at: chrono::DateTime<Utc>,
) -> ActRecord {
    let title_raw = if extraction.title.is_empty() {
        fallback_title.to_string()
    } else {
        extraction.title.clone()
    };
    let title_normalized: String = title_raw.nfc().collect();

    let schedules = if extraction.tables.is_empty() {
        Schedules {
            representation: "text".to_string(),
            extraction_method: "text_only".to_string(),
            processed: false,
            html_content: None,
        }
    } else {
        Schedules {
            representation: "table".to_string(),
            extraction_method: "matrix_algorithm".to_string(),
            processed: true,
            html_content: None,
        }
    };

    let mut numeric_representation: Vec<String> = fidelity_result
        .numeric_regions
        .iter()
        .map(|r| format!("{:?}", r.region_type).to_lowercase())
        .collect();
    numeric_representation.sort();
    numeric_representation.dedup();

    ActRecord {
        internal_id: internal_id.to_string(),
        title_raw,
        title_normalized,
        content_raw: fidelity_result.content_raw.clone(),
        content_normalized: fidelity_result.content_normalized.clone(),
        content_corrected: fidelity_result.content_corrected.clone(),
        content_raw_sha256: fidelity_result.content_raw_sha256.clone(),
        url: url.to_string(),
        volume_number: volume_number.to_string(),
        content_language: fidelity_result.content_language,
        transformation_log: fidelity_result.transformation_log.clone(),
        protected_sections: fidelity_result.protected_sections.clone(),
        numeric_regions: fidelity_result.numeric_regions.clone(),
        lexical_references: fidelity_result.lexical_references.clone(),
        data_quality: build_data_quality(fidelity_result),
        legal_status: "as_published".to_string(),
        temporal_status: "point_in_time_capture".to_string(),
        temporal_disclaimer:
            "captured at a point in time; legal status may have changed since capture and is not re-verified"
                .to_string(),
        schedules,
        extraction_risk: ExtractionRisk {
            possible_truncation: false,
            reason: None,
        },
        numeric_representation,
        language_distribution: fidelity_result.language_distribution.clone(),
        editorial_content_present: fidelity_result.editorial_content_present,
        source_authority: crate::classifier::ALLOWED_HOST.to_string(),
        authority_rank: "primary_source".to_string(),
        marker_frequency: extraction.marker_frequency.clone(),
        captured_at,
    }
}

fn build_data_quality(fidelity_result: &FidelityResult) -> DataQuality {
    let mut flags = Vec::new();
    if fidelity_result.editorial_content_present {
        flags.push("editorial_content_present".to_string());
    }
    if !fidelity_result.protected_sections.is_empty() {
        flags.push("contains_protected_sections".to_string());
    }
    if !fidelity_result.numeric_regions.is_empty() {
        flags.push("contains_numeric_sensitive_regions".to_string());
    }

    let unapplied_potential_semantic = fidelity_result
        .transformation_log
        .iter()
        .filter(|e| !e.applied && e.risk_level == crate::types::RiskLevel::PotentialSemantic)
        .count();

    let mut ml_risk_factors = vec![
        "lexical_references are pattern-matched citations, not verified legal relations".to_string(),
        "marker_frequency is a raw string count, not a structural parse".to_string(),
    ];
    if unapplied_potential_semantic > 0 {
        ml_risk_factors.push(format!(
            "{unapplied_potential_semantic} correction(s) were withheld inside protected or numeric-sensitive regions"
        ));
    }

    DataQuality {
        completeness: "complete".to_string(),
        completeness_disclaimer: "completeness reflects what the source page rendered at capture time, not legal completeness".to_string(),
        flags,
        ml_risk_factors,
        known_limitations: vec![
            "no legal-relation classification is performed".to_string(),
            "no inference of missing content is performed".to_string(),
        ],
        ml_usage_warning: "this record carries no safe-for-ML guarantee; review ml_risk_factors before training use".to_string(),
    }
}
