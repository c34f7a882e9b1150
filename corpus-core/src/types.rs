//! Core data model (§3 of the specification): entities, identifiers, and
//! the invariants that the rest of the crate is built to preserve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotone string identifier generator for `QueueItem::id`.
///
/// `QueueItem.id` is explicitly a fresh monotone string, not a UUID — it
/// only needs to be unique and ordered within a single queue-processor
/// session. `internal_id` remains the cross-session deduplication key.
#[derive(Debug, Default)]
pub struct MonotoneIdGenerator {
    next: AtomicU64,
}

impl MonotoneIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> QueueItemId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        QueueItemId(format!("q-{n:010}"))
    }
}

/// A fresh monotone identifier for a `QueueItem`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueItemId(pub String);

impl std::fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash for deduplication and integrity anchoring.
///
/// Always computed over `content_raw`, never over normalized or corrected
/// content (§4.4 "Content hash").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn of(content_raw: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content_raw.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// §3.1 PageType.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    RangeIndex,
    Volume,
    ChronologicalIndex,
    AlphabeticalIndex,
    ActDetails,
    ActSummary,
    Invalid,
}

/// §3.1 CatalogEntry — one row from a volume or index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The source database's identifier, *not* a legal citation number.
    pub internal_id: String,
    pub title: String,
    pub year: Option<String>,
    pub url: String,
    pub row_index: usize,
}

/// §3.1 QueueItem.status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Retrying,
}

/// §3.1 QueueItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub internal_id: String,
    pub title: String,
    pub url: String,
    pub volume_number: Option<String>,
    pub status: QueueStatus,
    pub added_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(
        id: QueueItemId,
        internal_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        volume_number: Option<String>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            internal_id: internal_id.into(),
            title: title.into(),
            url: url.into(),
            volume_number,
            status: QueueStatus::Pending,
            added_at,
        }
    }
}

/// §7 Failure taxonomy (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ContainerNotFound,
    ContentEmpty,
    ContentBelowThreshold,
    ContentSelectorMismatch,
    DomNotReady,
    /// Legacy alias for `DomNotReady`, retained for the external schema.
    DomTimeout,
    NetworkError,
    NavigationError,
    ExtractionError,
    UnknownError,
}

impl FailureReason {
    /// §4.7 / §9 retry policy, encoded as a table lookup rather than ad-hoc
    /// conditionals so retry scope cannot accidentally widen.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureReason::ContentSelectorMismatch | FailureReason::ContainerNotFound
        )
    }
}

/// The selector strategy used for a given extraction attempt.
///
/// "Broader selectors" changes *where* content is read from, never *how* —
/// see §4.3 and the GLOSSARY entry for "Broader selectors".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    Standard,
    BroaderSelectors,
}

impl std::fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorStrategy::Standard => write!(f, "standard"),
            SelectorStrategy::BroaderSelectors => write!(f, "broader_selectors"),
        }
    }
}

/// Outcome of a single extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// §3.1 FailedExtraction.attempts[] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub attempt_number: u32,
    pub timestamp: DateTime<Utc>,
    pub reason: FailureReason,
    pub outcome: AttemptOutcome,
    pub selector_strategy: SelectorStrategy,
}

/// §3.1 FailedExtraction.
///
/// Invariant: `0 < retry_count <= max_retries`; `retry_count == attempts.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedExtraction {
    pub act_id: String,
    pub internal_id: String,
    pub url: String,
    pub title: String,
    pub failure_reason: FailureReason,
    pub retry_count: u32,
    pub max_retries: u32,
    pub failed_at: DateTime<Utc>,
    pub attempts: Vec<Attempt>,
}

impl FailedExtraction {
    pub fn new(
        act_id: impl Into<String>,
        internal_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        failure_reason: FailureReason,
        max_retries: u32,
        failed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            act_id: act_id.into(),
            internal_id: internal_id.into(),
            url: url.into(),
            title: title.into(),
            failure_reason,
            retry_count: 0,
            max_retries,
            failed_at,
            attempts: Vec::new(),
        }
    }

    /// Append an attempt, keeping the `retry_count == attempts.len()` invariant.
    pub fn record_attempt(&mut self, attempt: Attempt) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.attempts.push(attempt);
    }

    pub fn should_retry(&self) -> bool {
        self.failure_reason.is_retryable() && self.retry_count < self.max_retries
    }

    pub fn max_retries_reached(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

/// Risk classification of a proposed text transformation (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    NonSemantic,
    PotentialSemantic,
}

/// Class of correction attempted by the Text Fidelity Engine (§4.4 table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum TransformationType {
    UnicodeNormalization,
    WhitespaceCleanup,
    EncodingFix,
    OcrWordCorrection,
    Spelling,
    Punctuation,
    WordSubstitution,
    /// An unrecognized class. §8 property 9: unknown classes default to
    /// `potential-semantic` risk.
    Unknown(String),
}

impl TransformationType {
    /// Default risk level per the §4.4 correction-class table.
    pub fn default_risk_level(&self) -> RiskLevel {
        match self {
            TransformationType::UnicodeNormalization | TransformationType::WhitespaceCleanup => {
                RiskLevel::NonSemantic
            }
            TransformationType::EncodingFix => RiskLevel::NonSemantic,
            TransformationType::OcrWordCorrection
            | TransformationType::Spelling
            | TransformationType::Punctuation
            | TransformationType::WordSubstitution => RiskLevel::PotentialSemantic,
            TransformationType::Unknown(_) => RiskLevel::PotentialSemantic,
        }
    }
}

/// §3.1 TransformationEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationEntry {
    pub transformation_type: TransformationType,
    pub original: String,
    pub corrected: String,
    pub position: usize,
    pub risk_level: RiskLevel,
    pub applied: bool,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// §3.1 ProtectedRegion.type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedRegionType {
    Definitions,
    Proviso,
    Explanation,
}

/// §3.1 ProtectedRegion. Invariant: `0 <= start < end <= |content_raw|`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedRegion {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub region_type: ProtectedRegionType,
    pub marker: String,
}

/// §3.1 NumericRegion.type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericRegionType {
    Currency,
    Percentage,
    TabularNumericList,
    Rate,
}

/// §3.1 NumericRegion. Same positional invariants as `ProtectedRegion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRegion {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub region_type: NumericRegionType,
}

/// Confidence of a lexical-reference detection. First-class per the §9 Open
/// Question resolution — never collapsed to a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A detected (not asserted) cross-reference to another legal act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalReference {
    pub citation_text: String,
    pub relation_type: String,
    pub confidence: Confidence,
    pub negation_present: bool,
}

/// Content language tag (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bengali,
    English,
}

/// §6.1 `data_quality` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub completeness: String,
    pub completeness_disclaimer: String,
    pub flags: Vec<String>,
    pub ml_risk_factors: Vec<String>,
    pub known_limitations: Vec<String>,
    pub ml_usage_warning: String,
}

/// §6.1 `identifiers` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub internal_id: String,
    pub note: String,
}

impl Identifiers {
    pub fn for_internal_id(internal_id: impl Into<String>) -> Self {
        Self {
            internal_id: internal_id.into(),
            note: "internal_id is the source database's row identifier; it is not a legal citation number".to_string(),
        }
    }
}

/// §6.1 `schedules` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedules {
    pub representation: String,
    pub extraction_method: String,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

/// §6.1 `extraction_risk` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRisk {
    pub possible_truncation: bool,
    pub reason: Option<String>,
}

/// §6.1 `marker_frequency` per-marker entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCount {
    pub count: usize,
    pub method: String,
}

/// §6.1 `marker_frequency` — raw string occurrence counts, explicitly *not*
/// a count of structural sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerFrequency {
    pub section: MarkerCount,
    pub chapter: MarkerCount,
    pub schedule: MarkerCount,
}

impl Default for MarkerCount {
    fn default() -> Self {
        Self {
            count: 0,
            method: "raw_string_frequency".to_string(),
        }
    }
}

/// §6.1 `trust_boundary` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustBoundary {
    pub can_trust: Vec<String>,
    pub must_not_trust: Vec<String>,
}

impl Default for TrustBoundary {
    fn default() -> Self {
        Self {
            can_trust: vec![
                "content_raw is verbatim text extracted from the page DOM".to_string(),
                "content_raw_sha256 is a verifiable integrity anchor".to_string(),
                "transformation_log records every attempted change and whether it was applied"
                    .to_string(),
            ],
            must_not_trust: vec![
                "marker_frequency is a raw string count, not a legal structure".to_string(),
                "lexical_references are pattern-matched citations, not verified legal relations"
                    .to_string(),
                "protected_sections/numeric_regions are heuristic spans, not a legal parse"
                    .to_string(),
            ],
        }
    }
}

/// §3.1 ActRecord — the captured act. This is the in-memory/persisted
/// representation; `export.rs` maps it onto the exact §6.1 JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActRecord {
    pub internal_id: String,
    pub title_raw: String,
    pub title_normalized: String,
    pub content_raw: String,
    pub content_normalized: String,
    pub content_corrected: String,
    pub content_raw_sha256: ContentHash,
    pub url: String,
    /// Defaults to `"unknown"`; never null.
    pub volume_number: String,
    pub content_language: Language,
    pub transformation_log: Vec<TransformationEntry>,
    pub protected_sections: Vec<ProtectedRegion>,
    pub numeric_regions: Vec<NumericRegion>,
    pub lexical_references: Vec<LexicalReference>,
    pub data_quality: DataQuality,
    pub legal_status: String,
    pub temporal_status: String,
    pub temporal_disclaimer: String,
    pub schedules: Schedules,
    pub extraction_risk: ExtractionRisk,
    pub numeric_representation: Vec<String>,
    pub language_distribution: HashMap<String, f32>,
    pub editorial_content_present: bool,
    pub source_authority: String,
    pub authority_rank: String,
    pub marker_frequency: MarkerFrequency,
    pub captured_at: DateTime<Utc>,
}

/// §3.1 CorpusManifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusManifest {
    pub version: u32,
    pub acts: HashMap<String, ManifestEntry>,
    pub corpus_stats: CorpusStats,
    pub cross_reference_coverage: CrossReferenceCoverage,
    pub archived_versions: Vec<ArchivedVersion>,
}

/// §3.1 ManifestEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub internal_id: String,
    pub title: String,
    pub volume_number: String,
    pub capture_timestamp: DateTime<Utc>,
    pub content_hash: ContentHash,
    pub content_language: Language,
    pub cross_reference_count: usize,
}

/// Descriptive corpus-wide statistics (not a legal judgment).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_acts: usize,
    pub bengali_count: usize,
    pub english_count: usize,
}

/// §4.9 Cross-reference coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceCoverage {
    pub referenced_present: usize,
    pub referenced_missing: usize,
    pub coverage_percentage: f32,
}

/// A demoted, archived prior version of an act's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedVersion {
    pub internal_id: String,
    pub content_hash: ContentHash,
    pub archived_at: DateTime<Utc>,
    pub reason: String,
}

/// §3.1 WAL entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalEntryType {
    Intent,
    Complete,
}

/// §3.1 WAL entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    pub entry_id: String,
    pub session_id: String,
    pub act_id: String,
    pub entry_type: WalEntryType,
    pub timestamp: DateTime<Utc>,
    pub content_hash: Option<ContentHash>,
    pub pruned: bool,
}

/// §3.1 ExtractionReceipt — durable record that a successful extraction was
/// persisted, retained across session boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReceipt {
    pub act_id: String,
    pub session_id: String,
    pub content_hash: ContentHash,
    pub completed_at: DateTime<Utc>,
}

/// §3.1 / §4.6 QueueConfig. Values are clamped, never rejected — see
/// `config.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub extraction_delay_ms: u64,
    pub minimum_content_threshold: usize,
    pub max_retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub dom_readiness_timeout_ms: u64,
}

/// §4.6 "processing-state" interruption record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub pending_item_ids: Vec<QueueItemId>,
    pub started_at: DateTime<Utc>,
}

/// §4.8 Checkpoint manager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub acts_since_export: u32,
    pub threshold: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic_and_anchored_to_raw() {
        let a = ContentHash::of("hello world");
        let b = ContentHash::of("hello world");
        assert_eq!(a, b);
        let c = ContentHash::of("hello World");
        assert_ne!(a, c);
    }

    #[test]
    fn monotone_ids_are_unique_and_ordered() {
        let gen = MonotoneIdGenerator::new();
        let a = gen.next_id();
        let b = gen.next_id();
        assert_ne!(a, b);
        assert!(a.0 < b.0);
    }

    #[test]
    fn retry_table_matches_closed_set() {
        assert!(FailureReason::ContentSelectorMismatch.is_retryable());
        assert!(FailureReason::ContainerNotFound.is_retryable());
        assert!(!FailureReason::DomNotReady.is_retryable());
        assert!(!FailureReason::NetworkError.is_retryable());
        assert!(!FailureReason::ExtractionError.is_retryable());
        assert!(!FailureReason::ContentEmpty.is_retryable());
        assert!(!FailureReason::ContentBelowThreshold.is_retryable());
    }

    #[test]
    fn failed_extraction_invariants_hold_after_attempts() {
        let mut f = FailedExtraction::new(
            "act-1",
            "123",
            "http://example.test/act-details-123.html",
            "Some Act",
            FailureReason::ContentSelectorMismatch,
            3,
            Utc::now(),
        );
        for n in 1..=3 {
            f.record_attempt(Attempt {
                attempt_number: n,
                timestamp: Utc::now(),
                reason: FailureReason::ContentSelectorMismatch,
                outcome: AttemptOutcome::Failure,
                selector_strategy: SelectorStrategy::BroaderSelectors,
            });
        }
        assert_eq!(f.retry_count, f.attempts.len() as u32);
        assert!(f.retry_count <= f.max_retries);
        assert!(f.max_retries_reached());
        assert!(!f.should_retry());
    }

    #[test]
    fn unknown_transformation_class_defaults_to_potential_semantic() {
        let t = TransformationType::Unknown("mystery".to_string());
        assert_eq!(t.default_risk_level(), RiskLevel::PotentialSemantic);
    }
}
