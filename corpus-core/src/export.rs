//! Export Writer (C10, §4.10, §6.1, §6.3, §6.4, §6.5): renders captured and
//! failed acts to the exact external JSON schema and writes them, the
//! corpus manifest, and the three research documents to disk under a fixed
//! filename surface.
//!
//! Every JSON shape here is built as an explicit [`serde_json::Value`]
//! rather than derived from `#[derive(Serialize)]` on the internal types,
//! because the external schema is a *subset and rename* of the internal
//! model (§6.1's `lexical_references` wraps a count alongside the items;
//! `protected_sections`/`numeric_regions` drop internal offsets readers have
//! no use for) and must never accidentally grow a forbidden field (§8
//! property 2) just because a new internal field was added to `ActRecord`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::time::Duration;

use crate::error::{ExportError, Result};
use crate::types::{
    ActRecord, CorpusManifest, FailedExtraction, Identifiers, ProtectedRegionType, TrustBoundary,
};

/// §9 Design Notes: "Mixed success/failure lists → tagged variant." An act
/// in an export is always unambiguously one or the other; there is no shape
/// that can carry both content and failure metadata at once.
#[derive(Debug, Clone)]
pub enum ActExport {
    Successful(ActRecord),
    Failed(FailedExtraction),
}

/// Pace between successive file writes in a batch export, so a large corpus
/// export does not saturate disk I/O in a tight loop (§4.10 "paces writes
/// with a short delay").
pub const BATCH_WRITE_DELAY_MS: u64 = 50;

/// ISO-8601 timestamp with `:` and `.` replaced by `-`, truncated to seconds
/// (§6.5).
pub fn format_export_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
        .replace(':', "-")
        .replace('.', "-")
}

pub fn act_filename(internal_id: &str, timestamp: DateTime<Utc>) -> String {
    format!("bdlaw_act_{internal_id}_{}.json", format_export_timestamp(timestamp))
}

pub fn failed_act_filename(internal_id: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "bdlaw_act_{internal_id}_FAILED_{}.json",
        format_export_timestamp(timestamp)
    )
}

pub fn volume_filename(volume_number: &str, timestamp: DateTime<Utc>) -> String {
    format!("bdlaw_volume_{volume_number}_{}.json", format_export_timestamp(timestamp))
}

pub fn manifest_filename(timestamp: DateTime<Utc>) -> String {
    format!("bdlaw_corpus_manifest_{}.json", format_export_timestamp(timestamp))
}

pub const README_FILENAME: &str = "README.md";
pub const CITATION_FILENAME: &str = "CITATION.cff";
pub const DATA_DICTIONARY_FILENAME: &str = "DATA_DICTIONARY.md";

/// §6.1 per-act export schema.
pub fn build_success_json(act: &ActRecord) -> Value {
    let mut protected_section_types: Vec<&'static str> = act
        .protected_sections
        .iter()
        .map(|r| match r.region_type {
            ProtectedRegionType::Definitions => "definitions",
            ProtectedRegionType::Proviso => "proviso",
            ProtectedRegionType::Explanation => "explanation",
        })
        .collect();
    protected_section_types.sort();
    protected_section_types.dedup();

    let numeric_regions: Vec<Value> = act
        .numeric_regions
        .iter()
        .map(|r| {
            json!({
                "start": r.start,
                "end": r.end,
                "type": r.region_type,
                "numeric_integrity_sensitive": true,
            })
        })
        .collect();

    json!({
        "identifiers": Identifiers::for_internal_id(act.internal_id.as_str()),
        "title_raw": act.title_raw,
        "title_normalized": act.title_normalized,
        "content_raw": act.content_raw,
        "content_normalized": act.content_normalized,
        "content_corrected": act.content_corrected,
        "content_raw_sha256": act.content_raw_sha256.0,
        "url": act.url,
        "volume_number": act.volume_number,
        "legal_status": act.legal_status,
        "temporal_status": act.temporal_status,
        "temporal_disclaimer": act.temporal_disclaimer,
        "lexical_references": {
            "count": act.lexical_references.len(),
            "items": act.lexical_references,
        },
        "schedules": act.schedules,
        "transformation_log": act.transformation_log,
        "protected_sections": protected_section_types,
        "numeric_regions": numeric_regions,
        "data_quality": act.data_quality,
        "extraction_risk": act.extraction_risk,
        "numeric_representation": act.numeric_representation,
        "language_distribution": act.language_distribution,
        "editorial_content_present": act.editorial_content_present,
        "source_authority": act.source_authority,
        "authority_rank": act.authority_rank,
        "marker_frequency": act.marker_frequency,
        "trust_boundary": TrustBoundary::default(),
    })
}

/// §6.3 failed-act export schema. All three content fields are explicit
/// `null`, never omitted (§8 property 8).
pub fn build_failed_json(failed: &FailedExtraction) -> Value {
    let selector_strategies_used: Vec<String> = {
        let mut strategies: Vec<String> = failed
            .attempts
            .iter()
            .map(|a| a.selector_strategy.to_string())
            .collect();
        strategies.sort();
        strategies.dedup();
        strategies
    };

    let first_attempt_at = failed.attempts.first().map(|a| a.timestamp);
    let last_attempt_at = failed.attempts.last().map(|a| a.timestamp);

    json!({
        "identifiers": Identifiers::for_internal_id(failed.internal_id.as_str()),
        "extraction_status": "failed",
        "failure_reason": failed.failure_reason,
        "attempts": failed.attempts.len(),
        "attempt_history": failed.attempts,
        "content_raw": Value::Null,
        "content_normalized": Value::Null,
        "content_corrected": Value::Null,
        "url": failed.url,
        "title_raw": failed.title,
        "_metadata": {
            "first_attempt_at": first_attempt_at,
            "last_attempt_at": last_attempt_at,
            "max_retries_reached": failed.max_retries_reached(),
            "selector_strategies_used": selector_strategies_used,
        },
        "trust_boundary": TrustBoundary::default(),
    })
}

/// Map an `ActExport` to its file contents and filename, without touching
/// disk. Kept separate from [`write_act_export`] so tests can assert on the
/// shape without a filesystem.
pub fn render_act_export(export: &ActExport, timestamp: DateTime<Utc>) -> (String, Value) {
    match export {
        ActExport::Successful(act) => (act_filename(&act.internal_id, timestamp), build_success_json(act)),
        ActExport::Failed(failed) => (
            failed_act_filename(&failed.internal_id, timestamp),
            build_failed_json(failed),
        ),
    }
}

/// Write a single act export (successful or failed) to `dir`.
pub async fn write_act_export(dir: &Path, export: &ActExport, timestamp: DateTime<Utc>) -> Result<PathBuf> {
    let (filename, value) = render_act_export(export, timestamp);
    write_json(dir, &filename, &value).await
}

/// §4.10 "Batch export-as-separate-files, paced with a short delay": write
/// every act in `exports` to its own file, sleeping `BATCH_WRITE_DELAY_MS`
/// between writes so the batch never saturates disk I/O in a tight loop.
pub async fn write_batch(dir: &Path, exports: &[ActExport], timestamp: DateTime<Utc>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(exports.len());
    for (index, export) in exports.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(Duration::from_millis(BATCH_WRITE_DELAY_MS)).await;
        }
        paths.push(write_act_export(dir, export, timestamp).await?);
    }
    Ok(paths)
}

/// §6.4 "A corpus manifest file may be emitted."
pub async fn write_manifest(dir: &Path, manifest: &CorpusManifest, timestamp: DateTime<Utc>) -> Result<PathBuf> {
    let filename = manifest_filename(timestamp);
    write_json(dir, &filename, &json!(manifest)).await
}

/// §4.10 "the research documents... are separate files with fixed filename
/// patterns," generated from the manifest via plain string templating — no
/// templating engine dependency is justified for three fixed documents.
pub async fn write_research_documents(dir: &Path, manifest: &CorpusManifest) -> Result<Vec<PathBuf>> {
    let readme = render_readme(manifest);
    let citation = render_citation(manifest);
    let data_dictionary = render_data_dictionary();

    let readme_path = write_text(dir, README_FILENAME, &readme).await?;
    let citation_path = write_text(dir, CITATION_FILENAME, &citation).await?;
    let dictionary_path = write_text(dir, DATA_DICTIONARY_FILENAME, &data_dictionary).await?;

    Ok(vec![readme_path, citation_path, dictionary_path])
}

fn render_readme(manifest: &CorpusManifest) -> String {
    format!(
        "# BD Law Corpus\n\n\
         A point-in-time capture of Bangladesh statutory acts as published on \
         the source government site. {total} acts captured ({bengali} Bengali, \
         {english} English); see `trust_boundary` in each act export for what \
         can and cannot be safely assumed about this data.\n\n\
         This corpus performs no legal interpretation, no automated \
         legal-relation classification, and carries no safe-for-ML guarantee. \
         See `DATA_DICTIONARY.md` for field-by-field provenance.\n",
        total = manifest.corpus_stats.total_acts,
        bengali = manifest.corpus_stats.bengali_count,
        english = manifest.corpus_stats.english_count,
    )
}

fn render_citation(manifest: &CorpusManifest) -> String {
    format!(
        "cff-version: 1.2.0\n\
         message: \"If you use this corpus, please cite it as below.\"\n\
         title: \"BD Law Corpus\"\n\
         type: dataset\n\
         date-released: \"{date}\"\n\
         abstract: \"A point-in-time capture of {total} Bangladesh statutory acts.\"\n",
        date = Utc::now().format("%Y-%m-%d"),
        total = manifest.corpus_stats.total_acts,
    )
}

fn render_data_dictionary() -> String {
    "# Data Dictionary\n\n\
     | Field | Meaning |\n\
     |---|---|\n\
     | `identifiers.internal_id` | Source database row identifier; not a legal citation number. |\n\
     | `content_raw` | Verbatim text extracted from the page DOM at capture time. |\n\
     | `content_normalized` | `content_raw` after NFC Unicode normalization only. |\n\
     | `content_corrected` | `content_normalized` with non-semantic/potential-semantic corrections applied, subject to protected/numeric-region enforcement. |\n\
     | `content_raw_sha256` | SHA-256 of `content_raw`, hex-encoded lowercase. |\n\
     | `marker_frequency` | Raw string occurrence counts, not a structural parse. |\n\
     | `lexical_references` | Pattern-matched citations with a confidence tag; not verified legal relations. |\n\
     | `protected_sections` / `numeric_regions` | Heuristic spans where corrections are withheld; not a legal parse. |\n".to_string()
}

async fn write_json(dir: &Path, filename: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(filename);
    let contents = serde_json::to_string_pretty(value).map_err(ExportError::from)?;
    tokio::fs::write(&path, contents).await.map_err(ExportError::from)?;
    Ok(path)
}

async fn write_text(dir: &Path, filename: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    tokio::fs::write(&path, contents).await.map_err(ExportError::from)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Attempt, AttemptOutcome, ContentHash, DataQuality, ExtractionRisk, FailureReason, Language,
        MarkerFrequency, Schedules, SelectorStrategy,
    };
    use std::collections::HashMap;

    fn sample_act() -> ActRecord {
        ActRecord {
            internal_id: "42".to_string(),
            title_raw: "Test Act, 1999".to_string(),
            title_normalized: "Test Act, 1999".to_string(),
            content_raw: "An Act to provide for testing.".to_string(),
            content_normalized: "An Act to provide for testing.".to_string(),
            content_corrected: "An Act to provide for testing.".to_string(),
            content_raw_sha256: ContentHash::of("An Act to provide for testing."),
            url: "http://bdlaws.minlaw.gov.bd/act-details-42.html".to_string(),
            volume_number: "unknown".to_string(),
            content_language: Language::English,
            transformation_log: vec![],
            protected_sections: vec![],
            numeric_regions: vec![],
            lexical_references: vec![],
            data_quality: DataQuality {
                completeness: "complete".to_string(),
                completeness_disclaimer: "disclaimer".to_string(),
                flags: vec![],
                ml_risk_factors: vec![],
                known_limitations: vec![],
                ml_usage_warning: "warning".to_string(),
            },
            legal_status: "as_published".to_string(),
            temporal_status: "point_in_time_capture".to_string(),
            temporal_disclaimer: "disclaimer".to_string(),
            schedules: Schedules {
                representation: "text".to_string(),
                extraction_method: "text_only".to_string(),
                processed: false,
                html_content: None,
            },
            extraction_risk: ExtractionRisk {
                possible_truncation: false,
                reason: None,
            },
            numeric_representation: vec![],
            language_distribution: HashMap::new(),
            editorial_content_present: false,
            source_authority: "bdlaws.minlaw.gov.bd".to_string(),
            authority_rank: "primary_source".to_string(),
            marker_frequency: MarkerFrequency::default(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn timestamp_formatting_strips_colons_and_dots_and_truncates_to_seconds() {
        let ts = "2024-01-15T10:30:45.123456Z".parse::<DateTime<Utc>>().unwrap();
        let formatted = format_export_timestamp(ts);
        assert!(!formatted.contains(':'));
        assert!(!formatted.contains('.'));
        assert_eq!(formatted, "2024-01-15T10-30-45Z");
    }

    #[test]
    fn act_filename_matches_the_fixed_pattern() {
        let ts = Utc::now();
        let name = act_filename("42", ts);
        assert!(name.starts_with("bdlaw_act_42_"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains("FAILED"));
    }

    #[test]
    fn failed_act_filename_carries_the_failed_infix() {
        let ts = Utc::now();
        let name = failed_act_filename("42", ts);
        assert!(name.contains("_FAILED_"));
    }

    /// §8 property 2: `volume_number` is always a non-null string, and the
    /// forbidden structural fields never appear.
    #[test]
    fn success_export_has_non_null_volume_number_and_no_forbidden_fields() {
        let value = build_success_json(&sample_act());
        assert_eq!(value["volume_number"], json!("unknown"));
        assert!(value.get("structured_sections").is_none());
        assert!(value.get("tables").is_none());
        assert!(value.get("amendments").is_none());
        assert!(value.get("sections_detected").is_none());
        assert!(value["marker_frequency"].is_object());
    }

    #[test]
    fn success_export_wraps_lexical_references_with_a_count() {
        let value = build_success_json(&sample_act());
        assert_eq!(value["lexical_references"]["count"], json!(0));
        assert!(value["lexical_references"]["items"].is_array());
    }

    /// §8 property 8: every failed export has all three content fields null.
    #[test]
    fn failed_export_has_all_three_content_fields_null() {
        let mut failed = FailedExtraction::new(
            "act-1",
            "42",
            "http://bdlaws.minlaw.gov.bd/act-details-42.html",
            "Test Act",
            FailureReason::ContentSelectorMismatch,
            3,
            Utc::now(),
        );
        failed.record_attempt(Attempt {
            attempt_number: 1,
            timestamp: Utc::now(),
            reason: FailureReason::ContentSelectorMismatch,
            outcome: AttemptOutcome::Failure,
            selector_strategy: SelectorStrategy::BroaderSelectors,
        });

        let value = build_failed_json(&failed);
        assert_eq!(value["content_raw"], Value::Null);
        assert_eq!(value["content_normalized"], Value::Null);
        assert_eq!(value["content_corrected"], Value::Null);
        assert_eq!(value["extraction_status"], json!("failed"));
        assert_eq!(value["attempts"], json!(1));
        assert_eq!(
            value["_metadata"]["selector_strategies_used"],
            json!(["broader_selectors"])
        );
    }

    #[test]
    fn render_act_export_dispatches_on_the_tagged_variant() {
        let (name, value) = render_act_export(&ActExport::Successful(sample_act()), Utc::now());
        assert!(name.starts_with("bdlaw_act_42_"));
        assert_eq!(value["extraction_status"].as_str(), None);

        let failed = FailedExtraction::new(
            "act-2",
            "7",
            "http://bdlaws.minlaw.gov.bd/act-details-7.html",
            "Other Act",
            FailureReason::ContainerNotFound,
            3,
            Utc::now(),
        );
        let (failed_name, failed_value) = render_act_export(&ActExport::Failed(failed), Utc::now());
        assert!(failed_name.contains("_FAILED_"));
        assert_eq!(failed_value["extraction_status"], json!("failed"));
    }
}
