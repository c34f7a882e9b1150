//! Manifest / Dedup Engine (C9, §4.9): language-aware duplicate detection,
//! idempotency checking, version archiving, and cross-reference coverage
//! statistics. Operates purely on a `CorpusManifest` value — persistence of
//! the result is the Storage Layer's job (`storage::Storage::store_manifest`).

use chrono::{DateTime, Utc};

use crate::types::{
    ArchivedVersion, ContentHash, CorpusManifest, CorpusStats, CrossReferenceCoverage, Language,
    LexicalReference, ManifestEntry,
};

/// Outcome of the §4.9 duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateDecision {
    /// No existing entry for this `internal_id`; proceed.
    NotDuplicate,
    /// Same `internal_id`, same language already captured; blocked unless
    /// the user forces a re-extraction.
    BlockedSameLanguage,
    /// Existing is English, new is Bengali: not blocked, and the existing
    /// record should be archived and replaced.
    ReplaceExisting,
    /// Existing is Bengali, new is English: blocked unconditionally.
    BlockedBengaliPreferred,
}

/// §4.9 "Duplicate check (language-aware)".
pub fn check_duplicate(
    manifest: &CorpusManifest,
    internal_id: &str,
    new_language: Language,
) -> DuplicateDecision {
    let Some(existing) = manifest.acts.get(internal_id) else {
        return DuplicateDecision::NotDuplicate;
    };

    match (existing.content_language, new_language) {
        (Language::English, Language::Bengali) => DuplicateDecision::ReplaceExisting,
        (Language::Bengali, Language::English) => DuplicateDecision::BlockedBengaliPreferred,
        (existing_lang, new_lang) if existing_lang == new_lang => {
            DuplicateDecision::BlockedSameLanguage
        }
        _ => DuplicateDecision::BlockedSameLanguage,
    }
}

/// Outcome of the §4.9 "Idempotency check", run before a forced re-extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyFlag {
    Identical,
    SourceChanged,
}

pub fn check_idempotency(existing_hash: &ContentHash, incoming_content_raw: &str) -> IdempotencyFlag {
    if *existing_hash == ContentHash::of(incoming_content_raw) {
        IdempotencyFlag::Identical
    } else {
        IdempotencyFlag::SourceChanged
    }
}

/// Insert or replace a manifest entry. When replacing an existing entry for
/// the same `internal_id` (the `ReplaceExisting` path, §4.9), the prior
/// entry's content hash is archived with `reason` before being overwritten —
/// archived versions are never re-promoted automatically (§3.2).
pub fn upsert_manifest_entry(
    manifest: &mut CorpusManifest,
    entry: ManifestEntry,
    archive_reason: Option<&str>,
    now: DateTime<Utc>,
) {
    if let Some(prior) = manifest.acts.get(&entry.internal_id) {
        if let Some(reason) = archive_reason {
            manifest.archived_versions.push(ArchivedVersion {
                internal_id: prior.internal_id.clone(),
                content_hash: prior.content_hash.clone(),
                archived_at: now,
                reason: reason.to_string(),
            });
        }
    }

    manifest.acts.insert(entry.internal_id.clone(), entry);
    manifest.corpus_stats = recompute_stats(manifest);
}

fn recompute_stats(manifest: &CorpusManifest) -> CorpusStats {
    let mut stats = CorpusStats {
        total_acts: manifest.acts.len(),
        bengali_count: 0,
        english_count: 0,
    };
    for entry in manifest.acts.values() {
        match entry.content_language {
            Language::Bengali => stats.bengali_count += 1,
            Language::English => stats.english_count += 1,
        }
    }
    stats
}

/// §4.9 "Cross-reference coverage": over every detected `LexicalReference`
/// across the corpus, how many name an act that is itself present in the
/// manifest (by a case-insensitive substring match of the citation text
/// against captured titles). Descriptive metadata, not a legal judgment —
/// a reference this heuristic misses is not asserted to be truly absent.
pub fn compute_cross_reference_coverage(
    manifest: &CorpusManifest,
    references: &[LexicalReference],
) -> CrossReferenceCoverage {
    if references.is_empty() {
        return CrossReferenceCoverage::default();
    }

    let titles: Vec<String> = manifest
        .acts
        .values()
        .map(|e| e.title.to_lowercase())
        .collect();

    let mut present = 0usize;
    let mut missing = 0usize;
    for reference in references {
        let needle = reference.citation_text.to_lowercase();
        if titles.iter().any(|title| title.contains(&needle)) {
            present += 1;
        } else {
            missing += 1;
        }
    }

    let total = present + missing;
    let coverage_percentage = if total == 0 {
        0.0
    } else {
        (present as f32 / total as f32) * 100.0
    };

    CrossReferenceCoverage {
        referenced_present: present,
        referenced_missing: missing,
        coverage_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entry(internal_id: &str, title: &str, language: Language, hash: &str) -> ManifestEntry {
        ManifestEntry {
            internal_id: internal_id.to_string(),
            title: title.to_string(),
            volume_number: "unknown".to_string(),
            capture_timestamp: Utc::now(),
            content_hash: ContentHash(hash.to_string()),
            content_language: language,
            cross_reference_count: 0,
        }
    }

    fn manifest_with(entries: Vec<ManifestEntry>) -> CorpusManifest {
        let mut acts = HashMap::new();
        for e in entries {
            acts.insert(e.internal_id.clone(), e);
        }
        CorpusManifest {
            version: 1,
            acts,
            ..Default::default()
        }
    }

    #[test]
    fn no_existing_entry_is_not_a_duplicate() {
        let manifest = CorpusManifest::default();
        assert_eq!(
            check_duplicate(&manifest, "1", Language::English),
            DuplicateDecision::NotDuplicate
        );
    }

    #[test]
    fn same_language_existing_entry_is_blocked() {
        let manifest = manifest_with(vec![entry("1", "Act", Language::English, "h1")]);
        assert_eq!(
            check_duplicate(&manifest, "1", Language::English),
            DuplicateDecision::BlockedSameLanguage
        );
    }

    /// §8 scenario S6: Bengali preferred over English unconditionally.
    #[test]
    fn s6_bengali_existing_blocks_english_replacement() {
        let manifest = manifest_with(vec![entry("1", "Act", Language::Bengali, "h1")]);
        assert_eq!(
            check_duplicate(&manifest, "1", Language::English),
            DuplicateDecision::BlockedBengaliPreferred
        );
    }

    #[test]
    fn english_existing_permits_bengali_replacement() {
        let manifest = manifest_with(vec![entry("1", "Act", Language::English, "h1")]);
        assert_eq!(
            check_duplicate(&manifest, "1", Language::Bengali),
            DuplicateDecision::ReplaceExisting
        );
    }

    #[test]
    fn idempotency_flags_identical_and_changed_content() {
        let hash = ContentHash::of("same content");
        assert_eq!(
            check_idempotency(&hash, "same content"),
            IdempotencyFlag::Identical
        );
        assert_eq!(
            check_idempotency(&hash, "different content"),
            IdempotencyFlag::SourceChanged
        );
    }

    #[test]
    fn upsert_archives_prior_entry_on_replace() {
        let mut manifest = manifest_with(vec![entry("1", "Act", Language::English, "h1")]);
        let replacement = entry("1", "Act", Language::Bengali, "h2");
        upsert_manifest_entry(
            &mut manifest,
            replacement,
            Some("bengali_preferred_replacement"),
            Utc::now(),
        );
        assert_eq!(manifest.archived_versions.len(), 1);
        assert_eq!(manifest.archived_versions[0].content_hash, ContentHash("h1".to_string()));
        assert_eq!(manifest.acts["1"].content_language, Language::Bengali);
        assert_eq!(manifest.corpus_stats.total_acts, 1);
        assert_eq!(manifest.corpus_stats.bengali_count, 1);
        assert_eq!(manifest.corpus_stats.english_count, 0);
    }

    #[test]
    fn cross_reference_coverage_matches_present_and_missing() {
        let manifest = manifest_with(vec![entry("1", "Penal Code Act, 1971", Language::English, "h1")]);
        let references = vec![
            LexicalReference {
                citation_text: "Penal Code Act, 1971".to_string(),
                relation_type: "amends".to_string(),
                confidence: crate::types::Confidence::High,
                negation_present: false,
            },
            LexicalReference {
                citation_text: "Some Missing Act, 1999".to_string(),
                relation_type: "amends".to_string(),
                confidence: crate::types::Confidence::Medium,
                negation_present: false,
            },
        ];
        let coverage = compute_cross_reference_coverage(&manifest, &references);
        assert_eq!(coverage.referenced_present, 1);
        assert_eq!(coverage.referenced_missing, 1);
        assert_eq!(coverage.coverage_percentage, 50.0);
    }
}
