//! Duplicate merging on a composite identity key
//!
//! Overlapping chunks and repeated tables make models report the same
//! physical item more than once. Records that share school, building, room
//! and the start of their material description are merged into one.

use crate::ValidationConfig;
use acmreg_domain::ExtractedRecord;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;

/// Composite identity key for a record
///
/// `{school}_{building}_{room}_{hash}` where missing parts read `unknown`,
/// `unknown` and `none`, and `hash` is the leading hex of the SHA-256 of the
/// first `dedup_prefix_chars` characters of material_description.
pub fn dedup_key(record: &ExtractedRecord, school_code: Option<&str>, config: &ValidationConfig) -> String {
    let school = school_code.filter(|s| !s.is_empty()).unwrap_or("unknown");
    let building = if record.building_id.is_empty() {
        "unknown"
    } else {
        record.building_id.as_str()
    };
    let room = record
        .room_id
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or("none");

    let prefix: String = record
        .material_description
        .chars()
        .take(config.dedup_prefix_chars)
        .collect();
    let digest = format!("{:x}", Sha256::digest(prefix.as_bytes()));
    let hash_len = config.dedup_hash_hex_len.min(digest.len());

    format!("{}_{}_{}_{}", school, building, room, &digest[..hash_len])
}

/// Merge two records with the same key
///
/// The record with the strictly higher confidence rank becomes the base;
/// ties keep `existing`. Data issues are the union of both, existing first.
pub fn merge_records(existing: ExtractedRecord, new: ExtractedRecord) -> ExtractedRecord {
    let issues = existing.data_issues.union(&new.data_issues);
    let mut base = if new.confidence_rank() > existing.confidence_rank() {
        new
    } else {
        existing
    };
    base.data_issues = issues;
    base
}

/// Records after merging, with a count of merges performed
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// One record per key, in first-seen order
    pub records: Vec<ExtractedRecord>,
    /// Number of records folded into an earlier one
    pub merged: usize,
}

/// Batch deduplicator
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    config: ValidationConfig,
}

impl Deduplicator {
    /// Create a deduplicator with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Merge records sharing a key
    pub fn deduplicate(&self, records: Vec<ExtractedRecord>, school_code: Option<&str>) -> DedupOutcome {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<ExtractedRecord> = Vec::with_capacity(records.len());
        let mut merged = 0;

        for record in records {
            let key = dedup_key(&record, school_code, &self.config);
            match slots.get(&key) {
                Some(&index) => {
                    let existing = std::mem::take(&mut kept[index]);
                    kept[index] = merge_records(existing, record);
                    merged += 1;
                }
                None => {
                    slots.insert(key, kept.len());
                    kept.push(record);
                }
            }
        }

        if merged > 0 {
            info!(merged, remaining = kept.len(), "Merged duplicate records");
        }

        DedupOutcome {
            records: kept,
            merged,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn confidence() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("high".to_string()),
            Just("medium".to_string()),
            Just("low".to_string()),
        ]
    }

    proptest! {
        /// Property: equal identity inputs give equal keys
        #[test]
        fn test_key_deterministic(
            school in proptest::option::of("[A-Z0-9]{1,6}"),
            building in "[A-Z][0-9]{1,3}",
            room in proptest::option::of("R[0-9]{1,4}"),
            desc in ".{0,80}",
        ) {
            let config = ValidationConfig::default();
            let a = ExtractedRecord {
                building_id: building.clone(),
                room_id: room.clone(),
                material_description: desc.clone(),
                product: "first".to_string(),
                ..Default::default()
            };
            let b = ExtractedRecord {
                building_id: building,
                room_id: room,
                material_description: desc,
                product: "second".to_string(),
                extraction_confidence: "low".to_string(),
                ..Default::default()
            };
            prop_assert_eq!(
                dedup_key(&a, school.as_deref(), &config),
                dedup_key(&b, school.as_deref(), &config)
            );
        }

        /// Property: a different building never shares a key
        #[test]
        fn test_key_separates_buildings(
            desc in ".{0,60}",
            a in "[A-Z][0-9]{1,3}",
            b in "[A-Z][0-9]{1,3}",
        ) {
            prop_assume!(a != b);
            let config = ValidationConfig::default();
            let ra = ExtractedRecord { building_id: a, material_description: desc.clone(), ..Default::default() };
            let rb = ExtractedRecord { building_id: b, material_description: desc, ..Default::default() };
            prop_assert_ne!(dedup_key(&ra, None, &config), dedup_key(&rb, None, &config));
        }

        /// Property: merge keeps the higher-ranked scalar fields and every issue
        #[test]
        fn test_merge_confidence_monotonic(
            first in confidence(),
            second in confidence(),
            issues_a in proptest::collection::vec("[a-z]{1,8}", 0..4),
            issues_b in proptest::collection::vec("[a-z]{1,8}", 0..4),
        ) {
            let a = ExtractedRecord {
                extraction_confidence: first,
                location: Some("first".to_string()),
                data_issues: issues_a.clone().into_iter().collect(),
                ..Default::default()
            };
            let b = ExtractedRecord {
                extraction_confidence: second,
                location: Some("second".to_string()),
                data_issues: issues_b.clone().into_iter().collect(),
                ..Default::default()
            };

            let merged = merge_records(a.clone(), b.clone());
            let winner = if b.confidence_rank() > a.confidence_rank() { &b } else { &a };
            prop_assert_eq!(&merged.location, &winner.location);
            prop_assert_eq!(merged.confidence_rank(), a.confidence_rank().max(b.confidence_rank()));
            for issue in issues_a.iter().chain(issues_b.iter()) {
                prop_assert!(merged.data_issues.contains(issue));
            }

            // Merging again changes nothing
            let again = merge_records(merged.clone(), merged.clone());
            prop_assert_eq!(again, merged);
        }
    }
}
