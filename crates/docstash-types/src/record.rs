use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::{DigestAlgorithm, DigestSet};
use crate::object::ObjectId;

/// Where a `put` placed (or found) an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResult {
    /// Primary digest of the content.
    pub id: ObjectId,
    /// Path of the object relative to the store root.
    pub relative_path: PathBuf,
    /// Absolute path of the object on disk.
    pub absolute_path: PathBuf,
    /// `true` if the object was already stored and nothing was written.
    pub is_duplicate: bool,
}

/// Indexed digests of one stored object.
///
/// There is at most one record per primary digest. `stored_at` is set when
/// the record is first inserted and survives later merges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: ObjectId,
    pub primary_algorithm: DigestAlgorithm,
    /// Digests under every non-primary algorithm.
    pub secondary: BTreeMap<DigestAlgorithm, String>,
    pub stored_at: DateTime<Utc>,
}

impl MetadataRecord {
    /// Build a record from a digest set, stamped with the current time.
    ///
    /// Returns `None` if the set has no digest for `primary`.
    pub fn from_digests(digests: &DigestSet, primary: DigestAlgorithm) -> Option<Self> {
        Some(Self {
            id: digests.object_id(primary)?,
            primary_algorithm: primary,
            secondary: digests.secondary(primary),
            stored_at: Utc::now(),
        })
    }

    pub fn digest(&self, algorithm: DigestAlgorithm) -> Option<&str> {
        if algorithm == self.primary_algorithm {
            Some(self.id.as_str())
        } else {
            self.secondary.get(&algorithm).map(String::as_str)
        }
    }

    /// Fold `other`'s secondary digests into this record.
    ///
    /// The identity and `stored_at` of `self` are kept; digests present only
    /// in `other` are added.
    pub fn merge(&mut self, other: &MetadataRecord) {
        for (algorithm, hex) in &other.secondary {
            self.secondary.insert(*algorithm, hex.clone());
        }
    }
}

/// Object counts of the content store and the metadata index.
///
/// Only counts are compared: a report can show that the two stores drifted
/// apart but not which digests are missing from either side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub store_count: u64,
    pub index_count: u64,
    pub consistent: bool,
}

impl ConsistencyReport {
    pub fn new(store_count: u64, index_count: u64) -> Self {
        Self {
            store_count,
            index_count,
            consistent: store_count == index_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digests() -> DigestSet {
        [
            (DigestAlgorithm::Md5, "d41d8cd98f00b204e9800998ecf8427e".to_string()),
            (
                DigestAlgorithm::Sha256,
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".to_string(),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn record_from_digests_splits_primary() {
        let record = MetadataRecord::from_digests(&digests(), DigestAlgorithm::Sha256).unwrap();
        assert_eq!(record.id.short_hex(), "e3b0c442");
        assert_eq!(record.secondary.len(), 1);
        assert_eq!(
            record.digest(DigestAlgorithm::Md5),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );
        assert_eq!(record.digest(DigestAlgorithm::Sha256), Some(record.id.as_str()));
        assert_eq!(record.digest(DigestAlgorithm::Sha1), None);
    }

    #[test]
    fn record_requires_primary_digest() {
        assert!(MetadataRecord::from_digests(&digests(), DigestAlgorithm::Sha1).is_none());
    }

    #[test]
    fn merge_keeps_identity_and_timestamp() {
        let mut first = MetadataRecord::from_digests(&digests(), DigestAlgorithm::Sha256).unwrap();
        let stored_at = first.stored_at;

        let mut second = first.clone();
        second.stored_at = stored_at + chrono::Duration::seconds(60);
        second
            .secondary
            .insert(DigestAlgorithm::Sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709".into());

        first.merge(&second);
        assert_eq!(first.stored_at, stored_at);
        assert_eq!(first.secondary.len(), 2);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn consistency_report_compares_counts() {
        assert!(ConsistencyReport::new(0, 0).consistent);
        assert!(ConsistencyReport::new(3, 3).consistent);
        let drift = ConsistencyReport::new(2, 3);
        assert!(!drift.consistent);
        assert_eq!(drift.store_count, 2);
        assert_eq!(drift.index_count, 3);
    }
}
