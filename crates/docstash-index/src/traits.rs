use docstash_types::{MetadataRecord, ObjectId};

use crate::error::IndexResult;

/// Persistent map from primary digest to [`MetadataRecord`].
///
/// Invariants:
/// - At most one record per primary digest.
/// - `upsert` is safe to repeat: it merges secondary digests and keeps the
///   `stored_at` of the first insertion.
/// - Operations on a missing digest report `IndexError::NotFound`.
pub trait MetadataIndex: Send + Sync {
    /// Insert `record`, or merge it into the existing record for its digest.
    ///
    /// Returns the record as stored after the merge.
    fn upsert(&self, record: &MetadataRecord) -> IndexResult<MetadataRecord>;

    /// Fetch the record for `id`.
    fn get(&self, id: &ObjectId) -> IndexResult<MetadataRecord>;

    /// Remove the record for `id`.
    fn delete(&self, id: &ObjectId) -> IndexResult<()>;

    /// Number of records.
    fn count(&self) -> IndexResult<u64>;

    /// Every indexed digest, in ascending order.
    fn ids(&self) -> IndexResult<Vec<ObjectId>>;
}
