use std::io::Read;
use std::path::PathBuf;

use docstash_types::{ObjectId, PlacementResult};

use crate::error::StoreResult;

/// Content-addressed object store keyed by primary digest.
///
/// All implementations must satisfy these invariants:
/// - At most one object per digest. `put` of an already-stored digest is a
///   no-op reported as `is_duplicate = true`.
/// - Two concurrent `put`s of the same digest never corrupt each other: one
///   wins, the other observes a duplicate.
/// - The store never interprets object contents and never verifies the
///   caller-supplied digest; the caller owns digest computation.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// Store the bytes of `reader` under `id`.
    fn put(
        &self,
        reader: &mut dyn Read,
        id: &ObjectId,
        extension: Option<&str>,
    ) -> StoreResult<PlacementResult>;

    /// Absolute path of the object stored under `id`, if any.
    fn locate(&self, id: &ObjectId) -> StoreResult<Option<PathBuf>>;

    /// Check whether an object is stored under `id`.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.locate(id)?.is_some())
    }

    /// Open the stored content for reading.
    ///
    /// Returns `Err(StoreError::NotFound)` if nothing is stored under `id`.
    fn open(&self, id: &ObjectId) -> StoreResult<Box<dyn Read + Send>>;

    /// Remove the object stored under `id`.
    ///
    /// Returns `Err(StoreError::NotFound)` if nothing is stored under `id`.
    fn delete(&self, id: &ObjectId) -> StoreResult<()>;

    /// Number of stored objects.
    fn count(&self) -> StoreResult<u64>;

    /// Every stored digest, in ascending order.
    fn ids(&self) -> StoreResult<Vec<ObjectId>>;
}
