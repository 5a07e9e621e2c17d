use std::collections::BTreeMap;
use std::sync::RwLock;

use docstash_types::{MetadataRecord, ObjectId};

use crate::error::{IndexError, IndexResult};
use crate::traits::MetadataIndex;

/// In-memory, `BTreeMap`-based metadata index.
///
/// Intended for tests and embedding. Same merge and not-found semantics as
/// [`SqliteIndex`](crate::SqliteIndex); nothing is persisted.
pub struct InMemoryIndex {
    records: RwLock<BTreeMap<ObjectId, MetadataRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataIndex for InMemoryIndex {
    fn upsert(&self, record: &MetadataRecord) -> IndexResult<MetadataRecord> {
        let mut map = self.records.write().expect("lock poisoned");
        let stored = match map.get_mut(&record.id) {
            Some(existing) => {
                if existing.primary_algorithm != record.primary_algorithm {
                    return Err(IndexError::AlgorithmMismatch {
                        id: record.id.clone(),
                        stored: existing.primary_algorithm,
                        given: record.primary_algorithm,
                    });
                }
                existing.merge(record);
                existing.clone()
            }
            None => {
                map.insert(record.id.clone(), record.clone());
                record.clone()
            }
        };
        Ok(stored)
    }

    fn get(&self, id: &ObjectId) -> IndexResult<MetadataRecord> {
        let map = self.records.read().expect("lock poisoned");
        map.get(id)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(id.clone()))
    }

    fn delete(&self, id: &ObjectId) -> IndexResult<()> {
        let mut map = self.records.write().expect("lock poisoned");
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| IndexError::NotFound(id.clone()))
    }

    fn count(&self) -> IndexResult<u64> {
        Ok(self.records.read().expect("lock poisoned").len() as u64)
    }

    fn ids(&self) -> IndexResult<Vec<ObjectId>> {
        Ok(self
            .records
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryIndex")
            .field("record_count", &count)
            .finish()
    }
}
