use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use docstash_digest::DigestEngine;
use docstash_gate::AdmissionFilter;
use docstash_index::{IndexError, MetadataIndex, SqliteIndex};
use docstash_store::{ContentStore, FsContentStore, StoreError};
use docstash_types::{ConsistencyReport, DigestAlgorithm, MetadataRecord, ObjectId};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::outcome::{DeleteReport, PutOutcome};

/// Admission, hashing, placement and indexing behind one API.
///
/// A `put` runs the stages in order and stops at the first that fails:
///
/// ```text
/// admission filter -> digest engine -> content store -> metadata index
/// ```
///
/// The two stores are updated one after the other with no transaction
/// spanning both. A failure between them leaves drift that
/// [`check_consistency`](Self::check_consistency) will report.
pub struct StorageEngine {
    gate: AdmissionFilter,
    digests: DigestEngine,
    store: Box<dyn ContentStore>,
    index: Box<dyn MetadataIndex>,
    primary: DigestAlgorithm,
}

impl StorageEngine {
    /// Open the filesystem store and SQLite index named by `config`.
    ///
    /// The index schema must already exist (see [`create_schema`](crate::create_schema)).
    pub fn open(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let store = FsContentStore::open(&config.storage_root, config.layout)?;
        let index = SqliteIndex::connect(config.connection.clone())?;
        let digests = DigestEngine::new(&config.digest_algorithms())?
            .with_chunk_size(config.chunk_size)?;
        let gate = AdmissionFilter::external(config.admission.clone());
        info!(
            storage = %store.root().display(),
            index = %config.connection,
            primary = %config.primary_algorithm,
            "opened storage engine"
        );
        Self::from_parts(
            gate,
            digests,
            Box::new(store),
            Box::new(index),
            config.primary_algorithm,
        )
    }

    /// Assemble an engine from explicit components.
    ///
    /// `digests` must compute the `primary` algorithm.
    pub fn from_parts(
        gate: AdmissionFilter,
        digests: DigestEngine,
        store: Box<dyn ContentStore>,
        index: Box<dyn MetadataIndex>,
        primary: DigestAlgorithm,
    ) -> EngineResult<Self> {
        if !digests.algorithms().contains(&primary) {
            return Err(EngineError::Config(format!(
                "digest engine does not compute the primary algorithm {primary}"
            )));
        }
        Ok(Self {
            gate,
            digests,
            store,
            index,
            primary,
        })
    }

    pub fn primary_algorithm(&self) -> DigestAlgorithm {
        self.primary
    }

    pub fn algorithms(&self) -> &[DigestAlgorithm] {
        self.digests.algorithms()
    }

    pub fn admission(&self) -> &AdmissionFilter {
        &self.gate
    }

    // ---- Ingest ----

    /// Admit, hash, store and index the file at `path`.
    ///
    /// The file is opened before classification, so a candidate that cannot
    /// be read fails with [`EngineError::Source`] rather than being judged by
    /// the admission tools. Returns [`PutOutcome::Skipped`] when the admission
    /// filter rejects the file. The one handle is read twice (hash, then copy)
    /// and closed on every return path.
    pub fn put(&self, path: &Path, extension: Option<&str>) -> EngineResult<PutOutcome> {
        let source_err = |source: io::Error| EngineError::Source {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(source_err)?;

        let admission = self.gate.classify(path)?;
        if !admission.is_accepted() {
            debug!(path = %path.display(), ?admission, "skipped by admission filter");
            return Ok(PutOutcome::Skipped { admission });
        }

        let digests = self.digests.compute(&mut file)?;
        file.seek(SeekFrom::Start(0)).map_err(source_err)?;

        let record = MetadataRecord::from_digests(&digests, self.primary).ok_or_else(|| {
            EngineError::Config(format!("no {} digest was computed", self.primary))
        })?;
        let placement = self.store.put(&mut file, &record.id, extension)?;
        self.index.upsert(&record)?;

        if placement.is_duplicate {
            debug!(id = %record.id, path = %path.display(), "already stored");
        } else {
            info!(
                id = %record.id,
                path = %path.display(),
                object = %placement.relative_path.display(),
                "stored object"
            );
        }
        Ok(PutOutcome::Stored(placement))
    }

    /// Like [`put`](Self::put), for content that only exists as a stream.
    ///
    /// The stream is spooled to a temporary file so the admission tools can
    /// inspect it by path. The spool file is removed on return.
    pub fn put_reader(
        &self,
        reader: &mut dyn Read,
        extension: Option<&str>,
    ) -> EngineResult<PutOutcome> {
        let mut spool = NamedTempFile::new().map_err(EngineError::Spool)?;
        io::copy(reader, &mut spool).map_err(EngineError::Spool)?;
        spool.flush().map_err(EngineError::Spool)?;
        self.put(spool.path(), extension)
    }

    // ---- Lookup ----

    /// The indexed record for `id`.
    pub fn get(&self, id: &ObjectId) -> EngineResult<MetadataRecord> {
        match self.index.get(id) {
            Err(IndexError::NotFound(_)) => Err(EngineError::NotFound(id.clone())),
            other => Ok(other?),
        }
    }

    /// Absolute path of the stored object, if the store holds one.
    pub fn locate(&self, id: &ObjectId) -> EngineResult<Option<PathBuf>> {
        Ok(self.store.locate(id)?)
    }

    /// Open the stored content of `id` for reading.
    pub fn open_object(&self, id: &ObjectId) -> EngineResult<Box<dyn Read + Send>> {
        match self.store.open(id) {
            Err(StoreError::NotFound(_)) => Err(EngineError::NotFound(id.clone())),
            other => Ok(other?),
        }
    }

    // ---- Removal ----

    /// Remove `id` from both the content store and the metadata index.
    ///
    /// Each side is attempted even if the other does not hold the digest.
    /// Fails with [`EngineError::NotFound`] only when neither does.
    pub fn delete(&self, id: &ObjectId) -> EngineResult<DeleteReport> {
        let removed_object = match self.store.delete(id) {
            Ok(()) => true,
            Err(StoreError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };
        let removed_record = match self.index.delete(id) {
            Ok(()) => true,
            Err(IndexError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };

        if !removed_object && !removed_record {
            return Err(EngineError::NotFound(id.clone()));
        }
        let report = DeleteReport {
            id: id.clone(),
            removed_object,
            removed_record,
        };
        if report.was_consistent() {
            info!(%id, "deleted object");
        } else {
            warn!(%id, removed_object, removed_record, "deleted object present on one side only");
        }
        Ok(report)
    }

    // ---- Consistency ----

    pub fn store_count(&self) -> EngineResult<u64> {
        Ok(self.store.count()?)
    }

    pub fn index_count(&self) -> EngineResult<u64> {
        Ok(self.index.count()?)
    }

    /// Compare the object count of the content store with the record count
    /// of the index. Read-only.
    pub fn check_consistency(&self) -> EngineResult<ConsistencyReport> {
        let report = ConsistencyReport::new(self.store_count()?, self.index_count()?);
        if report.consistent {
            info!(count = report.store_count, "storage consistent");
        } else {
            warn!(
                store = report.store_count,
                index = report.index_count,
                "storage drift detected"
            );
        }
        Ok(report)
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("gate", &self.gate)
            .field("digests", &self.digests)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}
