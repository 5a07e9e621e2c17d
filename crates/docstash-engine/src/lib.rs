//! Storage engine for docstash.
//!
//! Composes the admission filter, digest engine, content store and metadata
//! index into one API, and adds the operations that span them: deletion from
//! both stores, the consistency check, and batch ingest of a directory tree.
//!
//! # Key Types
//!
//! - [`StorageEngine`] -- `put`, `delete`, `get`, counts and consistency
//! - [`EngineConfig`] -- TOML-loadable configuration for [`StorageEngine::open`]
//! - [`PutOutcome`] -- stored (possibly as a duplicate) or skipped by admission
//! - [`add_files`] -- directory ingest with a [`FailurePolicy`]

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod outcome;

pub use config::EngineConfig;
pub use engine::StorageEngine;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use ingest::{add_files, FailurePolicy, IngestEntry, IngestOptions, IngestStatus, IngestSummary};
pub use outcome::{DeleteReport, PutOutcome};

// Re-export key types
pub use docstash_gate::{Admission, AdmissionConfig, AdmissionReason};
pub use docstash_index::ConnectionString;
pub use docstash_store::ShardLayout;
pub use docstash_types::{ConsistencyReport, DigestAlgorithm, MetadataRecord, ObjectId, PlacementResult};

/// Provision the metadata schema at `connection`. Safe to run repeatedly.
pub fn create_schema(connection: &ConnectionString) -> EngineResult<()> {
    docstash_index::create_schema(connection)?;
    Ok(())
}

/// Open the stores named by `config` and compare their object counts.
pub fn check_storage(config: &EngineConfig) -> EngineResult<ConsistencyReport> {
    StorageEngine::open(config)?.check_consistency()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> EngineConfig {
        let conn = ConnectionString::from_path(dir.path().join("files.sqlite"));
        let mut config = EngineConfig::new(dir.path().join("objects"), conn);
        config.admission = AdmissionConfig::permissive();
        config
    }

    #[test]
    fn create_schema_then_check_empty_storage() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        create_schema(&config.connection).unwrap();
        create_schema(&config.connection).unwrap();

        let report = check_storage(&config).unwrap();
        assert_eq!(report, ConsistencyReport::new(0, 0));
        assert!(report.consistent);
    }

    #[test]
    fn open_from_config_and_put() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        create_schema(&config.connection).unwrap();

        let engine = StorageEngine::open(&config).unwrap();
        assert_eq!(engine.primary_algorithm(), DigestAlgorithm::Sha256);
        assert_eq!(
            engine.algorithms(),
            &[DigestAlgorithm::Md5, DigestAlgorithm::Sha1, DigestAlgorithm::Sha256]
        );

        let mut reader: &[u8] = b"anything goes in permissive mode";
        let outcome = engine.put_reader(&mut reader, Some("bin")).unwrap();
        assert!(outcome.is_stored());
        drop(engine);

        assert_eq!(check_storage(&config).unwrap(), ConsistencyReport::new(1, 1));
    }

    #[test]
    fn check_storage_without_schema_fails() {
        let dir = TempDir::new().unwrap();
        let err = check_storage(&config(&dir)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
