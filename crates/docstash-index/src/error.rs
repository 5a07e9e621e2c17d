//! Error types for the index crate.

use docstash_types::{DigestAlgorithm, ObjectId};

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// No record exists for the digest.
    #[error("no metadata record for {0}")]
    NotFound(ObjectId),

    /// The database has not been provisioned with the index schema.
    #[error("metadata schema missing in {0}; create it first")]
    SchemaMissing(String),

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// A record with the same digest was indexed under another algorithm.
    #[error("record {id} is indexed under {stored}, not {given}")]
    AlgorithmMismatch {
        id: ObjectId,
        stored: DigestAlgorithm,
        given: DigestAlgorithm,
    },

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// SQLite connectivity or constraint error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
