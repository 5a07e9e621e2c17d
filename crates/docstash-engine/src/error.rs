use std::path::PathBuf;

use docstash_digest::DigestError;
use docstash_gate::GateError;
use docstash_index::IndexError;
use docstash_store::StoreError;
use docstash_types::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("admission failed: {0}")]
    Gate(#[from] GateError),

    #[error("digest error: {0}")]
    Digest(#[from] DigestError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("cannot read {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot spool input stream: {0}")]
    Spool(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot load config {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse failure categories callers can act on without matching every
/// component error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The external type tools failed, timed out, or produced unusable output.
    ClassificationFailure,
    /// The candidate could not be opened or read.
    UnreadableSource,
    /// The content store could not write, read, or remove an object.
    StorageWriteFailure,
    /// The metadata index could not be queried or updated.
    IndexFailure,
    /// Neither store holds the requested digest.
    NotFound,
    /// Layout, algorithm set, connection, or config file is unusable.
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassificationFailure => "classification_failure",
            Self::UnreadableSource => "unreadable_source",
            Self::StorageWriteFailure => "storage_write_failure",
            Self::IndexFailure => "index_failure",
            Self::NotFound => "not_found",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Gate(GateError::Candidate { .. }) => ErrorKind::UnreadableSource,
            Self::Gate(_) => ErrorKind::ClassificationFailure,

            Self::Digest(DigestError::Open { .. } | DigestError::Read(_)) => {
                ErrorKind::UnreadableSource
            }
            Self::Digest(_) => ErrorKind::Configuration,

            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(
                StoreError::InvalidLayout(_)
                | StoreError::DigestTooShort { .. }
                | StoreError::InvalidExtension(_),
            ) => ErrorKind::Configuration,
            Self::Store(_) => ErrorKind::StorageWriteFailure,

            Self::Index(IndexError::NotFound(_)) => ErrorKind::NotFound,
            Self::Index(
                IndexError::SchemaMissing(_)
                | IndexError::InvalidConnectionString(_)
                | IndexError::AlgorithmMismatch { .. },
            ) => ErrorKind::Configuration,
            Self::Index(_) => ErrorKind::IndexFailure,

            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Source { .. } | Self::Spool(_) => ErrorKind::UnreadableSource,
            Self::Config(_) | Self::ConfigFile { .. } => ErrorKind::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn kinds_follow_the_failing_component() {
        let id = ObjectId::from_hex("abcd").unwrap();
        let cases: Vec<(EngineError, ErrorKind)> = vec![
            (
                GateError::Timeout {
                    tool: "file".into(),
                    duration: Duration::from_secs(1),
                }
                .into(),
                ErrorKind::ClassificationFailure,
            ),
            (
                GateError::Candidate {
                    path: "x".into(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                }
                .into(),
                ErrorKind::UnreadableSource,
            ),
            (
                DigestError::Read(io::Error::other("eio")).into(),
                ErrorKind::UnreadableSource,
            ),
            (DigestError::NoAlgorithms.into(), ErrorKind::Configuration),
            (
                StoreError::Io(io::Error::other("disk full")).into(),
                ErrorKind::StorageWriteFailure,
            ),
            (StoreError::NotFound(id.clone()).into(), ErrorKind::NotFound),
            (
                IndexError::Serialization("bad json".into()).into(),
                ErrorKind::IndexFailure,
            ),
            (
                IndexError::SchemaMissing("db".into()).into(),
                ErrorKind::Configuration,
            ),
            (EngineError::NotFound(id), ErrorKind::NotFound),
            (EngineError::Config("x".into()), ErrorKind::Configuration),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn kind_display_matches_serde() {
        let json = serde_json::to_string(&ErrorKind::StorageWriteFailure).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorKind::StorageWriteFailure));
    }
}
