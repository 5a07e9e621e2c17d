use std::path::PathBuf;

/// Errors from digest computation.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// An algorithm name in the configuration is not supported.
    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The engine was configured without any algorithm.
    #[error("no digest algorithms configured")]
    NoAlgorithms,

    /// A chunk size of zero was requested.
    #[error("chunk size must be at least one byte")]
    ZeroChunkSize,

    /// The source could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the source failed part way.
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
}

/// Result alias for digest operations.
pub type DigestResult<T> = Result<T, DigestError>;
