use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex digest: {0}")]
    InvalidHex(String),

    #[error("empty digest")]
    EmptyDigest,

    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),
}
