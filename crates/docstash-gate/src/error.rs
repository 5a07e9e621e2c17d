use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while classifying a candidate file.
///
/// Every variant means "could not decide", which is distinct from a
/// rejection. Callers must not treat these as a negative admission.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The external tool could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the external tool to finish failed.
    #[error("failed waiting for {tool}: {source}")]
    Wait {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully.
    #[error("{tool} exited with {status}: {stderr}")]
    ExitStatus {
        tool: PathBuf,
        status: String,
        stderr: String,
    },

    /// The external tool did not finish within the configured limit.
    #[error("{tool} timed out after {duration:?}")]
    Timeout { tool: PathBuf, duration: Duration },

    /// The tool's output was unusable (non UTF-8, empty).
    #[error("unusable output from {tool}: {reason}")]
    InvalidOutput { tool: PathBuf, reason: String },

    /// The candidate path could not be inspected.
    #[error("cannot classify {path}: {source}")]
    Candidate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for gate results.
pub type GateResult<T> = Result<T, GateError>;
