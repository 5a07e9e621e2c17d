use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{ExternalClassifier, TypeClassifier};
use crate::config::AdmissionConfig;
use crate::error::{GateError, GateResult};

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Why a candidate was admitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AdmissionReason {
    /// The coarse detector reported a legacy office format.
    LegacyOffice { description: String },
    /// The MIME resolver reported an allow-listed type.
    AllowedMime { mime_type: String },
    /// The filter runs in permissive mode.
    Permissive,
}

/// Outcome of classifying a candidate file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Admission {
    Accepted(AdmissionReason),
    Rejected { mime_type: String },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

// ---------------------------------------------------------------------------
// AdmissionFilter
// ---------------------------------------------------------------------------

/// Decides whether a candidate file is a document worth storing.
///
/// Two stages, in order:
/// 1. The coarse detector's description; a match on the legacy prefix admits
///    immediately.
/// 2. The MIME resolver's answer, admitted only if on the allow-list.
///
/// Classification failures surface as [`GateError`], never as a rejection.
pub struct AdmissionFilter {
    classifier: Box<dyn TypeClassifier>,
    config: AdmissionConfig,
}

impl AdmissionFilter {
    pub fn new(classifier: Box<dyn TypeClassifier>, config: AdmissionConfig) -> Self {
        Self { classifier, config }
    }

    /// Filter backed by the external tools named in `config`.
    pub fn external(config: AdmissionConfig) -> Self {
        let classifier = ExternalClassifier::from_config(&config);
        Self::new(Box::new(classifier), config)
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Classify the file at `path`.
    pub fn classify(&self, path: &Path) -> GateResult<Admission> {
        let meta = std::fs::metadata(path).map_err(|source| GateError::Candidate {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(GateError::Candidate {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        if self.config.permissive {
            return Ok(Admission::Accepted(AdmissionReason::Permissive));
        }

        let description = self.classifier.describe(path)?;
        if description.starts_with(&self.config.legacy_prefix) {
            debug!(path = %path.display(), %description, "admitted by description");
            return Ok(Admission::Accepted(AdmissionReason::LegacyOffice { description }));
        }

        let mime_type = self.classifier.mime_type(path)?;
        let admission = if self.config.allows(&mime_type) {
            Admission::Accepted(AdmissionReason::AllowedMime { mime_type })
        } else {
            Admission::Rejected { mime_type }
        };
        debug!(path = %path.display(), ?admission, "classified");
        Ok(admission)
    }

    /// Boolean form of [`Self::classify`].
    pub fn is_eligible(&self, path: &Path) -> GateResult<bool> {
        Ok(self.classify(path)?.is_accepted())
    }
}

impl std::fmt::Debug for AdmissionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionFilter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
