use docstash_gate::Admission;
use docstash_types::{ObjectId, PlacementResult};
use serde::{Deserialize, Serialize};

/// Result of a `put`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PutOutcome {
    /// The object is in the store, either newly written or already present.
    Stored(PlacementResult),
    /// The admission filter rejected the candidate; nothing was hashed or
    /// stored.
    Skipped { admission: Admission },
}

impl PutOutcome {
    pub fn placement(&self) -> Option<&PlacementResult> {
        match self {
            Self::Stored(placement) => Some(placement),
            Self::Skipped { .. } => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }

    pub fn is_duplicate(&self) -> bool {
        self.placement().is_some_and(|p| p.is_duplicate)
    }
}

/// What a `delete` actually removed.
///
/// Only returned when at least one side held the digest; a digest unknown to
/// both stores is an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub id: ObjectId,
    pub removed_object: bool,
    pub removed_record: bool,
}

impl DeleteReport {
    /// `true` if the two stores agreed about the digest before the delete.
    pub fn was_consistent(&self) -> bool {
        self.removed_object == self.removed_record
    }
}
