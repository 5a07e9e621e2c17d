use docstash_types::ObjectId;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object is stored under this digest.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Depth or width of the shard layout is unusable.
    #[error("invalid shard layout: {0}")]
    InvalidLayout(String),

    /// The digest is too short to fill the shard directories and leave a
    /// file name.
    #[error("digest {id} too short for layout: need more than {required} hex characters")]
    DigestTooShort { id: ObjectId, required: usize },

    /// The requested file extension cannot be used in a file name.
    #[error("invalid extension: {0:?}")]
    InvalidExtension(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while walking the store tree.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
