//! Content-addressed file storage for docstash.
//!
//! Objects are plain files in a sharded directory tree. The path of an object
//! is derived from its primary digest: the leading hex characters are split
//! into `depth` directories of `width` characters each, and the rest of the
//! digest (plus an optional extension) is the file name.
//!
//! ```text
//! depth = 3, width = 2
//! abcdef0123...  ->  ab/cd/ef/0123...
//! ```
//!
//! # Design Rules
//!
//! 1. At most one physical copy per primary digest.
//! 2. Writes go to a temporary file in the target directory and are linked
//!    into place with a no-clobber rename; losing a race is a duplicate,
//!    never a corrupted file.
//! 3. Deleting an object prunes the shard directories it leaves empty.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod layout;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use layout::ShardLayout;
pub use traits::ContentStore;
