//! Metadata index for docstash.
//!
//! Maps each stored object's primary digest to its secondary digests and the
//! time it was first indexed. The index is independent of the content store:
//! nothing ties a record to a file on disk except the digest itself.
//!
//! # Key Types
//!
//! - [`MetadataIndex`] -- The index contract (upsert, get, delete, count)
//! - [`SqliteIndex`] -- SQLite-backed index, one connection per call
//! - [`InMemoryIndex`] -- `BTreeMap`-backed index for tests and embedding
//! - [`ConnectionString`] -- Parsed `sqlite:///path` connection string

pub mod connection;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use connection::ConnectionString;
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryIndex;
pub use sqlite::{create_schema, SqliteIndex, TABLE_NAME};
pub use traits::MetadataIndex;
