//! Digest engine for docstash.
//!
//! Reads a byte source once, in bounded chunks, and feeds every chunk to all
//! requested hash algorithms at the same time. An N-algorithm digest costs one
//! read pass, not N.
//!
//! All hashing wraps established libraries (RustCrypto, BLAKE3); there is no custom
//! cryptography.

pub mod engine;
pub mod error;
pub mod hasher;

pub use engine::{DigestEngine, DEFAULT_CHUNK_SIZE};
pub use error::{DigestError, DigestResult};
pub use hasher::MultiHasher;
