//! Foundation types for docstash.
//!
//! This crate provides the identity and record types shared by every other
//! docstash crate.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (hex primary digest)
//! - [`DigestAlgorithm`] -- Supported hash algorithms
//! - [`DigestSet`] -- Digests of one byte sequence under several algorithms
//! - [`MetadataRecord`] -- Indexed digests of a stored object
//! - [`PlacementResult`] -- Where `put` placed an object
//! - [`ConsistencyReport`] -- Object counts of the two stores, compared

pub mod digest;
pub mod error;
pub mod object;
pub mod record;

pub use digest::{DigestAlgorithm, DigestSet};
pub use error::TypeError;
pub use object::ObjectId;
pub use record::{ConsistencyReport, MetadataRecord, PlacementResult};
