//! Admission filter for docstash.
//!
//! Every candidate file passes through the filter before it is hashed or
//! stored. The filter asks two system tools about the file, a coarse type
//! detector (`file`) and a MIME resolver (`xdg-mime`), and admits office
//! suites and common document formats.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docstash_gate::{AdmissionConfig, AdmissionFilter};
//!
//! let filter = AdmissionFilter::external(AdmissionConfig::from_env());
//! let admission = filter.classify("report.pdf".as_ref()).unwrap();
//! println!("eligible: {}", admission.is_accepted());
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;

// Re-exports for convenience.
pub use classifier::{ExternalClassifier, TypeClassifier};
pub use config::{AdmissionConfig, DEFAULT_ALLOWED_MIME_TYPES, FILE_BIN_ENV, MIME_BIN_ENV};
pub use error::{GateError, GateResult};
pub use filter::{Admission, AdmissionFilter, AdmissionReason};
