//! Import and export of rexdd decision diagrams
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "dot")]
pub mod dot;
#[cfg(feature = "exchange")]
pub mod exchange;
