//! Parsers for minterm file formats
//!
//! The only format currently supported is the PLA-like minterm list
//! described in [`minterm`]. Compressed inputs are not handled here;
//! callers stream them through an external decompressor first.
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod minterm;

pub use minterm::{parse_minterms, MintermFile, MintermOptions, MintermOptionsBuilder, ParseError};
