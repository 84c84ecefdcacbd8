//! Reduced, shared, canonical decision diagrams over Boolean variables
//!
//! A forest stores nodes of one decision-diagram family in per-level arenas
//! with hash-consing, so structural equality is bit equality of edges. Edges
//! carry a reduction rule describing the function on skipped levels, plus
//! optional complement/swap flags and an additive edge value. The same engine
//! serves terminal-valued BDDs (sets), edge-valued BDDs (integer functions)
//! and binary matrix diagrams (relations); the family is selected at runtime
//! through a [`ForestConfig`].
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]
#![deny(unsafe_code)]

#[macro_use]
mod stats;

mod cache;
mod config;
mod edge;
mod error;
mod eval;
mod explicit;
mod forest;
mod gc;
mod node;
mod ops;
mod primes;
mod reduce;
mod roots;
mod rules;
mod store;
mod terminal;
mod unique;

pub use cache::CacheStats;
pub use config::{
    CompPolicy, Encoding, ForestConfig, MergePolicy, Predef, RangeType, SwapPolicy, ValueType,
};
pub use edge::{Edge, EdgeHandle, EdgeLabel};
pub use error::{DdError, DdResult};
pub use explicit::ExplicitFunc;
pub use forest::Forest;
pub use ops::concretize::Concretization;
pub use ops::copy::copy_into;
pub use ops::image::{post_image, pre_image};
pub use ops::saturation::{saturate_post, saturate_pre};
pub use roots::RootId;
pub use rules::{ReductionRule, RuleSet};
pub use terminal::{Special, Value};

#[cfg(feature = "statistics")]
pub use stats::print_stats;

/// Level number within a forest; level 0 is reserved for terminals.
pub type Level = u16;

/// Handle of a node within its level's arena; 0 is the null sentinel.
pub type NodeHandle = u32;
