//! Error types surfaced at the API boundary

use std::fmt;

use crate::Level;

/// Errors reported by forest construction and operators.
///
/// Internal invariant violations (child level at or above the parent level,
/// dangling handles, rule inconsistencies) are bugs and trip debug
/// assertions instead of being reported through this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DdError {
    /// The forest descriptor is inconsistent (e.g. an identity rule in a
    /// set forest, or a modular encoding without a modulus)
    Config(&'static str),
    /// The node arena of a level has no more representable handles
    NodesExhausted {
        /// Level whose arena overflowed
        level: Level,
    },
    /// The operation cache cannot grow further
    CacheExhausted,
    /// The requested operator is not defined for this forest family
    IncompatibleOperation(&'static str),
    /// An assignment vector does not match the number of forest variables
    AssignmentLength {
        /// Number of variables in the forest
        expected: usize,
        /// Length of the assignment that was passed
        got: usize,
    },
    /// A terminal or edge value lies outside the forest's range
    ValueOutOfRange,
    /// A variable index is not part of the forest's domain
    InvalidVariable(usize),
}

impl fmt::Display for DdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdError::Config(msg) => write!(f, "inconsistent forest configuration: {msg}"),
            DdError::NodesExhausted { level } => {
                write!(f, "node store exhausted at level {level}")
            }
            DdError::CacheExhausted => write!(f, "operation cache cannot be enlarged"),
            DdError::IncompatibleOperation(msg) => {
                write!(f, "operation not applicable to this forest: {msg}")
            }
            DdError::AssignmentLength { expected, got } => {
                write!(f, "assignment has {got} entries, forest has {expected} variables")
            }
            DdError::ValueOutOfRange => write!(f, "value outside the forest range"),
            DdError::InvalidVariable(i) => write!(f, "variable index {i} out of range"),
        }
    }
}

impl std::error::Error for DdError {}

/// Result type of fallible forest operations
pub type DdResult<T> = Result<T, DdError>;
