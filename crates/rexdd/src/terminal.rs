//! Terminal values and the special sentinels

use std::fmt;

/// Reserved terminal sentinels beyond ordinary numeric constants
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum Special {
    /// Positive infinity
    PosInf = 0,
    /// Negative infinity
    NegInf = 1,
    /// Undefined (partial functions)
    Undef = 2,
    /// The neutral terminal of edge-valued forests; the incoming edge value
    /// carries the actual function value
    Omega = 3,
}

impl Special {
    pub(crate) fn from_bits(bits: u32) -> Special {
        match bits {
            0 => Special::PosInf,
            1 => Special::NegInf,
            2 => Special::Undef,
            _ => Special::Omega,
        }
    }
}

impl fmt::Display for Special {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Special::PosInf => f.write_str("+inf"),
            Special::NegInf => f.write_str("-inf"),
            Special::Undef => f.write_str("undef"),
            Special::Omega => f.write_str("omega"),
        }
    }
}

/// A function value: a numeric constant or a special sentinel
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
    /// Integer constant
    Int(i64),
    /// Floating-point constant
    Float(f64),
    /// Special sentinel
    Special(Special),
}

impl Value {
    /// Integer zero
    pub const ZERO: Value = Value::Int(0);
    /// Integer one
    pub const ONE: Value = Value::Int(1);

    /// Is this the integer (or float) zero?
    pub fn is_zero(&self) -> bool {
        matches!(self, Value::Int(0)) || matches!(self, Value::Float(v) if *v == 0.0)
    }

    /// Is this the integer (or float) one?
    pub fn is_one(&self) -> bool {
        matches!(self, Value::Int(1)) || matches!(self, Value::Float(v) if *v == 1.0)
    }

    /// The integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Is this [`Special::Undef`]?
    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Special(Special::Undef))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Int(b as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Special(s) => write!(f, "{s}"),
        }
    }
}
