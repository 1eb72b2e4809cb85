//! Constant values carried by interface objects and inlined at elaboration.

use serde::{Deserialize, Serialize};
use std::fmt;
use strata_common::{BitVector, Value};

/// A resolved compile-time constant.
///
/// Interface members that are plain values (not signals) become constants;
/// the elaborated description inlines them as literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstValue {
    /// An integer constant.
    Int(i128),
    /// A boolean constant.
    Bool(bool),
    /// A sized bit-pattern constant.
    Bits(BitVector),
    /// A string constant.
    Str(String),
}

impl ConstValue {
    /// Returns the integer interpretation of the constant, if it has one.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Bool(b) => Some(i128::from(*b)),
            ConstValue::Bits(bv) => bv.to_int(),
            ConstValue::Str(_) => None,
        }
    }

    /// Converts the constant into a signal value, if it has one.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            ConstValue::Int(v) => Some(Value::Int(*v)),
            ConstValue::Bool(b) => Some(Value::Bool(*b)),
            ConstValue::Bits(bv) => Some(Value::Bits(bv.clone())),
            ConstValue::Str(_) => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Bits(bv) => write!(f, "{}'b{bv:b}", bv.width()),
            ConstValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i128> for ConstValue {
    fn from(v: i128) -> Self {
        ConstValue::Int(v)
    }
}

impl From<i64> for ConstValue {
    fn from(v: i64) -> Self {
        ConstValue::Int(i128::from(v))
    }
}

impl From<i32> for ConstValue {
    fn from(v: i32) -> Self {
        ConstValue::Int(i128::from(v))
    }
}

impl From<bool> for ConstValue {
    fn from(b: bool) -> Self {
        ConstValue::Bool(b)
    }
}

impl From<BitVector> for ConstValue {
    fn from(bv: BitVector) -> Self {
        ConstValue::Bits(bv)
    }
}

impl From<&str> for ConstValue {
    fn from(s: &str) -> Self {
        ConstValue::Str(s.to_string())
    }
}
