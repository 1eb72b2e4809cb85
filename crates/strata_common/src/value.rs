//! The value carried by a simulation signal.

use crate::bitvec::BitVector;
use crate::error::BitError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signal value.
///
/// `HighZ` is the "not driving" sentinel used by tristate drivers and by a
/// tristate bus that no driver currently asserts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// A single boolean bit.
    Bool(bool),
    /// A fixed-width, possibly bounded, bit vector.
    Bits(BitVector),
    /// An integer without a declared width.
    Int(i128),
    /// High impedance over the given number of bits.
    HighZ(u32),
}

impl Value {
    /// Returns the bit width, or `None` for unsized integers.
    pub fn width(&self) -> Option<u32> {
        match self {
            Value::Bool(_) => Some(1),
            Value::Bits(bv) => Some(bv.width()),
            Value::Int(_) => None,
            Value::HighZ(w) => Some(*w),
        }
    }

    /// Returns the integer interpretation, or `None` for `HighZ` and
    /// vectors too wide for an `i128`.
    pub fn to_int(&self) -> Option<i128> {
        match self {
            Value::Bool(b) => Some(i128::from(*b)),
            Value::Bits(bv) => bv.to_int(),
            Value::Int(v) => Some(*v),
            Value::HighZ(_) => None,
        }
    }

    /// Returns true for any non-zero driven value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Bits(bv) => !bv.is_all_zero(),
            Value::Int(v) => *v != 0,
            Value::HighZ(_) => false,
        }
    }

    /// Returns true for the high-impedance sentinel.
    pub fn is_high_z(&self) -> bool {
        matches!(self, Value::HighZ(_))
    }

    /// Returns the bit vector, if this value is one.
    pub fn as_bits(&self) -> Option<&BitVector> {
        match self {
            Value::Bits(bv) => Some(bv),
            _ => None,
        }
    }

    /// Converts a sized value into a bit vector.
    pub fn to_bit_vector(&self) -> Result<BitVector, BitError> {
        match self {
            Value::Bool(b) => Ok(BitVector::from_bool(*b)),
            Value::Bits(bv) => Ok(bv.clone()),
            Value::Int(v) => Err(BitError::Unsized(format!("integer {v}"))),
            Value::HighZ(w) => Err(BitError::Incompatible {
                from: format!("high impedance ({w} bits)"),
                to: "bit vector".into(),
            }),
        }
    }

    /// Concatenates sized values, the first part occupying the most-significant bits.
    pub fn concat(parts: &[Value]) -> Result<BitVector, BitError> {
        let vectors = parts
            .iter()
            .map(Value::to_bit_vector)
            .collect::<Result<Vec<_>, _>>()?;
        BitVector::concat(&vectors)
    }

    /// Converts `self` to the shape of `template`, range-checking the result.
    ///
    /// Booleans accept 0/1 and single-bit vectors; bit vectors keep the
    /// template's width, bounds and overflow mode; unsized integers accept any
    /// value with an integer interpretation.
    pub fn coerce_to(&self, template: &Value) -> Result<Value, BitError> {
        match (template, self) {
            (Value::Bool(_), Value::Bool(b)) => Ok(Value::Bool(*b)),
            (Value::Bool(_), other) => match other.to_int() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                Some(value) => Err(BitError::OutOfBounds {
                    value,
                    min: 0,
                    max: 2,
                }),
                None => Err(incompatible(other, template)),
            },
            (Value::Bits(t), Value::Bits(src)) => Ok(Value::Bits(t.with_value_of(src)?)),
            (Value::Bits(t), other) => {
                let value = other.to_int().ok_or_else(|| incompatible(other, template))?;
                Ok(Value::Bits(t.with_int(value)?))
            }
            (Value::Int(_), other) => {
                let value = other.to_int().ok_or_else(|| incompatible(other, template))?;
                Ok(Value::Int(value))
            }
            (Value::HighZ(_), other) => Err(incompatible(other, template)),
        }
    }

    fn kind_name(&self) -> String {
        match self {
            Value::Bool(_) => "bool".into(),
            Value::Bits(bv) => format!("{}-bit vector", bv.width()),
            Value::Int(_) => "integer".into(),
            Value::HighZ(w) => format!("high impedance ({w} bits)"),
        }
    }
}

fn incompatible(from: &Value, to: &Value) -> BitError {
    BitError::Incompatible {
        from: from.kind_name(),
        to: to.kind_name(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", u8::from(*b)),
            Value::Bits(bv) => write!(f, "{bv}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::HighZ(_) => write!(f, "None"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BitVector> for Value {
    fn from(bv: BitVector) -> Self {
        Value::Bits(bv)
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i128::from(v))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i128)
    }
}
