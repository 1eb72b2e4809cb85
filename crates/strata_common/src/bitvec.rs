//! Packed two-state bit vectors with optional integer bounds.

use crate::error::BitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr};

/// Number of bits packed per storage word.
const BITS_PER_WORD: u32 = 64;

/// A half-open integer range `[min, max)` a bounded vector must stay within.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive lower bound.
    pub min: i128,
    /// Exclusive upper bound.
    pub max: i128,
}

impl Bounds {
    /// Creates bounds, rejecting empty ranges.
    pub fn new(min: i128, max: i128) -> Result<Self, BitError> {
        if min >= max {
            return Err(BitError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Returns true if `value` lies within `[min, max)`.
    pub fn contains(&self, value: i128) -> bool {
        self.min <= value && value < self.max
    }

    /// Number of bits needed to hold every value in the range.
    ///
    /// Ranges with a negative lower bound are stored in two's complement and
    /// get a sign bit.
    pub fn width(&self) -> u32 {
        if self.min >= 0 {
            return bit_length(self.max - 1).max(1);
        }
        // -(min + 1) never overflows, even for i128::MIN.
        let negative = bit_length(-(self.min + 1)) + 1;
        if self.max <= 1 {
            negative
        } else {
            (bit_length(self.max - 1) + 1).max(negative)
        }
    }
}

/// What happens when a value outside the representable range is assigned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Overflow {
    /// Out-of-range assignments are rejected with [`BitError::OutOfBounds`].
    #[default]
    Checked,
    /// Assignments are masked to the vector width, discarding high bits.
    Wrap,
}

/// A fixed-width two-state bit vector.
///
/// Bits are packed 64 per `u64` word, least-significant bit first. A vector
/// may carry explicit [`Bounds`]; a vector whose lower bound is negative is
/// signed and stored in two's complement. Without explicit bounds the vector
/// is unsigned and its range is `[0, 2^width)`.
///
/// Equality and hashing consider only the width and the bit pattern.
#[derive(Clone, Serialize, Deserialize)]
pub struct BitVector {
    width: u32,
    data: Vec<u64>,
    bounds: Option<Bounds>,
    overflow: Overflow,
}

impl BitVector {
    /// Creates an unsigned, range-checked vector of the given width, all zero.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            data: vec![0; word_count(width)],
            bounds: None,
            overflow: Overflow::Checked,
        }
    }

    /// Creates a modulo vector of the given width, all zero.
    ///
    /// Assignments to a wrapping vector mask to `width` bits instead of
    /// failing.
    pub fn wrapping(width: u32) -> Self {
        Self {
            overflow: Overflow::Wrap,
            ..Self::new(width)
        }
    }

    /// Creates a vector constrained to `[min, max)` holding `value`.
    ///
    /// The width is derived from the bounds.
    pub fn bounded(value: i128, min: i128, max: i128) -> Result<Self, BitError> {
        let bounds = Bounds::new(min, max)?;
        let mut v = Self {
            bounds: Some(bounds),
            ..Self::new(bounds.width())
        };
        v.assign(value)?;
        Ok(v)
    }

    /// Creates an unsigned vector of `width` bits holding `value`.
    pub fn from_int(value: i128, width: u32) -> Result<Self, BitError> {
        let mut v = Self::new(width);
        v.assign(value)?;
        Ok(v)
    }

    /// Creates a signed two's-complement vector of `width` bits holding `value`.
    pub fn from_signed(value: i128, width: u32) -> Result<Self, BitError> {
        if width == 0 || width > 127 {
            return Err(BitError::Unrepresentable { width });
        }
        let half = 1i128 << (width - 1);
        Self::bounded(value, -half, half)
    }

    /// Creates a single-bit vector from a boolean.
    pub fn from_bool(value: bool) -> Self {
        let mut v = Self::new(1);
        v.set(0, value);
        v
    }

    /// Creates an unsigned vector from a `u64`, ignoring bits beyond `width`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 != 0 {
                v.set(i, true);
            }
        }
        v
    }

    /// Parses a binary string such as `"10"` into an unsigned vector.
    ///
    /// The leftmost character is the most significant bit. Underscores are
    /// ignored. Returns `None` on any other character or an empty string.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let digits: Vec<char> = s.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return None;
        }
        let mut v = Self::new(digits.len() as u32);
        for (i, c) in digits.iter().rev().enumerate() {
            match c {
                '0' => {}
                '1' => v.set(i as u32, true),
                _ => return None,
            }
        }
        Some(v)
    }

    /// Returns the number of bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the overflow behaviour of this vector.
    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Returns true if the vector is stored in two's complement.
    pub fn is_signed(&self) -> bool {
        self.bounds.is_some_and(|b| b.min < 0)
    }

    /// Returns the effective bounds: explicit ones, or `[0, 2^width)`.
    ///
    /// Returns `None` for unbounded vectors too wide for the implicit range to
    /// be expressed as an `i128`.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds.or_else(|| {
            (self.width <= 126).then(|| Bounds {
                min: 0,
                max: 1i128 << self.width,
            })
        })
    }

    /// Gets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = (index / BITS_PER_WORD) as usize;
        (self.data[word] >> (index % BITS_PER_WORD)) & 1 != 0
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = (index / BITS_PER_WORD) as usize;
        let mask = 1u64 << (index % BITS_PER_WORD);
        if value {
            self.data[word] |= mask;
        } else {
            self.data[word] &= !mask;
        }
    }

    /// Sets every bit in `[lo, hi)` to `value`, clamped to the width.
    pub fn set_range(&mut self, lo: u32, hi: u32, value: bool) {
        for i in lo..hi.min(self.width) {
            self.set(i, value);
        }
    }

    /// Returns the bit at `index`, or a range error.
    pub fn bit(&self, index: u32) -> Result<bool, BitError> {
        if index >= self.width {
            return Err(BitError::Index {
                index,
                width: self.width,
            });
        }
        Ok(self.get(index))
    }

    /// Returns true if all bits are zero.
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|w| *w == 0)
    }

    /// Returns true if all bits are one.
    pub fn is_all_one(&self) -> bool {
        (0..self.width).all(|i| self.get(i))
    }

    /// Returns true if any bit is set in both vectors.
    pub fn overlaps(&self, other: &BitVector) -> bool {
        !(self & other).is_all_zero()
    }

    /// Interprets the bits as an integer, sign-extending signed vectors.
    ///
    /// Returns `None` if the value does not fit in an `i128`.
    pub fn to_int(&self) -> Option<i128> {
        if self.data.iter().skip(2).any(|w| *w != 0) {
            return None;
        }
        let lo = self.data.first().copied().unwrap_or(0) as u128;
        let hi = self.data.get(1).copied().unwrap_or(0) as u128;
        let raw = lo | (hi << 64);
        if self.is_signed() && self.width > 0 && self.width <= 128 {
            let shift = 128 - self.width;
            Some(((raw << shift) as i128) >> shift)
        } else {
            i128::try_from(raw).ok()
        }
    }

    /// Interprets the bits as a `u64`, if the value is non-negative and fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_int().and_then(|v| u64::try_from(v).ok())
    }

    /// Stores `value`, checking it against the bounds or masking it.
    pub fn assign(&mut self, value: i128) -> Result<(), BitError> {
        if self.overflow == Overflow::Checked {
            match self.bounds() {
                Some(b) if !b.contains(value) => {
                    return Err(BitError::OutOfBounds {
                        value,
                        min: b.min,
                        max: b.max,
                    })
                }
                None if value < 0 => {
                    return Err(BitError::OutOfBounds {
                        value,
                        min: 0,
                        max: i128::MAX,
                    })
                }
                _ => {}
            }
        }
        let sign = value < 0;
        for i in 0..self.width {
            let bit = if i < 128 { (value >> i) & 1 != 0 } else { sign };
            self.set(i, bit);
        }
        Ok(())
    }

    /// Returns a copy with the same width and bounds holding `value`.
    pub fn with_int(&self, value: i128) -> Result<BitVector, BitError> {
        let mut out = self.clone();
        out.assign(value)?;
        Ok(out)
    }

    /// Returns a copy with the same width and bounds holding the value of `other`.
    ///
    /// Vectors of identical shape are copied bit for bit; otherwise the
    /// integer value is transferred and range-checked.
    pub fn with_value_of(&self, other: &BitVector) -> Result<BitVector, BitError> {
        if other.width == self.width && other.is_signed() == self.is_signed() {
            let mut out = self.clone();
            out.data.clone_from(&other.data);
            out.check_bounds()?;
            return Ok(out);
        }
        let value = other.to_int().ok_or(BitError::Unrepresentable {
            width: other.width,
        })?;
        self.with_int(value)
    }

    /// Extracts bits `[lo, hi)` as a new unsigned vector of width `hi - lo`.
    pub fn slice(&self, hi: u32, lo: u32) -> Result<BitVector, BitError> {
        if hi <= lo || hi > self.width {
            return Err(BitError::Range {
                hi,
                lo,
                width: self.width,
            });
        }
        let mut out = Self::new(hi - lo);
        for i in lo..hi {
            if self.get(i) {
                out.set(i - lo, true);
            }
        }
        Ok(out)
    }

    /// Returns a copy with bits `[lo, lo + src.width())` replaced by `src`.
    ///
    /// All other bits are preserved. The result is checked against this
    /// vector's bounds.
    pub fn splice(&self, lo: u32, src: &BitVector) -> Result<BitVector, BitError> {
        let hi = lo.saturating_add(src.width);
        if src.width == 0 || hi > self.width {
            return Err(BitError::Range {
                hi,
                lo,
                width: self.width,
            });
        }
        let mut out = self.clone();
        for i in 0..src.width {
            out.set(lo + i, src.get(i));
        }
        out.check_bounds()?;
        Ok(out)
    }

    /// Concatenates vectors, the first part occupying the most-significant bits.
    pub fn concat(parts: &[BitVector]) -> Result<BitVector, BitError> {
        if parts.is_empty() {
            return Err(BitError::EmptyConcat);
        }
        let width = parts.iter().map(|p| p.width).sum();
        let mut out = Self::new(width);
        let mut offset = width;
        for part in parts {
            offset -= part.width;
            for i in 0..part.width {
                if part.get(i) {
                    out.set(offset + i, true);
                }
            }
        }
        Ok(out)
    }

    fn check_bounds(&self) -> Result<(), BitError> {
        if self.overflow == Overflow::Wrap {
            return Ok(());
        }
        if let Some(b) = self.bounds {
            let value = self.to_int().ok_or(BitError::Unrepresentable { width: self.width })?;
            if !b.contains(value) {
                return Err(BitError::OutOfBounds {
                    value,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.data == other.data
    }
}

impl Eq for BitVector {}

impl Hash for BitVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.data.hash(state);
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_int() {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "{self:b}"),
        }
    }
}

impl fmt::Binary for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector({}'b{self:b})", self.width)
    }
}

impl BitAnd for &BitVector {
    type Output = BitVector;

    fn bitand(self, rhs: Self) -> BitVector {
        assert_eq!(self.width, rhs.width, "BitVector width mismatch in AND");
        let mut result = BitVector::wrapping(self.width);
        for (out, (a, b)) in result.data.iter_mut().zip(self.data.iter().zip(&rhs.data)) {
            *out = a & b;
        }
        result
    }
}

impl BitOr for &BitVector {
    type Output = BitVector;

    fn bitor(self, rhs: Self) -> BitVector {
        assert_eq!(self.width, rhs.width, "BitVector width mismatch in OR");
        let mut result = BitVector::wrapping(self.width);
        for (out, (a, b)) in result.data.iter_mut().zip(self.data.iter().zip(&rhs.data)) {
            *out = a | b;
        }
        result
    }
}

/// Returns the number of u64 words needed to store `width` bits.
fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}

/// Number of significant bits in a non-negative integer.
fn bit_length(value: i128) -> u32 {
    debug_assert!(value >= 0);
    128 - value.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero() {
        let v = BitVector::new(8);
        assert_eq!(v.width(), 8);
        assert!(v.is_all_zero());
        assert_eq!(v.to_int(), Some(0));
    }

    #[test]
    fn int_roundtrip_unsigned() {
        for width in [1u32, 3, 8, 63, 64, 65, 100] {
            for value in [0i128, 1, 5] {
                if value >= 1i128 << width.min(126) {
                    continue;
                }
                let v = BitVector::from_int(value, width).unwrap();
                assert_eq!(v.to_int(), Some(value), "width {width}");
                assert_eq!(BitVector::from_int(v.to_int().unwrap(), width).unwrap(), v);
            }
        }
    }

    #[test]
    fn int_roundtrip_signed() {
        for value in [-8i128, -1, 0, 3, 7] {
            let v = BitVector::from_signed(value, 4).unwrap();
            assert!(v.is_signed());
            assert_eq!(v.to_int(), Some(value));
        }
    }

    #[test]
    fn bounded_widths() {
        assert_eq!(BitVector::bounded(0, -8, 8).unwrap().width(), 4);
        assert_eq!(BitVector::bounded(0, -4, 4).unwrap().width(), 3);
        assert_eq!(BitVector::bounded(3, -5000, 5000).unwrap().width(), 14);
        assert_eq!(BitVector::bounded(4, -200, 200).unwrap().width(), 9);
        assert_eq!(BitVector::bounded(0, 0, 1).unwrap().width(), 1);
        assert_eq!(BitVector::bounded(0, 0, 256).unwrap().width(), 8);
        assert_eq!(BitVector::bounded(-1, -4, 0).unwrap().width(), 3);
    }

    #[test]
    fn bounded_rejects_out_of_range() {
        let err = BitVector::bounded(8, -8, 8).unwrap_err();
        assert_eq!(
            err,
            BitError::OutOfBounds {
                value: 8,
                min: -8,
                max: 8
            }
        );
        assert!(matches!(
            BitVector::bounded(0, 4, 4),
            Err(BitError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn checked_assign_rejects_overflow() {
        let mut v = BitVector::new(3);
        assert!(v.assign(7).is_ok());
        assert!(matches!(v.assign(8), Err(BitError::OutOfBounds { .. })));
        assert!(matches!(v.assign(-1), Err(BitError::OutOfBounds { .. })));
        // Failed assignment leaves the old value.
        assert_eq!(v.to_int(), Some(7));
    }

    #[test]
    fn wrapping_assign_masks() {
        let mut v = BitVector::wrapping(4);
        v.assign(0x1F).unwrap();
        assert_eq!(v.to_int(), Some(0xF));
        v.assign(-1).unwrap();
        assert_eq!(v.to_int(), Some(0xF));
    }

    #[test]
    fn slice_extracts_bits() {
        let s = BitVector::from_int(0b1011_0011, 8).unwrap();
        assert_eq!(s.slice(8, 5).unwrap().to_int(), Some(0b101));
        assert_eq!(s.slice(5, 2).unwrap().to_int(), Some(0b100));
        assert_eq!(s.slice(2, 0).unwrap().to_int(), Some(0b11));
        assert_eq!(s.slice(2, 0).unwrap().width(), 2);
    }

    #[test]
    fn slice_out_of_range() {
        let s = BitVector::new(8);
        assert!(matches!(s.slice(9, 5), Err(BitError::Range { .. })));
        assert!(matches!(s.slice(3, 3), Err(BitError::Range { .. })));
        assert!(matches!(s.slice(2, 5), Err(BitError::Range { .. })));
    }

    #[test]
    fn bit_index() {
        let s = BitVector::from_int(0b100, 3).unwrap();
        assert!(s.bit(2).unwrap());
        assert!(!s.bit(0).unwrap());
        assert_eq!(s.bit(3), Err(BitError::Index { index: 3, width: 3 }));
    }

    #[test]
    fn splice_preserves_other_bits() {
        let s = BitVector::from_int(0b1111_0000, 8).unwrap();
        let part = BitVector::from_int(0b01, 2).unwrap();
        let out = s.splice(3, &part).unwrap();
        assert_eq!(format!("{out:b}"), "11101000");
    }

    #[test]
    fn splice_checks_bounds() {
        let s = BitVector::bounded(0, 0, 5).unwrap();
        let part = BitVector::from_int(0b111, 3).unwrap();
        assert!(matches!(
            s.splice(0, &part),
            Err(BitError::OutOfBounds { value: 7, .. })
        ));
    }

    #[test]
    fn concat_msb_first() {
        let a = BitVector::from_int(0b101, 3).unwrap();
        let b = BitVector::from_bool(false);
        let c = BitVector::from_int(0b11, 2).unwrap();
        let r = BitVector::concat(&[a, b, c]).unwrap();
        assert_eq!(r.width(), 6);
        assert_eq!(format!("{r:b}"), "101011");
    }

    #[test]
    fn concat_is_associative() {
        let a = BitVector::from_int(0b1, 2).unwrap();
        let b = BitVector::from_int(0b110, 3).unwrap();
        let c = BitVector::from_int(0b1001, 4).unwrap();
        let left =
            BitVector::concat(&[BitVector::concat(&[a.clone(), b.clone()]).unwrap(), c.clone()])
                .unwrap();
        let right = BitVector::concat(&[a, BitVector::concat(&[b, c]).unwrap()]).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn concat_empty_fails() {
        assert_eq!(BitVector::concat(&[]), Err(BitError::EmptyConcat));
    }

    #[test]
    fn from_binary_str() {
        let v = BitVector::from_binary_str("10").unwrap();
        assert_eq!(v.width(), 2);
        assert_eq!(v.to_int(), Some(2));
        assert_eq!(BitVector::from_binary_str("0").unwrap().width(), 1);
        assert!(BitVector::from_binary_str("1x").is_none());
        assert!(BitVector::from_binary_str("").is_none());
    }

    #[test]
    fn wide_vectors_span_words() {
        let mut v = BitVector::new(130);
        v.set(0, true);
        v.set(129, true);
        assert!(v.get(129));
        assert_eq!(v.to_int(), None);
        v.set(129, false);
        assert_eq!(v.to_int(), Some(1));
    }

    #[test]
    fn equality_ignores_bounds() {
        let a = BitVector::bounded(3, 0, 5).unwrap();
        let b = BitVector::from_int(3, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn with_value_of_transfers_integer() {
        let target = BitVector::bounded(0, -8, 8).unwrap();
        let src = BitVector::from_int(3, 2).unwrap();
        assert_eq!(target.with_value_of(&src).unwrap().to_int(), Some(3));
        let too_big = BitVector::from_int(12, 4).unwrap();
        assert!(target.with_value_of(&too_big).is_err());
    }

    #[test]
    fn overlaps_and_or() {
        let mut a = BitVector::wrapping(8);
        a.set_range(0, 3, true);
        let mut b = BitVector::wrapping(8);
        b.set_range(3, 6, true);
        assert!(!a.overlaps(&b));
        let merged = &a | &b;
        assert_eq!(merged.to_int(), Some(0b11_1111));
        assert!(merged.overlaps(&a));
    }

    #[test]
    fn display_and_debug() {
        let v = BitVector::from_int(42, 8).unwrap();
        assert_eq!(v.to_string(), "42");
        assert_eq!(format!("{v:?}"), "BitVector(8'b00101010)");
        let n = BitVector::from_signed(-3, 4).unwrap();
        assert_eq!(n.to_string(), "-3");
    }

    #[test]
    fn serde_roundtrip() {
        let v = BitVector::bounded(-3, -8, 8).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: BitVector = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
        assert_eq!(back.to_int(), Some(-3));
    }
}
