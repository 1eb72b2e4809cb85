//! Signal views: non-owning aliases over backing signals.
//!
//! A view owns no time or scheduling state. Every read recomputes from the
//! committed values of the backing signals; slice writes become
//! read-modify-write updates of the backing signal's pending value.

use strata_common::{BitError, BitVector, Value};
use strata_ir::{BusId, SignalId, SignalRef};

use crate::error::SimError;
use crate::signal::{SignalTable, Writer};

/// Anything a process can read a value from.
pub trait SignalSource {
    /// Computes the current value from committed signal state.
    fn read(&self, signals: &SignalTable) -> Result<Value, SimError>;

    /// The backing signals a change of this source depends on.
    fn sensitivity(&self, signals: &SignalTable) -> Vec<SignalId>;

    /// Describes the source as an expression over backing signals.
    fn to_ref(&self, signals: &SignalTable) -> SignalRef;
}

/// Anything a process can write a value to.
pub trait SignalSink {
    /// Stores `value` as a pending write on behalf of `writer`.
    fn write(&self, signals: &mut SignalTable, value: Value, writer: Writer)
        -> Result<(), SimError>;
}

impl SignalSource for SignalId {
    fn read(&self, signals: &SignalTable) -> Result<Value, SimError> {
        signals.value(*self).cloned()
    }

    fn sensitivity(&self, _signals: &SignalTable) -> Vec<SignalId> {
        vec![*self]
    }

    fn to_ref(&self, _signals: &SignalTable) -> SignalRef {
        SignalRef::Signal(*self)
    }
}

impl SignalSink for SignalId {
    fn write(&self, signals: &mut SignalTable, value: Value, writer: Writer) -> Result<(), SimError> {
        signals.write(*self, value, writer)
    }
}

/// A contiguous bit range `[lo, hi)` of one backing bit-vector signal.
///
/// A view created for a single bit index reads as a boolean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceView {
    signal: SignalId,
    hi: u32,
    lo: u32,
    single_bit: bool,
}

impl SliceView {
    /// Creates a slice view, checking the range against the backing signal.
    pub fn new(signals: &SignalTable, signal: SignalId, hi: u32, lo: u32) -> Result<Self, SimError> {
        let width = backing_width(signals, signal)?;
        if hi <= lo || hi > width {
            return Err(BitError::Range { hi, lo, width }.into());
        }
        Ok(Self {
            signal,
            hi,
            lo,
            single_bit: false,
        })
    }

    /// Creates a single-bit view of bit `index`.
    pub fn bit(signals: &SignalTable, signal: SignalId, index: u32) -> Result<Self, SimError> {
        let width = backing_width(signals, signal)?;
        if index >= width {
            return Err(BitError::Index { index, width }.into());
        }
        Ok(Self {
            signal,
            hi: index + 1,
            lo: index,
            single_bit: true,
        })
    }

    /// The backing signal.
    pub fn signal(&self) -> SignalId {
        self.signal
    }

    /// The exclusive upper bit index.
    pub fn hi(&self) -> u32 {
        self.hi
    }

    /// The inclusive lower bit index.
    pub fn lo(&self) -> u32 {
        self.lo
    }

    /// Width of the view in bits.
    pub fn width(&self) -> u32 {
        self.hi - self.lo
    }

    /// Returns true for a view made with [`SliceView::bit`].
    pub fn is_single_bit(&self) -> bool {
        self.single_bit
    }

    fn read_bits(&self, signals: &SignalTable) -> Result<BitVector, SimError> {
        let backing = bits_of(signals, self.signal)?;
        Ok(backing.slice(self.hi, self.lo)?)
    }
}

impl SignalSource for SliceView {
    fn read(&self, signals: &SignalTable) -> Result<Value, SimError> {
        if self.single_bit {
            return Ok(Value::Bool(bits_of(signals, self.signal)?.bit(self.lo)?));
        }
        Ok(Value::Bits(self.read_bits(signals)?))
    }

    fn sensitivity(&self, _signals: &SignalTable) -> Vec<SignalId> {
        vec![self.signal]
    }

    fn to_ref(&self, _signals: &SignalTable) -> SignalRef {
        SignalRef::Slice {
            signal: self.signal,
            high: self.hi - 1,
            low: self.lo,
        }
    }
}

impl SignalSink for SliceView {
    fn write(&self, signals: &mut SignalTable, value: Value, writer: Writer) -> Result<(), SimError> {
        let src = fit_to_width(&value, self.width())?;
        signals.write_slice(self.signal, self.lo, &src, writer)
    }
}

/// Converts a value written through a slice into exactly `width` bits.
///
/// Same-width vectors are copied bit for bit. Anything else must have an
/// integer value in `[-2^width, 2^width)`; negative values are stored in
/// two's complement.
fn fit_to_width(value: &Value, width: u32) -> Result<BitVector, SimError> {
    if let Value::Bits(bv) = value {
        if bv.width() == width {
            let mut out = BitVector::new(width);
            for i in 0..width {
                out.set(i, bv.get(i));
            }
            return Ok(out);
        }
    }
    let v = value.to_int().ok_or_else(|| BitError::Incompatible {
        from: value.to_string(),
        to: format!("{width}-bit slice"),
    })?;
    if width < 127 {
        let lim = 1i128 << width;
        if v >= lim || v < -lim {
            return Err(BitError::OutOfBounds {
                value: v,
                min: -lim,
                max: lim,
            }
            .into());
        }
    }
    Ok(BitVector::wrapping(width).with_int(v)?)
}

fn bits_of(signals: &SignalTable, signal: SignalId) -> Result<&BitVector, SimError> {
    let state = signals.get(signal)?;
    state
        .current
        .as_bits()
        .ok_or_else(|| SimError::InvalidSignal {
            reason: format!("'{}' is not a bit vector and cannot be sliced", state.name),
        })
}

fn backing_width(signals: &SignalTable, signal: SignalId) -> Result<u32, SimError> {
    Ok(bits_of(signals, signal)?.width())
}

/// One element of a concatenation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConcatPart {
    /// A whole boolean or bit-vector signal.
    Signal(SignalId),
    /// A slice or single bit of a signal.
    Slice(SliceView),
    /// A literal bit pattern.
    Const(BitVector),
}

impl ConcatPart {
    fn bits(&self, signals: &SignalTable) -> Result<BitVector, SimError> {
        match self {
            ConcatPart::Signal(id) => Ok(signals.value(*id)?.to_bit_vector()?),
            ConcatPart::Slice(view) => Ok(view.read(signals)?.to_bit_vector()?),
            ConcatPart::Const(bv) => Ok(bv.clone()),
        }
    }

    fn to_ref(&self, signals: &SignalTable) -> SignalRef {
        match self {
            ConcatPart::Signal(id) => SignalRef::Signal(*id),
            ConcatPart::Slice(view) => view.to_ref(signals),
            ConcatPart::Const(bv) => SignalRef::Const(bv.clone()),
        }
    }
}

impl From<SignalId> for ConcatPart {
    fn from(id: SignalId) -> Self {
        ConcatPart::Signal(id)
    }
}

impl From<SliceView> for ConcatPart {
    fn from(view: SliceView) -> Self {
        ConcatPart::Slice(view)
    }
}

impl From<BitVector> for ConcatPart {
    fn from(bv: BitVector) -> Self {
        ConcatPart::Const(bv)
    }
}

impl From<bool> for ConcatPart {
    fn from(b: bool) -> Self {
        ConcatPart::Const(BitVector::from_bool(b))
    }
}

/// A read-only concatenation of parts, the first part most significant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConcatView {
    parts: Vec<ConcatPart>,
    width: u32,
}

impl ConcatView {
    /// Creates a concatenation, rejecting an empty part list and unsized signals.
    pub fn new(signals: &SignalTable, parts: Vec<ConcatPart>) -> Result<Self, SimError> {
        if parts.is_empty() {
            return Err(BitError::EmptyConcat.into());
        }
        let mut width = 0;
        for part in &parts {
            width += match part {
                ConcatPart::Signal(id) => {
                    let state = signals.get(*id)?;
                    state
                        .width()
                        .ok_or_else(|| BitError::Unsized(format!("signal '{}'", state.name)))?
                }
                ConcatPart::Slice(view) => view.width(),
                ConcatPart::Const(bv) => bv.width(),
            };
        }
        Ok(Self { parts, width })
    }

    /// The parts in order.
    pub fn parts(&self) -> &[ConcatPart] {
        &self.parts
    }

    /// Total width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }
}

impl SignalSource for ConcatView {
    fn read(&self, signals: &SignalTable) -> Result<Value, SimError> {
        let bits = self
            .parts
            .iter()
            .map(|p| p.bits(signals))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Bits(BitVector::concat(&bits)?))
    }

    fn sensitivity(&self, _signals: &SignalTable) -> Vec<SignalId> {
        let mut out = Vec::new();
        for part in &self.parts {
            let id = match part {
                ConcatPart::Signal(id) => *id,
                ConcatPart::Slice(view) => view.signal(),
                ConcatPart::Const(_) => continue,
            };
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    fn to_ref(&self, signals: &SignalTable) -> SignalRef {
        SignalRef::Concat(self.parts.iter().map(|p| p.to_ref(signals)).collect())
    }
}

impl SignalSink for ConcatView {
    fn write(&self, _signals: &mut SignalTable, _value: Value, _writer: Writer) -> Result<(), SimError> {
        Err(SimError::ReadOnlyView {
            view: format!("{}-part concatenation", self.parts.len()),
        })
    }
}

/// A handle to a tristate bus.
///
/// Reading resolves the bus from its drivers' committed values; drivers are
/// ordinary signals created with [`Simulator::driver`](crate::Simulator::driver).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TristateBus {
    id: BusId,
}

impl TristateBus {
    pub(crate) fn new(id: BusId) -> Self {
        Self { id }
    }

    /// The bus ID.
    pub fn id(&self) -> BusId {
        self.id
    }
}

impl SignalSource for TristateBus {
    fn read(&self, signals: &SignalTable) -> Result<Value, SimError> {
        signals.resolve_bus(self.id)
    }

    fn sensitivity(&self, signals: &SignalTable) -> Vec<SignalId> {
        signals
            .bus(self.id)
            .map(|b| b.drivers.clone())
            .unwrap_or_default()
    }

    fn to_ref(&self, signals: &SignalTable) -> SignalRef {
        SignalRef::Tristate {
            bus: self.id,
            drivers: self.sensitivity(signals),
        }
    }
}
