//! Waveform recording.
//!
//! The kernel talks to a [`WaveformRecorder`]; [`VcdRecorder`] writes the
//! IEEE 1364 value change dump text format. Several changes of one signal
//! inside a tick (delta glitches) are all emitted under the same `#time`
//! marker, so viewers show the settled value.
//!
//! VCD cannot declare variables once `$enddefinitions` is written. Signals
//! registered after that point are accepted but not traced.

use std::collections::HashMap;
use std::io::Write;

use strata_common::Value;
use strata_ir::SignalId;

use crate::error::SimError;

/// Width used to dump unsized integer signals.
pub const INT_DUMP_WIDTH: u32 = 64;

/// Sink for the signal changes of one run.
pub trait WaveformRecorder {
    /// Declares a signal inside the open scope.
    fn register_signal(&mut self, id: SignalId, name: &str, width: u32) -> Result<(), SimError>;

    /// Opens a hierarchy level.
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Closes the innermost hierarchy level.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records the committed value of `id` at tick `time`.
    fn record_change(&mut self, time: u64, id: SignalId, value: &Value) -> Result<(), SimError>;

    /// Flushes buffered output.
    fn finalize(&mut self) -> Result<(), SimError>;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Empty,
    Definitions,
    Changes,
}

struct VcdVar {
    /// `None` for signals registered after the definitions were closed.
    code: Option<String>,
    width: u32,
    last: Option<String>,
}

/// Value change dump writer.
pub struct VcdRecorder<W: Write> {
    out: W,
    timescale: String,
    vars: HashMap<SignalId, VcdVar>,
    section: Section,
    time: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// A recorder declaring a `1ns` timescale.
    pub fn new(out: W) -> Self {
        Self::with_timescale(out, "1ns")
    }

    /// A recorder declaring `timescale`, e.g. `"10ps"`.
    pub fn with_timescale(out: W, timescale: impl Into<String>) -> Self {
        Self {
            out,
            timescale: timescale.into(),
            vars: HashMap::new(),
            section: Section::Empty,
            time: None,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn open_header(&mut self) -> Result<(), SimError> {
        if self.section == Section::Empty {
            self.section = Section::Definitions;
            writeln!(self.out, "$version Strata simulator $end")?;
            writeln!(self.out, "$timescale {} $end", self.timescale)?;
        }
        Ok(())
    }

    fn close_header(&mut self) -> Result<(), SimError> {
        self.open_header()?;
        if self.section == Section::Definitions {
            self.section = Section::Changes;
            writeln!(self.out, "$enddefinitions $end")?;
        }
        Ok(())
    }
}

/// Short identifier for the `index`-th variable: base 94 over the printable
/// ASCII range `!`..=`~`.
fn id_code(mut index: usize) -> String {
    let mut code = String::new();
    loop {
        code.push(char::from(b'!' + (index % 94) as u8));
        index /= 94;
        if index == 0 {
            return code;
        }
        index -= 1;
    }
}

/// VCD value text without the identifier: `0`/`1`/`z` for scalars,
/// `b...` for vectors.
fn vcd_value(value: &Value, width: u32) -> String {
    let digits: String = match value {
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Bits(bv) => (0..bv.width())
            .rev()
            .map(|i| if bv.get(i) { '1' } else { '0' })
            .collect(),
        Value::Int(v) => format!("{:064b}", *v as u64),
        Value::HighZ(w) => "z".repeat((*w).max(1) as usize),
    };
    if width == 1 {
        digits
    } else {
        format!("b{digits}")
    }
}

impl<W: Write> WaveformRecorder for VcdRecorder<W> {
    fn register_signal(&mut self, id: SignalId, name: &str, width: u32) -> Result<(), SimError> {
        let code = if self.section == Section::Changes {
            tracing::warn!(signal = name, "signal created after the waveform header is not traced");
            None
        } else {
            self.open_header()?;
            let code = id_code(self.vars.len());
            writeln!(self.out, "$var wire {width} {code} {name} $end")?;
            Some(code)
        };
        self.vars.insert(
            id,
            VcdVar {
                code,
                width,
                last: None,
            },
        );
        Ok(())
    }

    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        self.open_header()?;
        writeln!(self.out, "$scope module {name} $end")?;
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.out, "$upscope $end")?;
        Ok(())
    }

    fn record_change(&mut self, time: u64, id: SignalId, value: &Value) -> Result<(), SimError> {
        let var = self.vars.get(&id).ok_or_else(|| SimError::InvalidSignal {
            reason: format!("{id} was never registered with the waveform"),
        })?;
        if var.code.is_none() {
            return Ok(());
        }
        let text = vcd_value(value, var.width);
        if var.last.as_deref() == Some(text.as_str()) {
            return Ok(());
        }

        if self.time != Some(time) {
            self.close_header()?;
            writeln!(self.out, "#{time}")?;
            self.time = Some(time);
        }
        let Some(var) = self.vars.get_mut(&id) else {
            return Ok(());
        };
        let code = var.code.as_deref().unwrap_or_default();
        if var.width == 1 {
            writeln!(self.out, "{text}{code}")?;
        } else {
            writeln!(self.out, "{text} {code}")?;
        }
        var.last = Some(text);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        self.close_header()?;
        self.out.flush()?;
        Ok(())
    }
}
