//! Conformance test helpers for the Strata simulator.
//!
//! Provides small building blocks shared by the scenario tests: value
//! constructors, a step-counting testbench process, a free-running clock
//! and a shortcut from `strata.toml` text to a [`SimConfig`].

#![warn(missing_docs)]

use strata_common::{BitError, BitVector, Value};
use strata_config::{load_config_from_str, ConfigError};
use strata_ir::{ProcessId, SignalId};
use strata_sim::{Process, ProcessContext, ProcessKind, SimConfig, SimError, Simulator, Suspend};

/// An unsigned `width`-bit vector value holding `value`.
pub fn bits(value: i128, width: u32) -> Result<Value, BitError> {
    Ok(Value::Bits(BitVector::from_int(value, width)?))
}

/// A bounded vector value holding `value` within `[min, max)`.
pub fn bounded(value: i128, min: i128, max: i128) -> Result<Value, BitError> {
    Ok(Value::Bits(BitVector::bounded(value, min, max)?))
}

/// A testbench process whose body receives the number of times it has
/// been resumed before, starting at zero.
pub struct Stepper<F> {
    step: usize,
    body: F,
}

/// Wraps `body` in a [`Stepper`].
pub fn stepper<F>(body: F) -> Stepper<F>
where
    F: FnMut(&mut ProcessContext<'_>, usize) -> Result<Suspend, SimError>,
{
    Stepper { step: 0, body }
}

impl<F> Process for Stepper<F>
where
    F: FnMut(&mut ProcessContext<'_>, usize) -> Result<Suspend, SimError>,
{
    fn resume(&mut self, cx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        let step = self.step;
        self.step += 1;
        (self.body)(cx, step)
    }
}

/// Spawns a testbench process built from a [`Stepper`] body.
pub fn spawn_bench<F>(sim: &mut Simulator, name: &str, body: F) -> ProcessId
where
    F: FnMut(&mut ProcessContext<'_>, usize) -> Result<Suspend, SimError> + 'static,
{
    sim.spawn(name, ProcessKind::Initial, stepper(body))
}

/// Spawns a clock that starts low and toggles every `half_period` ticks.
///
/// The clock never finishes; runs using it end by a stop request or a time limit.
pub fn spawn_clock(sim: &mut Simulator, name: &str, clock: SignalId, half_period: u64) -> ProcessId {
    spawn_bench(sim, name, move |cx, step| {
        cx.write(&clock, step % 2 == 1)?;
        Ok(Suspend::delay(half_period))
    })
}

/// Parses `strata.toml` text into a simulator configuration.
pub fn sim_config(toml: &str) -> Result<SimConfig, ConfigError> {
    let run = load_config_from_str(toml)?;
    Ok(SimConfig::from(&run))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepper_counts_resumes() {
        let mut sim = Simulator::new();
        let s = sim.signal("s", Value::Int(0)).unwrap();
        spawn_bench(&mut sim, "bench", move |cx, step| {
            cx.write(&s, step as i128)?;
            if step == 3 {
                return Ok(Suspend::Done);
            }
            Ok(Suspend::delay(1))
        });
        sim.run().unwrap();
        assert_eq!(sim.value(s).unwrap(), &Value::Int(3));
    }

    #[test]
    fn clock_toggles() {
        let mut sim = Simulator::new();
        let clk = sim.signal("clk", false).unwrap();
        spawn_clock(&mut sim, "clk_gen", clk, 5);
        sim.run_until(12).unwrap();
        // Low at 0, high at 5, low at 10.
        assert_eq!(sim.value(clk).unwrap(), &Value::Bool(false));
        sim.run_until(16).unwrap();
        assert_eq!(sim.value(clk).unwrap(), &Value::Bool(true));
    }

    #[test]
    fn config_shortcut() {
        let config = sim_config("[simulation]\ntime_limit = 30\n").unwrap();
        assert_eq!(config.time_limit, Some(30));
        assert!(sim_config("[simulation]\nmax_deltas = 0\n").is_err());
    }
}
