//! Slice and single-bit views over a backing vector signal.
//!
//! Views are aliases: every read recomputes from the backing signal, and
//! writes through a slice land in the backing signal's pending value.

use strata_common::Value;
use strata_conformance::{bits, bounded, spawn_bench};
use strata_sim::{ProcessContext, SimError, Simulator, Suspend};

#[test]
fn slice_views_track_backing_signal() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(0, 8).unwrap()).unwrap();
    let a = sim.bit(s, 7).unwrap();
    let b = sim.bit(s, 5).unwrap();
    let c = sim.bit(s, 0).unwrap();
    let d = sim.slice_view(s, 8, 5).unwrap();
    let e = sim.slice_view(s, 6, 3).unwrap();
    let f = sim.slice_view(s, 8, 0).unwrap();
    let g = sim.slice_view(s, 4, 3).unwrap();
    let n = 8;

    spawn_bench(&mut sim, "check", move |cx, step| {
        if step > 0 {
            let i = (step - 1) as i128;
            assert_eq!(cx.read(&a)?, Value::Bool(i >> 7 & 1 == 1));
            assert_eq!(cx.read(&b)?, Value::Bool(i >> 5 & 1 == 1));
            assert_eq!(cx.read(&c)?, Value::Bool(i & 1 == 1));
            assert_eq!(cx.read_int(&d)?, i >> 5 & 0b111);
            assert_eq!(cx.read_int(&e)?, i >> 3 & 0b111);
            assert_eq!(cx.read_int(&f)?, i);
            assert_eq!(cx.read_int(&g)?, i >> 3 & 0b1);
            cx.display(format!("{}", cx.read_int(&d)?));
        }
        if step == n {
            return Ok(Suspend::Done);
        }
        cx.write(&s, step as i128)?;
        Ok(Suspend::delay(10))
    });

    let result = sim.run().unwrap();
    assert_eq!(result.final_time.ticks, 80);
    assert_eq!(result.display_output.len(), n);
}

#[test]
fn three_way_split_of_a_byte() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(0b1011_0011, 8).unwrap()).unwrap();
    let a = sim.slice_view(s, 8, 5).unwrap();
    let b = sim.slice_view(s, 5, 2).unwrap();
    let c = sim.slice_view(s, 2, 0).unwrap();

    assert_eq!(sim.read(&a).unwrap(), bits(0b101, 3).unwrap());
    assert_eq!(sim.read(&b).unwrap(), bits(0b100, 3).unwrap());
    assert_eq!(sim.read(&c).unwrap(), bits(0b11, 2).unwrap());
    assert_eq!(a.width() + b.width() + c.width(), 8);
}

#[test]
fn disjoint_slice_writes_in_one_delta_both_survive() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(0b1000_0001, 8).unwrap()).unwrap();
    let hi = sim.slice_view(s, 7, 4).unwrap();
    let lo = sim.slice_view(s, 4, 1).unwrap();

    sim.spawn(
        "upper",
        strata_sim::ProcessKind::Initial,
        move |cx: &mut ProcessContext<'_>| {
            cx.write(&hi, 0b111)?;
            Ok(Suspend::Done)
        },
    );
    sim.spawn(
        "lower",
        strata_sim::ProcessKind::Initial,
        move |cx: &mut ProcessContext<'_>| {
            cx.write(&lo, 0b101)?;
            Ok(Suspend::Done)
        },
    );

    sim.run().unwrap();
    // Bits 7 and 0 untouched, [6:4] = 111, [3:1] = 101.
    assert_eq!(sim.value(s).unwrap(), &bits(0b1111_1011, 8).unwrap());
}

#[test]
fn overlapping_slice_writes_conflict() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(0, 8).unwrap()).unwrap();
    let wide = sim.slice_view(s, 6, 0).unwrap();
    let narrow = sim.slice_view(s, 8, 5).unwrap();

    sim.spawn(
        "wide",
        strata_sim::ProcessKind::Initial,
        move |cx: &mut ProcessContext<'_>| {
            cx.write(&wide, 1)?;
            Ok(Suspend::Done)
        },
    );
    sim.spawn(
        "narrow",
        strata_sim::ProcessKind::Initial,
        move |cx: &mut ProcessContext<'_>| {
            cx.write(&narrow, 1)?;
            Ok(Suspend::Done)
        },
    );

    let err = sim.run().unwrap_err();
    assert!(matches!(
        err.root_cause(),
        SimError::WriteConflict { signal, .. } if signal == "s"
    ));
}

#[test]
fn one_process_writing_overlapping_slices_conflicts() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(0, 8).unwrap()).unwrap();
    let low = sim.slice_view(s, 6, 0).unwrap();
    let high = sim.slice_view(s, 8, 4).unwrap();

    spawn_bench(&mut sim, "double", move |cx, _| {
        cx.write(&low, 0b11_1111)?;
        cx.write(&high, 0)?;
        Ok(Suspend::Done)
    });

    let err = sim.run().unwrap_err();
    assert!(matches!(
        err.root_cause(),
        SimError::WriteConflict { signal, .. } if signal == "s"
    ));
}

#[test]
fn slice_write_outside_backing_bounds_is_rejected() {
    let mut sim = Simulator::new();
    // 4-bit signed backing in [-8, 8): 0b11 into bits [3:2] reads back as -4.
    let s = sim.signal("s", bounded(0, -8, 8).unwrap()).unwrap();
    let top = sim.slice_view(s, 4, 2).unwrap();
    sim.write(&top, 0b11).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.value(s).unwrap().to_int(), Some(-4));

    let mut sim = Simulator::new();
    let s = sim.signal("s", bounded(0, 0, 10).unwrap()).unwrap();
    let top = sim.slice_view(s, 4, 2).unwrap();
    // 0b1100 = 12 is outside [0, 10).
    let err = sim.write(&top, 0b11).unwrap_err();
    assert!(matches!(err, SimError::Bits(_)));
}

#[test]
fn slice_range_errors() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(0, 8).unwrap()).unwrap();
    assert!(sim.slice_view(s, 9, 0).is_err());
    assert!(sim.slice_view(s, 3, 3).is_err());
    assert!(sim.bit(s, 8).is_err());
    let flag = sim.signal("flag", false).unwrap();
    assert!(sim.slice_view(flag, 1, 0).is_err());
}
