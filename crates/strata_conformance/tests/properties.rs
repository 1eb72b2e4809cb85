//! Properties of the value model and the scheduler that every run relies on.

use strata_common::{BitVector, Value};
use strata_conformance::{bits, spawn_bench};
use strata_sim::{ProcessContext, Simulator, Suspend};

#[test]
fn integers_survive_a_trip_through_vectors() {
    for width in [1u32, 7, 16, 63, 100] {
        let max = (1i128 << width) - 1;
        for v in [0, 1, max / 2, max] {
            assert_eq!(BitVector::from_int(v, width).unwrap().to_int(), Some(v));
        }
        let min = -(1i128 << (width - 1));
        for v in [min, -1, 0] {
            let bv = BitVector::from_signed(v, width).unwrap();
            assert_eq!(bv.to_int(), Some(v), "signed {v} in {width} bits");
        }
    }
}

#[test]
fn concatenation_is_associative() {
    let a = BitVector::from_int(0b101, 3).unwrap();
    let b = BitVector::from_int(0b01, 2).unwrap();
    let c = BitVector::from_int(0b1110, 4).unwrap();

    let left = BitVector::concat(&[BitVector::concat(&[a.clone(), b.clone()]).unwrap(), c.clone()])
        .unwrap();
    let right = BitVector::concat(&[a.clone(), BitVector::concat(&[b.clone(), c.clone()]).unwrap()])
        .unwrap();
    let flat = BitVector::concat(&[a, b, c]).unwrap();

    assert_eq!(left.to_int(), right.to_int());
    assert_eq!(flat.to_int(), Some(0b101_01_1110));
    assert_eq!(flat.width(), 9);
}

#[test]
fn writes_are_invisible_until_the_delta_commits() {
    let mut sim = Simulator::new();
    let s = sim.signal("s", bits(1, 4).unwrap()).unwrap();

    spawn_bench(&mut sim, "writer", move |cx, step| {
        match step {
            0 => {
                cx.write(&s, 9)?;
                assert_eq!(cx.read_int(&s)?, 1);
                Ok(Suspend::change([s]))
            }
            _ => {
                assert_eq!(cx.read_int(&s)?, 9);
                Ok(Suspend::Done)
            }
        }
    });

    sim.run().unwrap();
    assert_eq!(sim.value(s).unwrap(), &bits(9, 4).unwrap());
}

#[test]
fn edge_waiters_see_the_new_value_at_the_same_tick() {
    let mut sim = Simulator::new();
    let clk = sim.signal("clk", false).unwrap();
    let seen = sim.signal("seen", bits(0, 8).unwrap()).unwrap();

    spawn_bench(&mut sim, "watch", move |cx, step| {
        if step == 0 {
            return Ok(Suspend::rising(clk));
        }
        assert_eq!(cx.read(&clk)?, Value::Bool(true));
        cx.write(&seen, cx.now() as i128)?;
        Ok(Suspend::Done)
    });
    spawn_bench(&mut sim, "drive", move |cx, step| {
        if step == 0 {
            return Ok(Suspend::delay(5));
        }
        cx.write(&clk, true)?;
        Ok(Suspend::Done)
    });

    let result = sim.run().unwrap();
    assert_eq!(sim.value(seen).unwrap(), &bits(5, 8).unwrap());
    assert_eq!(result.final_time.ticks, 5);
}

#[test]
fn combinational_chains_settle_within_one_tick() {
    let mut sim = Simulator::new();
    let stages: Vec<_> = (0..6)
        .map(|i| sim.signal(format!("s{i}"), bits(0, 8).unwrap()).unwrap())
        .collect();
    for (i, pair) in stages.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        sim.always_comb(
            format!("inc{i}"),
            [from],
            move |cx: &mut ProcessContext<'_>| {
                let v = cx.read_int(&from)? + 1;
                cx.write(&to, v)
            },
        );
    }

    let head = stages[0];
    let tail = stages[stages.len() - 1];
    spawn_bench(&mut sim, "poke", move |cx, step| {
        match step {
            0 => {
                cx.write(&head, 10)?;
                Ok(Suspend::delay(1))
            }
            _ => {
                assert_eq!(cx.read_int(&tail)?, 15);
                Ok(Suspend::Done)
            }
        }
    });

    let result = sim.run().unwrap();
    assert_eq!(result.final_time.ticks, 1);
}

#[test]
fn project_config_drives_the_waveform() {
    let dir = tempfile::tempdir().unwrap();
    let vcd = dir.path().join("run.vcd");
    std::fs::write(
        dir.path().join(strata_config::CONFIG_FILE_NAME),
        format!(
            "[simulation]\ntime_limit = 100\n\n[waveform]\nenabled = true\npath = {:?}\nscope = \"bench\"\ntimescale = \"10ns\"\n",
            vcd.display().to_string()
        ),
    )
    .unwrap();
    let run = strata_config::load_config(dir.path()).unwrap();
    let config = strata_sim::SimConfig::from(&run);

    let mut sim = Simulator::new();
    let count = sim.signal("count", bits(0, 4).unwrap()).unwrap();
    spawn_bench(&mut sim, "counter", move |cx, step| {
        cx.write(&count, step as i128 % 16)?;
        Ok(Suspend::delay(10))
    });

    let result = strata_sim::simulate(&mut sim, &config).unwrap();
    assert_eq!(result.final_time.ticks, 100);
    drop(sim);

    let dump = std::fs::read_to_string(&vcd).unwrap();
    assert!(dump.contains("$timescale 10ns $end"));
    assert!(dump.contains("$scope module bench $end"));
    assert!(dump.contains("#30\nb0011 !"));
}
