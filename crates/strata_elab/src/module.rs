//! Building an [`ElaboratedModule`] from a prepared simulator.
//!
//! The builder reads signal shapes (width, signedness, initial value, and
//! whether a clocked process or a tristate bus drives it) from the
//! [`Simulator`], so the description always matches what is simulated.

use std::collections::{HashMap, HashSet};

use strata_common::{BitVector, Value};
use strata_ir::{
    ConstDecl, ConstValue, ElaboratedModule, PortDecl, PortDirection, SignalDecl, SignalId,
    SignalKind, ViewBinding,
};
use strata_sim::{SignalSource, Simulator};

use crate::const_eval::{eval_const_expr, ConstEnv, ConstExpr};
use crate::error::ElabError;
use crate::interface::Interface;

/// Collects the declarations of one module.
pub struct ModuleBuilder<'a> {
    sim: &'a Simulator,
    module: ElaboratedModule,
    /// Hardware names already taken.
    names: HashSet<String>,
    /// Declared signals and the name they were declared under.
    declared: HashMap<SignalId, String>,
}

impl<'a> ModuleBuilder<'a> {
    /// Starts a module called `name` over the signals of `sim`.
    pub fn new(sim: &'a Simulator, name: impl Into<String>) -> Self {
        Self {
            sim,
            module: ElaboratedModule {
                name: name.into(),
                ..ElaboratedModule::default()
            },
            names: HashSet::new(),
            declared: HashMap::new(),
        }
    }

    /// Declares a port.
    pub fn port(
        &mut self,
        name: impl Into<String>,
        signal: SignalId,
        direction: PortDirection,
    ) -> Result<&mut Self, ElabError> {
        let name = name.into();
        let decl = self.declare(name.clone(), name, signal)?;
        self.module.ports.push(PortDecl { decl, direction });
        Ok(self)
    }

    /// Declares an internal signal.
    pub fn signal(&mut self, name: impl Into<String>, signal: SignalId) -> Result<&mut Self, ElabError> {
        let name = name.into();
        let decl = self.declare(name.clone(), name, signal)?;
        self.module.signals.push(decl);
        Ok(self)
    }

    /// Flattens an interface into internal signals and inlined constants.
    pub fn interface(&mut self, interface: &Interface) -> Result<&mut Self, ElabError> {
        for flat in interface.flatten() {
            let decl = self.declare(flat.name, flat.path, flat.signal)?;
            self.module.signals.push(decl);
        }
        self.interface_constants(interface)
    }

    /// Flattens a top-level interface: every signal becomes a port with
    /// `direction`, constants are inlined.
    pub fn interface_ports(
        &mut self,
        interface: &Interface,
        direction: PortDirection,
    ) -> Result<&mut Self, ElabError> {
        for flat in interface.flatten() {
            let decl = self.declare(flat.name, flat.path, flat.signal)?;
            self.module.ports.push(PortDecl { decl, direction });
        }
        self.interface_constants(interface)
    }

    fn interface_constants(&mut self, interface: &Interface) -> Result<&mut Self, ElabError> {
        for flat in interface.constants() {
            self.claim_name(&flat.name)?;
            self.module.constants.push(ConstDecl {
                name: flat.name,
                path: flat.path,
                value: flat.value,
            });
        }
        Ok(self)
    }

    /// Binds a signal view under `name` as an expression over its backing signals.
    pub fn view(&mut self, name: impl Into<String>, source: &impl SignalSource) -> Result<&mut Self, ElabError> {
        let name = name.into();
        let sim = self.sim;
        let signals = sim.signals();
        let expr = source.to_ref(signals);
        let width = expr
            .width(&|id| signals.get(id).ok().and_then(|s| s.width()))
            .ok_or_else(|| ElabError::UnsizedView(name.clone()))?;
        self.claim_name(&name)?;
        self.module.views.push(ViewBinding { name, width, expr });
        Ok(self)
    }

    /// Declares a named literal constant.
    pub fn constant(&mut self, name: impl Into<String>, value: impl Into<ConstValue>) -> Result<&mut Self, ElabError> {
        let name = name.into();
        self.claim_name(&name)?;
        self.module.constants.push(ConstDecl {
            path: name.clone(),
            name,
            value: value.into(),
        });
        Ok(self)
    }

    /// Folds `expr` against `env` and declares the result as a constant.
    pub fn folded_constant(
        &mut self,
        name: impl Into<String>,
        expr: &ConstExpr,
        env: &ConstEnv,
    ) -> Result<&mut Self, ElabError> {
        let value = eval_const_expr(expr, env)?;
        self.constant(name, value)
    }

    /// Checks that every view refers to declared storage and returns the module.
    pub fn finish(self) -> Result<ElaboratedModule, ElabError> {
        for view in &self.module.views {
            if let Some(signal) = view
                .expr
                .signals()
                .into_iter()
                .find(|s| !self.declared.contains_key(s))
            {
                return Err(ElabError::UndeclaredSignal {
                    view: view.name.clone(),
                    signal,
                });
            }
        }
        tracing::debug!(
            module = %self.module.name,
            ports = self.module.ports.len(),
            signals = self.module.signals.len(),
            views = self.module.views.len(),
            constants = self.module.constants.len(),
            "module elaborated"
        );
        Ok(self.module)
    }

    fn claim_name(&mut self, name: &str) -> Result<(), ElabError> {
        if !self.names.insert(name.to_string()) {
            return Err(ElabError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn declare(&mut self, name: String, path: String, signal: SignalId) -> Result<SignalDecl, ElabError> {
        if let Some(previous) = self.declared.get(&signal) {
            return Err(ElabError::DuplicateSignal {
                signal,
                name: previous.clone(),
            });
        }
        let sim = self.sim;
        let state = sim.signal_state(signal)?;
        let kind = if state.bus.is_some() {
            SignalKind::TristateDriver
        } else if state.is_register() {
            SignalKind::Reg
        } else {
            SignalKind::Wire
        };
        let init = match &state.init {
            Value::Bool(b) => ConstValue::Bool(*b),
            Value::Bits(bv) => ConstValue::Bits(bv.clone()),
            Value::Int(v) => ConstValue::Int(*v),
            Value::HighZ(w) => ConstValue::Bits(BitVector::new(*w)),
        };
        self.claim_name(&name)?;
        self.declared.insert(signal, name.clone());
        Ok(SignalDecl {
            name,
            path,
            signal,
            width: state.width(),
            signed: state.is_signed(),
            kind,
            init,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::SignalRef;
    use strata_sim::{ConcatPart, Edge};

    fn bits(v: i128, w: u32) -> Value {
        Value::Bits(BitVector::from_int(v, w).unwrap())
    }

    #[test]
    fn nested_interface_elaborates_to_flat_signals() {
        let mut sim = Simulator::new();
        let a = sim.signal("a", bits(0, 3)).unwrap();
        let c = sim
            .signal("c", Value::Bits(BitVector::bounded(0, -4, 4).unwrap()))
            .unwrap();
        let b = Interface::builder("b").signal("c", c).build().unwrap();
        let intf = Interface::builder("intf")
            .signal("a", a)
            .nested("b", b)
            .build()
            .unwrap();

        let mut builder = ModuleBuilder::new(&sim, "top");
        builder.interface(&intf).unwrap();
        let module = builder.finish().unwrap();

        assert_eq!(module.signal_count(), 2);
        let a_decl = module.find("intf_a").unwrap();
        assert_eq!(a_decl.path, "intf.a");
        assert_eq!(a_decl.width, Some(3));
        assert!(!a_decl.signed);
        let c_decl = module.find("intf_b_c").unwrap();
        assert_eq!(c_decl.path, "intf.b.c");
        assert_eq!(c_decl.width, Some(3));
        assert!(c_decl.signed);
    }

    #[test]
    fn ports_and_kinds() {
        let mut sim = Simulator::new();
        let clk = sim.signal("clk", false).unwrap();
        let q = sim.signal("q", bits(0, 4)).unwrap();
        sim.always_seq("ff", clk, Edge::Rising, None, vec![q], |_cx| Ok(()))
            .unwrap();
        let bus = sim.tristate("bus", bits(0, 4)).unwrap();
        let d0 = sim.driver(&bus).unwrap();

        let mut builder = ModuleBuilder::new(&sim, "top");
        builder
            .port("clk", clk, PortDirection::Input)
            .unwrap()
            .port("q", q, PortDirection::Output)
            .unwrap()
            .signal("d0", d0)
            .unwrap()
            .view("bus", &bus)
            .unwrap();
        let module = builder.finish().unwrap();

        assert_eq!(module.ports.len(), 2);
        assert_eq!(module.ports[0].decl.kind, SignalKind::Wire);
        assert_eq!(module.ports[1].decl.kind, SignalKind::Reg);
        let d0_decl = module.find("d0").unwrap();
        assert_eq!(d0_decl.kind, SignalKind::TristateDriver);
        assert_eq!(d0_decl.init, ConstValue::Bits(BitVector::new(4)));
        assert_eq!(module.views[0].width, 4);
        assert!(matches!(module.views[0].expr, SignalRef::Tristate { .. }));
    }

    #[test]
    fn views_bind_slice_and_concat_expressions() {
        let mut sim = Simulator::new();
        let s = sim.signal("s", bits(0b1011_0011, 8)).unwrap();
        let flag = sim.signal("flag", true).unwrap();
        let hi = sim.slice_view(s, 8, 5).unwrap();
        let cat = sim
            .concat_view(vec![ConcatPart::from(flag), ConcatPart::from(hi)])
            .unwrap();

        let mut builder = ModuleBuilder::new(&sim, "top");
        builder
            .signal("s", s)
            .unwrap()
            .signal("flag", flag)
            .unwrap()
            .view("hi", &hi)
            .unwrap()
            .view("cat", &cat)
            .unwrap();
        let module = builder.finish().unwrap();

        assert_eq!(
            module.views[0].expr,
            SignalRef::Slice {
                signal: s,
                high: 7,
                low: 5
            }
        );
        assert_eq!(module.views[0].width, 3);
        assert_eq!(module.views[1].width, 4);
    }

    #[test]
    fn view_over_undeclared_signal_is_rejected() {
        let mut sim = Simulator::new();
        let s = sim.signal("s", bits(0, 8)).unwrap();
        let low = sim.slice_view(s, 4, 0).unwrap();
        let mut builder = ModuleBuilder::new(&sim, "top");
        builder.view("low", &low).unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ElabError::UndeclaredSignal { signal, .. } if signal == s));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut sim = Simulator::new();
        let x = sim.signal("x", false).unwrap();
        let y = sim.signal("y", false).unwrap();
        let mut builder = ModuleBuilder::new(&sim, "top");
        builder.signal("x", x).unwrap();
        assert!(matches!(
            builder.signal("x", y),
            Err(ElabError::DuplicateName(_))
        ));
        assert!(matches!(
            builder.port("x2", x, PortDirection::Input),
            Err(ElabError::DuplicateSignal { .. })
        ));
    }

    #[test]
    fn interface_constants_are_inlined() {
        let mut sim = Simulator::new();
        let x = sim
            .signal("x", Value::Bits(BitVector::bounded(3, -5000, 5000).unwrap()))
            .unwrap();
        let more = Interface::builder("more")
            .constant("const1", 707)
            .constant("const2", 3)
            .build()
            .unwrap();
        let intf = Interface::builder("intf")
            .constant("a", 9)
            .constant("b", 10)
            .constant("c", 1729)
            .nested("more_constants", more)
            .build()
            .unwrap();
        let env = intf.const_env();
        let v = ConstExpr::field("a").pow(3) + ConstExpr::field("b").pow(3) - ConstExpr::field("c");

        let mut builder = ModuleBuilder::new(&sim, "top_const");
        builder
            .port("x", x, PortDirection::Output)
            .unwrap()
            .interface_ports(&intf, PortDirection::Input)
            .unwrap()
            .folded_constant("v", &v, &env)
            .unwrap();
        let module = builder.finish().unwrap();

        assert_eq!(module.ports.len(), 1);
        assert_eq!(
            module.constant("intf.more_constants.const1"),
            Some(&ConstValue::Int(707))
        );
        assert_eq!(module.constant("v"), Some(&ConstValue::Int(0)));
        assert_eq!(module.constants.len(), 6);

        let json = serde_json::to_string(&module).unwrap();
        let back: ElaboratedModule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, module);
    }

    #[test]
    fn unknown_signal_is_a_sim_error() {
        let sim = Simulator::new();
        let mut builder = ModuleBuilder::new(&sim, "top");
        let err = builder.signal("ghost", SignalId::from_raw(9)).err().unwrap();
        assert!(matches!(err, ElabError::Sim(_)));
    }
}
