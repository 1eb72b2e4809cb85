//! Interface objects: named trees of signals, constants and nested interfaces.
//!
//! An [`Interface`] is built once with an [`InterfaceBuilder`] and its shape
//! never changes afterwards. Members are addressed by dotted paths relative
//! to the interface (`b.c`), and [`Interface::flatten`] turns the tree into
//! hardware names joined by `_` (`intf_b_c`) alongside their fully-qualified
//! paths (`intf.b.c`).

use strata_ir::{ConstValue, SignalId};

use crate::const_eval::ConstEnv;
use crate::error::ElabError;

/// One member of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A simulator signal.
    Signal(SignalId),
    /// A plain value, inlined as a literal at elaboration.
    Const(ConstValue),
    /// A nested interface.
    Interface(Interface),
}

impl Member {
    fn kind_name(&self) -> &'static str {
        match self {
            Member::Signal(_) => "signal",
            Member::Const(_) => "constant",
            Member::Interface(_) => "interface",
        }
    }
}

/// A named aggregate of members with a fixed structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    members: Vec<(String, Member)>,
}

/// A signal reached through an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatSignal {
    /// Hardware name, nesting joined by `_`.
    pub name: String,
    /// Fully-qualified dotted path.
    pub path: String,
    /// The backing simulator signal.
    pub signal: SignalId,
}

/// A constant reached through an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatConst {
    /// Hardware name, nesting joined by `_`.
    pub name: String,
    /// Fully-qualified dotted path.
    pub path: String,
    /// The literal value.
    pub value: ConstValue,
}

/// Builds an [`Interface`] member by member.
///
/// Members keep their insertion order. Duplicate field names are reported by
/// [`InterfaceBuilder::build`].
#[derive(Debug)]
pub struct InterfaceBuilder {
    name: String,
    members: Vec<(String, Member)>,
}

impl InterfaceBuilder {
    /// Adds a signal member.
    pub fn signal(mut self, field: impl Into<String>, signal: SignalId) -> Self {
        self.members.push((field.into(), Member::Signal(signal)));
        self
    }

    /// Adds a constant member.
    pub fn constant(mut self, field: impl Into<String>, value: impl Into<ConstValue>) -> Self {
        self.members.push((field.into(), Member::Const(value.into())));
        self
    }

    /// Adds a nested interface under `field`.
    ///
    /// The nested interface's own name is replaced by the field name.
    pub fn nested(mut self, field: impl Into<String>, mut interface: Interface) -> Self {
        let field = field.into();
        interface.name = field.clone();
        self.members.push((field, Member::Interface(interface)));
        self
    }

    /// Finishes the interface.
    pub fn build(self) -> Result<Interface, ElabError> {
        for (i, (field, _)) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|(f, _)| f == field) {
                return Err(ElabError::DuplicateMember {
                    interface: self.name,
                    member: field.clone(),
                });
            }
        }
        Ok(Interface {
            name: self.name,
            members: self.members,
        })
    }
}

impl Interface {
    /// Starts building an interface called `name`.
    pub fn builder(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// The interface name, used as the prefix of flattened names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(f, m)| (f.as_str(), m))
    }

    /// Looks up a direct member by field name.
    pub fn get(&self, field: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m)
    }

    /// Resolves a dotted path such as `more_constants.const1`.
    pub fn resolve(&self, path: &str) -> Result<&Member, ElabError> {
        let unresolved = || ElabError::UnresolvedPath {
            interface: self.name.clone(),
            path: path.to_string(),
        };
        let mut fields = path.split('.');
        let first = fields.next().ok_or_else(unresolved)?;
        let mut member = self.get(first).ok_or_else(unresolved)?;
        for field in fields {
            member = match member {
                Member::Interface(inner) => inner.get(field).ok_or_else(unresolved)?,
                _ => return Err(unresolved()),
            };
        }
        Ok(member)
    }

    /// Resolves a path that must lead to a signal.
    pub fn signal(&self, path: &str) -> Result<SignalId, ElabError> {
        match self.resolve(path)? {
            Member::Signal(id) => Ok(*id),
            _ => Err(ElabError::WrongMemberKind {
                path: path.to_string(),
                expected: "signal",
            }),
        }
    }

    /// Resolves a path that must lead to a constant.
    pub fn constant(&self, path: &str) -> Result<&ConstValue, ElabError> {
        match self.resolve(path)? {
            Member::Const(value) => Ok(value),
            other => Err(ElabError::WrongMemberKind {
                path: format!("{path} ({})", other.kind_name()),
                expected: "constant",
            }),
        }
    }

    /// Every signal in the tree, depth first in declaration order.
    pub fn signals(&self) -> Vec<SignalId> {
        self.flatten().into_iter().map(|s| s.signal).collect()
    }

    /// Flattens every signal in the tree.
    pub fn flatten(&self) -> Vec<FlatSignal> {
        let mut out = Vec::new();
        self.walk(&self.name, &self.name, &mut |name, path, member| {
            if let Member::Signal(signal) = member {
                out.push(FlatSignal {
                    name,
                    path,
                    signal: *signal,
                });
            }
        });
        out
    }

    /// Flattens every constant in the tree.
    pub fn constants(&self) -> Vec<FlatConst> {
        let mut out = Vec::new();
        self.walk(&self.name, &self.name, &mut |name, path, member| {
            if let Member::Const(value) = member {
                out.push(FlatConst {
                    name,
                    path,
                    value: value.clone(),
                });
            }
        });
        out
    }

    /// Builds a constant environment keyed by paths relative to this interface.
    pub fn const_env(&self) -> ConstEnv {
        let prefix_len = self.name.len() + 1;
        self.constants()
            .into_iter()
            .map(|c| (c.path[prefix_len..].to_string(), c.value))
            .collect()
    }

    fn walk(&self, name: &str, path: &str, visit: &mut impl FnMut(String, String, &Member)) {
        for (field, member) in &self.members {
            let name = format!("{name}_{field}");
            let path = format!("{path}.{field}");
            match member {
                Member::Interface(inner) => inner.walk(&name, &path, visit),
                leaf => visit(name, path, leaf),
            }
        }
    }
}
