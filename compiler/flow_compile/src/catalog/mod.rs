//! Node catalog: the behavior behind each node kind.
//!
//! A [`Node`](crate::graph::Node) only names its kind. The catalog maps that
//! name to a [`NodeKind`], which declares the node's ports and produces its
//! code: [`activate`](NodeKind::activate) when a signal arrives,
//! [`output`](NodeKind::output) when a consumer asks for a value.
//!
//! Kinds talk to the linearizer only through [`Activation`], so they never
//! see wires: an input is already resolved and adapted to the port's
//! representation, and a signal output is already linearized.

mod builtin;

use rustc_hash::FxHashMap;

use crate::error::CompileError;
use crate::instruction::Instruction;
use crate::linearize::Activation;
use crate::value::{Repr, ValueKind};

pub use builtin::{
    Arithmetic, Comparison, ConstantValue, Emit, GetVariable, If, MathConstant, Not, Query, Repeat,
    SetVariable, Start,
};

/// Declared shape of one node input or output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub repr: Repr,
}

impl PortSpec {
    /// A control-flow port.
    pub const fn signal(name: &'static str) -> Self {
        Self {
            name,
            kind: ValueKind::Signal,
            repr: Repr::Native,
        }
    }

    /// A value port in the kind's native representation.
    pub const fn native(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            repr: Repr::Native,
        }
    }

    /// A value port in the kind's boxed representation.
    pub const fn boxed(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            repr: Repr::Boxed,
        }
    }

    #[inline]
    pub fn is_signal(&self) -> bool {
        self.kind.is_signal()
    }
}

/// Behavior of one node kind.
pub trait NodeKind {
    /// Name nodes use to refer to this kind.
    fn name(&self) -> &str;

    fn inputs(&self) -> &[PortSpec];

    fn outputs(&self) -> &[PortSpec];

    /// Code run when a signal arrives at signal input `input`.
    ///
    /// The kind decides which signal outputs to follow and where their code
    /// goes relative to its own.
    fn activate(
        &self,
        cx: &mut Activation<'_, '_>,
        _input: usize,
    ) -> Result<Instruction, CompileError> {
        Err(cx.not_activatable())
    }

    /// Code computing value output `index` in the port's declared
    /// representation.
    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        Err(cx.no_value_output(index))
    }
}

/// Registry of node kinds by name.
#[derive(Default)]
pub struct Catalog {
    kinds: FxHashMap<Box<str>, Box<dyn NodeKind>>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every built-in kind.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        builtin::register_all(&mut catalog);
        catalog
    }

    /// Add a kind, replacing any kind of the same name.
    pub fn register(&mut self, kind: impl NodeKind + 'static) {
        let name: Box<str> = kind.name().into();
        tracing::trace!(kind = &*name, "registered node kind");
        self.kinds.insert(name, Box::new(kind));
    }

    pub fn get(&self, name: &str) -> Option<&dyn NodeKind> {
        self.kinds.get(name).map(|kind| &**kind)
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(|name| &**name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("kinds", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected lookups"
)]
