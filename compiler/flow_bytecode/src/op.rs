//! Target stack-machine operations.
//!
//! The operation set mirrors a JVM-style evaluation stack: constants, local
//! slots, reference type tests, boxing, labels and jumps, static field reads
//! and host invocations. Jump targets are symbolic [`Label`]s; a label is
//! defined by an [`Op::Label`] pseudo-operation at its position in the list.

use std::fmt;

use crate::types::{RefClass, StackType};

/// Symbolic jump target.
///
/// Labels are allocated by the compiler and are unique within one compiled
/// unit. Raw instruction blocks use small block-local labels that are renamed
/// through [`Op::relabel`] when the block is compiled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Label(u32);

impl Label {
    /// Create a label from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A constant pushed by [`Op::Const`].
///
/// Numbers are stored as raw `u64` bits so the type stays `Eq + Hash`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    /// The null reference.
    Null,
    /// A 64-bit float, as bits.
    Number(u64),
    Boolean(bool),
    Text(Box<str>),
}

impl Constant {
    /// Build a number constant.
    #[inline]
    pub fn number(value: f64) -> Self {
        Constant::Number(value.to_bits())
    }

    /// Build a text constant.
    pub fn text(value: impl Into<Box<str>>) -> Self {
        Constant::Text(value.into())
    }

    /// The number value, if this is a number constant.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Constant::Number(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Stack type produced when this constant is pushed.
    pub fn stack_type(&self) -> StackType {
        match self {
            Constant::Null => StackType::OBJECT,
            Constant::Number(_) => StackType::Double,
            Constant::Boolean(_) => StackType::Boolean,
            Constant::Text(_) => StackType::Ref(RefClass::Text),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Number(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            Constant::Boolean(b) => write!(f, "{b}"),
            Constant::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Binary arithmetic on two doubles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
        }
    }
}

/// Comparison of two doubles, producing a boolean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Lt,
    Gt,
    Eq,
}

impl CompareOp {
    #[expect(clippy::float_cmp, reason = "graph equality is exact float equality")]
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            CompareOp::Lt => "cmplt",
            CompareOp::Gt => "cmpgt",
            CompareOp::Eq => "cmpeq",
        }
    }
}

/// A single target-machine operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    /// Push a constant.
    Const(Constant),
    /// Discard the top of stack.
    Pop,
    /// Duplicate the top of stack.
    Dup,
    /// Push the value of a local slot.
    Load { slot: u32, ty: StackType },
    /// Pop into a local slot.
    Store { slot: u32, ty: StackType },
    /// Pop a reference, push whether it is a non-null instance of the class.
    InstanceOf(RefClass),
    /// Assert the reference on top of stack is an instance of the class.
    CheckCast(RefClass),
    /// Pop a primitive, push it boxed as the given class.
    Box(RefClass),
    /// Pop a boxed reference of the given class, push the primitive.
    Unbox(RefClass),
    /// Pop two doubles, push the result.
    Arith(ArithOp),
    /// Pop two doubles, push a boolean.
    Compare(CompareOp),
    /// Pop a boolean, push its negation.
    Not,
    /// Label definition (no runtime effect).
    Label(Label),
    /// Unconditional jump.
    Jump(Label),
    /// Pop a boolean, jump if it is `true`.
    JumpIf(Label),
    /// Pop a boolean, jump if it is `false`.
    JumpUnless(Label),
    /// Push a host-provided static field.
    GetStatic {
        owner: Box<str>,
        name: Box<str>,
        ty: StackType,
    },
    /// Pop `argc` arguments, call a host function, push its result unless
    /// `returns` is `Void`.
    Invoke {
        target: Box<str>,
        argc: u8,
        returns: StackType,
    },
    /// Stop executing the unit.
    Return,
}

impl Op {
    /// Rewrite every label this operation defines or targets.
    #[must_use]
    pub fn relabel(&self, mut map: impl FnMut(Label) -> Label) -> Op {
        match self {
            Op::Label(l) => Op::Label(map(*l)),
            Op::Jump(l) => Op::Jump(map(*l)),
            Op::JumpIf(l) => Op::JumpIf(map(*l)),
            Op::JumpUnless(l) => Op::JumpUnless(map(*l)),
            other => other.clone(),
        }
    }

    /// Returns `true` for the [`Op::Label`] pseudo-operation.
    #[inline]
    pub fn is_label(&self) -> bool {
        matches!(self, Op::Label(_))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Const(c) => write!(f, "const {c}"),
            Op::Pop => f.write_str("pop"),
            Op::Dup => f.write_str("dup"),
            Op::Load { slot, ty } => write!(f, "load {slot} ({ty})"),
            Op::Store { slot, ty } => write!(f, "store {slot} ({ty})"),
            Op::InstanceOf(class) => write!(f, "instanceof {}", class.name()),
            Op::CheckCast(class) => write!(f, "checkcast {}", class.name()),
            Op::Box(class) => write!(f, "box {}", class.name()),
            Op::Unbox(class) => write!(f, "unbox {}", class.name()),
            Op::Arith(op) => f.write_str(op.mnemonic()),
            Op::Compare(op) => f.write_str(op.mnemonic()),
            Op::Not => f.write_str("not"),
            Op::Label(l) => write!(f, "{l}:"),
            Op::Jump(l) => write!(f, "jump {l}"),
            Op::JumpIf(l) => write!(f, "jumpif {l}"),
            Op::JumpUnless(l) => write!(f, "jumpunless {l}"),
            Op::GetStatic { owner, name, ty } => write!(f, "getstatic {owner}.{name} ({ty})"),
            Op::Invoke {
                target,
                argc,
                returns,
            } => write!(f, "invoke {target}/{argc} ({returns})"),
            Op::Return => f.write_str("return"),
        }
    }
}
