//! Value kinds: the closed registry of data categories a wire can carry.
//!
//! Every kind knows two stack representations:
//!
//! - **native**: the unboxed form used when the kind is known statically
//!   (a double for `Number`, a boolean for `Condition`);
//! - **boxed**: a reference form used for kind-erased storage such as
//!   variables shared between nodes.
//!
//! and four conversions between literals, native values and boxed values:
//! [`load_constant`](ValueKind::load_constant),
//! [`cast`](ValueKind::cast) and [`wrap_primitive`](ValueKind::wrap_primitive).
//!
//! Conversions never fail. A malformed literal loads the kind's default, and
//! a boxed value of the wrong dynamic kind casts to the default at runtime.

use std::fmt;

use flow_bytecode::{Constant, Label, Op, RefClass, StackType};

use crate::instruction::Instruction;

/// A data category carried by wires and ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueKind {
    /// Control flow only; carries no value.
    Signal,
    /// A 64-bit float.
    Number,
    /// A boolean.
    Condition,
    /// A text string.
    Text,
}

/// Which representation of a kind a port produces or expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Repr {
    Native,
    Boxed,
}

impl ValueKind {
    /// Every kind known to the compiler.
    pub const ALL: [ValueKind; 4] = [
        ValueKind::Signal,
        ValueKind::Number,
        ValueKind::Condition,
        ValueKind::Text,
    ];

    /// Kinds that carry a value (everything but `Signal`).
    pub const VALUES: [ValueKind; 3] = [ValueKind::Number, ValueKind::Condition, ValueKind::Text];

    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Signal => "signal",
            ValueKind::Number => "number",
            ValueKind::Condition => "condition",
            ValueKind::Text => "text",
        }
    }

    /// Inverse of [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    #[inline]
    pub fn is_signal(self) -> bool {
        self == ValueKind::Signal
    }

    /// Stack type of the native representation.
    pub fn native_type(self) -> StackType {
        match self {
            ValueKind::Signal => StackType::Void,
            ValueKind::Number => StackType::Double,
            ValueKind::Condition => StackType::Boolean,
            ValueKind::Text => StackType::Ref(RefClass::Text),
        }
    }

    /// Stack type of the boxed representation.
    pub fn boxed_type(self) -> StackType {
        StackType::Ref(self.box_class())
    }

    /// Stack type of the given representation.
    pub fn stack_type(self, repr: Repr) -> StackType {
        match repr {
            Repr::Native => self.native_type(),
            Repr::Boxed => self.boxed_type(),
        }
    }

    /// Class a boxed value of this kind is tested against.
    fn box_class(self) -> RefClass {
        match self {
            ValueKind::Signal => RefClass::Object,
            ValueKind::Number => RefClass::Double,
            ValueKind::Condition => RefClass::Boolean,
            ValueKind::Text => RefClass::Text,
        }
    }

    /// The native default (`0.0`, `false`, `""`). `Signal` has none.
    pub fn default_constant(self) -> Option<Constant> {
        match self {
            ValueKind::Signal => None,
            ValueKind::Number => Some(Constant::number(0.0)),
            ValueKind::Condition => Some(Constant::Boolean(false)),
            ValueKind::Text => Some(Constant::text("")),
        }
    }

    /// Push the closest native value to `literal`.
    ///
    /// Integers widen to doubles; null and literals of another kind load the
    /// default.
    pub fn load_constant(self, literal: &Literal) -> Instruction {
        let constant = match (self, literal) {
            (ValueKind::Signal, _) => return Instruction::empty(),
            (ValueKind::Number, Literal::Number(n)) => Constant::number(*n),
            (ValueKind::Number, Literal::Integer(i)) => Constant::number(widen(*i)),
            (ValueKind::Condition, Literal::Boolean(b)) => Constant::Boolean(*b),
            (ValueKind::Text, Literal::Text(s)) => Constant::text(s.as_str()),
            (kind, _) => return kind.load_default(),
        };
        Instruction::constant(constant)
    }

    fn load_default(self) -> Instruction {
        self.default_constant()
            .map_or_else(Instruction::empty, Instruction::constant)
    }

    /// Convert a boxed value to this kind's native representation.
    ///
    /// Emits a runtime type test. A value of the right class is unboxed;
    /// anything else (including null) is popped and replaced by the default.
    pub fn cast(self, value: Instruction) -> Instruction {
        debug_assert!(
            value.return_type().is_reference(),
            "cast expects a boxed value, got {}",
            value.return_type()
        );

        let native = self.native_type();
        let Some(default) = self.default_constant() else {
            // Signal: discard whatever reference was produced.
            return Instruction::sequence(
                StackType::Void,
                vec![value, Instruction::op(Op::Pop, StackType::Void)],
            );
        };

        let class = self.box_class();
        let done = Label::new(0);
        let convert = Label::new(1);
        let mut ops = vec![
            Op::Dup,
            Op::InstanceOf(class),
            Op::JumpIf(convert),
            Op::Pop,
            Op::Const(default),
            Op::Jump(done),
            Op::Label(convert),
            Op::CheckCast(class),
        ];
        if !native.is_reference() {
            ops.push(Op::Unbox(class));
        }
        ops.push(Op::Label(done));

        Instruction::sequence(native, vec![value, Instruction::raw(native, ops)])
    }

    /// Convert a native value to the boxed representation. Inverse of
    /// [`cast`](Self::cast).
    pub fn wrap_primitive(self, value: Instruction) -> Instruction {
        let boxed = self.boxed_type();
        match self {
            ValueKind::Number | ValueKind::Condition => Instruction::sequence(
                boxed,
                vec![value, Instruction::op(Op::Box(self.box_class()), boxed)],
            ),
            // Native text is already a reference.
            ValueKind::Text => value,
            ValueKind::Signal => Instruction::sequence(
                boxed,
                vec![value, Instruction::constant(Constant::Null)],
            ),
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "integer literals widen to the nearest double"
)]
fn widen(i: i64) -> f64 {
    i as f64
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw constant typed into an unconnected node input.
///
/// Literals come from the editor and may be of any shape; the consuming
/// kind's [`load_constant`](ValueKind::load_constant) decides what they mean.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Literal {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Number(n) => write!(f, "{n:?}"),
            Literal::Text(s) => write!(f, "{s:?}"),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected machine faults"
)]
