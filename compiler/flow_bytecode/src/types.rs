//! Static stack types.
//!
//! Every operation and every instruction declares the type it leaves on the
//! evaluation stack. Value kinds map onto these: a kind's native
//! representation is a primitive slot type (or a text reference), its boxed
//! representation is always a [`StackType::Ref`].

use std::fmt;

/// Class of a heap reference on the stack.
///
/// `Object` is the kind-erased supertype; the others are the concrete
/// classes a reference can be tested against with `instanceof`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefClass {
    Object,
    Double,
    Boolean,
    Text,
}

impl RefClass {
    /// Human-readable class name, used in listings.
    pub fn name(self) -> &'static str {
        match self {
            RefClass::Object => "Object",
            RefClass::Double => "Double",
            RefClass::Boolean => "Boolean",
            RefClass::Text => "Text",
        }
    }

    /// Whether every instance of `self` is also an instance of `other`.
    pub fn is_subclass_of(self, other: RefClass) -> bool {
        self == other || other == RefClass::Object
    }
}

/// Type left on the evaluation stack by an operation or instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackType {
    /// Nothing is left on the stack.
    Void,
    /// A 64-bit float.
    Double,
    /// A boolean.
    Boolean,
    /// A (possibly null) reference of the given class.
    Ref(RefClass),
}

impl StackType {
    /// Generic boxed reference type.
    pub const OBJECT: StackType = StackType::Ref(RefClass::Object);

    /// Returns `true` if a value of this type occupies a stack entry.
    #[inline]
    pub fn is_value(self) -> bool {
        self != StackType::Void
    }

    /// Returns `true` for reference types.
    #[inline]
    pub fn is_reference(self) -> bool {
        matches!(self, StackType::Ref(_))
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackType::Void => f.write_str("void"),
            StackType::Double => f.write_str("double"),
            StackType::Boolean => f.write_str("boolean"),
            StackType::Ref(class) => write!(f, "ref {}", class.name()),
        }
    }
}
