//! Runtime values of the reference machine.

use std::fmt;
use std::rc::Rc;

use crate::op::Constant;
use crate::types::{RefClass, StackType};

/// A heap object behind a reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Double(f64),
    Boolean(bool),
    Text(Rc<str>),
}

impl Object {
    /// The concrete class of this object.
    pub fn class(&self) -> RefClass {
        match self {
            Object::Double(_) => RefClass::Double,
            Object::Boolean(_) => RefClass::Boolean,
            Object::Text(_) => RefClass::Text,
        }
    }
}

/// A value on the evaluation stack or in a local slot.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeValue {
    Double(f64),
    Boolean(bool),
    /// A reference; `None` is null.
    Ref(Option<Object>),
}

impl RuntimeValue {
    /// The null reference.
    pub const NULL: RuntimeValue = RuntimeValue::Ref(None);

    /// A text reference.
    pub fn text(value: &str) -> Self {
        RuntimeValue::Ref(Some(Object::Text(Rc::from(value))))
    }

    /// Materialize a constant.
    pub fn from_constant(constant: &Constant) -> Self {
        match constant {
            Constant::Null => RuntimeValue::NULL,
            Constant::Number(bits) => RuntimeValue::Double(f64::from_bits(*bits)),
            Constant::Boolean(b) => RuntimeValue::Boolean(*b),
            Constant::Text(s) => RuntimeValue::text(s),
        }
    }

    /// The default value of a stack type (`0.0`, `false`, null).
    ///
    /// `Void` has no value; callers never ask for it.
    pub fn default_for(ty: StackType) -> Option<Self> {
        match ty {
            StackType::Void => None,
            StackType::Double => Some(RuntimeValue::Double(0.0)),
            StackType::Boolean => Some(RuntimeValue::Boolean(false)),
            StackType::Ref(_) => Some(RuntimeValue::NULL),
        }
    }

    /// Whether this value may live in a slot of type `ty`.
    pub fn conforms_to(&self, ty: StackType) -> bool {
        match (self, ty) {
            (RuntimeValue::Double(_), StackType::Double)
            | (RuntimeValue::Boolean(_), StackType::Boolean)
            | (RuntimeValue::Ref(None), StackType::Ref(_)) => true,
            (RuntimeValue::Ref(Some(obj)), StackType::Ref(class)) => {
                obj.class().is_subclass_of(class)
            }
            _ => false,
        }
    }

    /// Short description used in type mismatch errors.
    pub fn describe(&self) -> &'static str {
        match self {
            RuntimeValue::Double(_) => "double",
            RuntimeValue::Boolean(_) => "boolean",
            RuntimeValue::Ref(None) => "null",
            RuntimeValue::Ref(Some(obj)) => obj.class().name(),
        }
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Double(v) | RuntimeValue::Ref(Some(Object::Double(v))) => {
                write!(f, "{v}")
            }
            RuntimeValue::Boolean(b) | RuntimeValue::Ref(Some(Object::Boolean(b))) => {
                write!(f, "{b}")
            }
            RuntimeValue::Ref(Some(Object::Text(s))) => f.write_str(s),
            RuntimeValue::Ref(None) => f.write_str("null"),
        }
    }
}
