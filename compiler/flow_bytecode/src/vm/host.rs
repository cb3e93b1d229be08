//! Host interface of the reference machine.
//!
//! Compiled graphs reach the outside world through two operations:
//! [`Op::Invoke`](crate::Op::Invoke) and
//! [`Op::GetStatic`](crate::Op::GetStatic). The machine forwards both to a
//! [`Host`].

use rustc_hash::FxHashMap;

use super::value::RuntimeValue;
use super::VmError;
use crate::types::StackType;

/// Services the machine delegates to its embedder.
pub trait Host {
    /// Call a host function. Must return `Some` value conforming to
    /// `returns` unless `returns` is `Void`.
    fn invoke(
        &mut self,
        target: &str,
        args: Vec<RuntimeValue>,
        returns: StackType,
    ) -> Result<Option<RuntimeValue>, VmError>;

    /// Read a static field.
    fn get_static(&mut self, owner: &str, name: &str) -> Result<RuntimeValue, VmError>;
}

/// One recorded host invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct HostCall {
    pub target: String,
    pub args: Vec<RuntimeValue>,
}

/// A host that answers from a table and records every call.
///
/// Functions with no scripted answer return the default value of their
/// declared return type. Statics default to the `Math` constants.
#[derive(Debug)]
pub struct ScriptedHost {
    answers: FxHashMap<String, RuntimeValue>,
    statics: FxHashMap<(String, String), RuntimeValue>,
    calls: Vec<HostCall>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    pub fn new() -> Self {
        let mut statics = FxHashMap::default();
        statics.insert(
            ("Math".to_owned(), "PI".to_owned()),
            RuntimeValue::Double(std::f64::consts::PI),
        );
        statics.insert(
            ("Math".to_owned(), "E".to_owned()),
            RuntimeValue::Double(std::f64::consts::E),
        );
        Self {
            answers: FxHashMap::default(),
            statics,
            calls: Vec::new(),
        }
    }

    /// Script the value a host function returns.
    #[must_use]
    pub fn with_answer(mut self, target: impl Into<String>, value: RuntimeValue) -> Self {
        self.answers.insert(target.into(), value);
        self
    }

    /// Define a static field.
    #[must_use]
    pub fn with_static(
        mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        value: RuntimeValue,
    ) -> Self {
        self.statics.insert((owner.into(), name.into()), value);
        self
    }

    /// Calls recorded so far, in execution order.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Calls to one target, in execution order.
    pub fn calls_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a HostCall> + 'a {
        self.calls.iter().filter(move |call| call.target == target)
    }
}

impl Host for ScriptedHost {
    fn invoke(
        &mut self,
        target: &str,
        args: Vec<RuntimeValue>,
        returns: StackType,
    ) -> Result<Option<RuntimeValue>, VmError> {
        tracing::trace!(function = target, argc = args.len(), "host invoke");
        self.calls.push(HostCall {
            target: target.to_owned(),
            args,
        });
        if returns == StackType::Void {
            return Ok(None);
        }
        Ok(self
            .answers
            .get(target)
            .cloned()
            .or_else(|| RuntimeValue::default_for(returns)))
    }

    fn get_static(&mut self, owner: &str, name: &str) -> Result<RuntimeValue, VmError> {
        self.statics
            .get(&(owner.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| VmError::UnknownStatic {
                owner: owner.to_owned(),
                name: name.to_owned(),
            })
    }
}
