//! Reference machine for compiled units.
//!
//! A straightforward interpreter for [`Op`] lists. It exists so the
//! compiler's runtime promises can be observed directly: a guarded cast
//! never faults, a shared value is computed once, signal order is preserved.
//!
//! The machine is strict where a real target would be: reading a local slot
//! that was never written, unboxing null and a failing `checkcast` are all
//! faults, so generated code that relies on any of them shows up in tests.

mod host;
mod value;

use rustc_hash::FxHashMap;

use crate::op::{Label, Op};
use crate::types::{RefClass, StackType};
use crate::unit::CompiledUnit;

pub use host::{Host, HostCall, ScriptedHost};
pub use value::{Object, RuntimeValue};

/// Execution limits.
#[derive(Clone, Debug)]
pub struct MachineConfig {
    /// Maximum evaluation stack depth.
    pub max_stack: usize,
    /// Maximum local slots a unit may declare.
    pub max_locals: u32,
    /// Maximum operations executed before giving up.
    pub max_steps: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_stack: 1024,
            max_locals: 4096,
            max_steps: 1_000_000,
        }
    }
}

/// A runtime fault.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum VmError {
    #[error("stack overflow (limit {0})")]
    StackOverflow(usize),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("unit needs {requested} locals, limit is {limit}")]
    TooManyLocals { requested: u32, limit: u32 },
    #[error("local slot {0} is out of range")]
    SlotOutOfRange(u32),
    #[error("local slot {0} read before it was written")]
    UninitializedLocal(u32),
    #[error("`{op}` expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("null reference")]
    NullReference,
    #[error("cannot cast {found} to {}", .expected.name())]
    ClassCast {
        expected: RefClass,
        found: &'static str,
    },
    #[error("jump to undefined label {0}")]
    UnknownLabel(Label),
    #[error("label {0} defined twice")]
    DuplicateLabel(Label),
    #[error("step limit of {0} exceeded")]
    StepLimit(u64),
    #[error("unknown static field {owner}.{name}")]
    UnknownStatic { owner: String, name: String },
    #[error("host function `{target}` returned {found}, expected {expected}")]
    BadHostResult {
        target: String,
        expected: StackType,
        found: &'static str,
    },
}

/// Final state of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Values left on the evaluation stack, bottom first.
    pub stack: Vec<RuntimeValue>,
    /// Operations executed.
    pub steps: u64,
}

impl Outcome {
    /// The value on top of the stack, if any.
    pub fn top(&self) -> Option<&RuntimeValue> {
        self.stack.last()
    }
}

enum Flow {
    Next,
    Goto(usize),
    Halt,
}

/// Interpreter state for one unit.
pub struct Machine<'u> {
    config: MachineConfig,
    unit: &'u CompiledUnit,
    labels: FxHashMap<Label, usize>,
    stack: Vec<RuntimeValue>,
    locals: Vec<Option<RuntimeValue>>,
    pc: usize,
    steps: u64,
}

impl<'u> Machine<'u> {
    /// Load a unit, resolving labels and checking limits.
    pub fn new(config: MachineConfig, unit: &'u CompiledUnit) -> Result<Self, VmError> {
        if unit.max_locals > config.max_locals {
            return Err(VmError::TooManyLocals {
                requested: unit.max_locals,
                limit: config.max_locals,
            });
        }

        let mut labels = FxHashMap::default();
        for (pos, op) in unit.ops.iter().enumerate() {
            if let Op::Label(label) = op {
                if labels.insert(*label, pos).is_some() {
                    return Err(VmError::DuplicateLabel(*label));
                }
            }
        }
        for op in &unit.ops {
            if let Op::Jump(l) | Op::JumpIf(l) | Op::JumpUnless(l) = op {
                if !labels.contains_key(l) {
                    return Err(VmError::UnknownLabel(*l));
                }
            }
        }

        Ok(Self {
            stack: Vec::with_capacity(64),
            locals: vec![None; unit.max_locals as usize],
            config,
            unit,
            labels,
            pc: 0,
            steps: 0,
        })
    }

    /// Execute until `return` or the end of the operation list.
    pub fn run(mut self, host: &mut dyn Host) -> Result<Outcome, VmError> {
        let unit = self.unit;
        while let Some(op) = unit.ops.get(self.pc) {
            self.steps += 1;
            if self.steps > self.config.max_steps {
                return Err(VmError::StepLimit(self.config.max_steps));
            }
            match self.exec(op, host)? {
                Flow::Next => self.pc += 1,
                Flow::Goto(pos) => self.pc = pos,
                Flow::Halt => break,
            }
        }
        tracing::debug!(steps = self.steps, depth = self.stack.len(), "unit finished");
        Ok(Outcome {
            stack: self.stack,
            steps: self.steps,
        })
    }

    fn exec(&mut self, op: &Op, host: &mut dyn Host) -> Result<Flow, VmError> {
        match op {
            Op::Const(c) => self.push(RuntimeValue::from_constant(c))?,
            Op::Pop => {
                self.pop()?;
            }
            Op::Dup => {
                let top = self.stack.last().cloned().ok_or(VmError::StackUnderflow)?;
                self.push(top)?;
            }
            Op::Load { slot, .. } => {
                let value = self
                    .locals
                    .get(*slot as usize)
                    .ok_or(VmError::SlotOutOfRange(*slot))?
                    .clone()
                    .ok_or(VmError::UninitializedLocal(*slot))?;
                self.push(value)?;
            }
            Op::Store { slot, ty } => {
                let value = self.pop()?;
                if !value.conforms_to(*ty) {
                    return Err(mismatch("store", *ty, &value));
                }
                let cell = self
                    .locals
                    .get_mut(*slot as usize)
                    .ok_or(VmError::SlotOutOfRange(*slot))?;
                *cell = Some(value);
            }
            Op::InstanceOf(class) => {
                let is = match self.pop()? {
                    RuntimeValue::Ref(Some(obj)) => obj.class().is_subclass_of(*class),
                    RuntimeValue::Ref(None) => false,
                    other => return Err(mismatch("instanceof", StackType::OBJECT, &other)),
                };
                self.push(RuntimeValue::Boolean(is))?;
            }
            Op::CheckCast(class) => {
                let top = self.stack.last().ok_or(VmError::StackUnderflow)?;
                if !top.conforms_to(StackType::Ref(*class)) {
                    return Err(VmError::ClassCast {
                        expected: *class,
                        found: top.describe(),
                    });
                }
            }
            Op::Box(class) => {
                let boxed = match (class, self.pop()?) {
                    (RefClass::Double, RuntimeValue::Double(v)) => Object::Double(v),
                    (RefClass::Boolean, RuntimeValue::Boolean(b)) => Object::Boolean(b),
                    (_, other) => return Err(mismatch("box", primitive_of(*class), &other)),
                };
                self.push(RuntimeValue::Ref(Some(boxed)))?;
            }
            Op::Unbox(class) => {
                let value = match (class, self.pop()?) {
                    (_, RuntimeValue::Ref(None)) => return Err(VmError::NullReference),
                    (RefClass::Double, RuntimeValue::Ref(Some(Object::Double(v)))) => {
                        RuntimeValue::Double(v)
                    }
                    (RefClass::Boolean, RuntimeValue::Ref(Some(Object::Boolean(b)))) => {
                        RuntimeValue::Boolean(b)
                    }
                    (_, other) => {
                        return Err(VmError::ClassCast {
                            expected: *class,
                            found: other.describe(),
                        })
                    }
                };
                self.push(value)?;
            }
            Op::Arith(arith) => {
                let rhs = self.pop_double("arith")?;
                let lhs = self.pop_double("arith")?;
                self.push(RuntimeValue::Double(arith.apply(lhs, rhs)))?;
            }
            Op::Compare(cmp) => {
                let rhs = self.pop_double("compare")?;
                let lhs = self.pop_double("compare")?;
                self.push(RuntimeValue::Boolean(cmp.apply(lhs, rhs)))?;
            }
            Op::Not => {
                let b = self.pop_bool("not")?;
                self.push(RuntimeValue::Boolean(!b))?;
            }
            Op::Label(_) => {}
            Op::Jump(l) => return Ok(Flow::Goto(self.target(*l)?)),
            Op::JumpIf(l) => {
                if self.pop_bool("jumpif")? {
                    return Ok(Flow::Goto(self.target(*l)?));
                }
            }
            Op::JumpUnless(l) => {
                if !self.pop_bool("jumpunless")? {
                    return Ok(Flow::Goto(self.target(*l)?));
                }
            }
            Op::GetStatic { owner, name, ty } => {
                let value = host.get_static(owner, name)?;
                if !value.conforms_to(*ty) {
                    return Err(mismatch("getstatic", *ty, &value));
                }
                self.push(value)?;
            }
            Op::Invoke {
                target,
                argc,
                returns,
            } => {
                let split = self
                    .stack
                    .len()
                    .checked_sub(usize::from(*argc))
                    .ok_or(VmError::StackUnderflow)?;
                let args = self.stack.split_off(split);
                let result = host.invoke(target, args, *returns)?;
                match (result, returns) {
                    (None, StackType::Void) => {}
                    (Some(value), ty) if value.conforms_to(*ty) => self.push(value)?,
                    (other, ty) => {
                        return Err(VmError::BadHostResult {
                            target: target.to_string(),
                            expected: *ty,
                            found: other.as_ref().map_or("nothing", RuntimeValue::describe),
                        })
                    }
                }
            }
            Op::Return => return Ok(Flow::Halt),
        }
        Ok(Flow::Next)
    }

    fn target(&self, label: Label) -> Result<usize, VmError> {
        self.labels
            .get(&label)
            .copied()
            .ok_or(VmError::UnknownLabel(label))
    }

    fn push(&mut self, value: RuntimeValue) -> Result<(), VmError> {
        if self.stack.len() >= self.config.max_stack {
            return Err(VmError::StackOverflow(self.config.max_stack));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<RuntimeValue, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn pop_double(&mut self, op: &'static str) -> Result<f64, VmError> {
        match self.pop()? {
            RuntimeValue::Double(v) => Ok(v),
            other => Err(mismatch(op, StackType::Double, &other)),
        }
    }

    fn pop_bool(&mut self, op: &'static str) -> Result<bool, VmError> {
        match self.pop()? {
            RuntimeValue::Boolean(b) => Ok(b),
            other => Err(mismatch(op, StackType::Boolean, &other)),
        }
    }
}

/// Run a unit to completion with the default limits.
pub fn run(unit: &CompiledUnit, host: &mut dyn Host) -> Result<Outcome, VmError> {
    Machine::new(MachineConfig::default(), unit)?.run(host)
}

fn mismatch(op: &'static str, expected: StackType, found: &RuntimeValue) -> VmError {
    VmError::TypeMismatch {
        op,
        expected: type_name(expected),
        found: found.describe(),
    }
}

fn type_name(ty: StackType) -> &'static str {
    match ty {
        StackType::Void => "void",
        StackType::Double => "double",
        StackType::Boolean => "boolean",
        StackType::Ref(class) => class.name(),
    }
}

fn primitive_of(class: RefClass) -> StackType {
    match class {
        RefClass::Double => StackType::Double,
        RefClass::Boolean => StackType::Boolean,
        RefClass::Object | RefClass::Text => StackType::Ref(class),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected machine faults"
)]
