//! Shared helpers for unit tests: run instructions on the reference machine.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test helpers panic on machine faults"
)]

use flow_bytecode::vm::{self, Outcome, RuntimeValue, ScriptedHost, VmError};
use flow_bytecode::Op;

use crate::compiler::NodeCompiler;
use crate::instruction::Instruction;

/// Compile `body` as a whole unit and run it.
pub(crate) fn run(body: Instruction) -> Result<Outcome, VmError> {
    let compilation = NodeCompiler::new().finish(body);
    vm::run(&compilation.unit, &mut ScriptedHost::new())
}

/// Value left on the stack by `value`, which must produce one.
pub(crate) fn evaluate(value: Instruction) -> RuntimeValue {
    assert!(
        value.return_type().is_value(),
        "evaluate needs a value, got {}",
        value.return_type()
    );
    let outcome = run(value).expect("machine fault");
    assert_eq!(outcome.stack.len(), 1, "expected exactly one value");
    outcome.stack.into_iter().next().unwrap()
}

/// Ops emitted by `value` alone, without prologue or `return`.
pub(crate) fn emitted(value: &Instruction) -> Vec<Op> {
    let mut ctx = NodeCompiler::new();
    value.prepare(&mut ctx);
    let reserved = ctx.used_vars();
    value.compile(&mut ctx, reserved)
}

/// Number of ops in `ops` matching `pred`.
pub(crate) fn count(ops: &[Op], pred: impl Fn(&Op) -> bool) -> usize {
    ops.iter().filter(|op| pred(op)).count()
}

