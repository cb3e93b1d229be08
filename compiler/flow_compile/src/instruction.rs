//! Instruction trees: composable units of emittable code.
//!
//! An [`Instruction`] is an owned tree. Leaves wrap a single target
//! operation; composites sequence their children and state one aggregate
//! result type. Every instruction goes through two phases driven by the
//! [`NodeCompiler`]:
//!
//! 1. [`prepare`](Instruction::prepare): top-down, before anything is
//!    emitted. Reserves the slots that must exist for the whole unit
//!    (variables, shared values).
//! 2. [`compile`](Instruction::compile): emits the flat operation list.
//!    Temporaries are handed out at or above `used_vars` in pre-order, so
//!    sibling subtrees never share a slot.

use std::slice;

use flow_bytecode::{ArithOp, CompareOp, Constant, Label, Op, StackType};
use flow_stack::ensure_sufficient_stack;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::compiler::{NodeCompiler, SharedEmit, SharedId};
use crate::error::CompileError;

/// A node in a tree of emittable operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// A single target operation.
    Leaf { op: Op, ty: StackType },

    /// Children in order; `ty` is supplied by the caller because earlier
    /// children may only set up the stack for the last one.
    Sequence {
        ty: StackType,
        children: Vec<Instruction>,
    },

    /// A fixed operation idiom. Labels inside are local to the block and are
    /// renamed to fresh unit-wide labels on every compile.
    Raw { ty: StackType, ops: Vec<Op> },

    /// A memoized node output owned by the compiler. It is computed once,
    /// where every reference passes first, and loaded everywhere else.
    Shared { id: SharedId, ty: StackType },

    /// Push the boxed value of a graph variable.
    LoadVariable { name: Box<str> },

    /// Pop a boxed value into a graph variable.
    StoreVariable {
        name: Box<str>,
        value: Box<Instruction>,
    },

    /// Run `body` `times` times (`times` is a native number).
    Repeat {
        times: Box<Instruction>,
        body: Box<Instruction>,
    },

    /// Run `then` if `condition` is true, `otherwise` if not.
    Branch {
        condition: Box<Instruction>,
        then: Box<Instruction>,
        otherwise: Box<Instruction>,
    },
}

impl Instruction {
    // Constructors

    /// A single operation with its result type.
    pub fn op(op: Op, ty: StackType) -> Self {
        Instruction::Leaf { op, ty }
    }

    /// Push a constant.
    pub fn constant(constant: Constant) -> Self {
        let ty = constant.stack_type();
        Instruction::Leaf {
            op: Op::Const(constant),
            ty,
        }
    }

    /// Emits nothing.
    pub fn empty() -> Self {
        Instruction::Sequence {
            ty: StackType::Void,
            children: Vec::new(),
        }
    }

    pub fn sequence(ty: StackType, children: Vec<Instruction>) -> Self {
        Instruction::Sequence { ty, children }
    }

    pub fn raw(ty: StackType, ops: Vec<Op>) -> Self {
        Instruction::Raw { ty, ops }
    }

    /// Evaluate `args` left to right, then call a host function.
    ///
    /// A call carries at most 255 arguments.
    pub fn call(
        target: &str,
        args: Vec<Instruction>,
        returns: StackType,
    ) -> Result<Self, CompileError> {
        let Ok(argc) = u8::try_from(args.len()) else {
            return Err(CompileError::TooManyArguments {
                target: target.into(),
                count: args.len(),
            });
        };
        let mut children = args;
        children.push(Instruction::op(
            Op::Invoke {
                target: target.into(),
                argc,
                returns,
            },
            returns,
        ));
        Ok(Instruction::Sequence {
            ty: returns,
            children,
        })
    }

    /// Evaluate both operands, then apply a double arithmetic operation.
    pub fn arith(op: ArithOp, lhs: Instruction, rhs: Instruction) -> Self {
        Instruction::sequence(
            StackType::Double,
            vec![lhs, rhs, Instruction::op(Op::Arith(op), StackType::Double)],
        )
    }

    /// Evaluate both operands, then compare them.
    pub fn compare(op: CompareOp, lhs: Instruction, rhs: Instruction) -> Self {
        Instruction::sequence(
            StackType::Boolean,
            vec![lhs, rhs, Instruction::op(Op::Compare(op), StackType::Boolean)],
        )
    }

    pub fn load_variable(name: &str) -> Self {
        Instruction::LoadVariable { name: name.into() }
    }

    pub fn store_variable(name: &str, value: Instruction) -> Self {
        Instruction::StoreVariable {
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn repeat(times: Instruction, body: Instruction) -> Self {
        Instruction::Repeat {
            times: Box::new(times),
            body: Box::new(body),
        }
    }

    pub fn branch(condition: Instruction, then: Instruction, otherwise: Instruction) -> Self {
        Instruction::Branch {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    // Protocol

    /// Static type left on the stack after this instruction runs.
    pub fn return_type(&self) -> StackType {
        match self {
            Instruction::Leaf { ty, .. }
            | Instruction::Sequence { ty, .. }
            | Instruction::Raw { ty, .. }
            | Instruction::Shared { ty, .. } => *ty,
            Instruction::LoadVariable { .. } => StackType::OBJECT,
            Instruction::StoreVariable { .. } | Instruction::Repeat { .. } => StackType::Void,
            Instruction::Branch { then, .. } => then.return_type(),
        }
    }

    /// Reserve the unit-wide resources this subtree needs.
    ///
    /// Safe to call on subtrees that end up emitting nothing; reservations
    /// are keyed (by variable name, by shared id) and happen once.
    pub fn prepare(&self, ctx: &mut NodeCompiler) {
        ensure_sufficient_stack(|| match self {
            Instruction::Leaf { .. } | Instruction::Raw { .. } => {}
            Instruction::Sequence { children, .. } => {
                for child in children {
                    child.prepare(ctx);
                }
            }
            Instruction::Shared { id, .. } => ctx.prepare_shared(*id),
            Instruction::LoadVariable { name } => {
                ctx.variable_slot(name);
            }
            Instruction::StoreVariable { name, value } => {
                ctx.variable_slot(name);
                value.prepare(ctx);
            }
            Instruction::Repeat { times, body } => {
                times.prepare(ctx);
                body.prepare(ctx);
            }
            Instruction::Branch {
                condition,
                then,
                otherwise,
            } => {
                condition.prepare(ctx);
                then.prepare(ctx);
                otherwise.prepare(ctx);
            }
        });
    }

    /// Emit the flat operation list.
    ///
    /// `used_vars` is the number of slots already committed by code compiled
    /// earlier; any temporary this subtree introduces is numbered at or above
    /// it.
    pub fn compile(&self, ctx: &mut NodeCompiler, used_vars: u32) -> Vec<Op> {
        let mut out = Vec::new();
        self.emit(ctx, used_vars, &END, &mut out);
        out
    }

    /// Shared values this subtree may reference, including the ones the
    /// computations of unstored values reference in turn.
    fn shared_uses(&self, ctx: &NodeCompiler, uses: &mut FxHashSet<SharedId>) {
        ensure_sufficient_stack(|| match self {
            Instruction::Leaf { .. }
            | Instruction::Raw { .. }
            | Instruction::LoadVariable { .. } => {}
            Instruction::Sequence { children, .. } => {
                for child in children {
                    child.shared_uses(ctx, uses);
                }
            }
            Instruction::Shared { id, .. } => {
                if uses.insert(*id) && !ctx.is_stored(*id) {
                    if let Some(value) = ctx.shared_value(*id) {
                        value.shared_uses(ctx, uses);
                    }
                }
            }
            Instruction::StoreVariable { value, .. } => value.shared_uses(ctx, uses),
            Instruction::Repeat { times, body } => {
                times.shared_uses(ctx, uses);
                body.shared_uses(ctx, uses);
            }
            Instruction::Branch {
                condition,
                then,
                otherwise,
            } => {
                condition.shared_uses(ctx, uses);
                then.shared_uses(ctx, uses);
                otherwise.shared_uses(ctx, uses);
            }
        });
    }

    fn emit(
        &self,
        ctx: &mut NodeCompiler,
        used_vars: u32,
        after: &After<'_>,
        out: &mut Vec<Op>,
    ) {
        ensure_sufficient_stack(|| match self {
            Instruction::Leaf { op, .. } => out.push(op.clone()),
            Instruction::Sequence { children, .. } => {
                for (i, child) in children.iter().enumerate() {
                    let rest = After {
                        rest: &children[i + 1..],
                        outer: Some(after),
                    };
                    child.emit(ctx, used_vars, &rest, out);
                }
            }
            Instruction::Raw { ops, .. } => emit_raw(ops, ctx, out),
            Instruction::Shared { id, ty } => match ctx.begin_shared(*id) {
                SharedEmit::First { value, slot } => {
                    value.emit(ctx, used_vars, after, out);
                    out.push(Op::Dup);
                    out.push(Op::Store { slot, ty: *ty });
                }
                SharedEmit::Again { slot } => out.push(Op::Load { slot, ty: *ty }),
                SharedEmit::Unknown => {
                    if let Some(constant) = zero(*ty) {
                        out.push(Op::Const(constant));
                    }
                }
            },
            Instruction::LoadVariable { name } => {
                let slot = ctx.variable_slot(name);
                out.push(Op::Load {
                    slot,
                    ty: StackType::OBJECT,
                });
            }
            Instruction::StoreVariable { name, value } => {
                value.emit(ctx, used_vars, after, out);
                let slot = ctx.variable_slot(name);
                out.push(Op::Store {
                    slot,
                    ty: StackType::OBJECT,
                });
            }
            Instruction::Repeat { times, body } => {
                let body_then_after = After {
                    rest: slice::from_ref(&**body),
                    outer: Some(after),
                };
                times.emit(ctx, used_vars, &body_then_after, out);
                let limit = ctx.temp_slot(used_vars);
                let counter = ctx.temp_slot(limit + 1);
                let head = ctx.fresh_label();
                let exit = ctx.fresh_label();
                let double = StackType::Double;
                out.extend([
                    Op::Store {
                        slot: limit,
                        ty: double,
                    },
                    Op::Const(Constant::number(0.0)),
                    Op::Store {
                        slot: counter,
                        ty: double,
                    },
                ]);
                // The body may run zero times.
                hoist_shared(ctx, counter + 1, &[&**body], after, &body_then_after, out);
                let marks = ctx.stored_marks();
                out.extend([
                    Op::Label(head),
                    Op::Load {
                        slot: counter,
                        ty: double,
                    },
                    Op::Load {
                        slot: limit,
                        ty: double,
                    },
                    Op::Compare(CompareOp::Lt),
                    Op::JumpUnless(exit),
                ]);
                body.emit(ctx, counter + 1, after, out);
                ctx.restore_marks(&marks);
                out.extend([
                    Op::Load {
                        slot: counter,
                        ty: double,
                    },
                    Op::Const(Constant::number(1.0)),
                    Op::Arith(ArithOp::Add),
                    Op::Store {
                        slot: counter,
                        ty: double,
                    },
                    Op::Jump(head),
                    Op::Label(exit),
                ]);
            }
            Instruction::Branch {
                condition,
                then,
                otherwise,
            } => {
                let otherwise_then_after = After {
                    rest: slice::from_ref(&**otherwise),
                    outer: Some(after),
                };
                let arms_then_after = After {
                    rest: slice::from_ref(&**then),
                    outer: Some(&otherwise_then_after),
                };
                condition.emit(ctx, used_vars, &arms_then_after, out);
                hoist_shared(
                    ctx,
                    used_vars,
                    &[&**then, &**otherwise],
                    after,
                    &arms_then_after,
                    out,
                );
                let marks = ctx.stored_marks();
                let else_label = ctx.fresh_label();
                let end = ctx.fresh_label();
                out.push(Op::JumpUnless(else_label));
                then.emit(ctx, used_vars, after, out);
                ctx.restore_marks(&marks);
                out.push(Op::Jump(end));
                out.push(Op::Label(else_label));
                otherwise.emit(ctx, used_vars, after, out);
                ctx.restore_marks(&marks);
                out.push(Op::Label(end));
            }
        });
    }
}

/// Code that runs after the instruction being emitted: the remaining
/// siblings, then whatever follows the enclosing instruction.
struct After<'a> {
    rest: &'a [Instruction],
    outer: Option<&'a After<'a>>,
}

const END: After<'static> = After {
    rest: &[],
    outer: None,
};

impl After<'_> {
    fn shared_uses(&self, ctx: &NodeCompiler) -> FxHashSet<SharedId> {
        let mut uses = FxHashSet::default();
        let mut next = Some(self);
        while let Some(after) = next {
            for instruction in after.rest {
                instruction.shared_uses(ctx, &mut uses);
            }
            next = after.outer;
        }
        uses
    }
}

/// Store, ahead of a branch or loop, every shared value that more than one
/// of `regions` and the code `after` them need and that is not stored yet.
///
/// A value needed by a single region is left to that region, so it is
/// only computed on the paths that use it.
fn hoist_shared(
    ctx: &mut NodeCompiler,
    used_vars: u32,
    regions: &[&Instruction],
    after: &After<'_>,
    following: &After<'_>,
    out: &mut Vec<Op>,
) {
    if !ctx.has_shared() {
        return;
    }
    let per_region: SmallVec<[FxHashSet<SharedId>; 2]> = regions
        .iter()
        .map(|region| {
            let mut uses = FxHashSet::default();
            region.shared_uses(ctx, &mut uses);
            uses
        })
        .collect();
    let mut candidates: Vec<SharedId> = per_region
        .iter()
        .flatten()
        .copied()
        .filter(|&id| !ctx.is_stored(id))
        .collect();
    if candidates.is_empty() {
        return;
    }
    // Outer values first: their computations store the inner ones.
    candidates.sort_unstable_by(|a, b| b.cmp(a));
    candidates.dedup();

    let later = after.shared_uses(ctx);
    for id in candidates {
        let needed_by = per_region.iter().filter(|uses| uses.contains(&id)).count()
            + usize::from(later.contains(&id));
        if needed_by < 2 {
            continue;
        }
        if let SharedEmit::First { value, slot } = ctx.begin_shared(id) {
            tracing::trace!(id = id.index(), slot, "hoisted shared value");
            let ty = value.return_type();
            value.emit(ctx, used_vars, following, out);
            out.push(Op::Store { slot, ty });
        }
    }
}

/// Placeholder pushed for a value that cannot be computed.
fn zero(ty: StackType) -> Option<Constant> {
    match ty {
        StackType::Void => None,
        StackType::Double => Some(Constant::number(0.0)),
        StackType::Boolean => Some(Constant::Boolean(false)),
        StackType::Ref(_) => Some(Constant::Null),
    }
}

/// Copy a raw block, renaming its block-local labels to fresh ones.
fn emit_raw(ops: &[Op], ctx: &mut NodeCompiler, out: &mut Vec<Op>) {
    let mut renamed: SmallVec<[(Label, Label); 4]> = SmallVec::new();
    for op in ops {
        out.push(op.relabel(|local| {
            if let Some(&(_, fresh)) = renamed.iter().find(|(l, _)| *l == local) {
                return fresh;
            }
            let fresh = ctx.fresh_label();
            renamed.push((local, fresh));
            fresh
        }));
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected machine faults"
)]
