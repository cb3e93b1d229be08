//! Per-compilation context.
//!
//! A [`NodeCompiler`] lives for exactly one full-graph compilation. It owns
//! every resource decision made during the walk: slot numbering, label
//! numbering, the table of graph variables, and the memo table that keeps a
//! multiply-consumed node output from being emitted more than once.
//!
//! # Slot discipline
//!
//! One monotonic counter numbers every local slot. The `prepare` phase
//! reserves unit-wide slots (variables, shared values) first, so they occupy
//! the lowest numbers. Compilation then starts with `used_vars` equal to the
//! reserved count and hands out temporaries from the same counter, which
//! never decreases. A slot number is therefore never reused within one unit.
//!
//! # Shared values
//!
//! A memoized output is computed once and stored in its slot; consumers
//! load it. The computation is placed where every consumer passes first:
//! at the first reference when later ones follow it on the same path, or
//! just before a branch or loop whose arms (or body and continuation)
//! both need it. Emission tracks which values are stored on the current
//! path and forgets stores made inside an arm or a loop body once it
//! leaves them.

use flow_bytecode::{CompiledUnit, Constant, Label, Op, StackType};
use rustc_hash::FxHashMap;

use crate::error::WireProblem;
use crate::graph::Port;
use crate::instruction::Instruction;

/// Index of a memoized value in the compiler's shared table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SharedId(u32);

impl SharedId {
    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A memoized node output.
#[derive(Debug)]
struct SharedValue {
    value: Instruction,
    ty: StackType,
    /// Value the slot holds until the computation first runs.
    default: Constant,
    slot: Option<u32>,
    /// Whether code emitted so far stores the value on every path that
    /// reaches the current emission point.
    stored: bool,
}

/// What a [`Instruction::Shared`] reference should emit.
pub(crate) enum SharedEmit {
    /// Not yet stored on this path: compute and store.
    First { value: Instruction, slot: u32 },
    /// Already stored: load it.
    Again { slot: u32 },
    /// The id belongs to another compilation.
    Unknown,
}

/// Result of a full compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct Compilation {
    /// The code handed to the encoder.
    pub unit: CompiledUnit,
    /// Unresolvable references that were defaulted instead of failing.
    pub problems: Vec<WireProblem>,
}

/// Compilation context for one unit.
#[derive(Debug, Default)]
pub struct NodeCompiler {
    next_slot: u32,
    next_label: u32,
    variables: FxHashMap<Box<str>, u32>,
    shared: Vec<SharedValue>,
    memo: FxHashMap<Port, SharedId>,
    problems: Vec<WireProblem>,
    compiling: bool,
}

impl NodeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of local slots committed so far.
    #[inline]
    pub fn used_vars(&self) -> u32 {
        self.next_slot
    }

    // Slots

    /// Reserve a unit-wide slot. Only valid during `prepare`.
    pub fn reserve_slot(&mut self) -> u32 {
        debug_assert!(!self.compiling, "unit-wide slots are reserved during prepare");
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Slot of a graph variable, reserving it on first use.
    pub fn variable_slot(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.variables.get(name) {
            return slot;
        }
        let slot = self.reserve_slot();
        tracing::trace!(variable = name, slot, "reserved variable slot");
        self.variables.insert(name.into(), slot);
        slot
    }

    /// A temporary numbered at or above `used_vars`.
    pub fn temp_slot(&mut self, used_vars: u32) -> u32 {
        let slot = used_vars.max(self.next_slot);
        self.next_slot = slot + 1;
        slot
    }

    /// A label unique within the unit.
    pub fn fresh_label(&mut self) -> Label {
        let label = Label::new(self.next_label);
        self.next_label += 1;
        label
    }

    // Shared values

    /// Memoize the instruction computing `port`; every consumer gets a
    /// [`Instruction::Shared`] reference to it.
    ///
    /// `default` is what the slot holds before the computation first runs.
    pub fn share(&mut self, port: Port, value: Instruction, default: Constant) -> Instruction {
        let ty = value.return_type();
        debug_assert!(ty.is_value(), "only values can be shared");
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shared value count never exceeds u32"
        )]
        let id = SharedId(self.shared.len() as u32);
        self.shared.push(SharedValue {
            value,
            ty,
            default,
            slot: None,
            stored: false,
        });
        self.memo.insert(port, id);
        Instruction::Shared { id, ty }
    }

    /// Reference to an already memoized output.
    pub fn shared(&self, port: Port) -> Option<Instruction> {
        let id = *self.memo.get(&port)?;
        let shared = self.shared.get(id.index())?;
        Some(Instruction::Shared { id, ty: shared.ty })
    }

    /// Returns `true` once any output has been memoized.
    #[inline]
    pub(crate) fn has_shared(&self) -> bool {
        !self.shared.is_empty()
    }

    /// The computation behind `id`.
    pub(crate) fn shared_value(&self, id: SharedId) -> Option<&Instruction> {
        self.shared.get(id.index()).map(|shared| &shared.value)
    }

    /// Reserve the slot of a shared value and prepare its computation, once.
    pub(crate) fn prepare_shared(&mut self, id: SharedId) {
        let Some(shared) = self.shared.get(id.index()) else {
            tracing::warn!(id = id.index(), "shared value from another compilation");
            return;
        };
        if shared.slot.is_some() {
            return;
        }
        let value = shared.value.clone();
        let slot = self.reserve_slot();
        if let Some(shared) = self.shared.get_mut(id.index()) {
            shared.slot = Some(slot);
        }
        value.prepare(self);
    }

    /// Returns `true` if `id` is stored on every path to the current point.
    pub(crate) fn is_stored(&self, id: SharedId) -> bool {
        self.shared.get(id.index()).is_some_and(|shared| shared.stored)
    }

    pub(crate) fn begin_shared(&mut self, id: SharedId) -> SharedEmit {
        let fresh = self.next_slot;
        let Some(shared) = self.shared.get_mut(id.index()) else {
            tracing::warn!(
                id = id.index(),
                "shared value from another compilation, pushing zero"
            );
            return SharedEmit::Unknown;
        };
        let slot = match shared.slot {
            Some(slot) => slot,
            None => {
                // Never prepared; give it a slot that cannot collide.
                shared.slot = Some(fresh);
                self.next_slot += 1;
                fresh
            }
        };
        if shared.stored {
            SharedEmit::Again { slot }
        } else {
            shared.stored = true;
            SharedEmit::First {
                value: shared.value.clone(),
                slot,
            }
        }
    }

    /// Which shared values are stored at the current emission point.
    pub(crate) fn stored_marks(&self) -> Vec<bool> {
        self.shared.iter().map(|shared| shared.stored).collect()
    }

    /// Forget stores made inside a branch arm or loop body.
    pub(crate) fn restore_marks(&mut self, marks: &[bool]) {
        for (shared, &stored) in self.shared.iter_mut().zip(marks) {
            shared.stored = stored;
        }
    }

    // Problems

    /// Record an unresolvable reference. Duplicates are dropped.
    pub fn record(&mut self, problem: WireProblem) {
        if !self.problems.contains(&problem) {
            tracing::warn!(%problem, "unresolvable wiring, using defaults");
            self.problems.push(problem);
        }
    }

    pub fn problems(&self) -> &[WireProblem] {
        &self.problems
    }

    // Finishing

    /// Run both phases over `body` and produce the unit.
    ///
    /// The prologue initializes every reserved slot (variables to null,
    /// shared values to their default), so no reserved slot is ever read
    /// before it is written.
    pub fn finish(mut self, body: Instruction) -> Compilation {
        body.prepare(&mut self);
        let reserved = self.next_slot;
        self.compiling = true;

        let code = body.compile(&mut self, reserved);

        let mut inits: Vec<(u32, Constant, StackType)> = self
            .variables
            .values()
            .map(|&slot| (slot, Constant::Null, StackType::OBJECT))
            .chain(
                self.shared
                    .iter()
                    .filter_map(|s| s.slot.map(|slot| (slot, s.default.clone(), s.ty))),
            )
            .collect();
        inits.sort_by_key(|(slot, ..)| *slot);

        let mut ops = Vec::with_capacity(inits.len() * 2 + code.len() + 1);
        for (slot, constant, ty) in inits {
            ops.push(Op::Const(constant));
            ops.push(Op::Store { slot, ty });
        }
        ops.extend(code);
        ops.push(Op::Return);

        tracing::debug!(
            reserved,
            locals = self.next_slot,
            ops = ops.len(),
            problems = self.problems.len(),
            "compiled unit"
        );

        Compilation {
            unit: CompiledUnit::new(ops, self.next_slot),
            problems: self.problems,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected machine faults"
)]
