//! Node graph compiler for the flow stack machine.
//!
//! This crate turns an authored graph of nodes and wires into one
//! [`CompiledUnit`](flow_bytecode::CompiledUnit):
//!
//! - **Value kinds** ([`ValueKind`], [`Repr`], [`Literal`]): the closed set
//!   of data categories a wire carries, each with a native and a boxed stack
//!   representation and never-failing conversions between them.
//!
//! - **Instruction trees** ([`Instruction`]): composable emittable code with
//!   a static result type and a two-phase `prepare`/`compile` protocol.
//!
//! - **Compilation context** ([`NodeCompiler`]): slot and label numbering,
//!   graph variables, and the memo table for outputs with several consumers.
//!
//! - **Graph model** ([`Graph`], [`Node`], [`Port`], [`Wire`]): stable node
//!   indices with tombstones for removed nodes.
//!
//! - **Node catalog** ([`catalog`]): the behavior behind each node kind.
//!
//! - **Linearizer** ([`compile_graph`]): signal-ordered walk producing one
//!   instruction tree.
//!
//! # Crate Dependencies
//!
//! `flow_compile` depends on `flow_bytecode` for the target operation set and
//! on `flow_stack` for deep-walk stack growth. It has no dependency on any
//! editor or encoder.

pub mod catalog;
mod compiler;
mod error;
mod graph;
mod instruction;
mod linearize;
mod value;

#[cfg(test)]
mod test_helpers;

pub use catalog::{Catalog, NodeKind, PortSpec};
pub use compiler::{Compilation, NodeCompiler, SharedId};
pub use error::{CompileError, WireProblem};
pub use graph::{Graph, Node, NodeId, Port, Wire, WireId};
pub use instruction::Instruction;
pub use linearize::{compile_graph, Activation};
pub use value::{Literal, Repr, ValueKind};
