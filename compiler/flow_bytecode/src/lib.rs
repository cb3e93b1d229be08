//! Target stack-machine representation for the flow graph compiler.
//!
//! This crate defines what the compiler emits and what the encoder consumes:
//!
//! - **Static types** ([`StackType`], [`RefClass`]): the type an operation
//!   leaves on the evaluation stack.
//! - **Operations** ([`Op`], [`Constant`], [`Label`]): one flat, JVM-style
//!   operation set with symbolic labels.
//! - **Compiled units** ([`CompiledUnit`]): the operation list plus the local
//!   slot count; the whole handoff contract with an encoder.
//! - **Reference machine** ([`vm`]): an interpreter used to observe the
//!   runtime behavior of compiled graphs.
//!
//! # Crate Dependencies
//!
//! None on the rest of the compiler. The compiler depends on this crate, not
//! the other way round.

mod op;
mod types;
mod unit;
pub mod vm;

pub use op::{ArithOp, CompareOp, Constant, Label, Op};
pub use types::{RefClass, StackType};
pub use unit::CompiledUnit;
