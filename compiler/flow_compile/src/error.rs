//! Compile failures and recoverable wiring problems.
//!
//! Two tiers:
//!
//! - [`CompileError`]: structural damage (unknown node kind, port indices
//!   beyond what a kind declares, cycles, value fan-in). Compilation stops
//!   and no unit is produced.
//! - [`WireProblem`]: a reference that cannot be resolved (typically a wire
//!   left behind by a node deletion). The affected input behaves as if
//!   unconnected and compilation continues.

use crate::graph::{NodeId, Port, WireId};

/// A structural failure that aborts compilation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("graph has no entry node")]
    NoEntry,

    #[error("entry node {0} does not exist")]
    MissingEntry(NodeId),

    #[error("node {node} uses unknown kind `{kind}`")]
    UnknownKind { node: NodeId, kind: String },

    #[error("node {node} ({kind}) has no input {index}; the kind declares {declared}")]
    InputOutOfRange {
        node: NodeId,
        kind: String,
        index: usize,
        declared: usize,
    },

    #[error("node {node} ({kind}) has no output {index}; the kind declares {declared}")]
    OutputOutOfRange {
        node: NodeId,
        kind: String,
        index: usize,
        declared: usize,
    },

    #[error("value input {port} is driven by {count} wires")]
    ValueFanIn { port: Port, count: usize },

    #[error("signal wiring loops back into node {0}")]
    SignalCycle(NodeId),

    #[error("value of output {0} depends on itself")]
    ValueCycle(Port),

    #[error("{0} is a signal port where a value was expected")]
    NotAValue(Port),

    #[error("{0} is a value port where a signal was expected")]
    NotASignal(Port),

    #[error("node {node} ({kind}) cannot be activated by a signal")]
    NotActivatable { node: NodeId, kind: String },

    #[error("node {node} ({kind}) does not compute output {index}")]
    NoValueOutput {
        node: NodeId,
        kind: String,
        index: usize,
    },

    #[error("node {node} ({kind}) needs a tag")]
    MissingTag { node: NodeId, kind: String },

    #[error("call to `{target}` passes {count} arguments; at most 255 fit")]
    TooManyArguments { target: String, count: usize },
}

/// An unresolvable reference, recovered by defaulting.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireProblem {
    #[error("{wire} comes from removed node {node}")]
    MissingSource { wire: WireId, node: NodeId },

    #[error("{wire} leads to removed node {node}")]
    MissingTarget { wire: WireId, node: NodeId },

    #[error("{wire} comes from output {port}, which its node does not have")]
    MissingOutput { wire: WireId, port: Port },

    #[error("{wire} leads to input {port}, which its node does not have")]
    MissingInput { wire: WireId, port: Port },

    #[error("{wire} connects a signal to value input {input}")]
    SignalIntoValue { wire: WireId, input: Port },
}
