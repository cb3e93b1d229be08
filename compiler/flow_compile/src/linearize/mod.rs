//! Graph linearization: from wires to one instruction tree.
//!
//! Execution order comes from signal wires. Starting at the entry node, each
//! signal output is followed to the nodes it activates, in wire-list order,
//! and each activated node's kind produces its code, following its own
//! signal outputs wherever its semantics put them (after itself, inside a
//! loop body, in a branch arm).
//!
//! Values are pulled, not pushed: a kind asks for input `i`, and the
//! linearizer finds the one wire driving it, asks the producing kind for the
//! output's code, and adapts the producer's representation to the
//! consumer's. An output with more than one consumer is memoized in the
//! [`NodeCompiler`] so its code is emitted once.
//!
//! # Failure tiers
//!
//! References that cannot be resolved (a wire from a removed node, an output
//! index the source kind lacks, a signal wired into a value input) are
//! recorded as [`WireProblem`]s and the input behaves as if unconnected.
//! Structural damage (unknown kinds, cycles, fan-in) is a [`CompileError`].

use flow_bytecode::{Constant, StackType};
use flow_stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::catalog::{Catalog, NodeKind, PortSpec};
use crate::compiler::{Compilation, NodeCompiler};
use crate::error::{CompileError, WireProblem};
use crate::graph::{Graph, Node, NodeId, Port, WireId};
use crate::instruction::Instruction;
use crate::value::{Literal, Repr};

/// Wires touching one port, in wire-list order.
type WireList = SmallVec<[WireId; 2]>;

/// Compile a whole graph into one unit.
///
/// # Errors
///
/// Returns a [`CompileError`] when the graph is structurally broken. Wiring
/// that merely cannot be resolved is reported in
/// [`Compilation::problems`] instead.
pub fn compile_graph(graph: &Graph, catalog: &Catalog) -> Result<Compilation, CompileError> {
    let entry = graph.entry().ok_or(CompileError::NoEntry)?;
    let mut lin = Linearizer::new(graph, catalog);
    let (_, kind) = lin.resolve(entry)?.ok_or(CompileError::MissingEntry(entry))?;

    tracing::debug!(
        entry = %entry,
        kind = kind.name(),
        wires = lin.by_source.values().map(SmallVec::len).sum::<usize>(),
        "linearizing graph"
    );

    lin.active.push(entry);
    let mut code = Vec::new();
    for (index, spec) in kind.outputs().iter().enumerate() {
        if spec.is_signal() {
            code.push(lin.follow(Port::new(entry, index))?);
        }
    }
    lin.active.pop();

    let body = Instruction::sequence(StackType::Void, code);
    Ok(lin.ctx.finish(body))
}

/// Walk state for one compilation.
pub(crate) struct Linearizer<'g> {
    graph: &'g Graph,
    catalog: &'g Catalog,
    ctx: NodeCompiler,
    /// Wires leaving each output port.
    by_source: FxHashMap<Port, WireList>,
    /// Wires arriving at each input port.
    by_target: FxHashMap<Port, WireList>,
    /// Nodes whose activation is in progress.
    active: Vec<NodeId>,
    /// Outputs whose code is being built.
    evaluating: FxHashSet<Port>,
}

/// The producing side of a value wire.
struct Driver<'g> {
    port: Port,
    spec: PortSpec,
    node: &'g Node,
    kind: &'g dyn NodeKind,
}

impl<'g> Linearizer<'g> {
    fn new(graph: &'g Graph, catalog: &'g Catalog) -> Self {
        let mut by_source: FxHashMap<Port, WireList> = FxHashMap::default();
        let mut by_target: FxHashMap<Port, WireList> = FxHashMap::default();
        for (id, wire) in graph.wires() {
            by_source.entry(wire.from).or_default().push(id);
            by_target.entry(wire.to).or_default().push(id);
        }
        Self {
            graph,
            catalog,
            ctx: NodeCompiler::new(),
            by_source,
            by_target,
            active: Vec::new(),
            evaluating: FxHashSet::default(),
        }
    }

    /// Look up a node and its kind. `None` if the node was removed.
    fn resolve(&self, id: NodeId) -> Result<Option<(&'g Node, &'g dyn NodeKind)>, CompileError> {
        let graph = self.graph;
        let catalog = self.catalog;
        let Some(node) = graph.node(id) else {
            return Ok(None);
        };
        let kind = catalog
            .get(&node.kind)
            .ok_or_else(|| CompileError::UnknownKind {
                node: id,
                kind: node.kind.clone(),
            })?;

        let declared = kind.inputs().len();
        if let Some(index) = (declared..node.insets.len()).find(|&i| node.insets[i].is_some()) {
            return Err(CompileError::InputOutOfRange {
                node: id,
                kind: node.kind.clone(),
                index,
                declared,
            });
        }
        Ok(Some((node, kind)))
    }

    // Signals

    /// Linearize everything a signal output activates, in wire-list order.
    fn follow(&mut self, from: Port) -> Result<Instruction, CompileError> {
        let wires = self.by_source.get(&from).cloned().unwrap_or_default();
        let mut code = Vec::with_capacity(wires.len());
        for id in wires {
            let Some(&wire) = self.graph.wire(id) else {
                continue;
            };
            let to = wire.to;
            let Some((node, kind)) = self.resolve(to.node)? else {
                self.ctx.record(WireProblem::MissingTarget {
                    wire: id,
                    node: to.node,
                });
                continue;
            };
            match kind.inputs().get(to.index) {
                None => {
                    self.ctx
                        .record(WireProblem::MissingInput { wire: id, port: to });
                    continue;
                }
                Some(spec) if !spec.is_signal() => {
                    self.ctx
                        .record(WireProblem::SignalIntoValue { wire: id, input: to });
                    continue;
                }
                Some(_) => {}
            }
            code.push(self.activate(to.node, node, kind, to.index)?);
        }
        Ok(Instruction::sequence(StackType::Void, code))
    }

    fn activate(
        &mut self,
        id: NodeId,
        node: &'g Node,
        kind: &'g dyn NodeKind,
        input: usize,
    ) -> Result<Instruction, CompileError> {
        if self.active.contains(&id) {
            return Err(CompileError::SignalCycle(id));
        }
        tracing::trace!(node = %id, kind = kind.name(), input, "activate");

        self.active.push(id);
        let code = ensure_sufficient_stack(|| {
            let mut cx = Activation {
                lin: self,
                id,
                node,
                kind,
            };
            kind.activate(&mut cx, input)
        });
        self.active.pop();
        code
    }

    // Values

    /// Code for value input `index` of a node, in the input's declared
    /// representation.
    fn input(
        &mut self,
        id: NodeId,
        node: &'g Node,
        kind: &'g dyn NodeKind,
        index: usize,
    ) -> Result<Instruction, CompileError> {
        let port = Port::new(id, index);
        let Some(&spec) = kind.inputs().get(index) else {
            return Err(CompileError::InputOutOfRange {
                node: id,
                kind: node.kind.clone(),
                index,
                declared: kind.inputs().len(),
            });
        };
        if spec.is_signal() {
            return Err(CompileError::NotAValue(port));
        }

        let drivers = self.by_target.get(&port).cloned().unwrap_or_default();
        if drivers.len() > 1 {
            return Err(CompileError::ValueFanIn {
                port,
                count: drivers.len(),
            });
        }
        if let Some(&wire) = drivers.first() {
            if let Some(driver) = self.resolve_driver(wire, port)? {
                tracing::trace!(input = %port, from = %driver.port, "resolve value");
                let produced = driver.spec;
                let value = self.output(driver)?;
                return Ok(adapt(produced, spec, value));
            }
        }
        Ok(unconnected(node, index, spec))
    }

    /// The output driving a value input, or `None` (recorded) if the wire
    /// cannot be resolved.
    fn resolve_driver(
        &mut self,
        id: WireId,
        input: Port,
    ) -> Result<Option<Driver<'g>>, CompileError> {
        let graph = self.graph;
        let Some(&wire) = graph.wire(id) else {
            return Ok(None);
        };
        let from = wire.from;
        let Some((node, kind)) = self.resolve(from.node)? else {
            self.ctx.record(WireProblem::MissingSource {
                wire: id,
                node: from.node,
            });
            return Ok(None);
        };
        let Some(&spec) = kind.outputs().get(from.index) else {
            self.ctx
                .record(WireProblem::MissingOutput { wire: id, port: from });
            return Ok(None);
        };
        if spec.is_signal() {
            self.ctx
                .record(WireProblem::SignalIntoValue { wire: id, input });
            return Ok(None);
        }
        Ok(Some(Driver {
            port: from,
            spec,
            node,
            kind,
        }))
    }

    /// Code for a value output, memoized when several wires consume it.
    fn output(&mut self, driver: Driver<'g>) -> Result<Instruction, CompileError> {
        let port = driver.port;
        if let Some(shared) = self.ctx.shared(port) {
            return Ok(shared);
        }
        if !self.evaluating.insert(port) {
            return Err(CompileError::ValueCycle(port));
        }

        let value = ensure_sufficient_stack(|| {
            let mut cx = Activation {
                lin: self,
                id: port.node,
                node: driver.node,
                kind: driver.kind,
            };
            driver.kind.output(&mut cx, port.index)
        });
        self.evaluating.remove(&port);
        let value = value?;

        let consumers = self.by_source.get(&port).map_or(0, SmallVec::len);
        if consumers > 1 {
            let default = match driver.spec.repr {
                Repr::Native => driver
                    .spec
                    .kind
                    .default_constant()
                    .unwrap_or(Constant::Null),
                Repr::Boxed => Constant::Null,
            };
            tracing::trace!(output = %port, consumers, "sharing output");
            return Ok(self.ctx.share(port, value, default));
        }
        Ok(value)
    }
}

/// Convert a producer's representation to what the consumer declared.
fn adapt(produced: PortSpec, consumed: PortSpec, value: Instruction) -> Instruction {
    match (produced.repr, consumed.repr) {
        (Repr::Native, Repr::Native) if produced.kind == consumed.kind => value,
        (Repr::Native, Repr::Native) => consumed.kind.cast(produced.kind.wrap_primitive(value)),
        (Repr::Native, Repr::Boxed) => produced.kind.wrap_primitive(value),
        (Repr::Boxed, Repr::Native) => consumed.kind.cast(value),
        (Repr::Boxed, Repr::Boxed) => value,
    }
}

/// Value of an input with no usable wire: the inset, or the kind's default.
fn unconnected(node: &Node, index: usize, spec: PortSpec) -> Instruction {
    let value = match node.inset(index) {
        Some(literal) => spec.kind.load_constant(literal),
        None => spec.kind.load_constant(&Literal::Null),
    };
    match spec.repr {
        Repr::Native => value,
        Repr::Boxed => spec.kind.wrap_primitive(value),
    }
}

/// A node kind's view of the linearizer while it produces code.
pub struct Activation<'a, 'g> {
    lin: &'a mut Linearizer<'g>,
    id: NodeId,
    node: &'g Node,
    kind: &'g dyn NodeKind,
}

impl<'g> Activation<'_, 'g> {
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'g Node {
        self.node
    }

    pub fn tag(&self) -> Option<&'g str> {
        self.node.tag.as_deref()
    }

    /// The node's tag, for kinds that cannot work without one.
    pub fn require_tag(&self) -> Result<&'g str, CompileError> {
        self.tag().ok_or_else(|| CompileError::MissingTag {
            node: self.id,
            kind: self.node.kind.clone(),
        })
    }

    /// Code for value input `index`, adapted to the declared representation.
    /// Unconnected inputs load the inset or the kind's default.
    pub fn input(&mut self, index: usize) -> Result<Instruction, CompileError> {
        self.lin.input(self.id, self.node, self.kind, index)
    }

    /// Code for everything signal output `index` activates.
    pub fn follow(&mut self, index: usize) -> Result<Instruction, CompileError> {
        let port = Port::new(self.id, index);
        match self.kind.outputs().get(index) {
            None => Err(CompileError::OutputOutOfRange {
                node: self.id,
                kind: self.node.kind.clone(),
                index,
                declared: self.kind.outputs().len(),
            }),
            Some(spec) if !spec.is_signal() => Err(CompileError::NotASignal(port)),
            Some(_) => self.lin.follow(port),
        }
    }

    /// Error for a kind asked to run that has no signal behavior.
    pub fn not_activatable(&self) -> CompileError {
        CompileError::NotActivatable {
            node: self.id,
            kind: self.node.kind.clone(),
        }
    }

    /// Error for a kind asked for an output it does not compute.
    pub fn no_value_output(&self, index: usize) -> CompileError {
        CompileError::NoValueOutput {
            node: self.id,
            kind: self.node.kind.clone(),
            index,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected compile failures"
)]
mod tests;
