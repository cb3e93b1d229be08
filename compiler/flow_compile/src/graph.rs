//! The authored graph: nodes, ports and wires addressed by stable indices.
//!
//! Nodes live in a slot list; removing one leaves a hole so every other
//! [`NodeId`] stays valid and wires touching the removed node resolve to
//! "not found" rather than to some other node.

use std::fmt;

use crate::value::Literal;

/// Stable index of a node in a [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node ID from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a wire in a [`Graph`]'s wire list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct WireId(u32);

impl WireId {
    /// Create a wire ID from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire {}", self.0)
    }
}

/// One input or output of a node. Whether it is an input or an output is
/// given by context (a wire's `from` is an output, its `to` an input).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Port {
    pub node: NodeId,
    pub index: usize,
}

impl Port {
    #[inline]
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.index)
    }
}

/// A node instance. Its ports come from the catalog kind named by `kind`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Catalog kind name.
    pub kind: String,
    /// Literal typed into each input, used when the input is unconnected.
    #[cfg_attr(feature = "serde", serde(default))]
    pub insets: Vec<Option<Literal>>,
    /// Static identifier some kinds need (variable name, host function).
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag: Option<String>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            insets: Vec::new(),
            tag: None,
        }
    }

    /// Set the inset of input `index`.
    #[must_use]
    pub fn with_inset(mut self, index: usize, literal: impl Into<Literal>) -> Self {
        if self.insets.len() <= index {
            self.insets.resize(index + 1, None);
        }
        self.insets[index] = Some(literal.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The inset of input `index`, if one was typed.
    pub fn inset(&self, index: usize) -> Option<&Literal> {
        self.insets.get(index).and_then(Option::as_ref)
    }
}

/// A directed edge from an output port to an input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wire {
    pub from: Port,
    pub to: Port,
}

/// Nodes and wires, plus the node execution starts from.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Graph {
    nodes: Vec<Option<Node>>,
    #[cfg_attr(feature = "serde", serde(default))]
    wires: Vec<Wire>,
    #[cfg_attr(feature = "serde", serde(default))]
    entry: Option<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "node indices never exceed u32"
    )]
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    /// Remove a node, leaving its wires dangling.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.get_mut(id.index())?.take()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())?.as_ref()
    }

    /// Live nodes in index order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "node indices never exceed u32"
    )]
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| Some((NodeId::new(i as u32), node.as_ref()?)))
    }

    /// Wire output `from` to input `to`. Wires keep insertion order, which is
    /// the activation order of a signal output's targets.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "wire indices never exceed u32"
    )]
    pub fn connect(&mut self, from: Port, to: Port) -> WireId {
        let id = WireId::new(self.wires.len() as u32);
        self.wires.push(Wire { from, to });
        id
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.index())
    }

    /// Wires in insertion order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "wire indices never exceed u32"
    )]
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires
            .iter()
            .enumerate()
            .map(|(i, wire)| (WireId::new(i as u32), wire))
    }

    pub fn set_entry(&mut self, id: NodeId) {
        self.entry = Some(id);
    }

    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }
}
