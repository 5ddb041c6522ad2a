// graph.rs — Node graph model consumed by the lowering pass
//
// Owns node instances and their pins. Nodes are materialized from the static
// kind descriptors; the pin set is fixed at creation and only the connection
// lists and default literals mutate as the graph is edited. The lowering pass
// reads this model and never writes to it.
//
// Preconditions: none.
// Postconditions: connection lists are reciprocal (a link appears on both
//   endpoints).
// Failure modes: connect/set_default/remove_pin return false on unknown
//   nodes or pins.
// Side effects: none beyond the owned collections.

use std::fmt;

use crate::descriptor::{descriptor, NodeKind, PinDir, PinKind};
use crate::id::{IdAllocator, NodeId, PinId};
use crate::value::ValueType;

// ── Pins ───────────────────────────────────────────────────────────────────

/// One endpoint of a connection: a pin on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRef {
    pub node: NodeId,
    pub pin: PinId,
}

/// A connection point on a node. Identity (name, direction, kind, type) is
/// fixed at node creation; `links` and `default_literal` mutate with edits.
#[derive(Debug, Clone)]
pub struct Pin {
    pub id: PinId,
    pub name: String,
    pub dir: PinDir,
    pub kind: PinKind,
    pub value_type: Option<ValueType>,
    pub default_literal: Option<String>,
    pub links: Vec<PinRef>,
}

impl Pin {
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }
}

// ── Nodes ──────────────────────────────────────────────────────────────────

/// One occurrence of a node kind in the graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub pins: Vec<Pin>,
}

impl Node {
    /// Find a pin by name and direction.
    pub fn find_pin(&self, name: &str, dir: PinDir) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name == name && p.dir == dir)
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id.0 as usize)
    }

    fn find_pin_mut(&mut self, name: &str, dir: PinDir) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.name == name && p.dir == dir)
    }
}

// ── Graph ──────────────────────────────────────────────────────────────────

/// The node graph. Owns nodes exclusively; destroyed together.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    ids: IdAllocator,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a node of the given kind with its descriptor's pin set.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.ids.alloc_node();
        let desc = descriptor(kind);
        let pins = desc
            .pins
            .iter()
            .enumerate()
            .map(|(i, pd)| Pin {
                id: PinId(i as u32),
                name: pd.name.to_string(),
                dir: pd.dir,
                kind: pd.kind,
                value_type: pd.value_type,
                default_literal: pd.default.map(str::to_string),
                links: Vec::new(),
            })
            .collect();
        self.nodes.push(Node { id, kind, pins });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Connect an output pin to an input pin by name. Returns false if
    /// either endpoint does not exist.
    pub fn connect(&mut self, src: NodeId, src_pin: &str, dst: NodeId, dst_pin: &str) -> bool {
        let src_id = match self.node(src).and_then(|n| n.find_pin(src_pin, PinDir::Output)) {
            Some(p) => p.id,
            None => return false,
        };
        let dst_id = match self.node(dst).and_then(|n| n.find_pin(dst_pin, PinDir::Input)) {
            Some(p) => p.id,
            None => return false,
        };
        self.push_link(src, src_id, PinRef { node: dst, pin: dst_id });
        self.push_link(dst, dst_id, PinRef { node: src, pin: src_id });
        true
    }

    /// Overwrite a value input pin's default literal (the editor-side edit
    /// of the literal shown on the node).
    pub fn set_default(&mut self, node: NodeId, pin: &str, text: &str) -> bool {
        match self
            .node_mut(node)
            .and_then(|n| n.find_pin_mut(pin, PinDir::Input))
        {
            Some(p) if p.kind == PinKind::Value => {
                p.default_literal = Some(text.to_string());
                true
            }
            _ => false,
        }
    }

    /// Remove a pin from a node, severing its connections. Models the
    /// corrupt-node case the lowering pass must reject; a well-formed editor
    /// never produces it for descriptor pins.
    pub fn remove_pin(&mut self, node: NodeId, pin: &str, dir: PinDir) -> bool {
        let idx = match self.node(node).and_then(|n| n.find_pin(pin, dir)) {
            Some(p) => p.id.0 as usize,
            None => return false,
        };
        let removed = PinId(idx as u32);
        if let Some(n) = self.node_mut(node) {
            n.pins.remove(idx);
            for p in n.pins.iter_mut().skip(idx) {
                p.id = PinId(p.id.0 - 1);
            }
        }
        // Fix up every link that points into the renumbered node.
        for n in &mut self.nodes {
            for p in &mut n.pins {
                p.links.retain(|l| !(l.node == node && l.pin == removed));
                for l in &mut p.links {
                    if l.node == node && l.pin > removed {
                        l.pin = PinId(l.pin.0 - 1);
                    }
                }
            }
        }
        true
    }

    /// Force a raw link into a pin, bypassing the direction/kind rules of
    /// `connect`. Models damaged assets in tests.
    #[cfg(test)]
    pub(crate) fn splice_link_for_tests(&mut self, node: NodeId, pin: PinId, link: PinRef) {
        self.push_link(node, pin, link);
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn push_link(&mut self, node: NodeId, pin: PinId, link: PinRef) {
        if let Some(p) = self
            .node_mut(node)
            .and_then(|n| n.pins.get_mut(pin.0 as usize))
        {
            p.links.push(link);
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph ({} nodes)", self.nodes.len())?;
        for n in &self.nodes {
            let connected = n.pins.iter().filter(|p| p.is_connected()).count();
            writeln!(
                f,
                "  node {} {}: {} pins, {} connected",
                n.id.0,
                n.kind,
                n.pins.len(),
                connected
            )?;
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
