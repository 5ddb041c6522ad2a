// lower.rs — Node-to-IR lowering: registration, validation, emission
//
// Walks each node instance once: register its storage, validate its required
// pins and control-pin wiring, then emit one compiled statement with named
// continuation targets and value bindings. Errors are local to a node; a
// failing node contributes no statement and the remaining nodes still
// compile.
//
// Preconditions: the graph is fully constructed; no other pass runs
//   concurrently.
// Postconditions: LowerResult holds one statement per clean node, in
//   visitation order, plus all registered slots.
// Failure modes: E0501 missing required pin, E0502 control-type mismatch,
//   E0503 unresolved value source. All abort the offending node only.
// Side effects: none on the graph.

use crate::descriptor::{descriptor, PinDir, PinKind};
use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::graph::{Graph, Node, Pin};
use crate::id::SlotId;
use crate::ir::{CompiledStatement, CompiledUnit, ContinuationTarget};
use crate::state::{output_role, register_state, SlotRole};

// ── Output types ───────────────────────────────────────────────────────────

/// Result of lowering a graph.
pub struct LowerResult {
    pub unit: CompiledUnit,
    pub diagnostics: Vec<Diagnostic>,
}

impl LowerResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagLevel::Error)
    }
}

// ── Public entry point ─────────────────────────────────────────────────────

/// Lower every node in the graph to its compiled statement.
///
/// Registration runs for all nodes first so cross-node value bindings can
/// resolve regardless of visitation order; validation and emission then run
/// per node.
pub fn lower_graph(graph: &Graph) -> LowerResult {
    let mut engine = LowerEngine {
        graph,
        unit: CompiledUnit::new(),
        diagnostics: Vec::new(),
    };

    for node in graph.nodes() {
        register_state(node, &mut engine.unit, &mut engine.diagnostics);
    }

    for node in graph.nodes() {
        if let Err(diag) = engine.compile_node(node) {
            engine.diagnostics.push(diag);
        }
    }

    LowerResult {
        unit: engine.unit,
        diagnostics: engine.diagnostics,
    }
}

// ── Lowering engine ────────────────────────────────────────────────────────

struct LowerEngine<'a> {
    graph: &'a Graph,
    unit: CompiledUnit,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> LowerEngine<'a> {
    fn compile_node(&mut self, node: &Node) -> Result<(), Diagnostic> {
        self.validate(node)?;
        let stmt = self.emit(node)?;
        self.unit.push_statement(stmt);
        Ok(())
    }

    // ── Connection validation ──────────────────────────────────────────

    fn validate(&self, node: &Node) -> Result<(), Diagnostic> {
        let desc = descriptor(node.kind);

        for pd in desc.pins.iter().filter(|pd| pd.required) {
            if node.find_pin(pd.name, pd.dir).is_none() {
                return Err(Diagnostic::new(
                    DiagLevel::Error,
                    node.id,
                    format!(
                        "{} node missing required pin '{}'",
                        node.kind,
                        pd.display_name()
                    ),
                )
                .with_code(codes::MISSING_REQUIRED_PORT)
                .with_hint("the node instance is corrupt; recreate it"));
            }
        }

        // Every link out of a control pin must land on a control pin.
        for pin in node.pins.iter().filter(|p| p.kind == PinKind::Exec) {
            for link in &pin.links {
                let peer = self
                    .graph
                    .node(link.node)
                    .and_then(|n| n.pin(link.pin));
                let peer_is_exec = peer.map(|p| p.kind == PinKind::Exec).unwrap_or(false);
                if !peer_is_exec {
                    return Err(Diagnostic::new(
                        DiagLevel::Error,
                        node.id,
                        format!(
                            "{} pin '{}' is connected to a non-execution pin",
                            node.kind,
                            display_pin(pin)
                        ),
                    )
                    .with_code(codes::TYPE_MISMATCH));
                }
            }
        }

        Ok(())
    }

    // ── Statement emission ─────────────────────────────────────────────

    fn emit(&self, node: &Node) -> Result<CompiledStatement, Diagnostic> {
        let desc = descriptor(node.kind);
        let mut stmt = CompiledStatement::new(node.id, node.kind);

        for pd in desc.pins {
            let Some(key) = pd.key else { continue };
            let Some(pin) = node.find_pin(pd.name, pd.dir) else { continue };
            match pd.kind {
                PinKind::Exec => {
                    // Unconnected control pins are legal unused branches and
                    // contribute no entry.
                    if let Some(target) = self.successor(pin) {
                        stmt.continuations.insert(key, target);
                    }
                }
                PinKind::Value => {
                    if let Some(slot) = self.resolve_binding(node, pin, key)? {
                        stmt.bindings.insert(key, slot);
                    }
                }
            }
        }

        Ok(stmt)
    }

    /// The compiled successor of a connected control pin: the peer node of
    /// its first connection, entered through the peer's pin.
    fn successor(&self, pin: &Pin) -> Option<ContinuationTarget> {
        let link = pin.links.first()?;
        let peer = self.graph.node(link.node)?.pin(link.pin)?;
        Some(ContinuationTarget {
            node: link.node,
            pin: peer.name.clone(),
        })
    }

    /// Resolve a value pin to its storage slot.
    ///
    /// Outputs and unconnected defaulted inputs resolve from this node's own
    /// slots; a connected input resolves through its source pin's slot. A
    /// connected input whose source owns no slot is the fatal
    /// MissingResolvedTerm case: no partial statement may be emitted.
    fn resolve_binding(
        &self,
        node: &Node,
        pin: &Pin,
        key: &'static str,
    ) -> Result<Option<SlotId>, Diagnostic> {
        match pin.dir {
            PinDir::Output => Ok(output_role(key).and_then(|role| self.unit.slot_of(node.id, role))),
            PinDir::Input => {
                let Some(link) = pin.links.first() else {
                    return Ok(self.unit.slot_of(node.id, SlotRole::Literal(key)));
                };
                let source = self
                    .graph
                    .node(link.node)
                    .and_then(|n| n.pin(link.pin))
                    .and_then(|peer| {
                        if peer.dir != PinDir::Output || peer.kind != PinKind::Value {
                            return None;
                        }
                        let peer_desc = descriptor(self.graph.node(link.node)?.kind);
                        let role = output_role(peer_desc.pin(&peer.name, PinDir::Output)?.key?)?;
                        self.unit.slot_of(link.node, role)
                    });
                match source {
                    Some(slot) => Ok(Some(slot)),
                    None => Err(Diagnostic::new(
                        DiagLevel::Error,
                        node.id,
                        format!(
                            "{} node missing required term for pin '{}'",
                            node.kind,
                            display_pin(pin)
                        ),
                    )
                    .with_code(codes::MISSING_RESOLVED_TERM)),
                }
            }
        }
    }
}

fn display_pin(pin: &Pin) -> &str {
    if pin.name.is_empty() {
        "<entry>"
    } else {
        &pin.name
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
