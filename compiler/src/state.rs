// state.rs — Persistent-state registration for node instances
//
// Allocates the storage slots a node needs to remember progress across
// invocations (counters, latches, toggle flags, gate state) plus the
// per-activation output slots downstream statements read (loop index,
// current element, branch flag). Unconnected value inputs with a default
// literal register a literal slot so their binding still resolves.
//
// Preconditions: the node belongs to the graph being compiled.
// Postconditions: one slot per (node, role); re-registration reuses slots.
// Failure modes: none — registration never fails. Break-capable loops get a
//   best-effort W0502 warning here when required output pins are missing;
//   the authoritative check happens at emission.
// Side effects: allocates slots in the compilation unit.

use crate::descriptor::{descriptor, NodeKind, PinDir, PinKind};
use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::graph::Node;
use crate::id::{NodeId, SlotId};
use crate::ir::CompiledUnit;
use crate::value::{Value, ValueType};

// ── Slot model ─────────────────────────────────────────────────────────────

/// The semantic role of a storage slot within its owning node. At most one
/// slot exists per (node, role) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotRole {
    /// DoN execution counter.
    Counter,
    /// DoOnce "already executed" latch.
    Executed,
    /// FlipFlop current branch / Gate open flag.
    State,
    /// Current loop index (ForLoop family, ForEach family).
    Index,
    /// Current collection element (ForEach family).
    Element,
    /// FlipFlop branch output.
    IsA,
    /// Literal backing an unconnected defaulted value input; the payload is
    /// the input's statement key.
    Literal(&'static str),
}

/// A unit of storage owned by the compilation unit on behalf of one node.
#[derive(Debug, Clone)]
pub struct StorageSlot {
    pub id: SlotId,
    pub owner: NodeId,
    pub role: SlotRole,
    pub ty: ValueType,
    /// Stable name derived from the node and role, e.g. "DoNCounter_3".
    pub name: String,
    /// Present for literal slots; None for mutable local storage.
    pub literal: Option<Value>,
}

// ── Per-kind persistent state table ────────────────────────────────────────

struct StateDesc {
    role: SlotRole,
    ty: ValueType,
    base_name: &'static str,
}

fn persistent_state(kind: NodeKind) -> &'static [StateDesc] {
    match kind {
        NodeKind::DoN => &[StateDesc {
            role: SlotRole::Counter,
            ty: ValueType::Int,
            base_name: "DoNCounter",
        }],
        NodeKind::DoOnce => &[StateDesc {
            role: SlotRole::Executed,
            ty: ValueType::Bool,
            base_name: "DoOnceExecuted",
        }],
        NodeKind::FlipFlop => &[StateDesc {
            role: SlotRole::State,
            ty: ValueType::Bool,
            base_name: "FlipFlopState",
        }],
        NodeKind::Gate => &[StateDesc {
            role: SlotRole::State,
            ty: ValueType::Bool,
            base_name: "GateState",
        }],
        _ => &[],
    }
}

/// Role backing a value-output pin, by statement key.
pub fn output_role(key: &str) -> Option<SlotRole> {
    match key {
        "Index" | "ArrayIndex" => Some(SlotRole::Index),
        "ArrayElement" => Some(SlotRole::Element),
        "IsA" => Some(SlotRole::IsA),
        _ => None,
    }
}

// ── Registration ───────────────────────────────────────────────────────────

/// Allocate the storage a node instance needs. Idempotent: existing slots
/// are found and reused, never duplicated.
pub fn register_state(node: &Node, unit: &mut CompiledUnit, diagnostics: &mut Vec<Diagnostic>) {
    let desc = descriptor(node.kind);

    // Best-effort early check on break-capable loops; emission re-validates
    // and is the authoritative abort point.
    if node.kind.has_break() {
        let missing = desc
            .pins
            .iter()
            .filter(|pd| pd.required && pd.dir == PinDir::Output)
            .any(|pd| node.find_pin(pd.name, pd.dir).is_none());
        if missing {
            diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Warning,
                    node.id,
                    format!("{} node missing required output pins", node.kind),
                )
                .with_code(codes::EARLY_PIN_CHECK),
            );
        }
    }

    for sd in persistent_state(node.kind) {
        unit.ensure_slot(
            node.id,
            sd.role,
            sd.ty,
            format!("{}_{}", sd.base_name, node.id.0),
            None,
        );
    }

    for pin in &node.pins {
        if pin.kind != PinKind::Value {
            continue;
        }
        let Some(pd) = desc.pin(&pin.name, pin.dir) else { continue };
        let Some(key) = pd.key else { continue };
        match pin.dir {
            PinDir::Output => {
                if let Some(role) = output_role(key) {
                    let ty = pin.value_type.unwrap_or(ValueType::Wildcard);
                    unit.ensure_slot(node.id, role, ty, format!("{}_{}", key, node.id.0), None);
                }
            }
            PinDir::Input => {
                if pin.is_connected() {
                    continue;
                }
                let Some(text) = pin.default_literal.as_deref() else { continue };
                // Unparseable text yields no slot; the binding is omitted
                // and the error surfaces downstream if it matters.
                let Some(value) = Value::parse_literal(text) else { continue };
                let ty = pin.value_type.unwrap_or(ValueType::Wildcard);
                unit.ensure_slot(
                    node.id,
                    SlotRole::Literal(key),
                    ty,
                    format!("{}Default_{}", key, node.id.0),
                    Some(value),
                );
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
