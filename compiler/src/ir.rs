// ir.rs — Compiled IR: per-node statements and the compilation unit
//
// `CompiledUnit` is the self-contained output of lowering: one statement per
// successfully compiled node, plus the storage slots the statements
// reference. The downstream execution engine reads it without consulting the
// graph. Continuation and binding maps are BTreeMaps so every dump is
// deterministic.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::descriptor::NodeKind;
use crate::id::{IdAllocator, NodeId, SlotId};
use crate::state::{SlotRole, StorageSlot};
use crate::value::{Value, ValueType};

// ── Statements ─────────────────────────────────────────────────────────────

/// The compiled successor a continuation jumps to: the peer node's statement,
/// entered through the named pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationTarget {
    pub node: NodeId,
    /// Entry pin name on the peer (may be empty for unlabeled primaries).
    pub pin: String,
}

/// The IR unit emitted for one node instance.
///
/// Keys are the symbolic names fixed by the node kind's descriptor. An entry
/// exists in `continuations` only for connected, semantically applicable
/// control pins, and in `bindings` only for value pins that resolved to a
/// slot.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    pub node: NodeId,
    pub kind: NodeKind,
    pub continuations: BTreeMap<&'static str, ContinuationTarget>,
    pub bindings: BTreeMap<&'static str, SlotId>,
}

impl CompiledStatement {
    pub fn new(node: NodeId, kind: NodeKind) -> Self {
        Self {
            node,
            kind,
            continuations: BTreeMap::new(),
            bindings: BTreeMap::new(),
        }
    }
}

// ── Compilation unit ───────────────────────────────────────────────────────

/// All statements and slots produced by one lowering pass. Statements appear
/// in node-visitation order; order is not semantically significant.
#[derive(Debug, Default)]
pub struct CompiledUnit {
    statements: Vec<CompiledStatement>,
    slots: Vec<StorageSlot>,
    stmt_index: HashMap<NodeId, usize>,
    slot_index: HashMap<(NodeId, SlotRole), SlotId>,
    ids: IdAllocator,
}

impl CompiledUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[CompiledStatement] {
        &self.statements
    }

    pub fn slots(&self) -> &[StorageSlot] {
        &self.slots
    }

    pub fn statement_of(&self, node: NodeId) -> Option<&CompiledStatement> {
        self.stmt_index.get(&node).map(|&i| &self.statements[i])
    }

    pub fn slot(&self, id: SlotId) -> Option<&StorageSlot> {
        self.slots.get(id.0 as usize)
    }

    pub fn slot_of(&self, node: NodeId, role: SlotRole) -> Option<SlotId> {
        self.slot_index.get(&(node, role)).copied()
    }

    /// Find or allocate the slot for (owner, role). Reuse updates the
    /// literal payload when one is supplied (the default may have been
    /// edited between passes); identity is stable.
    pub fn ensure_slot(
        &mut self,
        owner: NodeId,
        role: SlotRole,
        ty: ValueType,
        name: String,
        literal: Option<Value>,
    ) -> SlotId {
        if let Some(&id) = self.slot_index.get(&(owner, role)) {
            if literal.is_some() {
                self.slots[id.0 as usize].literal = literal;
            }
            return id;
        }
        let id = self.ids.alloc_slot();
        self.slots.push(StorageSlot {
            id,
            owner,
            role,
            ty,
            name,
            literal,
        });
        self.slot_index.insert((owner, role), id);
        id
    }

    /// Append a statement in visitation order. One statement per node; a
    /// repeat push for the same node replaces the earlier statement.
    pub fn push_statement(&mut self, stmt: CompiledStatement) {
        match self.stmt_index.get(&stmt.node) {
            Some(&i) => self.statements[i] = stmt,
            None => {
                self.stmt_index.insert(stmt.node, self.statements.len());
                self.statements.push(stmt);
            }
        }
    }
}

// ── Display ────────────────────────────────────────────────────────────────

impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "unit: {} statements, {} slots",
            self.statements.len(),
            self.slots.len()
        )?;
        for stmt in &self.statements {
            writeln!(f, "  statement node{} {}", stmt.node.0, stmt.kind)?;
            if !stmt.continuations.is_empty() {
                writeln!(f, "    continuations:")?;
                for (key, target) in &stmt.continuations {
                    writeln!(f, "      {} -> node{}.\"{}\"", key, target.node.0, target.pin)?;
                }
            }
            if !stmt.bindings.is_empty() {
                writeln!(f, "    bindings:")?;
                for (key, slot) in &stmt.bindings {
                    writeln!(f, "      {} -> %{}", key, slot.0)?;
                }
            }
        }
        if !self.slots.is_empty() {
            writeln!(f, "  slots:")?;
            for slot in &self.slots {
                write!(
                    f,
                    "    %{} node{} {} \"{}\"",
                    slot.id.0, slot.owner.0, slot.ty, slot.name
                )?;
                if let Some(lit) = &slot.literal {
                    write!(f, " = {}", lit)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_slot_reuses_by_role() {
        let mut unit = CompiledUnit::new();
        let a = unit.ensure_slot(
            NodeId(0),
            SlotRole::Counter,
            ValueType::Int,
            "DoNCounter_0".into(),
            None,
        );
        let b = unit.ensure_slot(
            NodeId(0),
            SlotRole::Counter,
            ValueType::Int,
            "DoNCounter_0".into(),
            None,
        );
        assert_eq!(a, b);
        assert_eq!(unit.slots().len(), 1);

        let c = unit.ensure_slot(
            NodeId(1),
            SlotRole::Counter,
            ValueType::Int,
            "DoNCounter_1".into(),
            None,
        );
        assert_ne!(a, c);
    }

    #[test]
    fn ensure_slot_updates_literal_on_reuse() {
        let mut unit = CompiledUnit::new();
        let id = unit.ensure_slot(
            NodeId(0),
            SlotRole::Literal("N"),
            ValueType::Int,
            "NDefault_0".into(),
            Some(Value::Int(1)),
        );
        unit.ensure_slot(
            NodeId(0),
            SlotRole::Literal("N"),
            ValueType::Int,
            "NDefault_0".into(),
            Some(Value::Int(3)),
        );
        assert_eq!(unit.slot(id).unwrap().literal, Some(Value::Int(3)));
        assert_eq!(unit.slots().len(), 1);
    }

    #[test]
    fn push_statement_replaces_per_node() {
        let mut unit = CompiledUnit::new();
        unit.push_statement(CompiledStatement::new(NodeId(0), NodeKind::DoN));
        let mut second = CompiledStatement::new(NodeId(0), NodeKind::DoN);
        second.continuations.insert(
            "Exit",
            ContinuationTarget {
                node: NodeId(1),
                pin: "Enter".into(),
            },
        );
        unit.push_statement(second);
        assert_eq!(unit.statements().len(), 1);
        assert!(unit.statement_of(NodeId(0)).unwrap().continuations.contains_key("Exit"));
    }

    #[test]
    fn display_is_stable() {
        let mut unit = CompiledUnit::new();
        let slot = unit.ensure_slot(
            NodeId(0),
            SlotRole::Literal("N"),
            ValueType::Int,
            "NDefault_0".into(),
            Some(Value::Int(1)),
        );
        let mut stmt = CompiledStatement::new(NodeId(0), NodeKind::DoN);
        stmt.bindings.insert("N", slot);
        unit.push_statement(stmt);

        let text = format!("{unit}");
        assert_eq!(format!("{unit}"), text);
        assert!(text.contains("statement node0 DoN"));
        assert!(text.contains("N -> %0"));
        assert!(text.contains("%0 node0 int \"NDefault_0\" = 1"));
    }
}
