// descriptor.rs — Node kind descriptors: metadata tables for the lowering protocol
//
// Declares the nine stateful control-flow node kinds as a closed enum plus
// one static descriptor table per kind. A descriptor fixes the kind's pins
// (name, direction, exec/value, declared type, default literal, required) and
// the symbolic key each pin contributes to the compiled statement's
// continuation/binding maps. All lowering steps branch on these tables
// instead of per-kind code paths.
//
// Pin names are editor-facing and may be empty (the unlabeled primary entry)
// or spaced ("First Index"); statement keys are the fixed unspaced symbolic
// names ("FirstIndex"). The two namespaces never mix.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

// ── Node kinds ─────────────────────────────────────────────────────────────

/// The nine stateful control-flow node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    DoN,
    DoOnce,
    FlipFlop,
    Gate,
    ForLoop,
    ForLoopWithBreak,
    ForEachLoop,
    ForEachLoopWithBreak,
    WhileLoop,
}

/// All kinds in declaration order (used for iteration in tests and tools).
pub const ALL_KINDS: [NodeKind; 9] = [
    NodeKind::DoN,
    NodeKind::DoOnce,
    NodeKind::FlipFlop,
    NodeKind::Gate,
    NodeKind::ForLoop,
    NodeKind::ForLoopWithBreak,
    NodeKind::ForEachLoop,
    NodeKind::ForEachLoopWithBreak,
    NodeKind::WhileLoop,
];

impl NodeKind {
    pub fn name(self) -> &'static str {
        descriptor(self).name
    }

    /// True for the loop variants that accept a Break control signal.
    pub fn has_break(self) -> bool {
        matches!(self, NodeKind::ForLoopWithBreak | NodeKind::ForEachLoopWithBreak)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ── Pin descriptors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDir {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinKind {
    Exec,
    Value,
}

/// Static description of one pin of a node kind.
pub struct PinDesc {
    /// Editor-facing pin name. Empty for the unlabeled primary entry.
    pub name: &'static str,
    /// Symbolic key in the compiled statement's maps. None for exec pins
    /// that contribute no statement entry (ForLoop/ForEachLoop primary).
    pub key: Option<&'static str>,
    pub dir: PinDir,
    pub kind: PinKind,
    /// Declared type for value pins; None for exec pins.
    pub value_type: Option<ValueType>,
    /// Default literal text for value pins that carry one.
    pub default: Option<&'static str>,
    /// Structurally mandatory: absence marks a corrupt node instance.
    pub required: bool,
}

impl PinDesc {
    /// Name for diagnostics; the unlabeled primary renders as its key.
    pub fn display_name(&self) -> &'static str {
        if self.name.is_empty() {
            self.key.unwrap_or("<entry>")
        } else {
            self.name
        }
    }
}

/// Static metadata for one node kind.
pub struct NodeDescriptor {
    pub name: &'static str,
    pub pins: &'static [PinDesc],
}

impl NodeDescriptor {
    /// Look up a pin by name and direction. Names are unique per
    /// (direction, exec/value) combination within a kind.
    pub fn pin(&self, name: &str, dir: PinDir) -> Option<&'static PinDesc> {
        self.pins.iter().find(|p| p.name == name && p.dir == dir)
    }
}

// ── Table shorthands ───────────────────────────────────────────────────────

const fn exec_in(name: &'static str, key: Option<&'static str>, required: bool) -> PinDesc {
    PinDesc {
        name,
        key,
        dir: PinDir::Input,
        kind: PinKind::Exec,
        value_type: None,
        default: None,
        required,
    }
}

const fn exec_out(name: &'static str, key: &'static str, required: bool) -> PinDesc {
    PinDesc {
        name,
        key: Some(key),
        dir: PinDir::Output,
        kind: PinKind::Exec,
        value_type: None,
        default: None,
        required,
    }
}

const fn value_in(
    name: &'static str,
    key: &'static str,
    ty: ValueType,
    default: Option<&'static str>,
    required: bool,
) -> PinDesc {
    PinDesc {
        name,
        key: Some(key),
        dir: PinDir::Input,
        kind: PinKind::Value,
        value_type: Some(ty),
        default,
        required,
    }
}

const fn value_out(name: &'static str, key: &'static str, ty: ValueType, required: bool) -> PinDesc {
    PinDesc {
        name,
        key: Some(key),
        dir: PinDir::Output,
        kind: PinKind::Value,
        value_type: Some(ty),
        default: None,
        required,
    }
}

// ── Descriptor tables ──────────────────────────────────────────────────────
//
// One const table per kind so the slices are genuinely 'static.

const DON_PINS: &[PinDesc] = &[
    exec_in("Enter", Some("Enter"), true),
    value_in("n", "N", ValueType::Int, Some("1"), true),
    exec_in("Reset", Some("Reset"), false),
    exec_out("Exit", "Exit", true),
];

const DO_ONCE_PINS: &[PinDesc] = &[
    exec_in("Enter", Some("Enter"), true),
    exec_in("Reset", Some("Reset"), false),
    exec_out("Completed", "Completed", true),
];

const FLIP_FLOP_PINS: &[PinDesc] = &[
    exec_in("Enter", Some("Enter"), true),
    exec_out("A", "A", true),
    exec_out("B", "B", true),
    value_out("IsA", "IsA", ValueType::Bool, true),
];

const GATE_PINS: &[PinDesc] = &[
    exec_in("", Some("Enter"), true),
    exec_in("Open", Some("Open"), false),
    exec_in("Close", Some("Close"), false),
    exec_in("Toggle", Some("Toggle"), false),
    exec_out("Exit", "Exit", true),
    value_in("Start Closed", "StartClosed", ValueType::Bool, Some("false"), false),
];

const FOR_LOOP_PINS: &[PinDesc] = &[
    exec_in("exec", None, true),
    value_in("FirstIndex", "FirstIndex", ValueType::Int, Some("0"), true),
    value_in("LastIndex", "LastIndex", ValueType::Int, Some("10"), true),
    exec_out("LoopBody", "LoopBody", true),
    value_out("Index", "Index", ValueType::Int, true),
    exec_out("Completed", "Completed", true),
];

const FOR_LOOP_BREAK_PINS: &[PinDesc] = &[
    exec_in("", Some("Exec"), true),
    value_in("First Index", "FirstIndex", ValueType::Int, Some("0"), true),
    value_in("Last Index", "LastIndex", ValueType::Int, Some("10"), true),
    exec_in("Break", Some("Break"), false),
    exec_out("Loop Body", "LoopBody", true),
    value_out("Index", "Index", ValueType::Int, true),
    exec_out("Completed", "Completed", true),
];

const FOR_EACH_PINS: &[PinDesc] = &[
    exec_in("exec", None, true),
    value_in("Array", "Array", ValueType::Wildcard, None, true),
    exec_out("LoopBody", "LoopBody", true),
    value_out("ArrayElement", "ArrayElement", ValueType::Wildcard, true),
    value_out("ArrayIndex", "ArrayIndex", ValueType::Int, false),
    exec_out("Completed", "Completed", true),
];

const FOR_EACH_BREAK_PINS: &[PinDesc] = &[
    exec_in("", Some("Exec"), true),
    value_in("Array", "Array", ValueType::Wildcard, None, true),
    exec_in("Break", Some("Break"), false),
    exec_out("Loop Body", "LoopBody", true),
    value_out("Array Element", "ArrayElement", ValueType::Wildcard, true),
    value_out("Array Index", "ArrayIndex", ValueType::Int, true),
    exec_out("Completed", "Completed", true),
];

const WHILE_PINS: &[PinDesc] = &[
    exec_in("", Some("Exec"), true),
    value_in("Condition", "Condition", ValueType::Bool, Some("true"), true),
    exec_out("Loop Body", "LoopBody", true),
    exec_out("Completed", "Completed", true),
];

/// Return the static descriptor for a node kind.
pub fn descriptor(kind: NodeKind) -> NodeDescriptor {
    match kind {
        NodeKind::DoN => NodeDescriptor { name: "DoN", pins: DON_PINS },
        NodeKind::DoOnce => NodeDescriptor { name: "DoOnce", pins: DO_ONCE_PINS },
        NodeKind::FlipFlop => NodeDescriptor { name: "FlipFlop", pins: FLIP_FLOP_PINS },
        NodeKind::Gate => NodeDescriptor { name: "Gate", pins: GATE_PINS },
        NodeKind::ForLoop => NodeDescriptor { name: "ForLoop", pins: FOR_LOOP_PINS },
        NodeKind::ForLoopWithBreak => NodeDescriptor {
            name: "ForLoopWithBreak",
            pins: FOR_LOOP_BREAK_PINS,
        },
        NodeKind::ForEachLoop => NodeDescriptor { name: "ForEachLoop", pins: FOR_EACH_PINS },
        NodeKind::ForEachLoopWithBreak => NodeDescriptor {
            name: "ForEachLoopWithBreak",
            pins: FOR_EACH_BREAK_PINS,
        },
        NodeKind::WhileLoop => NodeDescriptor { name: "WhileLoop", pins: WHILE_PINS },
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_tables_are_shared_statics() {
        for kind in ALL_KINDS {
            let a = descriptor(kind).pins;
            let b = descriptor(kind).pins;
            assert!(std::ptr::eq(a, b), "{kind} pins are rebuilt per call");
        }
    }

    #[test]
    fn every_kind_has_one_primary_entry() {
        for kind in ALL_KINDS {
            let desc = descriptor(kind);
            let entries: Vec<_> = desc
                .pins
                .iter()
                .filter(|p| p.dir == PinDir::Input && p.kind == PinKind::Exec && p.required)
                .collect();
            assert!(
                !entries.is_empty(),
                "{} has no required control entry",
                desc.name
            );
        }
    }

    #[test]
    fn pin_names_unique_per_direction_and_kind() {
        for kind in ALL_KINDS {
            let desc = descriptor(kind);
            for (i, a) in desc.pins.iter().enumerate() {
                for b in &desc.pins[i + 1..] {
                    assert!(
                        !(a.name == b.name && a.dir == b.dir && a.kind == b.kind),
                        "{}: duplicate pin '{}'",
                        desc.name,
                        a.name
                    );
                }
            }
        }
    }

    #[test]
    fn statement_keys_unique_within_kind() {
        for kind in ALL_KINDS {
            let desc = descriptor(kind);
            let mut keys: Vec<&str> = desc.pins.iter().filter_map(|p| p.key).collect();
            let n = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(n, keys.len(), "{}: duplicate statement key", desc.name);
        }
    }

    #[test]
    fn value_pins_are_typed_exec_pins_are_not() {
        for kind in ALL_KINDS {
            for pin in descriptor(kind).pins {
                match pin.kind {
                    PinKind::Exec => assert!(pin.value_type.is_none()),
                    PinKind::Value => assert!(pin.value_type.is_some()),
                }
            }
        }
    }

    #[test]
    fn loop_defaults_match_contract() {
        let desc = descriptor(NodeKind::ForLoop);
        assert_eq!(desc.pin("FirstIndex", PinDir::Input).unwrap().default, Some("0"));
        assert_eq!(desc.pin("LastIndex", PinDir::Input).unwrap().default, Some("10"));
        let wl = descriptor(NodeKind::WhileLoop);
        assert_eq!(wl.pin("Condition", PinDir::Input).unwrap().default, Some("true"));
        let gate = descriptor(NodeKind::Gate);
        assert_eq!(gate.pin("Start Closed", PinDir::Input).unwrap().default, Some("false"));
    }

    #[test]
    fn plain_for_loops_emit_no_primary_entry() {
        assert!(descriptor(NodeKind::ForLoop).pin("exec", PinDir::Input).unwrap().key.is_none());
        assert!(descriptor(NodeKind::ForEachLoop).pin("exec", PinDir::Input).unwrap().key.is_none());
        assert_eq!(
            descriptor(NodeKind::WhileLoop).pin("", PinDir::Input).unwrap().key,
            Some("Exec")
        );
    }

    #[test]
    fn unlabeled_primary_displays_as_key() {
        let gate = descriptor(NodeKind::Gate);
        assert_eq!(gate.pin("", PinDir::Input).unwrap().display_name(), "Enter");
    }
}
