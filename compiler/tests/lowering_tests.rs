// Integration tests for the lowering pass, driven through JSON graph
// documents the way the CLI drives it.
//
// Covers the continuation/binding contract per node kind, optional-pin
// omission, per-node error isolation, and determinism of the dumped unit.

use vgc::descriptor::NodeKind;
use vgc::diag::{codes, DiagLevel};
use vgc::doc;
use vgc::graph::Graph;
use vgc::id::NodeId;
use vgc::lower::{lower_graph, LowerResult};

fn lower_doc(json: &str) -> (LowerResult, std::collections::BTreeMap<String, NodeId>) {
    let doc = doc::from_json(json).expect("fixture must parse");
    let (graph, names) = doc.build().expect("fixture must build");
    (lower_graph(&graph), names)
}

#[test]
fn don_chain_compiles_all_entries() {
    let (result, names) = lower_doc(
        r#"{
            "nodes": [
                { "name": "once", "kind": "DoOnce" },
                { "name": "don",  "kind": "DoN", "defaults": { "n": "3" } },
                { "name": "ff",   "kind": "FlipFlop" }
            ],
            "connections": [
                { "from": { "node": "once", "pin": "Completed" },
                  "to":   { "node": "don", "pin": "Enter" } },
                { "from": { "node": "don", "pin": "Exit" },
                  "to":   { "node": "ff", "pin": "Enter" } },
                { "from": { "node": "ff", "pin": "A" },
                  "to":   { "node": "don", "pin": "Reset" } }
            ]
        }"#,
    );
    assert!(!result.has_errors());

    let don = result.unit.statement_of(names["don"]).unwrap();
    assert_eq!(don.continuations["Enter"].node, names["once"]);
    assert_eq!(don.continuations["Exit"].node, names["ff"]);
    assert_eq!(don.continuations["Reset"].node, names["ff"]);
    assert!(don.bindings.contains_key("N"));

    let ff = result.unit.statement_of(names["ff"]).unwrap();
    assert!(ff.continuations.contains_key("A"));
    assert!(!ff.continuations.contains_key("B"), "B is unconnected");
    assert!(ff.bindings.contains_key("IsA"));
}

#[test]
fn unconnected_optional_pins_produce_no_entries() {
    let (result, names) = lower_doc(
        r#"{ "nodes": [ { "name": "gate", "kind": "Gate" } ] }"#,
    );
    assert!(!result.has_errors());
    let gate = result.unit.statement_of(names["gate"]).unwrap();
    assert!(gate.continuations.is_empty());
    // StartClosed still binds through its default literal.
    assert!(gate.bindings.contains_key("StartClosed"));
}

#[test]
fn plain_for_loops_have_no_primary_continuation() {
    let (result, names) = lower_doc(
        r#"{
            "nodes": [
                { "name": "lp", "kind": "ForLoop" },
                { "name": "once", "kind": "DoOnce" }
            ],
            "connections": [
                { "from": { "node": "lp", "pin": "LoopBody" },
                  "to":   { "node": "once", "pin": "Enter" } },
                { "from": { "node": "lp", "pin": "Completed" },
                  "to":   { "node": "once", "pin": "Reset" } }
            ]
        }"#,
    );
    assert!(!result.has_errors());
    let lp = result.unit.statement_of(names["lp"]).unwrap();
    let keys: Vec<&str> = lp.continuations.keys().copied().collect();
    assert_eq!(keys, ["Completed", "LoopBody"]);
}

#[test]
fn break_loop_records_exec_and_break_entries() {
    let (result, names) = lower_doc(
        r#"{
            "nodes": [
                { "name": "lp", "kind": "ForLoopWithBreak" },
                { "name": "ff", "kind": "FlipFlop" }
            ],
            "connections": [
                { "from": { "node": "lp", "pin": "Loop Body" },
                  "to":   { "node": "ff", "pin": "Enter" } },
                { "from": { "node": "ff", "pin": "B" },
                  "to":   { "node": "lp", "pin": "Break" } }
            ]
        }"#,
    );
    assert!(!result.has_errors());
    let lp = result.unit.statement_of(names["lp"]).unwrap();
    assert_eq!(lp.continuations["Break"].node, names["ff"]);
    assert_eq!(lp.continuations["Break"].pin, "B");
    assert_eq!(lp.continuations["LoopBody"].pin, "Enter");
    // Break carries no Exec entry when the primary is unconnected.
    assert!(!lp.continuations.contains_key("Exec"));
}

#[test]
fn index_output_binds_source_and_consumer_to_one_slot() {
    let (result, names) = lower_doc(
        r#"{
            "nodes": [
                { "name": "lp", "kind": "ForLoop" },
                { "name": "don", "kind": "DoN" }
            ],
            "connections": [
                { "from": { "node": "lp", "pin": "Index" },
                  "to":   { "node": "don", "pin": "n" } }
            ]
        }"#,
    );
    assert!(!result.has_errors());
    let lp = result.unit.statement_of(names["lp"]).unwrap();
    let don = result.unit.statement_of(names["don"]).unwrap();
    assert_eq!(lp.bindings["Index"], don.bindings["N"]);
    // The connected consumer registered no literal fallback of its own.
    let slot = result.unit.slot(don.bindings["N"]).unwrap();
    assert_eq!(slot.owner, names["lp"]);
}

#[test]
fn corrupt_node_aborts_alone() {
    let mut g = Graph::new();
    let broken = g.add_node(NodeKind::WhileLoop);
    let fine = g.add_node(NodeKind::Gate);
    assert!(g.remove_pin(broken, "Completed", vgc::descriptor::PinDir::Output));

    let result = lower_graph(&g);
    assert!(result.has_errors());
    let errors: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.level == DiagLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Some(codes::MISSING_REQUIRED_PORT));
    assert_eq!(errors[0].node, broken);
    assert!(result.unit.statement_of(broken).is_none());
    assert!(result.unit.statement_of(fine).is_some());
}

#[test]
fn break_loop_missing_output_warns_then_errors() {
    let mut g = Graph::new();
    let lp = g.add_node(NodeKind::ForEachLoopWithBreak);
    assert!(g.remove_pin(lp, "Completed", vgc::descriptor::PinDir::Output));

    let result = lower_graph(&g);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == Some(codes::EARLY_PIN_CHECK) && d.level == DiagLevel::Warning));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == Some(codes::MISSING_REQUIRED_PORT) && d.level == DiagLevel::Error));
}

#[test]
fn losing_an_optional_pin_is_tolerated() {
    let mut g = Graph::new();
    let lp = g.add_node(NodeKind::ForLoopWithBreak);
    assert!(g.remove_pin(lp, "Break", vgc::descriptor::PinDir::Input));

    let result = lower_graph(&g);
    assert!(!result.has_errors());
    assert!(result.unit.statement_of(lp).is_some());
}

#[test]
fn dump_is_deterministic_across_passes() {
    let json = r#"{
        "nodes": [
            { "name": "lp", "kind": "ForEachLoop", "defaults": { "Array": "[4, 5, 6]" } },
            { "name": "gate", "kind": "Gate", "defaults": { "Start Closed": "true" } },
            { "name": "ff", "kind": "FlipFlop" }
        ],
        "connections": [
            { "from": { "node": "lp", "pin": "LoopBody" },
              "to":   { "node": "gate", "pin": "" } },
            { "from": { "node": "gate", "pin": "Exit" },
              "to":   { "node": "ff", "pin": "Enter" } },
            { "from": { "node": "ff", "pin": "A" },
              "to":   { "node": "gate", "pin": "Toggle" } }
        ]
    }"#;
    let (first, _) = lower_doc(json);
    let (second, _) = lower_doc(json);
    assert_eq!(first.unit.to_string(), second.unit.to_string());
}
