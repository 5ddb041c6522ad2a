// Snapshot tests: lock the compiled-unit dump format so structural changes
// to statements, bindings, or slot naming show up in review.
//
// Inline snapshots via `insta`; run `cargo insta review` after intentional
// format changes.

use vgc::descriptor::NodeKind;
use vgc::graph::Graph;
use vgc::lower::lower_graph;

fn dump(g: &Graph) -> String {
    let result = lower_graph(g);
    assert!(
        !result.has_errors(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
    result.unit.to_string()
}

#[test]
fn for_loop_feeding_don() {
    let mut g = Graph::new();
    let lp = g.add_node(NodeKind::ForLoop);
    let don = g.add_node(NodeKind::DoN);
    assert!(g.connect(lp, "LoopBody", don, "Enter"));
    assert!(g.connect(lp, "Index", don, "n"));

    insta::assert_snapshot!(dump(&g).trim_end(), @r#"
    unit: 2 statements, 4 slots
      statement node0 ForLoop
        continuations:
          LoopBody -> node1."Enter"
        bindings:
          FirstIndex -> %0
          Index -> %2
          LastIndex -> %1
      statement node1 DoN
        continuations:
          Enter -> node0."LoopBody"
        bindings:
          N -> %2
      slots:
        %0 node0 int "FirstIndexDefault_0" = 0
        %1 node0 int "LastIndexDefault_0" = 10
        %2 node0 int "Index_0"
        %3 node1 int "DoNCounter_1"
    "#);
}

#[test]
fn lone_gate_with_start_closed() {
    let mut g = Graph::new();
    let gate = g.add_node(NodeKind::Gate);
    assert!(g.set_default(gate, "Start Closed", "true"));

    insta::assert_snapshot!(dump(&g).trim_end(), @r#"
    unit: 1 statements, 2 slots
      statement node0 Gate
        bindings:
          StartClosed -> %1
      slots:
        %0 node0 bool "GateState_0"
        %1 node0 bool "StartClosedDefault_0" = true
    "#);
}

#[test]
fn for_each_with_break_cycle() {
    let mut g = Graph::new();
    let lp = g.add_node(NodeKind::ForEachLoopWithBreak);
    let ff = g.add_node(NodeKind::FlipFlop);
    assert!(g.set_default(lp, "Array", "[1, 2, 3]"));
    assert!(g.connect(lp, "Loop Body", ff, "Enter"));
    assert!(g.connect(ff, "B", lp, "Break"));

    insta::assert_snapshot!(dump(&g).trim_end(), @r#"
    unit: 2 statements, 5 slots
      statement node0 ForEachLoopWithBreak
        continuations:
          Break -> node1."B"
          LoopBody -> node1."Enter"
        bindings:
          Array -> %0
          ArrayElement -> %1
          ArrayIndex -> %2
      statement node1 FlipFlop
        continuations:
          B -> node0."Break"
          Enter -> node0."Loop Body"
        bindings:
          IsA -> %4
      slots:
        %0 node0 wildcard "ArrayDefault_0" = [1, 2, 3]
        %1 node0 wildcard "ArrayElement_0"
        %2 node0 int "ArrayIndex_0"
        %3 node1 bool "FlipFlopState_1"
        %4 node1 bool "IsA_1"
    "#);
}

#[test]
fn corrupt_node_diagnostic_rendering() {
    let mut g = Graph::new();
    let lp = g.add_node(NodeKind::ForLoop);
    assert!(g.remove_pin(lp, "LastIndex", vgc::descriptor::PinDir::Input));

    let result = lower_graph(&g);
    let rendered: Vec<String> = result.diagnostics.iter().map(|d| d.to_string()).collect();
    insta::assert_snapshot!(rendered.join("\n"), @r#"
    error[E0501]: node 0: ForLoop node missing required pin 'LastIndex'
      hint: the node instance is corrupt; recreate it
    "#);
}
