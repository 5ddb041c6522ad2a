// dot.rs — Graphviz DOT output for node graphs
//
// Transforms a Graph into DOT format suitable for rendering with `dot`,
// `neato`, or other Graphviz layout engines. Exec wiring is drawn solid,
// value wiring dashed.
//
// Preconditions: `graph` is a fully constructed Graph.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::graph::{Graph, Pin};
use crate::descriptor::{PinDir, PinKind};

/// Emit the node graph as a Graphviz DOT string.
pub fn emit_dot(graph: &Graph) -> String {
    let mut buf = String::new();
    writeln!(buf, "digraph vgc {{").unwrap();
    writeln!(buf, "    rankdir=LR;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];").unwrap();

    writeln!(buf).unwrap();
    for node in graph.nodes() {
        writeln!(
            buf,
            "    n{} [shape=box, style=filled, fillcolor=lightblue, label=\"{:?} #{}\"];",
            node.id.0, node.kind, node.id.0,
        )
        .unwrap();
    }

    // Every connection is linked reciprocally, so walking output pins
    // alone visits each edge exactly once.
    writeln!(buf).unwrap();
    for node in graph.nodes() {
        for pin in node.pins.iter().filter(|p| p.dir == PinDir::Output) {
            for link in &pin.links {
                let label = edge_label(pin, graph, link.node, link.pin);
                let attrs = match pin.kind {
                    PinKind::Exec => format!("label=\"{label}\""),
                    PinKind::Value => format!("label=\"{label}\", style=dashed, color=gray50"),
                };
                writeln!(buf, "    n{} -> n{} [{attrs}];", node.id.0, link.node.0).unwrap();
            }
        }
    }

    writeln!(buf, "}}").unwrap();
    buf
}

fn edge_label(
    src: &Pin,
    graph: &Graph,
    dst_node: crate::id::NodeId,
    dst_pin: crate::id::PinId,
) -> String {
    let dst_name = graph
        .node(dst_node)
        .and_then(|n| n.pin(dst_pin))
        .map(|p| pin_label(&p.name))
        .unwrap_or_else(|| "?".to_string());
    format!("{} / {}", pin_label(&src.name), dst_name)
}

/// Primary pins with an empty display name render as `(entry)`.
fn pin_label(name: &str) -> String {
    if name.is_empty() {
        "(entry)".to_string()
    } else {
        name.to_string()
    }
}
