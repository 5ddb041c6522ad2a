// doc.rs — JSON graph documents
//
// On-disk description of a node graph: a list of named nodes with default
// overrides, plus the connections between their pins. Documents are the
// CLI's input format and a convenient fixture format for tests.
//
// Preconditions: none.
// Postconditions: `build` yields a Graph whose wiring mirrors the document,
//   plus a name-to-id map for addressing nodes afterwards.
// Failure modes: malformed JSON, duplicate or unknown node names, pins that
//   do not exist or refuse the connection.
// Side effects: none.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::NodeKind;
use crate::graph::Graph;
use crate::id::NodeId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDoc {
    pub nodes: Vec<NodeDoc>,
    #[serde(default)]
    pub connections: Vec<ConnDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDoc {
    pub name: String,
    pub kind: NodeKind,
    /// Input pin name to literal text, applied over the descriptor defaults.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnDoc {
    pub from: EndpointDoc,
    pub to: EndpointDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDoc {
    pub node: String,
    pub pin: String,
}

// ── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum DocError {
    Json(serde_json::Error),
    DuplicateNode(String),
    UnknownNode(String),
    BadDefault { node: String, pin: String },
    BadConnection { from: String, to: String },
}

impl fmt::Display for DocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocError::Json(e) => write!(f, "invalid graph document: {e}"),
            DocError::DuplicateNode(name) => write!(f, "duplicate node name '{name}'"),
            DocError::UnknownNode(name) => write!(f, "unknown node name '{name}'"),
            DocError::BadDefault { node, pin } => {
                write!(f, "node '{node}' has no defaultable input pin '{pin}'")
            }
            DocError::BadConnection { from, to } => {
                write!(f, "cannot connect {from} to {to}")
            }
        }
    }
}

impl std::error::Error for DocError {}

impl From<serde_json::Error> for DocError {
    fn from(e: serde_json::Error) -> Self {
        DocError::Json(e)
    }
}

// ── Loading ────────────────────────────────────────────────────────────────

/// Parse a graph document from JSON text.
pub fn from_json(text: &str) -> Result<GraphDoc, DocError> {
    Ok(serde_json::from_str(text)?)
}

impl GraphDoc {
    /// Materialize the document into a Graph. Nodes are created in document
    /// order, so ids are stable for a given document.
    pub fn build(&self) -> Result<(Graph, BTreeMap<String, NodeId>), DocError> {
        let mut graph = Graph::new();
        let mut names: BTreeMap<String, NodeId> = BTreeMap::new();

        for node in &self.nodes {
            if names.contains_key(&node.name) {
                return Err(DocError::DuplicateNode(node.name.clone()));
            }
            let id = graph.add_node(node.kind);
            for (pin, text) in &node.defaults {
                if !graph.set_default(id, pin, text) {
                    return Err(DocError::BadDefault {
                        node: node.name.clone(),
                        pin: pin.clone(),
                    });
                }
            }
            names.insert(node.name.clone(), id);
        }

        for conn in &self.connections {
            let src = *names
                .get(&conn.from.node)
                .ok_or_else(|| DocError::UnknownNode(conn.from.node.clone()))?;
            let dst = *names
                .get(&conn.to.node)
                .ok_or_else(|| DocError::UnknownNode(conn.to.node.clone()))?;
            if !graph.connect(src, &conn.from.pin, dst, &conn.to.pin) {
                return Err(DocError::BadConnection {
                    from: format!("{}.{}", conn.from.node, conn.from.pin),
                    to: format!("{}.{}", conn.to.node, conn.to.pin),
                });
            }
        }

        Ok((graph, names))
    }
}
