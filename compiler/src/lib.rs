// vgc — Visual Graph Compiler
//
// Library root. Lowers stateful control-flow graph nodes to executable IR.

pub mod descriptor;
pub mod diag;
pub mod doc;
pub mod dot;
pub mod exec;
pub mod graph;
pub mod id;
pub mod ir;
pub mod lower;
pub mod state;
pub mod value;
