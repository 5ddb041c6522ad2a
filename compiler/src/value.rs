// value.rs — Scalar and array values carried by value pins
//
// Literal text on pins ("0", "10", "true", "[1, 2, 3]") is parsed through
// serde_json, which covers every literal form the node kinds declare.
//
// Preconditions: none.
// Postconditions: none.
// Failure modes: `Value::parse_literal` returns None on unparseable text.
// Side effects: none.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Declared pin value types ─────────────────────────────────────────────

/// The declared type of a value pin. Control pins carry no value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Bool,
    /// Collection pins: the element type is resolved by editor-side type
    /// unification, which is outside this crate. Lowering treats the
    /// collection and element pins as wildcards.
    Wildcard,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Wildcard => "wildcard",
        };
        write!(f, "{}", s)
    }
}

// ── Runtime values ───────────────────────────────────────────────────────

/// A runtime value held by a storage slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    /// Parse pin literal text. Accepts JSON scalars and arrays; anything
    /// else (including empty text) yields None.
    pub fn parse_literal(text: &str) -> Option<Value> {
        match serde_json::from_str::<serde_json::Value>(text.trim()).ok()? {
            serde_json::Value::Bool(b) => Some(Value::Bool(b)),
            serde_json::Value::Number(n) => n.as_i64().map(Value::Int),
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(match item {
                        serde_json::Value::Bool(b) => Value::Bool(b),
                        serde_json::Value::Number(n) => Value::Int(n.as_i64()?),
                        _ => return None,
                    });
                }
                Some(Value::Array(out))
            }
            _ => None,
        }
    }

    /// The zero value for a declared type. Wildcard defaults to the empty
    /// collection.
    pub fn default_for(ty: ValueType) -> Value {
        match ty {
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Wildcard => Value::Array(Vec::new()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
