// diag.rs — Unified diagnostics model
//
// Shared diagnostic types used by state registration, validation, and
// emission. Diagnostics carry the offending node's identity; there is no
// source text, so no spans.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::id::NodeId;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0501`, `W0502`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different semantic
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable codes for the lowering error taxonomy.
pub mod codes {
    use super::DiagCode;

    /// A node instance lacks a pin its kind mandates (corrupt node).
    pub const MISSING_REQUIRED_PORT: DiagCode = DiagCode("E0501");
    /// A connected control pin resolved to a non-control peer.
    pub const TYPE_MISMATCH: DiagCode = DiagCode("E0502");
    /// A connected value pin did not resolve to a storage slot.
    pub const MISSING_RESOLVED_TERM: DiagCode = DiagCode("E0503");
    /// Best-effort early check in state registration (break-capable loops).
    pub const EARLY_PIN_CHECK: DiagCode = DiagCode("W0502");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted by any lowering step, tied to one node instance.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub node: NodeId,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code or hint.
    pub fn new(level: DiagLevel, node: NodeId, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            node,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: node {}: {}", level, code, self.node.0, self.message)?;
        } else {
            write!(f, "{}: node {}: {}", level, self.node.0, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
