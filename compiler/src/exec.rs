// exec.rs — Reference execution engine for compiled units
//
// A minimal interpreter realizing the behavioral contract of each node kind:
// it backs every storage slot with a value, accepts activations addressed by
// (node, entry pin name), and follows connected continuations recursively.
// The production VM is a separate system; this engine exists so the lowering
// contract is executable and testable in-repo.
//
// Activation of one node never interleaves with another activation of the
// same node except through the Break protocol, which is re-entrant by
// design: a loop body's downstream execution may activate the loop's Break
// entry, flagging the enclosing iteration to stop.
//
// Preconditions: the unit came from `lower_graph` without errors for the
//   nodes being activated.
// Postconditions: the branch trace records every branch taken, connected or
//   not; slot values persist across activations.
// Failure modes: unknown node/pin, fuel exhaustion (runaway loops), and
//   activation nesting past the depth cap (overlong continuation chains).
// Side effects: none outside the engine's own storage.

use std::collections::HashSet;
use std::fmt;

use crate::descriptor::NodeKind;
use crate::id::{NodeId, SlotId};
use crate::ir::{CompiledStatement, CompiledUnit};
use crate::state::SlotRole;
use crate::value::Value;

const DEFAULT_FUEL: u32 = 65_536;

// Fuel caps total work but not stack growth; a long enough continuation
// chain would overflow the stack well before spending 65k units. Nesting
// is capped separately at a depth the stack comfortably holds.
const MAX_DEPTH: u32 = 512;

// ── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    UnknownNode(NodeId),
    UnknownPin { node: NodeId, pin: String },
    FuelExhausted,
    TooDeep,
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::UnknownNode(node) => write!(f, "no statement for node {}", node.0),
            ExecError::UnknownPin { node, pin } => {
                write!(f, "node {} has no entry pin '{}'", node.0, pin)
            }
            ExecError::FuelExhausted => write!(f, "activation budget exhausted"),
            ExecError::TooDeep => write!(f, "activation nesting too deep"),
        }
    }
}

// ── Trace ──────────────────────────────────────────────────────────────────

/// One branch taken during execution. Loop-body events carry the current
/// index (and element, for collection loops) at fire time.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub node: NodeId,
    pub branch: &'static str,
    pub index: Option<i64>,
    pub element: Option<Value>,
}

// ── Engine ─────────────────────────────────────────────────────────────────

pub struct Engine<'a> {
    unit: &'a CompiledUnit,
    values: Vec<Value>,
    looping: HashSet<NodeId>,
    break_requested: HashSet<NodeId>,
    trace: Vec<TraceEvent>,
    fuel: u32,
    depth: u32,
}

impl<'a> Engine<'a> {
    /// Build an engine over a compiled unit. Slots start at their literal
    /// value or their type's zero; FlipFlop state starts on branch A and
    /// Gate state is seeded once from the StartClosed binding's negation.
    pub fn new(unit: &'a CompiledUnit) -> Self {
        let mut values: Vec<Value> = unit
            .slots()
            .iter()
            .map(|s| s.literal.clone().unwrap_or_else(|| Value::default_for(s.ty)))
            .collect();

        for stmt in unit.statements() {
            match stmt.kind {
                NodeKind::FlipFlop => {
                    if let Some(slot) = unit.slot_of(stmt.node, SlotRole::State) {
                        values[slot.0 as usize] = Value::Bool(true);
                    }
                }
                NodeKind::Gate => {
                    let closed = stmt
                        .bindings
                        .get("StartClosed")
                        .and_then(|s| values.get(s.0 as usize))
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    if let Some(slot) = unit.slot_of(stmt.node, SlotRole::State) {
                        values[slot.0 as usize] = Value::Bool(!closed);
                    }
                }
                _ => {}
            }
        }

        Engine {
            unit,
            values,
            looping: HashSet::new(),
            break_requested: HashSet::new(),
            trace: Vec::new(),
            fuel: DEFAULT_FUEL,
            depth: 0,
        }
    }

    pub fn with_fuel(mut self, fuel: u32) -> Self {
        self.fuel = fuel;
        self
    }

    // ── Activation ─────────────────────────────────────────────────────

    /// Deliver a control pulse to a node's entry pin.
    pub fn activate(&mut self, node: NodeId, pin: &str) -> Result<(), ExecError> {
        let unit = self.unit;
        let stmt = unit
            .statement_of(node)
            .ok_or(ExecError::UnknownNode(node))?;
        self.step(stmt, pin)
    }

    fn step(&mut self, stmt: &'a CompiledStatement, pin: &str) -> Result<(), ExecError> {
        self.spend()?;
        if self.depth >= MAX_DEPTH {
            return Err(ExecError::TooDeep);
        }
        self.depth += 1;
        let outcome = self.dispatch(stmt, pin);
        self.depth -= 1;
        outcome
    }

    fn dispatch(&mut self, stmt: &'a CompiledStatement, pin: &str) -> Result<(), ExecError> {
        let node = stmt.node;
        match (stmt.kind, pin) {
            (NodeKind::DoN, "Enter") => {
                let n = self.bind_int(stmt, "N").unwrap_or(0);
                let count = self.state_int(node, SlotRole::Counter);
                if count < n {
                    self.set_state(node, SlotRole::Counter, Value::Int(count + 1));
                    self.follow(stmt, "Exit", None, None)?;
                }
                Ok(())
            }
            (NodeKind::DoN, "Reset") => {
                self.set_state(node, SlotRole::Counter, Value::Int(0));
                Ok(())
            }

            (NodeKind::DoOnce, "Enter") => {
                if !self.state_bool(node, SlotRole::Executed) {
                    self.set_state(node, SlotRole::Executed, Value::Bool(true));
                    self.follow(stmt, "Completed", None, None)?;
                }
                Ok(())
            }
            (NodeKind::DoOnce, "Reset") => {
                self.set_state(node, SlotRole::Executed, Value::Bool(false));
                Ok(())
            }

            (NodeKind::FlipFlop, "Enter") => {
                let is_a = self.state_bool(node, SlotRole::State);
                // IsA reflects the branch about to be taken, before the flip.
                if let Some(&slot) = stmt.bindings.get("IsA") {
                    self.set(slot, Value::Bool(is_a));
                }
                self.follow(stmt, if is_a { "A" } else { "B" }, None, None)?;
                self.set_state(node, SlotRole::State, Value::Bool(!is_a));
                Ok(())
            }

            (NodeKind::Gate, "") => {
                if self.state_bool(node, SlotRole::State) {
                    self.follow(stmt, "Exit", None, None)?;
                }
                Ok(())
            }
            (NodeKind::Gate, "Open") => {
                self.set_state(node, SlotRole::State, Value::Bool(true));
                Ok(())
            }
            (NodeKind::Gate, "Close") => {
                self.set_state(node, SlotRole::State, Value::Bool(false));
                Ok(())
            }
            (NodeKind::Gate, "Toggle") => {
                let open = self.state_bool(node, SlotRole::State);
                self.set_state(node, SlotRole::State, Value::Bool(!open));
                Ok(())
            }

            (NodeKind::ForLoop, "exec") | (NodeKind::ForLoopWithBreak, "") => self.run_for(stmt),
            (NodeKind::ForLoopWithBreak, "Break")
            | (NodeKind::ForEachLoopWithBreak, "Break") => {
                if self.looping.contains(&node) {
                    self.break_requested.insert(node);
                }
                Ok(())
            }

            (NodeKind::ForEachLoop, "exec") | (NodeKind::ForEachLoopWithBreak, "") => {
                self.run_foreach(stmt)
            }

            (NodeKind::WhileLoop, "") => self.run_while(stmt),

            _ => Err(ExecError::UnknownPin {
                node,
                pin: pin.to_string(),
            }),
        }
    }

    // ── Loop bodies ────────────────────────────────────────────────────

    fn run_for(&mut self, stmt: &'a CompiledStatement) -> Result<(), ExecError> {
        let node = stmt.node;
        let first = self.bind_int(stmt, "FirstIndex").unwrap_or(0);
        let last = self.bind_int(stmt, "LastIndex").unwrap_or(0);

        self.looping.insert(node);
        let mut i = first;
        while i <= last {
            if let Some(&slot) = stmt.bindings.get("Index") {
                self.set(slot, Value::Int(i));
            }
            self.follow(stmt, "LoopBody", Some(i), None)?;
            if self.break_requested.remove(&node) {
                break;
            }
            // Stop before incrementing so LastIndex == i64::MAX terminates.
            if i == last {
                break;
            }
            i += 1;
        }
        self.looping.remove(&node);
        self.break_requested.remove(&node);
        self.follow(stmt, "Completed", None, None)
    }

    fn run_foreach(&mut self, stmt: &'a CompiledStatement) -> Result<(), ExecError> {
        let node = stmt.node;
        let items: Vec<Value> = self
            .bind_value(stmt, "Array")
            .and_then(Value::as_array)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();

        self.looping.insert(node);
        for (i, item) in items.into_iter().enumerate() {
            if let Some(&slot) = stmt.bindings.get("ArrayElement") {
                self.set(slot, item.clone());
            }
            if let Some(&slot) = stmt.bindings.get("ArrayIndex") {
                self.set(slot, Value::Int(i as i64));
            }
            self.follow(stmt, "LoopBody", Some(i as i64), Some(item))?;
            if self.break_requested.remove(&node) {
                break;
            }
        }
        self.looping.remove(&node);
        self.break_requested.remove(&node);
        self.follow(stmt, "Completed", None, None)
    }

    fn run_while(&mut self, stmt: &'a CompiledStatement) -> Result<(), ExecError> {
        let node = stmt.node;
        self.looping.insert(node);
        loop {
            // Condition is read fresh before every prospective iteration.
            let cond = self.bind_bool(stmt, "Condition").unwrap_or(false);
            if !cond {
                break;
            }
            self.follow(stmt, "LoopBody", None, None)?;
        }
        self.looping.remove(&node);
        self.follow(stmt, "Completed", None, None)
    }

    // ── Branch following ───────────────────────────────────────────────

    /// Record the branch taken and, when a successor is attached, activate
    /// it. An unconnected branch goes nowhere but still appears in the
    /// trace.
    fn follow(
        &mut self,
        stmt: &'a CompiledStatement,
        key: &'static str,
        index: Option<i64>,
        element: Option<Value>,
    ) -> Result<(), ExecError> {
        self.spend()?;
        self.trace.push(TraceEvent {
            node: stmt.node,
            branch: key,
            index,
            element,
        });
        if let Some(target) = stmt.continuations.get(key) {
            let unit = self.unit;
            if let Some(next) = unit.statement_of(target.node) {
                self.step(next, &target.pin)?;
            }
        }
        Ok(())
    }

    fn spend(&mut self) -> Result<(), ExecError> {
        if self.fuel == 0 {
            return Err(ExecError::FuelExhausted);
        }
        self.fuel -= 1;
        Ok(())
    }

    // ── Storage access ─────────────────────────────────────────────────

    fn set(&mut self, slot: SlotId, value: Value) {
        if let Some(cell) = self.values.get_mut(slot.0 as usize) {
            *cell = value;
        }
    }

    fn get(&self, slot: SlotId) -> Option<&Value> {
        self.values.get(slot.0 as usize)
    }

    fn set_state(&mut self, node: NodeId, role: SlotRole, value: Value) {
        if let Some(slot) = self.unit.slot_of(node, role) {
            self.set(slot, value);
        }
    }

    fn state_int(&self, node: NodeId, role: SlotRole) -> i64 {
        self.unit
            .slot_of(node, role)
            .and_then(|s| self.get(s))
            .and_then(Value::as_int)
            .unwrap_or(0)
    }

    fn state_bool(&self, node: NodeId, role: SlotRole) -> bool {
        self.unit
            .slot_of(node, role)
            .and_then(|s| self.get(s))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn bind_value(&self, stmt: &CompiledStatement, key: &str) -> Option<&Value> {
        stmt.bindings.get(key).and_then(|&s| self.get(s))
    }

    fn bind_int(&self, stmt: &CompiledStatement, key: &str) -> Option<i64> {
        self.bind_value(stmt, key).and_then(Value::as_int)
    }

    fn bind_bool(&self, stmt: &CompiledStatement, key: &str) -> Option<bool> {
        self.bind_value(stmt, key).and_then(Value::as_bool)
    }

    // ── Observation API (tests and tools) ──────────────────────────────

    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// How many times a branch of a node has fired so far.
    pub fn fires(&self, node: NodeId, branch: &str) -> usize {
        self.trace
            .iter()
            .filter(|e| e.node == node && e.branch == branch)
            .count()
    }

    /// Current value of a statement binding.
    pub fn binding(&self, node: NodeId, key: &str) -> Option<&Value> {
        let stmt = self.unit.statement_of(node)?;
        self.bind_value(stmt, key)
    }

    /// Overwrite a statement binding's slot (drives externally supplied
    /// inputs such as a WhileLoop condition).
    pub fn write_binding(&mut self, node: NodeId, key: &str, value: Value) -> bool {
        let slot = self
            .unit
            .statement_of(node)
            .and_then(|stmt| stmt.bindings.get(key).copied());
        match slot {
            Some(slot) => {
                self.set(slot, value);
                true
            }
            None => false,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
