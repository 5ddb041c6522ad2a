// id.rs — Stable identifiers for graph and compilation artifacts
//
// IDs are allocated in creation order, giving deterministic identity for
// nodes and storage slots across a compilation pass. Threaded through graph
// construction, state registration, and statement emission.

/// Stable identifier for a node instance in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Identifier for a pin, unique within its owning node (index into the
/// node's pin list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u32);

/// Stable identifier for a storage slot within one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

/// Allocator for stable IDs. Produces monotonically increasing IDs in
/// allocation order, ensuring deterministic assignment.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_node: u32,
    next_slot: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn alloc_slot(&mut self) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        id
    }
}
