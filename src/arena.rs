//! Append-only node table.
//!
//! Nodes live in slots addressed by [`NodeId`]. Allocation bumps: the id of a
//! new node is the table length at the time of the call, so ids equal
//! insertion order. Deleting a node tombstones its slot; the slot is never
//! handed out again, which rules out id aliasing between a removed node and
//! a later one. The table only grows, bounded by the number of edits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle into a [`NodeTable`]. Never reused once retired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Slot index backing this id.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Sparse table of slots, each either a live value or a tombstone.
///
/// Serializes as a plain array where tombstones are `null`, so the array
/// index of an entry is its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTable<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for NodeTable<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> NodeTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` and return its id (the previous table length).
    pub fn allocate(&mut self, value: T) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(value));
        id
    }

    /// Retire `id`. Returns the value that lived there, if any.
    ///
    /// The slot stays in the table as a tombstone; later allocations never
    /// land on it.
    pub fn tombstone(&mut self, id: NodeId) -> Option<T> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    /// Live value at `id`, `None` for tombstones and unallocated ids.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable access to the live value at `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Whether `id` refers to a live slot.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Id the next [`allocate`](Self::allocate) call will return.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.slots.len())
    }

    /// Number of slots, tombstones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot was ever allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over live entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (NodeId(index), value)))
    }

    /// Mutable iteration over live entries in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|value| (NodeId(index), value)))
    }
}
