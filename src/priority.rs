//! A small `Reverse`-ordered binary-heap entry, for min-priority lazy-deletion search queues.

use std::cmp::Ordering;

/// Wraps a `(priority, payload)` pair so a [`std::collections::BinaryHeap`] (a max-heap) pops
/// the smallest priority first, breaking ties on `payload` for a deterministic pop order.
///
/// Mirrors the `SmallestHolder<K>` wrapper used by this crate's Dijkstra implementations,
/// generalized over the payload instead of being tied to a map index.
#[derive(Eq, PartialEq)]
pub struct MinEntry<T> {
    /// The ordering key; lower pops first.
    pub priority: u32,
    /// The payload carried alongside the priority.
    pub payload: T,
}

impl<T: Ord> Ord for MinEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.payload.cmp(&self.payload))
    }
}

impl<T: Ord> PartialOrd for MinEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
