//! Indexed binary min-heap.
//!
//! `std::collections::BinaryHeap` cannot remove an arbitrary element, which
//! cancellation needs, so this heap keeps a position map from event id to
//! heap slot and updates it on every swap.

use crate::{EventId, EventKey, EventList};
use std::collections::HashMap;

/// Event list kept as an array-backed binary min-heap.
#[derive(Debug, Default)]
pub struct BinaryHeap {
    heap: Vec<EventKey>,
    /// Heap slot of each pending event.
    positions: HashMap<EventId, usize>,
}

impl BinaryHeap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].id, a);
        self.positions.insert(self.heap[b].id, b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot] >= self.heap[parent] {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < len && self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            if right < len && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn remove_at(&mut self, slot: usize) -> Option<EventKey> {
        let last = self.heap.len().checked_sub(1)?;
        if slot != last {
            self.swap(slot, last);
        }
        let key = self.heap.pop()?;
        self.positions.remove(&key.id);

        if slot < self.heap.len() {
            // The moved element may need to go either way.
            self.sift_down(slot);
            self.sift_up(slot);
        }
        Some(key)
    }
}

impl EventList for BinaryHeap {
    fn name(&self) -> &'static str {
        "binary_heap"
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.positions.clear();
    }

    fn insert(&mut self, key: EventKey) {
        self.heap.push(key);
        let slot = self.heap.len() - 1;
        self.positions.insert(key.id, slot);
        self.sift_up(slot);
    }

    fn first(&self) -> Option<EventKey> {
        self.heap.first().copied()
    }

    fn remove_first(&mut self) -> Option<EventKey> {
        self.remove_at(0)
    }

    fn remove(&mut self, key: &EventKey) -> bool {
        let Some(&slot) = self.positions.get(&key.id) else {
            return false;
        };
        if self.heap[slot] != *key {
            return false;
        }
        self.remove_at(slot).is_some()
    }

    fn ordered_keys(&self) -> Vec<EventKey> {
        let mut keys = self.heap.clone();
        keys.sort();
        keys
    }
}
