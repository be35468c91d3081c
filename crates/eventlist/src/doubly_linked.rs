//! Sorted doubly linked list.
//!
//! Nodes live in a slab (`Vec`) and link to each other by index, so the list
//! needs no unsafe code and recycles freed slots. Insertion scans backwards
//! from the tail: new events usually land near the end of the schedule, and
//! scanning from the tail puts a new key after every existing key it does not
//! strictly precede.

use crate::{EventId, EventKey, EventList};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Node {
    key: EventKey,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Event list kept as a sorted doubly linked list.
#[derive(Debug, Default)]
pub struct DoublyLinked {
    /// Node slab. Slots listed in `free` hold stale data.
    nodes: Vec<Node>,
    /// Recycled slots.
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Slot of each linked event, for O(1) arbitrary removal.
    index: HashMap<EventId, usize>,
}

impl DoublyLinked {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Detach a node from its neighbours and recycle its slot.
    fn unlink(&mut self, slot: usize) -> EventKey {
        let Node { key, prev, next } = self.nodes[slot];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.index.remove(&key.id);
        self.free.push(slot);
        key
    }
}

impl EventList for DoublyLinked {
    fn name(&self) -> &'static str {
        "doubly_linked"
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    fn insert(&mut self, key: EventKey) {
        // Find the last node that sorts before the new key.
        let mut cursor = self.tail;
        while let Some(slot) = cursor {
            if self.nodes[slot].key < key {
                break;
            }
            cursor = self.nodes[slot].prev;
        }

        let next = match cursor {
            Some(prev) => self.nodes[prev].next,
            None => self.head,
        };
        let slot = self.alloc(Node {
            key,
            prev: cursor,
            next,
        });

        match cursor {
            Some(prev) => self.nodes[prev].next = Some(slot),
            None => self.head = Some(slot),
        }
        match next {
            Some(n) => self.nodes[n].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.index.insert(key.id, slot);
    }

    fn first(&self) -> Option<EventKey> {
        self.head.map(|slot| self.nodes[slot].key)
    }

    fn remove_first(&mut self) -> Option<EventKey> {
        let slot = self.head?;
        Some(self.unlink(slot))
    }

    fn remove(&mut self, key: &EventKey) -> bool {
        let Some(&slot) = self.index.get(&key.id) else {
            return false;
        };
        if self.nodes[slot].key != *key {
            return false;
        }
        self.unlink(slot);
        true
    }

    fn ordered_keys(&self) -> Vec<EventKey> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            keys.push(self.nodes[slot].key);
            cursor = self.nodes[slot].next;
        }
        keys
    }
}
