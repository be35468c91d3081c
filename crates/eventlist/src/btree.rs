//! Balanced ordered tree backed by the standard `BTreeSet`.

use crate::{EventKey, EventList};
use std::collections::BTreeSet;

/// Event list kept in a `BTreeSet<EventKey>`.
///
/// The key already carries the full (time, priority, sequence) order, so the
/// set needs no extra bookkeeping to stay stable.
#[derive(Debug, Default)]
pub struct BTree {
    keys: BTreeSet<EventKey>,
}

impl BTree {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventList for BTree {
    fn name(&self) -> &'static str {
        "b_tree"
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn clear(&mut self) {
        self.keys.clear();
    }

    fn insert(&mut self, key: EventKey) {
        self.keys.insert(key);
    }

    fn first(&self) -> Option<EventKey> {
        self.keys.first().copied()
    }

    fn remove_first(&mut self) -> Option<EventKey> {
        self.keys.pop_first()
    }

    fn remove(&mut self, key: &EventKey) -> bool {
        // Equality ignores the id, so make sure the stored key is the same event.
        let same_event = self.keys.get(key).is_some_and(|stored| stored.id == key.id);
        same_event && self.keys.remove(key)
    }

    fn ordered_keys(&self) -> Vec<EventKey> {
        self.keys.iter().copied().collect()
    }
}
