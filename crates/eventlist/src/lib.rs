//! Pending-event list strategies.
//!
//! A simulator keeps its future events in exactly one [`EventList`]. Every
//! strategy stores [`EventKey`]s and must hand them back in the same total
//! order: time, then priority, then insertion sequence. Because the order is
//! fully determined by the key, swapping one strategy for another never
//! changes the fire sequence of a simulation, only its cost profile.
//!
//! | Strategy          | insert     | remove first | remove arbitrary |
//! |-------------------|------------|--------------|------------------|
//! | [`DoublyLinked`]  | O(n)       | O(1)         | O(1)             |
//! | [`BinaryHeap`]    | O(log n)   | O(log n)     | O(log n)         |
//! | [`SplayTree`]     | O(log n)*  | O(log n)*    | O(log n)*        |
//! | [`BTree`]         | O(log n)   | O(log n)     | O(log n)         |
//!
//! \* amortised

mod binary_heap;
mod btree;
mod doubly_linked;
mod key;
mod splay_tree;

pub use binary_heap::BinaryHeap;
pub use btree::BTree;
pub use doubly_linked::DoublyLinked;
pub use key::{EventId, EventKey};
pub use splay_tree::SplayTree;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An ordered container of pending events.
///
/// Implementations must keep the total order defined by [`EventKey`]'s `Ord`
/// impl. Keys handed to `insert` are unique (the simulator never inserts the
/// same sequence number twice).
pub trait EventList: Send + fmt::Debug {
    /// Short human-readable name of the strategy.
    fn name(&self) -> &'static str;

    /// Number of pending events.
    fn len(&self) -> usize;

    /// Check if there are no pending events.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every pending event.
    fn clear(&mut self);

    /// Insert a key at its ordered position.
    fn insert(&mut self, key: EventKey);

    /// Peek at the smallest key without removing it.
    fn first(&self) -> Option<EventKey>;

    /// Remove and return the smallest key.
    fn remove_first(&mut self) -> Option<EventKey>;

    /// Remove a specific key.
    ///
    /// Returns `false`, leaving the list untouched, if the key is not present.
    fn remove(&mut self, key: &EventKey) -> bool;

    /// All pending keys in firing order.
    fn ordered_keys(&self) -> Vec<EventKey>;
}

/// Selects an [`EventList`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventListKind {
    /// Sorted doubly linked list. Simplest, linear insertion.
    DoublyLinked,
    /// Indexed binary min-heap.
    BinaryHeap,
    /// Self-adjusting splay tree.
    #[default]
    SplayTree,
    /// Balanced ordered tree (`BTreeSet`).
    BTree,
}

impl EventListKind {
    /// Every available strategy.
    pub const ALL: [EventListKind; 4] = [
        EventListKind::DoublyLinked,
        EventListKind::BinaryHeap,
        EventListKind::SplayTree,
        EventListKind::BTree,
    ];

    /// Build an empty list of this kind.
    pub fn build(self) -> Box<dyn EventList> {
        match self {
            EventListKind::DoublyLinked => Box::new(DoublyLinked::new()),
            EventListKind::BinaryHeap => Box::new(BinaryHeap::new()),
            EventListKind::SplayTree => Box::new(SplayTree::new()),
            EventListKind::BTree => Box::new(BTree::new()),
        }
    }

    /// Name used for parsing and display.
    pub fn as_str(self) -> &'static str {
        match self {
            EventListKind::DoublyLinked => "doubly_linked",
            EventListKind::BinaryHeap => "binary_heap",
            EventListKind::SplayTree => "splay_tree",
            EventListKind::BTree => "b_tree",
        }
    }
}

impl fmt::Display for EventListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown event list kind: {0}")]
pub struct UnknownEventListKind(pub String);

impl FromStr for EventListKind {
    type Err = UnknownEventListKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "doubly_linked" | "linked_list" => Ok(EventListKind::DoublyLinked),
            "binary_heap" | "heap" => Ok(EventListKind::BinaryHeap),
            "splay_tree" | "splay" => Ok(EventListKind::SplayTree),
            "b_tree" | "btree" => Ok(EventListKind::BTree),
            _ => Err(UnknownEventListKind(s.to_string())),
        }
    }
}
