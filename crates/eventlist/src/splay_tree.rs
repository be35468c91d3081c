//! Self-adjusting splay tree.
//!
//! Top-down splaying (Sleator & Tarjan) over an index-linked node slab. Every
//! insert and removal splays the touched key to the root, which keeps
//! recently scheduled, soon-due events cheap to reach.

use crate::{EventKey, EventList};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
struct Node {
    key: EventKey,
    left: Option<usize>,
    right: Option<usize>,
}

/// Event list kept as a splay tree. This is the default strategy.
#[derive(Debug, Default)]
pub struct SplayTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Option<usize>,
    len: usize,
}

impl SplayTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, key: EventKey) -> usize {
        let node = Node {
            key,
            left: None,
            right: None,
        };
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

    /// Splay the subtree rooted at `t` around `key` and return the new root.
    ///
    /// The new root is the node holding `key` if present, otherwise the last
    /// node visited on the search path (its in-order neighbour).
    fn splay(&mut self, mut t: usize, key: &EventKey) -> usize {
        // Roots and attachment points of the assembled left and right trees.
        let mut left_root: Option<usize> = None;
        let mut left_max: Option<usize> = None;
        let mut right_root: Option<usize> = None;
        let mut right_min: Option<usize> = None;

        loop {
            match key.cmp(&self.nodes[t].key) {
                Ordering::Less => {
                    let Some(mut child) = self.nodes[t].left else {
                        break;
                    };
                    if *key < self.nodes[child].key {
                        // Rotate right.
                        self.nodes[t].left = self.nodes[child].right;
                        self.nodes[child].right = Some(t);
                        t = child;
                        match self.nodes[t].left {
                            Some(next) => child = next,
                            None => break,
                        }
                    }
                    // Link right.
                    match right_min {
                        Some(r) => self.nodes[r].left = Some(t),
                        None => right_root = Some(t),
                    }
                    right_min = Some(t);
                    t = child;
                }
                Ordering::Greater => {
                    let Some(mut child) = self.nodes[t].right else {
                        break;
                    };
                    if *key > self.nodes[child].key {
                        // Rotate left.
                        self.nodes[t].right = self.nodes[child].left;
                        self.nodes[child].left = Some(t);
                        t = child;
                        match self.nodes[t].right {
                            Some(next) => child = next,
                            None => break,
                        }
                    }
                    // Link left.
                    match left_max {
                        Some(l) => self.nodes[l].right = Some(t),
                        None => left_root = Some(t),
                    }
                    left_max = Some(t);
                    t = child;
                }
                Ordering::Equal => break,
            }
        }

        // Assemble.
        match left_max {
            Some(l) => self.nodes[l].right = self.nodes[t].left,
            None => left_root = self.nodes[t].left,
        }
        match right_min {
            Some(r) => self.nodes[r].left = self.nodes[t].right,
            None => right_root = self.nodes[t].right,
        }
        self.nodes[t].left = left_root;
        self.nodes[t].right = right_root;
        t
    }
}

impl EventList for SplayTree {
    fn name(&self) -> &'static str {
        "splay_tree"
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    fn insert(&mut self, key: EventKey) {
        let slot = self.alloc(key);
        self.len += 1;

        let Some(root) = self.root else {
            self.root = Some(slot);
            return;
        };

        let t = self.splay(root, &key);
        if key < self.nodes[t].key {
            self.nodes[slot].left = self.nodes[t].left;
            self.nodes[slot].right = Some(t);
            self.nodes[t].left = None;
        } else {
            self.nodes[slot].right = self.nodes[t].right;
            self.nodes[slot].left = Some(t);
            self.nodes[t].right = None;
        }
        self.root = Some(slot);
    }

    fn first(&self) -> Option<EventKey> {
        let mut cursor = self.root?;
        while let Some(left) = self.nodes[cursor].left {
            cursor = left;
        }
        Some(self.nodes[cursor].key)
    }

    fn remove_first(&mut self) -> Option<EventKey> {
        let first = self.first()?;
        self.remove(&first);
        Some(first)
    }

    fn remove(&mut self, key: &EventKey) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let t = self.splay(root, key);
        self.root = Some(t);
        let found = self.nodes[t].key;
        if found != *key || found.id != key.id {
            return false;
        }

        self.root = match self.nodes[t].left {
            None => self.nodes[t].right,
            Some(left) => {
                // Every key on the left is smaller, so this brings the
                // left subtree's maximum up with an empty right child.
                let max = self.splay(left, key);
                self.nodes[max].right = self.nodes[t].right;
                Some(max)
            }
        };
        self.free.push(t);
        self.len -= 1;
        true
    }

    fn ordered_keys(&self) -> Vec<EventKey> {
        let mut keys = Vec::with_capacity(self.len);
        let mut stack = Vec::new();
        let mut cursor = self.root;
        while cursor.is_some() || !stack.is_empty() {
            while let Some(slot) = cursor {
                stack.push(slot);
                cursor = self.nodes[slot].left;
            }
            if let Some(slot) = stack.pop() {
                keys.push(self.nodes[slot].key);
                cursor = self.nodes[slot].right;
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventId;

    fn key(time: f64, sequence: u64) -> EventKey {
        EventKey::new(time, 1.0, sequence, EventId::new(0, sequence))
    }

    fn times(tree: &SplayTree) -> Vec<f64> {
        tree.ordered_keys().iter().map(|k| k.time).collect()
    }

    #[test]
    fn test_in_order_after_inserts() {
        let mut tree = SplayTree::new();
        for (seq, t) in [4.0, 8.0, 1.0, 6.0, 2.0, 9.0, 5.0].into_iter().enumerate() {
            tree.insert(key(t, seq as u64));
        }
        assert_eq!(times(&tree), vec![1.0, 2.0, 4.0, 5.0, 6.0, 8.0, 9.0]);
        assert_eq!(tree.first().map(|k| k.time), Some(1.0));
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_ascending_and_descending_runs() {
        // Degenerate shapes are the classic splay stress case.
        let mut tree = SplayTree::new();
        for seq in 0..50u64 {
            tree.insert(key(seq as f64, seq));
        }
        for seq in 50..100u64 {
            tree.insert(key((150 - seq) as f64, seq));
        }

        let mut previous = f64::NEG_INFINITY;
        let mut count = 0;
        while let Some(k) = tree.remove_first() {
            assert!(k.time >= previous);
            previous = k.time;
            count += 1;
        }
        assert_eq!(count, 100);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_arbitrary() {
        let mut tree = SplayTree::new();
        for seq in 0..10u64 {
            tree.insert(key(seq as f64, seq));
        }

        assert!(tree.remove(&key(5.0, 5)));
        assert!(tree.remove(&key(0.0, 0)));
        assert!(tree.remove(&key(9.0, 9)));
        assert!(!tree.remove(&key(5.0, 5)));
        assert!(!tree.remove(&key(42.0, 42)));

        assert_eq!(times(&tree), vec![1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0]);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_removed_slots_are_reused() {
        let mut tree = SplayTree::new();
        tree.insert(key(1.0, 1));
        tree.insert(key(2.0, 2));
        tree.remove_first();
        tree.insert(key(3.0, 3));
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(times(&tree), vec![2.0, 3.0]);
    }
}
