//! Lists that record their own size and sojourn statistics.
//!
//! A [`ListWithStat`] stamps every element with the simulation time it was
//! inserted. While statistics are on, every change of length updates a
//! time-weighted [`Accumulate`] and every removal adds the element's time in
//! the list to a [`Tally`]. Typical use is a waiting queue, where these are
//! the queue-length and waiting-time statistics.
//!
//! Elements inserted before `Simulator::init` carry stamps from the previous
//! run; clear the list when re-initialising the simulator.

use crate::{Accumulate, Simulator, Tally};
use std::collections::VecDeque;
use std::fmt::Write;

#[derive(Debug, Clone)]
struct Node<T> {
    element: T,
    inserted_at: f64,
}

/// A double-ended list with size and sojourn statistics.
#[derive(Debug, Clone)]
pub struct ListWithStat<T> {
    name: Option<String>,
    nodes: VecDeque<Node<T>>,
    collecting: bool,
    init_time: f64,
    size: Accumulate,
    sojourn: Tally,
}

impl<T> ListWithStat<T> {
    /// Create an empty list. Statistics start off.
    pub fn new(sim: &Simulator) -> Self {
        Self {
            name: None,
            nodes: VecDeque::new(),
            collecting: false,
            init_time: sim.time(),
            size: Accumulate::new(sim),
            sojourn: Tally::new(),
        }
    }

    /// Create an empty named list.
    pub fn named(sim: &Simulator, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            size: Accumulate::named(sim, format!("List Size {name}")),
            sojourn: Tally::named(format!("List Sojourn {name}")),
            name: Some(name),
            ..Self::new(sim)
        }
    }

    /// Name of the list.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Contents
    // ═══════════════════════════════════════════════════════════════════════

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.nodes.get(index).map(|node| &node.element)
    }

    /// First element.
    pub fn front(&self) -> Option<&T> {
        self.nodes.front().map(|node| &node.element)
    }

    /// Last element.
    pub fn back(&self) -> Option<&T> {
        self.nodes.back().map(|node| &node.element)
    }

    /// Time the element at `index` entered the list.
    pub fn insertion_time(&self, index: usize) -> Option<f64> {
        self.nodes.get(index).map(|node| node.inserted_at)
    }

    /// Elements from front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes.iter().map(|node| &node.element)
    }

    /// Append at the back.
    pub fn push_back(&mut self, sim: &Simulator, element: T) {
        self.nodes.push_back(Node {
            element,
            inserted_at: sim.time(),
        });
        self.record_size(sim);
    }

    /// Insert at the front.
    pub fn push_front(&mut self, sim: &Simulator, element: T) {
        self.nodes.push_front(Node {
            element,
            inserted_at: sim.time(),
        });
        self.record_size(sim);
    }

    /// Insert at `index`, shifting later elements back.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the length.
    pub fn insert(&mut self, sim: &Simulator, index: usize, element: T) {
        self.nodes.insert(
            index,
            Node {
                element,
                inserted_at: sim.time(),
            },
        );
        self.record_size(sim);
    }

    /// Remove the first element.
    pub fn pop_front(&mut self, sim: &Simulator) -> Option<T> {
        let node = self.nodes.pop_front()?;
        Some(self.leave(sim, node))
    }

    /// Remove the last element.
    pub fn pop_back(&mut self, sim: &Simulator) -> Option<T> {
        let node = self.nodes.pop_back()?;
        Some(self.leave(sim, node))
    }

    /// Remove the element at `index`.
    pub fn remove(&mut self, sim: &Simulator, index: usize) -> Option<T> {
        let node = self.nodes.remove(index)?;
        Some(self.leave(sim, node))
    }

    /// Remove the first element matching `pred`.
    pub fn remove_first_where(
        &mut self,
        sim: &Simulator,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Option<T> {
        let index = self.nodes.iter().position(|node| pred(&node.element))?;
        self.remove(sim, index)
    }

    /// Remove every element without recording sojourns, and restart the
    /// statistics if they are on.
    pub fn clear(&mut self, sim: &Simulator) {
        self.nodes.clear();
        if self.collecting {
            self.init_stat(sim);
        }
    }

    fn leave(&mut self, sim: &Simulator, node: Node<T>) -> T {
        if self.collecting {
            self.sojourn.add(sim.time() - node.inserted_at);
        }
        self.record_size(sim);
        node.element
    }

    fn record_size(&mut self, sim: &Simulator) {
        if self.collecting {
            self.size.update(sim, self.nodes.len() as f64);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statistics
    // ═══════════════════════════════════════════════════════════════════════

    /// Check if statistics are being collected.
    pub fn is_stat_collecting(&self) -> bool {
        self.collecting
    }

    /// Turn statistics on or off. Turning them on restarts them at the
    /// current time with the current length.
    pub fn set_stat_collecting(&mut self, sim: &Simulator, collecting: bool) {
        if collecting && !self.collecting {
            self.collecting = true;
            self.init_stat(sim);
        } else if !collecting {
            self.collecting = false;
        }
    }

    /// Restart the statistics at the current time with the current length.
    pub fn init_stat(&mut self, sim: &Simulator) {
        self.size.init_with(sim, self.nodes.len() as f64);
        self.sojourn.init();
        self.init_time = sim.time();
    }

    /// Time statistics were last restarted.
    pub fn init_time(&self) -> f64 {
        self.init_time
    }

    /// Time-weighted list length.
    pub fn stat_size(&self) -> &Accumulate {
        &self.size
    }

    /// Time-average length from the last restart to now.
    pub fn average_size(&mut self, sim: &Simulator) -> f64 {
        self.size.average(sim)
    }

    /// Time spent in the list by each removed element.
    pub fn stat_sojourn(&self) -> &Tally {
        &self.sojourn
    }

    /// Multi-line report on size and sojourn up to now.
    pub fn report(&mut self, sim: &Simulator) -> String {
        let average = self.size.average(sim);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "REPORT ON LIST : {}",
            self.name.as_deref().unwrap_or("")
        );
        let _ = writeln!(
            out,
            "   From time: {:>7.2} to time: {:>10.2}",
            self.init_time,
            sim.time()
        );
        let _ = writeln!(
            out,
            "{:>20}{:>11}{:>13}{:>15}{:>9}",
            "min", "max", "average", "standard dev.", "nb. Obs"
        );
        let _ = writeln!(
            out,
            "   Size    {:>9}{:>11}{:>13.3}",
            self.size.min().round(),
            self.size.max().round(),
            average
        );
        let _ = writeln!(
            out,
            "   Sojourn {:>9.3}{:>11.3}{:>13.3}{:>15.3}{:>9}",
            self.sojourn.min(),
            self.sojourn.max(),
            self.sojourn.average().unwrap_or(f64::NAN),
            self.sojourn.standard_deviation().unwrap_or(f64::NAN),
            self.sojourn.count()
        );
        out
    }
}

impl<T: PartialEq> ListWithStat<T> {
    /// Replace the element at `index`, returning the old one.
    ///
    /// An equal element keeps the old insertion time. A different one counts
    /// as the old element leaving and the new one entering now.
    pub fn replace(&mut self, sim: &Simulator, index: usize, element: T) -> Option<T> {
        let now = sim.time();
        let collecting = self.collecting;
        let node = self.nodes.get_mut(index)?;
        if node.element != element {
            if collecting {
                self.sojourn.add(now - node.inserted_at);
            }
            node.inserted_at = now;
        }
        Some(std::mem::replace(&mut node.element, element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_operations() {
        let sim = Simulator::new();
        let mut list = ListWithStat::named(&sim, "queue");
        list.push_back(&sim, 2);
        list.push_front(&sim, 1);
        list.insert(&sim, 2, 4);
        list.insert(&sim, 2, 3);

        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&4));
        assert_eq!(list.remove_first_where(&sim, |x| x % 2 == 1), Some(1));
        assert_eq!(list.remove(&sim, 1), Some(3));
        assert_eq!(list.pop_back(&sim), Some(4));
        assert_eq!(list.pop_front(&sim), Some(2));
        assert_eq!(list.pop_front(&sim), None);
        assert_eq!(list.name(), Some("queue"));
        assert_eq!(list.stat_size().name(), Some("List Size queue"));
    }

    #[test]
    fn test_no_statistics_until_enabled() {
        let sim = Simulator::new();
        let mut list = ListWithStat::new(&sim);
        list.push_back(&sim, "a");
        list.pop_front(&sim);
        assert!(!list.is_stat_collecting());
        assert_eq!(list.stat_sojourn().count(), 0);

        list.push_back(&sim, "b");
        list.set_stat_collecting(&sim, true);
        assert_eq!(list.stat_size().last_value(), 1.0);
    }

    #[test]
    fn test_replace_equal_keeps_insertion_time() {
        let sim = Simulator::new();
        let mut list = ListWithStat::new(&sim);
        list.set_stat_collecting(&sim, true);
        list.push_back(&sim, 7);

        assert_eq!(list.replace(&sim, 0, 7), Some(7));
        assert_eq!(list.stat_sojourn().count(), 0);
        assert_eq!(list.replace(&sim, 0, 8), Some(7));
        assert_eq!(list.stat_sojourn().count(), 1);
        assert_eq!(list.replace(&sim, 3, 9), None);
    }
}
