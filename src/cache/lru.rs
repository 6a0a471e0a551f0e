//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use indexmap::IndexSet;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are stored in an `IndexSet` where:
/// - Index 0 = Least recently used
/// - Last index = Most recently used
///
/// The tracker is not synchronized; the store guards it with a mutex.
#[derive(Debug)]
pub struct LruTracker {
    /// Order of keys by access time, oldest first
    order: IndexSet<String>,
    /// Number of keys tolerated before a candidate is offered
    capacity: usize,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker for the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            order: IndexSet::new(),
            capacity,
        }
    }

    // == Record Access ==
    /// Marks a key as most recently used, inserting it if new.
    pub fn record_access(&mut self, key: &str) {
        match self.order.get_index_of(key) {
            Some(idx) => {
                let last = self.order.len() - 1;
                self.order.move_index(idx, last);
            }
            None => {
                self.order.insert(key.to_string());
            }
        }
    }

    // == Eviction Candidate ==
    /// Returns the least recently used key when size exceeds capacity.
    ///
    /// At exactly-full no candidate is offered.
    pub fn eviction_candidate(&self) -> Option<&str> {
        if self.order.len() > self.capacity {
            self.order.first().map(String::as_str)
        } else {
            None
        }
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        self.order.shift_remove(key)
    }

    // == Ordered Keys ==
    /// Returns tracked keys oldest-first.
    pub fn ordered_keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    // == Restore Order ==
    /// Replaces the whole sequence with `keys`, oldest-first.
    ///
    /// A key listed twice keeps its last position.
    pub fn restore_order<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.order.clear();
        for key in keys {
            self.record_access(&key);
        }
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.order.contains(key)
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
