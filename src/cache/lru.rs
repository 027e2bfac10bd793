//! LRU Policy Module
//!
//! Implements Least Recently Used ordering for memory tier eviction.

use std::collections::VecDeque;

use crate::cache::EvictionAlgorithm;

// == LRU Policy ==
/// Tracks access order for LRU eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruPolicy<K> {
    /// Order of keys by access time
    order: VecDeque<K>,
}

impl<K: PartialEq + Clone> LruPolicy<K> {
    // == Constructor ==
    /// Creates a new empty LRU policy.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    ///
    /// If key exists, removes it first then adds to front.
    fn touch(&mut self, key: &K) {
        self.forget(key);
        self.order.push_front(key.clone());
    }

    fn forget(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.back()
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

impl<K: PartialEq + Clone> Default for LruPolicy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionAlgorithm<K> for LruPolicy<K>
where
    K: PartialEq + Clone + Send + Sync,
{
    fn on_entry_add(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_entry_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_entry_remove(&mut self, key: &K) {
        self.forget(key);
    }

    fn select_eviction_candidate(&self) -> Option<K> {
        self.peek_oldest().cloned()
    }

    fn on_clear(&mut self) {
        self.order.clear();
    }
}
