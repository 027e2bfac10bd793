//! FIFO Policy Module
//!
//! Evicts in insertion order; reads never change the order.

use std::collections::VecDeque;

use crate::cache::EvictionAlgorithm;

// == FIFO Policy ==
/// Insertion-ordered eviction. Front = newest, back = oldest.
///
/// Overwriting a key counts as a fresh insertion.
#[derive(Debug)]
pub struct FifoPolicy<K> {
    order: VecDeque<K>,
}

impl<K> FifoPolicy<K> {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K> Default for FifoPolicy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionAlgorithm<K> for FifoPolicy<K>
where
    K: PartialEq + Clone + Send + Sync,
{
    fn on_entry_add(&mut self, key: &K) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.clone());
    }

    fn on_entry_access(&mut self, _key: &K) {}

    fn on_entry_remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    fn select_eviction_candidate(&self) -> Option<K> {
        self.order.back().cloned()
    }

    fn on_clear(&mut self) {
        self.order.clear();
    }
}
