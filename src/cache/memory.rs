//! Memory Tier Module
//!
//! Fixed-capacity key-value storage that defers victim selection to a
//! pluggable [`EvictionAlgorithm`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::EvictionAlgorithm;

type BoxedPolicy<K> = Box<dyn EvictionAlgorithm<K>>;

// == Memory Store ==
/// Unsynchronized state of the memory tier.
///
/// The policy sits behind its own mutex so that a read hit, which only
/// holds the tier's read lock, can still record the access.
pub(crate) struct MemoryStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, V>,
    /// Eviction bookkeeping
    policy: Mutex<BoxedPolicy<K>>,
    /// Maximum number of entries before eviction kicks in
    max_items: usize,
    /// Entries dropped to make room
    evictions: u64,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(max_items: usize, policy: BoxedPolicy<K>) -> Self {
        Self {
            entries: HashMap::new(),
            policy: Mutex::new(policy),
            max_items,
            evictions: 0,
        }
    }

    fn policy_mut(&mut self) -> &mut BoxedPolicy<K> {
        self.policy.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    // == Put ==
    /// Inserts or overwrites `key`.
    ///
    /// A new key arriving at capacity first evicts the policy's candidate.
    /// If the policy has nothing to offer the insert still happens, leaving
    /// the tier one entry over capacity.
    pub(crate) fn put(&mut self, key: K, value: V) {
        if self.entries.len() >= self.max_items && !self.entries.contains_key(&key) {
            let candidate = self.policy_mut().select_eviction_candidate();
            if let Some(victim) = candidate {
                self.entries.remove(&victim);
                self.policy_mut().on_entry_remove(&victim);
                self.evictions += 1;
                debug!("memory tier: evicted one entry at capacity {}", self.max_items);
            }
        }

        self.policy_mut().on_entry_add(&key);
        self.entries.insert(key, value);
    }

    // == Get ==
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        let value = self.entries.get(key)?.clone();
        self.policy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_entry_access(key);
        Some(value)
    }

    // == Remove ==
    pub(crate) fn remove(&mut self, key: &K) -> bool {
        if self.entries.remove(key).is_some() {
            self.policy_mut().on_entry_remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.policy_mut().on_clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions
    }
}

// == Memory Tier ==
/// Thread-safe memory tier guarded by a single reader/writer lock.
///
/// `get` and `len` share the read lock; `put`, `remove` and `clear` take it
/// exclusively.
pub struct MemoryTier<K, V> {
    store: RwLock<MemoryStore<K, V>>,
}

impl<K, V> MemoryTier<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a memory tier holding at most `max_items` entries.
    pub fn new(max_items: usize, policy: Box<dyn EvictionAlgorithm<K>>) -> Self {
        Self {
            store: RwLock::new(MemoryStore::new(max_items, policy)),
        }
    }

    pub async fn put(&self, key: K, value: V) {
        self.store.write().await.put(key, value);
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.store.read().await.get(key)
    }

    /// Removes `key`, returning whether anything was deleted.
    pub async fn remove(&self, key: &K) -> bool {
        self.store.write().await.remove(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of entries evicted since creation.
    pub async fn evictions(&self) -> u64 {
        self.store.read().await.evictions()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FifoPolicy, LruPolicy};

    fn lru_store(max_items: usize) -> MemoryStore<String, String> {
        MemoryStore::new(max_items, Box::new(LruPolicy::new()))
    }

    /// Policy that never offers a victim.
    struct NoVictim;

    impl EvictionAlgorithm<String> for NoVictim {
        fn on_entry_add(&mut self, _key: &String) {}
        fn on_entry_access(&mut self, _key: &String) {}
        fn on_entry_remove(&mut self, _key: &String) {}
        fn select_eviction_candidate(&self) -> Option<String> {
            None
        }
        fn on_clear(&mut self) {}
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = lru_store(10);

        store.put("key1".to_string(), "value1".to_string());

        assert_eq!(store.get(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = lru_store(10);
        assert_eq!(store.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let mut store = lru_store(2);

        store.put("a".to_string(), "1".to_string());
        store.put("b".to_string(), "2".to_string());
        store.put("a".to_string(), "3".to_string());

        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 0);
        assert_eq!(store.get(&"a".to_string()), Some("3".to_string()));
        assert_eq!(store.get(&"b".to_string()), Some("2".to_string()));
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = lru_store(3);

        store.put("key1".to_string(), "value1".to_string());
        store.put("key2".to_string(), "value2".to_string());
        store.put("key3".to_string(), "value3".to_string());
        store.put("key4".to_string(), "value4".to_string());

        assert_eq!(store.len(), 3);
        assert_eq!(store.evictions(), 1);
        assert_eq!(store.get(&"key1".to_string()), None);
        assert!(store.get(&"key4".to_string()).is_some());
    }

    #[test]
    fn test_store_get_refreshes_recency() {
        let mut store = lru_store(3);

        store.put("key1".to_string(), "value1".to_string());
        store.put("key2".to_string(), "value2".to_string());
        store.put("key3".to_string(), "value3".to_string());

        store.get(&"key1".to_string());
        store.put("key4".to_string(), "value4".to_string());

        assert!(store.get(&"key1".to_string()).is_some());
        assert_eq!(store.get(&"key2".to_string()), None);
    }

    #[test]
    fn test_store_fifo_ignores_reads() {
        let mut store: MemoryStore<String, String> =
            MemoryStore::new(2, Box::new(FifoPolicy::new()));

        store.put("a".to_string(), "1".to_string());
        store.put("b".to_string(), "2".to_string());
        store.get(&"a".to_string());
        store.put("c".to_string(), "3".to_string());

        assert_eq!(store.get(&"a".to_string()), None);
        assert!(store.get(&"b".to_string()).is_some());
    }

    #[test]
    fn test_store_overshoots_when_policy_has_no_candidate() {
        let mut store: MemoryStore<String, String> = MemoryStore::new(1, Box::new(NoVictim));

        store.put("a".to_string(), "1".to_string());
        store.put("b".to_string(), "2".to_string());

        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 0);
    }

    #[test]
    fn test_store_remove() {
        let mut store = lru_store(10);

        store.put("key1".to_string(), "value1".to_string());

        assert!(store.remove(&"key1".to_string()));
        assert!(!store.remove(&"key1".to_string()));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_clear_resets_policy() {
        let mut store = lru_store(2);

        store.put("a".to_string(), "1".to_string());
        store.put("b".to_string(), "2".to_string());
        store.clear();
        assert_eq!(store.len(), 0);

        // Stale tracking would name "a" as the victim and let the map grow.
        store.put("c".to_string(), "3".to_string());
        store.put("d".to_string(), "4".to_string());
        store.put("e".to_string(), "5".to_string());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"c".to_string()), None);
    }

    #[tokio::test]
    async fn test_tier_async_operations() {
        let tier: MemoryTier<u64, String> = MemoryTier::new(2, Box::new(LruPolicy::new()));

        tier.put(1, "one".to_string()).await;
        tier.put(2, "two".to_string()).await;
        assert_eq!(tier.get(&1).await, Some("one".to_string()));

        tier.put(3, "three".to_string()).await;
        assert_eq!(tier.len().await, 2);
        assert_eq!(tier.get(&2).await, None);
        assert_eq!(tier.evictions().await, 1);

        assert!(tier.remove(&1).await);
        tier.clear().await;
        assert!(tier.is_empty().await);
    }
}
