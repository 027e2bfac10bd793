//! Tiered Cache Module
//!
//! Orchestrates an optional memory tier and an optional disk tier:
//! read-through (memory, then disk, then the caller's fetcher), write-through
//! to every configured tier, and promotion of disk hits into memory.

use std::fmt::Display;
use std::future::{Future, Ready};
use std::hash::Hash;
use std::time::Duration;

use tracing::debug;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheConfig, CacheStats, DiskTier, MemoryTier};
use crate::error::{CacheError, Result};

/// Fetcher type for lookups that stay inside the tiers.
type NoFetcher<V> = fn() -> Ready<anyhow::Result<V>>;

// == Tiered Cache ==
/// Two-tier cache in front of an expensive value producer.
///
/// Holds no lock of its own; each tier guards itself. A lookup is therefore
/// not atomic: a concurrent `put` or `remove` on the same key between the
/// memory miss and the final populate goes undetected and the last write
/// wins. Concurrent misses on one key may each run the fetcher.
pub struct TieredCache<K, V> {
    memory: Option<MemoryTier<K, V>>,
    disk: Option<DiskTier<V>>,
    stats: StatsRecorder,
    default_ttl: Duration,
}

impl<K, V> TieredCache<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache from already-built tiers.
    pub fn new(memory: Option<MemoryTier<K, V>>, disk: Option<DiskTier<V>>) -> Self {
        Self {
            memory,
            disk,
            stats: StatsRecorder::default(),
            default_ttl: Duration::ZERO,
        }
    }

    /// Assembles the tiers described by `config`.
    pub fn from_config(config: CacheConfig<K, V>) -> Result<Self> {
        let memory = config
            .memory
            .map(|m| MemoryTier::new(m.max_items, m.eviction_algorithm));
        let disk = match config.disk {
            Some(d) => Some(DiskTier::new(d.directory, d.max_size_bytes, config.serializer)?),
            None => None,
        };

        let mut cache = Self::new(memory, disk);
        cache.default_ttl = config.default_ttl;
        Ok(cache)
    }

    pub fn memory(&self) -> Option<&MemoryTier<K, V>> {
        self.memory.as_ref()
    }

    pub fn disk(&self) -> Option<&DiskTier<V>> {
        self.disk.as_ref()
    }

    /// Default TTL from the configuration. No operation enforces it.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Put ==
    /// Writes `value` to the memory tier, then the disk tier.
    ///
    /// The tiers are not updated atomically: if the disk write fails the
    /// memory write stays in effect and the error is returned.
    pub async fn put(&self, key: K, value: V) -> Result<()> {
        if let Some(memory) = &self.memory {
            memory.put(key.clone(), value.clone()).await;
        }
        if let Some(disk) = &self.disk {
            disk.put(&key, &value).await?;
        }
        Ok(())
    }

    // == Get ==
    /// Looks `key` up in memory, then on disk, then via `fetcher`.
    ///
    /// A disk hit is promoted into memory. A fetched value is written to both
    /// tiers before it is returned. Returns `Ok(None)` when nothing resolves.
    /// Fetcher errors and disk write errors while populating propagate; the
    /// fetcher runs without a timeout.
    pub async fn get<F, Fut>(&self, key: &K, fetcher: Option<F>) -> Result<Option<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(memory) = &self.memory {
            if let Some(value) = memory.get(key).await {
                debug!("memory hit for '{}'", key);
                self.stats.record_memory_hit();
                return Ok(Some(value));
            }
        }

        if let Some(disk) = &self.disk {
            if let Some(value) = disk.get(key).await {
                debug!("disk hit for '{}', promoting to memory", key);
                self.stats.record_disk_hit();
                if let Some(memory) = &self.memory {
                    memory.put(key.clone(), value.clone()).await;
                }
                return Ok(Some(value));
            }
        }

        self.stats.record_miss();

        let Some(fetcher) = fetcher else {
            debug!("miss for '{}'", key);
            return Ok(None);
        };

        debug!("miss for '{}', invoking fetcher", key);
        self.stats.record_fetch();
        let value = fetcher().await?;
        self.put(key.clone(), value.clone()).await?;
        Ok(Some(value))
    }

    /// Looks `key` up in the tiers only.
    pub async fn get_cached(&self, key: &K) -> Result<Option<V>> {
        self.get(key, None::<NoFetcher<V>>).await
    }

    /// Looks `key` up, falling through to `fetcher` on a miss.
    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetcher: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        self.get(key, Some(fetcher))
            .await?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Remove ==
    /// Removes `key` from both tiers; true if either held it.
    pub async fn remove(&self, key: &K) -> Result<bool> {
        let mut removed = false;
        if let Some(memory) = &self.memory {
            removed |= memory.remove(key).await;
        }
        if let Some(disk) = &self.disk {
            removed |= disk.remove(key).await?;
        }
        Ok(removed)
    }

    // == Clear ==
    /// Clears memory, then disk. Not atomic across the pair.
    pub async fn clear(&self) -> Result<()> {
        if let Some(memory) = &self.memory {
            memory.clear().await;
        }
        if let Some(disk) = &self.disk {
            disk.clear().await?;
        }
        Ok(())
    }

    // == Size ==
    /// Memory entry count plus disk byte count.
    ///
    /// The two terms have different units. Use [`memory_len`](Self::memory_len)
    /// and [`disk_bytes`](Self::disk_bytes) for figures that mean something
    /// on their own.
    pub async fn size(&self) -> Result<u64> {
        Ok(self.memory_len().await as u64 + self.disk_bytes().await?)
    }

    /// Number of entries in the memory tier (0 if absent).
    pub async fn memory_len(&self) -> usize {
        match &self.memory {
            Some(memory) => memory.len().await,
            None => 0,
        }
    }

    /// Bytes stored in the disk tier (0 if absent).
    pub async fn disk_bytes(&self) -> Result<u64> {
        match &self.disk {
            Some(disk) => disk.size().await,
            None => Ok(0),
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = self.stats.snapshot();
        if let Some(memory) = &self.memory {
            stats.memory_entries = memory.len().await;
            stats.memory_evictions = memory.evictions().await;
        }
        if let Some(disk) = &self.disk {
            stats.disk_bytes = disk.size().await?;
            stats.disk_evictions = disk.evictions().await;
        }
        Ok(stats)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{JsonSerializer, LruPolicy};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn memory_only(max_items: usize) -> TieredCache<String, String> {
        TieredCache::new(
            Some(MemoryTier::new(max_items, Box::new(LruPolicy::new()))),
            None,
        )
    }

    fn both_tiers(dir: &std::path::Path) -> TieredCache<String, String> {
        let config = CacheConfig::builder()
            .memory(10, LruPolicy::new())
            .disk(dir, 1024 * 1024)
            .serializer(JsonSerializer::new())
            .build()
            .unwrap();
        TieredCache::from_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_memory_only_put_get() {
        let cache = memory_only(10);

        cache.put("k".to_string(), "v".to_string()).await.unwrap();

        assert_eq!(
            cache.get_cached(&"k".to_string()).await.unwrap(),
            Some("v".to_string())
        );
        assert_eq!(cache.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_tiers_falls_through_to_fetcher_every_time() {
        let cache: TieredCache<String, String> = TieredCache::new(None, None);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let value = cache
                .get_or_fetch(&"k".to_string(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fresh".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "fresh");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetcher_error_propagates() {
        let cache = memory_only(10);

        let result = cache
            .get_or_fetch(&"k".to_string(), || async {
                Err::<String, _>(anyhow::anyhow!("upstream unavailable"))
            })
            .await;

        assert!(matches!(result, Err(CacheError::Fetch(_))));
        assert_eq!(cache.memory_len().await, 0);
    }

    #[tokio::test]
    async fn test_memory_hit_skips_fetcher() {
        let cache = memory_only(10);
        cache.put("k".to_string(), "cached".to_string()).await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let value = cache
            .get_or_fetch(&"k".to_string(), || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("fetched".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stats_track_resolution_tier() {
        let tmp = TempDir::new().unwrap();
        let cache = both_tiers(tmp.path());
        let key = "k".to_string();

        // Fetch, then memory hit.
        cache
            .get_or_fetch(&key, || async { Ok("v".to_string()) })
            .await
            .unwrap();
        cache.get_cached(&key).await.unwrap();

        // Disk hit after dropping the memory copy.
        cache.memory().unwrap().remove(&key).await;
        cache.get_cached(&key).await.unwrap();

        // Plain miss.
        cache.get_cached(&"other".to_string()).await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.disk_hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.memory_entries, 1);
        assert_eq!(stats.disk_bytes, 3);
    }

    #[tokio::test]
    async fn test_from_config_carries_ttl() {
        let config = CacheConfig::<String, String>::builder()
            .memory(5, LruPolicy::new())
            .ttl(Duration::from_secs(60))
            .serializer(JsonSerializer::new())
            .build()
            .unwrap();

        let cache = TieredCache::from_config(config).unwrap();

        assert_eq!(cache.default_ttl(), Duration::from_secs(60));
        assert!(cache.memory().is_some());
        assert!(cache.disk().is_none());
    }
}
