//! Cache Statistics Module
//!
//! Tracks where lookups resolved and how much each tier has evicted.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered by the memory tier
    pub memory_hits: u64,
    /// Lookups answered by the disk tier (and promoted)
    pub disk_hits: u64,
    /// Lookups that invoked the fetcher
    pub fetches: u64,
    /// Lookups no tier could answer, including those handed to the fetcher
    pub misses: u64,
    /// Entries evicted from the memory tier
    pub memory_evictions: u64,
    /// Files evicted from the disk tier
    pub disk_evictions: u64,
    /// Current number of entries in the memory tier
    pub memory_entries: usize,
    /// Current bytes stored in the disk tier
    pub disk_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total lookups observed.
    pub fn lookups(&self) -> u64 {
        self.memory_hits + self.disk_hits + self.misses
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate across both tiers.
    ///
    /// Returns hits / lookups, or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            (self.memory_hits + self.disk_hits) as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free lookup counters owned by the orchestrator.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    fetches: AtomicU64,
    misses: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the lookup counters; tier fields are left at zero.
    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}
