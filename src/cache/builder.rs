//! Cache Configuration Module
//!
//! Immutable configuration record for a [`TieredCache`](crate::cache::TieredCache)
//! and the builder that validates it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{EvictionAlgorithm, Serializer};
use crate::error::{CacheError, Result};

/// Memory tier settings.
pub struct MemoryConfig<K> {
    pub max_items: usize,
    pub eviction_algorithm: Box<dyn EvictionAlgorithm<K>>,
}

/// Disk tier settings.
#[derive(Debug, Clone)]
pub struct DiskConfig {
    pub directory: PathBuf,
    pub max_size_bytes: u64,
}

// == Cache Config ==
/// Settings for a tiered cache. Either tier may be absent.
pub struct CacheConfig<K, V> {
    pub(crate) memory: Option<MemoryConfig<K>>,
    pub(crate) disk: Option<DiskConfig>,
    /// Carried for callers; no cache operation consults it.
    pub(crate) default_ttl: Duration,
    pub(crate) serializer: Arc<dyn Serializer<V>>,
}

impl<K, V> CacheConfig<K, V> {
    pub fn builder() -> CacheConfigBuilder<K, V> {
        CacheConfigBuilder::new()
    }

    /// Memory tier capacity, if the tier is configured.
    pub fn memory_max_items(&self) -> Option<usize> {
        self.memory.as_ref().map(|m| m.max_items)
    }

    pub fn disk(&self) -> Option<&DiskConfig> {
        self.disk.as_ref()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("memory_max_items", &self.memory_max_items())
            .field("disk", &self.disk)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

// == Builder ==
/// Builder for [`CacheConfig`].
///
/// A serializer is mandatory; `build` fails without one. Building with a
/// disk tier creates its directory if needed.
pub struct CacheConfigBuilder<K, V> {
    memory: Option<MemoryConfig<K>>,
    disk: Option<DiskConfig>,
    ttl: Duration,
    serializer: Option<Arc<dyn Serializer<V>>>,
}

impl<K, V> CacheConfigBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            memory: None,
            disk: None,
            ttl: Duration::ZERO,
            serializer: None,
        }
    }

    /// Enables the memory tier with the given capacity and policy.
    pub fn memory<P>(mut self, max_items: usize, eviction_algorithm: P) -> Self
    where
        P: EvictionAlgorithm<K> + 'static,
    {
        self.memory = Some(MemoryConfig {
            max_items,
            eviction_algorithm: Box::new(eviction_algorithm),
        });
        self
    }

    /// Enables the disk tier rooted at `directory` with a byte budget.
    pub fn disk(mut self, directory: impl AsRef<Path>, max_size_bytes: u64) -> Self {
        self.disk = Some(DiskConfig {
            directory: directory.as_ref().to_path_buf(),
            max_size_bytes,
        });
        self
    }

    pub fn ttl(mut self, default_ttl: Duration) -> Self {
        self.ttl = default_ttl;
        self
    }

    pub fn serializer<S>(mut self, serializer: S) -> Self
    where
        S: Serializer<V> + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    // == Build ==
    pub fn build(self) -> Result<CacheConfig<K, V>> {
        let serializer = self
            .serializer
            .ok_or_else(|| CacheError::Config("Serializer must be provided".to_string()))?;

        if let Some(disk) = &self.disk {
            if !disk.directory.exists() {
                fs::create_dir_all(&disk.directory)?;
                info!("Created disk cache directory {}", disk.directory.display());
            }
        }

        Ok(CacheConfig {
            memory: self.memory,
            disk: self.disk,
            default_ttl: self.ttl,
            serializer,
        })
    }
}

impl<K, V> Default for CacheConfigBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
