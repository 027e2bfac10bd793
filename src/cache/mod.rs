//! Cache Module
//!
//! Provides a memory tier with pluggable eviction, a size-bounded disk tier,
//! and the orchestrator that layers them.

mod builder;
mod disk;
mod eviction;
mod fifo;
mod lru;
mod manager;
mod memory;
mod serializer;
mod stats;


// Re-export public types
pub use builder::{CacheConfig, CacheConfigBuilder, DiskConfig, MemoryConfig};
pub use disk::{file_name_for, DiskTier};
pub use eviction::EvictionAlgorithm;
pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use manager::TieredCache;
pub use memory::MemoryTier;
pub use serializer::{JsonSerializer, Serializer};
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes for the HTTP front-end
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes for the HTTP front-end
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
