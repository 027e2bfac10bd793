//! Tiered Cache - A generic memory + disk cache
//!
//! Provides read-through, write-through and promotion across a bounded
//! memory tier with pluggable eviction and a size-bounded disk tier, plus a
//! small HTTP front-end over a `String -> String` cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{CacheConfig, EvictionAlgorithm, LruPolicy, Serializer, TieredCache};
pub use config::Config;
pub use error::{CacheError, Result};
