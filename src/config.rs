//! Configuration Module
//!
//! Handles loading the HTTP front-end's configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{CacheConfig, JsonSerializer, LruPolicy};
use crate::error::Result;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Memory tier capacity; 0 disables the memory tier
    pub memory_max_items: usize,
    /// Disk tier directory; None disables the disk tier
    pub disk_dir: Option<PathBuf>,
    /// Disk tier byte budget
    pub disk_max_bytes: u64,
    /// Default TTL in seconds, carried into the cache configuration
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMORY_MAX_ITEMS` - Memory tier capacity (default: 1000, 0 disables)
    /// - `DISK_CACHE_DIR` - Disk tier directory (default: ./cache_data, empty disables)
    /// - `DISK_MAX_BYTES` - Disk tier budget in bytes (default: 64 MiB)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let disk_dir = match env::var("DISK_CACHE_DIR") {
            Ok(dir) if dir.is_empty() => None,
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => defaults.disk_dir,
        };

        Self {
            memory_max_items: env_or("MEMORY_MAX_ITEMS", defaults.memory_max_items),
            disk_dir,
            disk_max_bytes: env_or("DISK_MAX_BYTES", defaults.disk_max_bytes),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Builds the cache configuration for a `String -> String` cache with an
    /// LRU memory tier and JSON-encoded disk files.
    pub fn cache_config(&self) -> Result<CacheConfig<String, String>> {
        let mut builder = CacheConfig::builder()
            .ttl(Duration::from_secs(self.default_ttl))
            .serializer(JsonSerializer::new());

        if self.memory_max_items > 0 {
            builder = builder.memory(self.memory_max_items, LruPolicy::new());
        }
        if let Some(dir) = &self.disk_dir {
            builder = builder.disk(dir, self.disk_max_bytes);
        }

        builder.build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_max_items: 1000,
            disk_dir: Some(PathBuf::from("./cache_data")),
            disk_max_bytes: 64 * 1024 * 1024,
            default_ttl: 300,
            server_port: 3000,
        }
    }
}
