//! Disk Tier Module
//!
//! Directory-backed storage: one file per key, named by the hex SHA-256 of
//! the key's textual form. Total directory size is capped by deleting the
//! least recently touched files first, using file modification times as the
//! recency signal.

use std::fmt::Display;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::Serializer;
use crate::error::Result;

// == File Naming ==
/// Returns the lowercase hex SHA-256 of `key.to_string()`.
pub fn file_name_for<K: Display + ?Sized>(key: &K) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sets the file's modification time to now.
fn touch(path: &Path) -> io::Result<()> {
    File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

struct FileInfo {
    path: PathBuf,
    len: u64,
    modified: SystemTime,
}

// == Disk Store ==
/// Unsynchronized filesystem operations of the disk tier.
#[derive(Debug)]
pub(crate) struct DiskStore {
    directory: PathBuf,
    max_size_bytes: u64,
    /// Files deleted by budget enforcement
    evictions: u64,
}

impl DiskStore {
    pub(crate) fn new(directory: PathBuf, max_size_bytes: u64) -> Self {
        Self {
            directory,
            max_size_bytes,
            evictions: 0,
        }
    }

    // == Put ==
    /// Writes `bytes` to `filename`, refreshes its mtime and enforces the
    /// size budget. Returns the number of files evicted.
    pub(crate) fn put(&mut self, filename: &str, bytes: &[u8]) -> io::Result<usize> {
        let path = self.directory.join(filename);
        fs::write(&path, bytes)?;
        touch(&path)?;

        let evicted = self.enforce(&path)?;
        self.evictions += evicted as u64;
        Ok(evicted)
    }

    // == Read ==
    /// Reads `filename`, refreshing its mtime on success.
    ///
    /// A missing or unreadable file is a miss.
    pub(crate) fn read(&self, filename: &str) -> Option<Vec<u8>> {
        let path = self.directory.join(filename);
        if !path.is_file() {
            return None;
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("disk tier: failed to read {}: {}", path.display(), err);
                return None;
            }
        };

        if let Err(err) = touch(&path) {
            debug!("disk tier: could not refresh mtime of {}: {}", path.display(), err);
        }

        Some(bytes)
    }

    // == Remove ==
    pub(crate) fn remove(&self, filename: &str) -> io::Result<bool> {
        match fs::remove_file(self.directory.join(filename)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    // == Clear ==
    pub(crate) fn clear(&self) -> io::Result<()> {
        for file in self.list_files()? {
            match fs::remove_file(&file.path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    // == Size ==
    /// Sum of the lengths of all files in the directory.
    pub(crate) fn size(&self) -> io::Result<u64> {
        Ok(self.list_files()?.iter().map(|f| f.len).sum())
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions
    }

    // == Enforce ==
    /// Deletes files oldest-first until the directory fits the budget.
    ///
    /// `keep` (the file just written) is never deleted, so a single value
    /// larger than the budget survives on its own. Files with equal mtimes
    /// go in directory listing order.
    fn enforce(&self, keep: &Path) -> io::Result<usize> {
        let mut files = self.list_files()?;
        let mut total: u64 = files.iter().map(|f| f.len).sum();
        if total <= self.max_size_bytes {
            return Ok(0);
        }

        files.sort_by_key(|f| f.modified);

        let mut evicted = 0;
        for file in files {
            if total <= self.max_size_bytes {
                break;
            }
            if file.path == keep {
                continue;
            }
            match fs::remove_file(&file.path) {
                Ok(()) => {
                    total = total.saturating_sub(file.len);
                    evicted += 1;
                }
                Err(err) => {
                    warn!("disk tier: failed to evict {}: {}", file.path.display(), err);
                }
            }
        }

        debug!(
            "disk tier: evicted {} files, {} bytes remain (budget {})",
            evicted, total, self.max_size_bytes
        );
        Ok(evicted)
    }

    fn list_files(&self) -> io::Result<Vec<FileInfo>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            // Entries can vanish between listing and stat.
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            files.push(FileInfo {
                path: entry.path(),
                len: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(files)
    }
}

// == Disk Tier ==
/// Thread-safe disk tier guarded by a single reader/writer lock.
///
/// Filesystem work runs on tokio's blocking pool while the lock guard is
/// held, so a `put` that returns has finished its eviction pass.
pub struct DiskTier<V> {
    store: Arc<RwLock<DiskStore>>,
    directory: PathBuf,
    serializer: Arc<dyn Serializer<V>>,
}

impl<V> DiskTier<V> {
    /// Opens a disk tier over `directory`, creating it if absent.
    pub fn new(
        directory: impl Into<PathBuf>,
        max_size_bytes: u64,
        serializer: Arc<dyn Serializer<V>>,
    ) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            store: Arc::new(RwLock::new(DiskStore::new(directory.clone(), max_size_bytes))),
            directory,
            serializer,
        })
    }

    /// Directory holding the cache files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    // == Put ==
    /// Serializes and writes `value`, then enforces the size budget.
    ///
    /// Serialization and write failures propagate.
    pub async fn put<K: Display + ?Sized>(&self, key: &K, value: &V) -> Result<()> {
        let bytes = self.serializer.serialize(value)?;
        let filename = file_name_for(key);

        let mut guard = self.store.clone().write_owned().await;
        tokio::task::spawn_blocking(move || guard.put(&filename, &bytes)).await??;
        Ok(())
    }

    // == Get ==
    /// Reads and deserializes the value for `key`.
    ///
    /// Read and deserialize failures are misses; a corrupt file is left in place.
    pub async fn get<K: Display + ?Sized>(&self, key: &K) -> Option<V> {
        let filename = file_name_for(key);

        let guard = self.store.clone().read_owned().await;
        let bytes = match tokio::task::spawn_blocking(move || guard.read(&filename)).await {
            Ok(bytes) => bytes?,
            Err(err) => {
                warn!("disk tier: read task failed: {}", err);
                return None;
            }
        };

        match self.serializer.deserialize(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("disk tier: failed to decode entry for '{}': {}", key, err);
                None
            }
        }
    }

    // == Remove ==
    /// Deletes the file for `key`, returning whether one existed.
    pub async fn remove<K: Display + ?Sized>(&self, key: &K) -> Result<bool> {
        let filename = file_name_for(key);

        let guard = self.store.clone().write_owned().await;
        Ok(tokio::task::spawn_blocking(move || guard.remove(&filename)).await??)
    }

    // == Clear ==
    pub async fn clear(&self) -> Result<()> {
        let guard = self.store.clone().write_owned().await;
        tokio::task::spawn_blocking(move || guard.clear()).await??;
        Ok(())
    }

    // == Size ==
    /// Total bytes currently stored.
    pub async fn size(&self) -> Result<u64> {
        let guard = self.store.clone().read_owned().await;
        Ok(tokio::task::spawn_blocking(move || guard.size()).await??)
    }

    /// Files evicted by budget enforcement since creation.
    pub async fn evictions(&self) -> u64 {
        self.store.read().await.evictions()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::JsonSerializer;
    use std::time::Duration;
    use tempfile::TempDir;

    fn open_tier(dir: &Path, max_size_bytes: u64) -> DiskTier<String> {
        DiskTier::new(dir, max_size_bytes, Arc::new(JsonSerializer::new())).unwrap()
    }

    /// Distinct mtimes for ordering assertions.
    async fn tick() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[test]
    fn test_file_name_is_lowercase_sha256_hex() {
        // sha256("hello")
        assert_eq!(
            file_name_for("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(file_name_for(&42u32), file_name_for("42"));
        assert_ne!(file_name_for("a"), file_name_for("b"));
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 1024);

        tier.put("key1", &"value1".to_string()).await.unwrap();

        assert_eq!(tier.get("key1").await, Some("value1".to_string()));
        assert!(tmp.path().join(file_name_for("key1")).is_file());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 1024);

        assert_eq!(tier.get("nope").await, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss_and_left_in_place() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 1024);
        let path = tmp.path().join(file_name_for("broken"));
        fs::write(&path, b"{not json").unwrap();

        assert_eq!(tier.get("broken").await, None);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_bytes() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 1024);

        tier.put("k", &"first".to_string()).await.unwrap();
        tier.put("k", &"second".to_string()).await.unwrap();

        assert_eq!(tier.get("k").await, Some("second".to_string()));
        assert_eq!(tier.size().await.unwrap(), "\"second\"".len() as u64);
    }

    #[tokio::test]
    async fn test_oldest_first_eviction() {
        let tmp = TempDir::new().unwrap();
        // Each value serializes to 12 bytes; room for two.
        let tier = open_tier(tmp.path(), 24);

        tier.put("A", &"aaaaaaaaaa".to_string()).await.unwrap();
        tick().await;
        tier.put("B", &"bbbbbbbbbb".to_string()).await.unwrap();
        tick().await;
        tier.put("C", &"cccccccccc".to_string()).await.unwrap();

        assert!(!tmp.path().join(file_name_for("A")).exists());
        assert!(tmp.path().join(file_name_for("B")).exists());
        assert!(tmp.path().join(file_name_for("C")).exists());
        assert_eq!(tier.evictions().await, 1);
        assert!(tier.size().await.unwrap() <= 24);
    }

    #[tokio::test]
    async fn test_get_refreshes_recency() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 24);

        tier.put("A", &"aaaaaaaaaa".to_string()).await.unwrap();
        tick().await;
        tier.put("B", &"bbbbbbbbbb".to_string()).await.unwrap();
        tick().await;
        assert!(tier.get("A").await.is_some());
        tick().await;
        tier.put("C", &"cccccccccc".to_string()).await.unwrap();

        assert!(tmp.path().join(file_name_for("A")).exists());
        assert!(!tmp.path().join(file_name_for("B")).exists());
    }

    #[tokio::test]
    async fn test_oversized_value_survives_alone() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 8);

        tier.put("small", &"x".to_string()).await.unwrap();
        tick().await;
        tier.put("big", &"y".repeat(64)).await.unwrap();

        assert_eq!(tier.get("small").await, None);
        assert_eq!(tier.get("big").await, Some("y".repeat(64)));
    }

    #[tokio::test]
    async fn test_remove() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 1024);

        tier.put("k", &"v".to_string()).await.unwrap();

        assert!(tier.remove("k").await.unwrap());
        assert!(!tier.remove("k").await.unwrap());
        assert_eq!(tier.get("k").await, None);
    }

    #[tokio::test]
    async fn test_clear_twice_and_size() {
        let tmp = TempDir::new().unwrap();
        let tier = open_tier(tmp.path(), 1024);

        tier.put("a", &"1".to_string()).await.unwrap();
        tier.put("b", &"2".to_string()).await.unwrap();
        assert_eq!(tier.size().await.unwrap(), 6);

        tier.clear().await.unwrap();
        assert_eq!(tier.size().await.unwrap(), 0);
        tier.clear().await.unwrap();
        assert_eq!(tier.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_new_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");

        let tier = open_tier(&nested, 1024);

        assert!(nested.is_dir());
        assert_eq!(tier.directory(), nested.as_path());
    }
}
