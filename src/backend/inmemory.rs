//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Byte values and sets share one keyspace like they do in Redis, and TTL
//! expiration is applied lazily on access.

use super::CacheBackend;
use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

enum StoredValue {
    Bytes(Vec<u8>),
    Members(HashSet<String>),
}

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn bytes(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        // A deadline past what Instant can hold means no expiry.
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));
        CacheEntry {
            value: StoredValue::Bytes(data),
            expires_at,
        }
    }

    fn members() -> Self {
        CacheEntry {
            value: StoredValue::Members(HashSet::new()),
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }

    fn size(&self) -> usize {
        match &self.value {
            StoredValue::Bytes(data) => data.len(),
            StoredValue::Members(members) => members.iter().map(String::len).sum(),
        }
    }
}

fn wrong_type(key: &str, expected: &str) -> Error {
    Error::BackendError(format!(
        "WRONGTYPE key {} does not hold a {} value",
        key, expected
    ))
}

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same store.
///
/// # Example
///
/// ```no_run
/// use tag_cache::backend::{InMemoryBackend, CacheBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("key1", b"value".to_vec(), None).await?;
///     assert!(backend.get("key1").await?.is_some());
///
///     backend.set("key2", b"expires".to_vec(), Some(Duration::from_secs(300))).await?;
///
///     backend.add_to_set("tag:users", "key1").await?;
///     assert_eq!(backend.members_of("tag:users").await?, vec!["key1".to_string()]);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of keys (values and sets) in cache.
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            total_entries: self.store.len(),
            ..Default::default()
        };
        for entry in self.store.iter() {
            if entry.is_expired() {
                stats.expired_entries += 1;
            }
            if matches!(entry.value, StoredValue::Members(_)) {
                stats.set_entries += 1;
            }
            stats.total_bytes += entry.size();
        }
        stats
    }

    /// Print cache statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Cache Stats: {} entries ({} expired, {} sets), {} bytes",
            stats.total_entries, stats.expired_entries, stats.set_entries, stats.total_bytes
        );
    }

    /// Remaining lifetime of `key`, if it holds a value with an expiry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entry = self.store.get(key)?;
        entry
            .expires_at
            .and_then(|exp| exp.checked_duration_since(Instant::now()))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return match &entry.value {
                    StoredValue::Bytes(data) => {
                        debug!("✓ InMemory GET {} -> HIT", key);
                        Ok(Some(data.clone()))
                    }
                    StoredValue::Members(_) => Err(wrong_type(key, "string")),
                };
            }
        }

        // Remove expired entry if it exists
        self.store.remove_if(key, |_, entry| entry.is_expired());
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.store
            .insert(key.to_string(), CacheEntry::bytes(value, ttl));

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn mdelete(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.store.remove(*key);
        }

        debug!("✓ InMemory MDELETE {} keys", keys.len());
        Ok(())
    }

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<()> {
        let mut entry = match self.store.entry(set_key.to_string()) {
            Entry::Occupied(occupied) => {
                let mut entry = occupied.into_ref();
                if entry.is_expired() {
                    *entry = CacheEntry::members();
                }
                entry
            }
            Entry::Vacant(vacant) => vacant.insert(CacheEntry::members()),
        };

        match &mut entry.value {
            StoredValue::Members(members) => {
                members.insert(member.to_string());
                debug!("✓ InMemory SADD {} {}", set_key, member);
                Ok(())
            }
            StoredValue::Bytes(_) => Err(wrong_type(set_key, "set")),
        }
    }

    async fn members_of(&self, set_key: &str) -> Result<Vec<String>> {
        let Some(entry) = self.store.get(set_key) else {
            return Ok(Vec::new());
        };
        if entry.is_expired() {
            return Ok(Vec::new());
        }

        match &entry.value {
            StoredValue::Members(members) => {
                debug!("✓ InMemory SMEMBERS {} -> {} members", set_key, members.len());
                Ok(members.iter().cloned().collect())
            }
            StoredValue::Bytes(_) => Err(wrong_type(set_key, "set")),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        if let Some(entry) = self.store.get(key) {
            return Ok(!entry.is_expired());
        }

        Ok(false)
    }

    async fn health_check(&self) -> Result<bool> {
        // In-memory backend is always healthy
        Ok(true)
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all cache cleared!");
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub set_entries: usize,
    pub total_bytes: usize,
}
