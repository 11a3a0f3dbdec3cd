//! Store adapters: the key-value backends the engine sits in front of.

use crate::error::Result;
use std::time::Duration;

#[cfg(feature = "inmemory")]
pub mod inmemory;
pub mod noop;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryBackend;
pub use noop::NoOpBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for cache backend implementations.
///
/// Byte values and sets share one keyspace, as they do in Redis: deleting a
/// key removes whatever lives there. Each call is expected to be atomic on
/// its own; a sequence of calls is not.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// Timeouts and cancellation belong here, not in the engine: configure them on
/// the adapter (see `RedisConfig::connection_timeout`).
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache (possibly empty)
    /// - `Ok(None)` - Key not found
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value in cache, overwriting any previous entry and its TTL.
    ///
    /// # Arguments
    /// - `key`: Cache key
    /// - `value`: Encoded bytes
    /// - `ttl`: Time-to-live. None = use backend default or infinite
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Remove value from cache. Succeeds when the key is already absent.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// Bulk delete operation.
    ///
    /// Default implementation calls `delete()` for each key.
    /// Override to issue a single round trip (e.g., Redis DEL).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn mdelete(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// Add `member` to the set stored at `set_key`, creating the set if absent.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs or `set_key` holds a non-set value
    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<()>;

    /// Members of the set stored at `set_key`, in no particular order.
    ///
    /// An absent set is empty, not an error.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs or `set_key` holds a non-set value
    async fn members_of(&self, set_key: &str) -> Result<Vec<String>>;

    /// Check if key exists in cache (optional optimization).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Optional: Clear all cache (use with caution).
    ///
    /// # Errors
    /// Returns `Err` if operation is not implemented or fails
    async fn clear_all(&self) -> Result<()> {
        Err(crate::error::Error::NotImplemented(
            "clear_all not implemented for this backend".to_string(),
        ))
    }
}
