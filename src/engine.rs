//! Cache engine - cache-aside orchestration and the tag index.
//!
//! # Consistency notes
//!
//! The engine keeps no state of its own besides the metrics sink; every
//! backend call is atomic on its own but sequences of calls are not:
//!
//! - Within one `cache` call the value is stored before its tags are
//!   registered. Two concurrent `cache` calls for the same key race, and the
//!   last write to reach the backend wins.
//! - `flush_tags` reads a tag-set and then deletes its members together with
//!   the tag-set itself. A key tagged after the read but before the delete is
//!   not deleted. It survives untagged until its TTL runs out.
//! - Concurrent misses on the same key each run their own producer. There is
//!   no single-flight deduplication and producer failures are never cached.

use crate::backend::{CacheBackend, NoOpBackend};
use crate::error::{Error, Result};
use crate::expiration::Ttl;
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::serialization::{Codec, PostcardCodec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Instant;

/// Cache engine over a backend `B` and a codec `C`.
///
/// # Example
///
/// ```
/// use tag_cache::{backend::InMemoryBackend, CacheEngine, Ttl};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tag_cache::Result<()> {
/// let engine = CacheEngine::new(InMemoryBackend::new());
///
/// let name: Option<String> = engine
///     .cache("user:1:name", Ttl::from_secs(60), &["users"], || async {
///         Ok(Some("Alice".to_string()))
///     })
///     .await?;
/// assert_eq!(name.as_deref(), Some("Alice"));
///
/// engine.flush_tags(&["users"]).await;
/// assert!(!engine.exists("user:1:name").await);
/// # Ok(())
/// # }
/// ```
pub struct CacheEngine<B: CacheBackend, C: Codec = PostcardCodec> {
    backend: B,
    codec: C,
    metrics: Box<dyn CacheMetrics>,
}

impl<B: CacheBackend> CacheEngine<B> {
    /// Create new engine with given backend and the default codec.
    pub fn new(backend: B) -> Self {
        CacheEngine {
            backend,
            codec: PostcardCodec,
            metrics: Box::new(NoOpMetrics),
        }
    }
}

impl CacheEngine<NoOpBackend> {
    /// Engine with no backend configured: reads miss, writes are discarded.
    pub fn disabled() -> Self {
        CacheEngine::new(NoOpBackend)
    }
}

impl<B: CacheBackend, C: Codec> CacheEngine<B, C> {
    /// Replace the codec.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> CacheEngine<B, C2> {
        CacheEngine {
            backend: self.backend,
            codec,
            metrics: self.metrics,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the codec used for stored payloads.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Whether `key` is present, without decoding it.
    ///
    /// Backend failures and invalid keys read as `false`.
    pub async fn exists(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        self.lookup(key).await.is_ok()
    }

    /// Look up and decode the value stored at `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - decoded value
    /// - `Ok(None)` - the key holds an empty payload (a cached absence)
    ///
    /// # Errors
    /// - `Error::CacheMiss`: key not present
    /// - `Error::BackendError`: backend unreachable or failing
    /// - `Error::DeserializationError` (or another codec error): stored bytes
    ///   do not decode as `T`
    /// - `Error::ValidationError`: empty key
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        CacheKeyBuilder::validate(key)?;
        let bytes = self.lookup(key).await?;
        self.decode(key, &bytes)
    }

    /// Cache-aside: return the cached value, or compute, store and tag it.
    ///
    /// On a miss `producer` runs exactly once. Its `Ok(None)` is cached as an
    /// empty payload, so absence is cached too. Its `Err` is returned verbatim
    /// and nothing is written or tagged.
    ///
    /// After a successful producer run the value is stored under the
    /// normalized `ttl` and `key` is then registered under every tag, even if
    /// the store step failed. A store failure is still returned to the caller;
    /// tag registration failures are only logged.
    ///
    /// # Errors
    /// - any error returned by `producer`
    /// - `Error::BackendError` from the lookup (producer not run) or the store
    /// - codec errors from decoding a hit (producer not run) or encoding the
    ///   produced value
    /// - `Error::ValidationError`: empty key
    pub async fn cache<T, F, Fut>(
        &self,
        key: &str,
        ttl: Ttl,
        tags: &[&str],
        producer: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        CacheKeyBuilder::validate(key)?;

        match self.lookup(key).await {
            Ok(bytes) => return self.decode(key, &bytes),
            Err(Error::CacheMiss) => {}
            Err(e) => return Err(e),
        }

        debug!("» Cache miss for {}, running producer", key);
        let value = producer().await?;

        let stored = self.store(key, value.as_ref(), ttl).await;
        self.set_tags(key, tags).await;
        stored?;

        Ok(value)
    }

    /// Write-through: encode and store `value` at `key`, then tag it.
    ///
    /// `None` is stored as an empty payload.
    ///
    /// # Errors
    /// - `Error::SerializationError`: encoding failed (nothing stored)
    /// - `Error::BackendError`: backend rejected the write
    /// - `Error::ValidationError`: empty key
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
        ttl: Ttl,
        tags: &[&str],
    ) -> Result<()> {
        CacheKeyBuilder::validate(key)?;
        let stored = self.store(key, value, ttl).await;
        self.set_tags(key, tags).await;
        stored
    }

    /// Register `key` under each of `tags`. Best-effort.
    pub async fn set_tags(&self, key: &str, tags: &[&str]) {
        if key.is_empty() {
            warn!("Refusing to tag an empty cache key");
            return;
        }

        for tag in tags {
            let tag_key = CacheKeyBuilder::tag_key(tag);
            if let Err(e) = self.backend.add_to_set(&tag_key, key).await {
                warn!("Tagging {} with {} failed: {}", key, tag, e);
                self.metrics.record_error(&tag_key, &e.to_string());
            }
        }
    }

    /// Delete `key`. Best-effort and idempotent.
    pub async fn flush_key(&self, key: &str) {
        if key.is_empty() {
            warn!("Refusing to flush an empty cache key");
            return;
        }

        let timer = Instant::now();
        match self.backend.delete(key).await {
            Ok(()) => self.metrics.record_delete(key, timer.elapsed()),
            Err(e) => {
                warn!("Flush of {} failed: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
            }
        }
    }

    /// Delete every key registered under each of `tags`, and the tag-sets.
    ///
    /// Tags are processed independently; a failure on one is logged and does
    /// not stop the others. An empty tag-set issues no delete.
    pub async fn flush_tags(&self, tags: &[&str]) {
        for tag in tags {
            let tag_key = CacheKeyBuilder::tag_key(tag);
            let timer = Instant::now();

            let members = match self.backend.members_of(&tag_key).await {
                Ok(members) => members,
                Err(e) => {
                    warn!("Reading tag {} failed: {}", tag, e);
                    self.metrics.record_error(&tag_key, &e.to_string());
                    continue;
                }
            };

            if members.is_empty() {
                debug!("Tag {} has no members, nothing to flush", tag);
                continue;
            }

            let mut doomed: Vec<&str> = members.iter().map(String::as_str).collect();
            doomed.push(&tag_key);

            match self.backend.mdelete(&doomed).await {
                Ok(()) => {
                    debug!("✓ Flushed tag {} ({} keys)", tag, members.len());
                    self.metrics.record_delete(&tag_key, timer.elapsed());
                }
                Err(e) => {
                    warn!("Flushing tag {} failed: {}", tag, e);
                    self.metrics.record_error(&tag_key, &e.to_string());
                }
            }
        }
    }

    /// Verify the backend is reachable.
    ///
    /// # Errors
    /// Returns `Err` if the backend reports itself inaccessible.
    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// Raw bytes at `key`, with hit/miss accounting.
    async fn lookup(&self, key: &str) -> Result<Vec<u8>> {
        let timer = Instant::now();

        match self.backend.get(key).await {
            Ok(Some(bytes)) => {
                self.metrics.record_hit(key, timer.elapsed());
                Ok(bytes)
            }
            Ok(None) => {
                self.metrics.record_miss(key, timer.elapsed());
                Err(Error::CacheMiss)
            }
            Err(e) => {
                self.metrics.record_miss(key, timer.elapsed());
                self.metrics.record_error(key, &e.to_string());
                error!("Cache GET of {} failed: {}", key, e);
                Err(e)
            }
        }
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, bytes: &[u8]) -> Result<Option<T>> {
        if bytes.is_empty() {
            return Ok(None);
        }

        self.codec.decode::<T>(bytes).map(Some).map_err(|e| {
            error!(
                "Decoding {} as {} failed: {}",
                key,
                std::any::type_name::<T>(),
                e
            );
            e
        })
    }

    async fn store<T: Serialize>(&self, key: &str, value: Option<&T>, ttl: Ttl) -> Result<()> {
        let bytes = match value {
            Some(value) => self.codec.encode(value).map_err(|e| {
                error!("Encoding {} failed: {}", key, e);
                e
            })?,
            None => Vec::new(),
        };

        let timer = Instant::now();
        let backend_ttl = ttl.backend_ttl();
        match self.backend.set(key, bytes, backend_ttl).await {
            Ok(()) => {
                debug!("✓ Stored {} (requested {:?}, effective {:?})", key, ttl, backend_ttl);
                self.metrics.record_set(key, timer.elapsed());
                Ok(())
            }
            Err(e) => {
                error!("Cache SET of {} failed: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }
}
