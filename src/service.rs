//! High-level cache service for web applications.
//!
//! Provides a convenient wrapper around CacheEngine with Arc for easy sharing.

use crate::backend::CacheBackend;
use crate::engine::CacheEngine;
use crate::error::Result;
use crate::expiration::Ttl;
use crate::observability::CacheMetrics;
use crate::serialization::{Codec, PostcardCodec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// High-level cache service for web applications.
///
/// Wraps `CacheEngine` in `Arc` so handlers and background tasks can share
/// one engine without an external `Arc<Mutex<>>`. The engine only takes
/// `&self`, so no lock is needed.
///
/// # Example
///
/// ```ignore
/// use tag_cache::{CacheService, Ttl, backend::InMemoryBackend};
///
/// pub struct UserService {
///     cache: CacheService<InMemoryBackend>,
///     repo: Arc<UserRepository>,
/// }
///
/// impl UserService {
///     pub async fn get(&self, id: &str) -> Result<Option<User>> {
///         let key = format!("user:{}", id);
///         self.cache
///             .cache(&key, Ttl::from_secs(300), &["users"], || self.repo.find(id))
///             .await
///     }
///
///     pub async fn on_users_changed(&self) {
///         self.cache.flush_tags(&["users"]).await;
///     }
/// }
/// ```
pub struct CacheService<B: CacheBackend, C: Codec = PostcardCodec> {
    engine: Arc<CacheEngine<B, C>>,
}

impl<B: CacheBackend, C: Codec> Clone for CacheService<B, C> {
    fn clone(&self) -> Self {
        CacheService {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<B: CacheBackend> CacheService<B> {
    /// Create a new cache service with the given backend.
    pub fn new(backend: B) -> Self {
        CacheService {
            engine: Arc::new(CacheEngine::new(backend)),
        }
    }

    /// Create a new cache service with custom metrics.
    pub fn with_metrics(backend: B, metrics: Box<dyn CacheMetrics>) -> Self {
        CacheService {
            engine: Arc::new(CacheEngine::new(backend).with_metrics(metrics)),
        }
    }
}

impl<B: CacheBackend, C: Codec> CacheService<B, C> {
    /// Wrap a fully configured engine.
    pub fn from_engine(engine: CacheEngine<B, C>) -> Self {
        CacheService {
            engine: Arc::new(engine),
        }
    }

    /// See [`CacheEngine::exists`].
    pub async fn exists(&self, key: &str) -> bool {
        self.engine.exists(key).await
    }

    /// See [`CacheEngine::get`].
    ///
    /// # Errors
    ///
    /// Same error cases as [`CacheEngine::get`].
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.engine.get(key).await
    }

    /// See [`CacheEngine::cache`].
    ///
    /// # Errors
    ///
    /// Same error cases as [`CacheEngine::cache`].
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
        self.engine.cache(key, ttl, tags, producer).await
    }

    /// See [`CacheEngine::set`].
    ///
    /// # Errors
    ///
    /// Same error cases as [`CacheEngine::set`].
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
        ttl: Ttl,
        tags: &[&str],
    ) -> Result<()> {
        self.engine.set(key, value, ttl, tags).await
    }

    pub async fn set_tags(&self, key: &str, tags: &[&str]) {
        self.engine.set_tags(key, tags).await
    }

    pub async fn flush_key(&self, key: &str) {
        self.engine.flush_key(key).await
    }

    pub async fn flush_tags(&self, tags: &[&str]) {
        self.engine.flush_tags(tags).await
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &CacheEngine<B, C> {
        &self.engine
    }
}
