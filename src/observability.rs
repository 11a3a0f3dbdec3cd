//! Metrics hooks for cache operations.
//!
//! The engine reports every lookup, write, delete and swallowed failure to an
//! injected [`CacheMetrics`] sink. Nothing is kept in process-wide state, so
//! several engines can run side by side with independent accounting.
//!
//! ```ignore
//! use tag_cache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("cache_hits").inc();
//!     }
//!     // ... implement other methods
//! }
//!
//! let engine = CacheEngine::new(backend).with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! Counters are best-effort: a lookup that returned bytes is a hit, every
//! other lookup outcome (absent key or failing backend) is a miss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

/// Lock-free counting sink.
///
/// Clones share the same counters, so keep one clone and hand the other to
/// the engine:
///
/// ```
/// use tag_cache::observability::HitMissCounter;
/// use tag_cache::{backend::InMemoryBackend, CacheEngine};
///
/// let counter = HitMissCounter::new();
/// let engine = CacheEngine::new(InMemoryBackend::new())
///     .with_metrics(Box::new(counter.clone()));
/// assert_eq!(counter.stats().hits, 0);
/// ```
#[derive(Clone, Default)]
pub struct HitMissCounter {
    counters: Arc<Counters>,
}

impl HitMissCounter {
    /// Create a counter with every count at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current counts.
    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            sets: c.sets.load(Ordering::Relaxed),
            deletes: c.deletes.load(Ordering::Relaxed),
            errors: c.errors.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for HitMissCounter {
    fn record_hit(&self, _key: &str, _duration: Duration) {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _key: &str, _duration: Duration) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_set(&self, _key: &str, _duration: Duration) {
        self.counters.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delete(&self, _key: &str, _duration: Duration) {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, key: &str, error: &str) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        debug!("Counted cache error for {}: {}", key, error);
    }
}

/// Point-in-time counter values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}

impl CacheStats {
    /// Fraction of lookups that were hits, or `0.0` before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
