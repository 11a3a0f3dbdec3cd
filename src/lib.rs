//! # tag-cache
//!
//! A client-side caching layer for key-value stores.
//!
//! ## Features
//!
//! - **Cache-aside:** [`CacheEngine::cache`] returns a cached value or runs a
//!   producer, stores its result and tags the key
//! - **Tag invalidation:** group keys under tags and drop a whole group with
//!   [`CacheEngine::flush_tags`]
//! - **Pluggable codecs:** Postcard (default) or JSON, or your own [`Codec`]
//! - **Backend agnostic:** in-memory, Redis, or any [`CacheBackend`];
//!   [`NoOpBackend`](backend::NoOpBackend) when caching is switched off
//! - **Injected metrics:** per-engine [`CacheMetrics`](observability::CacheMetrics)
//!   sinks, no global counters
//!
//! ## Quick Start
//!
//! ```ignore
//! use tag_cache::{backend::InMemoryBackend, CacheService, Ttl};
//!
//! let cache = CacheService::new(InMemoryBackend::new());
//!
//! // Computed on the first call, served from the cache afterwards
//! let user: Option<User> = cache
//!     .cache("user:42", Ttl::from_secs(300), &["users", "tenant:7"], || async {
//!         repo.find_user(42).await
//!     })
//!     .await?;
//!
//! // Drop every key tagged "users"
//! cache.flush_tags(&["users"]).await;
//! ```
//!
//! ## Expiration
//!
//! Requested lifetimes are normalized once, at store time: negative requests
//! mean "no explicit expiry", anything below one second becomes one hour,
//! everything else is kept. See [`expiration`].

#[macro_use]
extern crate log;

pub mod backend;
pub mod engine;
pub mod error;
pub mod expiration;
pub mod key;
pub mod observability;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use engine::CacheEngine;
pub use error::{Error, Result};
pub use expiration::Ttl;
pub use key::TAG_PREFIX;
pub use serialization::Codec;
pub use service::CacheService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
