//! Integration tests for tag-cache
//!
//! These tests verify end-to-end cache behavior across all components using
//! the in-memory backend.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tag_cache::backend::{CacheBackend, InMemoryBackend};
use tag_cache::observability::HitMissCounter;
use tag_cache::serialization::JsonCodec;
use tag_cache::{CacheEngine, CacheService, Error, Ttl};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: String,
    name: String,
    email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct Order {
    id: String,
    user_id: String,
    total: f64,
}

fn alice() -> User {
    User {
        id: "user_123".to_string(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
    }
}

/// Test 1: End-to-End Cache Flow
///
/// - Cache miss → producer runs → cache populated
/// - Second call hits cache, producer untouched
/// - `get` returns the same logical value
#[tokio::test]
async fn test_end_to_end_cache_flow() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());
    let calls = AtomicUsize::new(0);

    let first = engine
        .cache("user:user_123", Ttl::from_secs(300), &["users"], || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(alice()))
        })
        .await
        .expect("First cache operation should succeed");
    assert_eq!(first, Some(alice()));

    let cached = backend
        .get("user:user_123")
        .await
        .expect("Cache get should not error");
    assert!(cached.is_some(), "Cache should be populated after first call");

    let second = engine
        .cache("user:user_123", Ttl::from_secs(300), &["users"], || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(User {
                id: "user_123".to_string(),
                name: "Imposter".to_string(),
                email: String::new(),
            }))
        })
        .await
        .expect("Second cache operation should succeed");
    assert_eq!(second, Some(alice()), "Second call must be served from cache");

    let fetched = engine
        .get::<User>("user:user_123")
        .await
        .expect("Get should succeed");
    assert_eq!(fetched, Some(alice()));

    assert_eq!(calls.load(Ordering::SeqCst), 1, "Producer runs exactly once");
}

/// Test 2: Tag Bulk Invalidation
///
/// Keys a and b tagged "users", c tagged "orders". Flushing "users" removes
/// a, b and the "users" tag-set, and leaves c alone.
#[tokio::test]
async fn test_tag_bulk_invalidation() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());

    for key in ["a", "b"] {
        engine
            .cache(key, Ttl::from_secs(60), &["users"], || async {
                Ok(Some(alice()))
            })
            .await
            .expect("Failed to cache");
    }
    engine
        .cache("c", Ttl::from_secs(60), &["orders"], || async {
            Ok(Some(Order {
                id: "o1".to_string(),
                user_id: "user_123".to_string(),
                total: 9.5,
            }))
        })
        .await
        .expect("Failed to cache");

    engine.flush_tags(&["users"]).await;

    assert!(!engine.exists("a").await);
    assert!(!engine.exists("b").await);
    assert!(engine.exists("c").await);
    assert!(
        !backend.exists("tag:users").await.expect("exists failed"),
        "Tag-set itself must be deleted"
    );
    assert!(backend.exists("tag:orders").await.expect("exists failed"));
}

/// Test 3: Multi-Tag Keys
///
/// A key registered under several tags disappears when any one of them is
/// flushed; the other tag-sets keep their (now stale) membership, and a later
/// flush of those tags tolerates the already-absent key.
#[tokio::test]
async fn test_multi_tag_key_and_stale_membership() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());

    engine
        .set("shared", Some(&alice()), Ttl::from_secs(60), &["users", "tenant:7"])
        .await
        .expect("Failed to set");
    engine
        .set("other", Some(&alice()), Ttl::from_secs(60), &["tenant:7"])
        .await
        .expect("Failed to set");

    engine.flush_tags(&["users"]).await;
    assert!(!engine.exists("shared").await);

    let mut stale = backend
        .members_of("tag:tenant:7")
        .await
        .expect("Failed to read tag");
    stale.sort();
    assert_eq!(stale, vec!["other".to_string(), "shared".to_string()]);

    engine.flush_tags(&["tenant:7"]).await;
    assert!(!engine.exists("other").await);
    assert!(backend.is_empty().await);
}

/// Test 4: Flush of an unknown tag is a no-op
#[tokio::test]
async fn test_flush_unknown_tag() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());

    engine
        .set("k", Some(&1u32), Ttl::ZERO, &["known"])
        .await
        .expect("Failed to set");

    engine.flush_tags(&["unknown", ""]).await;

    assert!(engine.exists("k").await);
    assert_eq!(backend.len().await, 2);
}

/// Test 5: Idempotent Flush
#[tokio::test]
async fn test_flush_key_twice() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());

    engine
        .set("k", Some(&alice()), Ttl::ZERO, &[])
        .await
        .expect("Failed to set");

    engine.flush_key("k").await;
    assert_eq!(backend.get("k").await.expect("get failed"), None);

    engine.flush_key("k").await;
    assert_eq!(backend.get("k").await.expect("get failed"), None);
}

/// Test 6: Producer failure leaves no trace
#[tokio::test]
async fn test_producer_failure_leaves_no_trace() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let result = engine
            .cache::<User, _, _>("user:1", Ttl::from_secs(60), &["users"], || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::ProducerError("db timeout".to_string()))
            })
            .await;
        assert_eq!(result, Err(Error::ProducerError("db timeout".to_string())));
    }

    // Failures are never cached: every call retried the producer.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!engine.exists("user:1").await);
    assert!(backend
        .members_of("tag:users")
        .await
        .expect("Failed to read tag")
        .is_empty());
    assert!(backend.is_empty().await);
}

/// Test 7: Cached absence
///
/// A producer answering `None` caches an empty payload: later lookups report
/// `Ok(None)` rather than a miss, and the producer is not re-run.
#[tokio::test]
async fn test_cached_absence() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());
    let calls = AtomicUsize::new(0);

    for _ in 0..2 {
        let result = engine
            .cache::<User, _, _>("user:ghost", Ttl::from_secs(60), &[], || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await
            .expect("Failed to cache");
        assert_eq!(result, None);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        backend.get("user:ghost").await.expect("get failed"),
        Some(Vec::new())
    );
    assert_eq!(engine.get::<User>("user:ghost").await, Ok(None));
    assert!(engine.exists("user:ghost").await);
}

/// Test 8: Existence check never decodes
#[tokio::test]
async fn test_exists_ignores_payload_shape() {
    let engine = CacheEngine::new(InMemoryBackend::new());

    engine
        .set("order:1", Some(&vec![1u8, 2, 3]), Ttl::ZERO, &[])
        .await
        .expect("Failed to set");

    assert!(engine.exists("order:1").await);
    let wrong_type = engine.get::<User>("order:1").await;
    assert!(wrong_type.expect_err("Vec<u8> is not a User").is_codec());
    assert!(engine.exists("order:1").await);
}

/// Test 9: TTL expiry hands control back to the producer
#[tokio::test]
async fn test_expired_entry_recomputed() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());

    // Write below the engine to get an expiry shorter than the 1s floor.
    backend
        .set(
            "counter",
            tag_cache::Codec::encode(engine.codec(), &1u32).expect("encode failed"),
            Some(Duration::from_millis(50)),
        )
        .await
        .expect("Failed to set");

    assert_eq!(engine.get::<u32>("counter").await, Ok(Some(1)));
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(engine.get::<u32>("counter").await, Err(Error::CacheMiss));

    let value = engine
        .cache("counter", Ttl::from_secs(5), &[], || async { Ok(Some(2u32)) })
        .await
        .expect("Failed to cache");
    assert_eq!(value, Some(2));
}

/// Test 10: Overwrite semantics
///
/// `set` on an existing key replaces its value and its TTL.
#[tokio::test]
async fn test_set_overwrites() {
    let backend = InMemoryBackend::new();
    let engine = CacheEngine::new(backend.clone());

    engine
        .set("k", Some(&1u32), Ttl::from_secs(10), &[])
        .await
        .expect("Failed to set");
    engine
        .set("k", Some(&2u32), Ttl::from_secs(-1), &[])
        .await
        .expect("Failed to set");

    assert_eq!(engine.get::<u32>("k").await, Ok(Some(2)));
    assert_eq!(backend.ttl("k").await, None);
}

/// Test 11: Independent engines keep independent metrics
#[tokio::test]
async fn test_independent_metrics() {
    let backend = InMemoryBackend::new();
    let first_counter = HitMissCounter::new();
    let second_counter = HitMissCounter::new();

    let first = CacheEngine::new(backend.clone()).with_metrics(Box::new(first_counter.clone()));
    let second = CacheEngine::new(backend.clone()).with_metrics(Box::new(second_counter.clone()));

    first
        .cache("k", Ttl::ZERO, &[], || async { Ok(Some(1u32)) })
        .await
        .expect("Failed to cache");
    assert_eq!(second.get::<u32>("k").await, Ok(Some(1)));

    assert_eq!(first_counter.stats().misses, 1);
    assert_eq!(first_counter.stats().hits, 0);
    assert_eq!(second_counter.stats().hits, 1);
    assert_eq!(second_counter.stats().misses, 0);
}

/// Test 12: Codec choice is invisible to callers
#[tokio::test]
async fn test_json_codec_end_to_end() {
    let engine = CacheEngine::new(InMemoryBackend::new()).with_codec(JsonCodec);

    let value = engine
        .cache("user:json", Ttl::from_secs(60), &["users"], || async {
            Ok(Some(alice()))
        })
        .await
        .expect("Failed to cache");
    assert_eq!(value, Some(alice()));
    assert_eq!(engine.get::<User>("user:json").await, Ok(Some(alice())));

    engine.flush_tags(&["users"]).await;
    assert_eq!(engine.get::<User>("user:json").await, Err(Error::CacheMiss));
}

/// Test 13: Concurrent load through the shared service
#[tokio::test]
async fn test_concurrent_service_access() {
    let service = CacheService::new(InMemoryBackend::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for i in 0..20 {
        let service = service.clone();
        let calls = Arc::clone(&calls);
        handles.push(tokio::spawn(async move {
            let key = format!("user:{}", i % 5);
            service
                .cache(&key, Ttl::from_secs(60), &["users"], || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(i % 5))
                })
                .await
                .expect("Failed to cache")
        }));
    }

    for handle in handles {
        let value = handle.await.expect("Task failed");
        assert!(value.is_some());
    }

    // Misses are not deduplicated, so anything from 5 to 20 runs is valid.
    let runs = calls.load(Ordering::SeqCst);
    assert!((5..=20).contains(&runs), "unexpected producer runs: {}", runs);

    service.flush_tags(&["users"]).await;
    for i in 0..5 {
        assert!(!service.exists(&format!("user:{}", i)).await);
    }
}
