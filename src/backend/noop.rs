//! Backend used when no store is configured.
//!
//! Reads always miss and writes succeed without effect, so an engine built on
//! it behaves uniformly: every `cache` call runs its producer, every `get`
//! reports `CacheMiss`, and flushes do nothing.

use super::CacheBackend;
use crate::error::Result;
use std::time::Duration;

/// Always-miss, discard-writes backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpBackend;

impl CacheBackend for NoOpBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        trace!("NoOp GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
        trace!("NoOp SET {} discarded", key);
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn mdelete(&self, _keys: &[&str]) -> Result<()> {
        Ok(())
    }

    async fn add_to_set(&self, _set_key: &str, _member: &str) -> Result<()> {
        Ok(())
    }

    async fn members_of(&self, _set_key: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn clear_all(&self) -> Result<()> {
        Ok(())
    }
}
