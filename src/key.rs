//! Cache key utilities and the reserved tag namespace.

use crate::error::{Error, Result};

/// Reserved prefix for tag-set keys.
///
/// A tag named `users` is stored in the backend as the set `tag:users`.
/// Callers must not use cache keys beginning with this prefix.
pub const TAG_PREFIX: &str = "tag:";

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Backend key of the tag-set for `tag`.
    pub fn tag_key(tag: &str) -> String {
        format!("{}{}", TAG_PREFIX, tag)
    }

    /// Whether `key` lives in the tag namespace.
    pub fn is_tag_key(key: &str) -> bool {
        key.starts_with(TAG_PREFIX)
    }

    /// Build cache key with custom prefix.
    pub fn build_with_prefix(prefix: &str, id: &dyn std::fmt::Display) -> String {
        format!("{}:{}", prefix, id)
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// Parse a composite key into parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }

    /// Reject keys the engine cannot address.
    pub(crate) fn validate(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::ValidationError(
                "cache key must not be empty".to_string(),
            ));
        }
        if Self::is_tag_key(key) {
            warn!(
                "Cache key {} collides with the tag namespace ({})",
                key, TAG_PREFIX
            );
        }
        Ok(())
    }
}
