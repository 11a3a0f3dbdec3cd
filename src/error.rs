//! Error types for the caching layer.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations.
///
/// `CacheMiss` is deliberately separate from `BackendError`: callers use the
/// former to decide whether to compute a value, and must never mistake an
/// unreachable backend for an absent key.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The requested key is absent in the backend.
    ///
    /// Expected and non-exceptional. [`CacheEngine::cache`](crate::CacheEngine::cache)
    /// reacts to it by invoking the producer.
    CacheMiss,

    /// Backend storage error (Redis, in-memory type mismatch, etc).
    ///
    /// Common causes:
    /// - Redis connection lost or pool exhausted
    /// - Network timeout configured on the adapter
    /// - Backend protocol error (e.g. `WRONGTYPE`)
    ///
    /// Never retried by the engine.
    BackendError(String),

    /// Encoding a value into cache bytes failed.
    SerializationError(String),

    /// Decoding cache bytes into a value failed.
    ///
    /// A decode failure on read is a hard error, not a miss: corrupt or stale
    /// data must not silently vanish.
    DeserializationError(String),

    /// Invalid cache entry: corrupted envelope or bad magic.
    ///
    /// Returned by [`PostcardCodec`](crate::serialization::PostcardCodec) when
    /// the magic header is not `b"TAGC"`.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and cached data.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Failure reported by a caller-supplied producer.
    ///
    /// The engine never constructs this itself; it exists so producers have a
    /// natural variant to fail with. Whatever a producer returns is propagated
    /// verbatim.
    ProducerError(String),

    /// Invalid input, such as an empty cache key.
    ValidationError(String),

    /// Configuration error while building a backend.
    ConfigError(String),

    /// Operation not supported by this backend.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Whether this is the distinguished "key not present" condition.
    pub fn is_miss(&self) -> bool {
        matches!(self, Error::CacheMiss)
    }

    /// Whether the backend itself failed.
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::BackendError(_))
    }

    /// Whether the codec failed in either direction.
    pub fn is_codec(&self) -> bool {
        matches!(
            self,
            Error::SerializationError(_)
                | Error::DeserializationError(_)
                | Error::InvalidCacheEntry(_)
                | Error::VersionMismatch { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CacheMiss => write!(f, "Cache miss"),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::ProducerError(msg) => write!(f, "Producer error: {}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}
