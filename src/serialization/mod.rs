//! Pluggable codecs between cached values and backend bytes.
//!
//! The engine never looks inside a payload. It hands values to a [`Codec`] on
//! the way in and bytes to the same codec on the way out, so the shape of a
//! cached object is independent of the store's byte-oriented protocol.
//!
//! # Provided codecs
//!
//! - [`PostcardCodec`] (default): Postcard payload wrapped in a versioned
//!   envelope.
//! - [`JsonCodec`]: plain JSON, useful when non-Rust readers share the store.
//!
//! # Envelope format
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (varint)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "TAGC"              u32                postcard::to_allocvec(T)
//! ```
//!
//! # Example
//!
//! ```rust
//! use tag_cache::serialization::{Codec, PostcardCodec};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # fn main() -> tag_cache::Result<()> {
//! let codec = PostcardCodec;
//! let user = User { id: 1, name: "Alice".to_string() };
//!
//! let bytes = codec.encode(&user)?;
//! let decoded: User = codec.decode(&bytes)?;
//! assert_eq!(user, decoded);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for envelope-encoded entries: b"TAGC"
pub const CACHE_MAGIC: [u8; 4] = *b"TAGC";

/// Current schema version.
///
/// Increment when making breaking changes to cached types. Entries written
/// under another version fail to decode with [`Error::VersionMismatch`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Encode/decode capability used by the engine.
///
/// Implementations must be deterministic: the same value always yields the
/// same bytes, and the same bytes always decode to the same value.
pub trait Codec: Send + Sync {
    /// Encode a value for storage.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the value cannot be encoded.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode stored bytes into a value.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` (or an envelope error) if the
    /// bytes do not describe a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// Versioned envelope for cache entries.
///
/// ```rust
/// use tag_cache::serialization::CacheEnvelope;
///
/// let envelope = CacheEnvelope::new("data");
/// assert_eq!(envelope.magic, *b"TAGC");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be b"TAGC"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The actual cached data
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Postcard codec with magic/version validation. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostcardCodec;

impl Codec for PostcardCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let envelope = CacheEnvelope::new(value);
        postcard::to_allocvec(&envelope).map_err(|e| {
            error!("Cache serialization failed: {}", e);
            Error::SerializationError(e.to_string())
        })
    }

    /// Decode with strict validation.
    ///
    /// - bad magic: `Error::InvalidCacheEntry`
    /// - other schema version: `Error::VersionMismatch`
    /// - malformed payload: `Error::DeserializationError`
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
            error!("Cache deserialization failed: {}", e);
            Error::DeserializationError(e.to_string())
        })?;

        if envelope.magic != CACHE_MAGIC {
            warn!(
                "Invalid cache entry: expected magic {:?}, got {:?}",
                CACHE_MAGIC, envelope.magic
            );
            return Err(Error::InvalidCacheEntry(format!(
                "Invalid magic: expected {:?}, got {:?}",
                CACHE_MAGIC, envelope.magic
            )));
        }

        if envelope.version != CURRENT_SCHEMA_VERSION {
            warn!(
                "Cache version mismatch: expected {}, got {}",
                CURRENT_SCHEMA_VERSION, envelope.version
            );
            return Err(Error::VersionMismatch {
                expected: CURRENT_SCHEMA_VERSION,
                found: envelope.version,
            });
        }

        Ok(envelope.payload)
    }
}

/// Plain JSON codec, no envelope.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| {
            error!("JSON serialization failed: {}", e);
            Error::SerializationError(e.to_string())
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            error!("JSON deserialization failed: {}", e);
            Error::DeserializationError(e.to_string())
        })
    }
}
