//! Redis cache backend implementation.

use super::CacheBackend;
use crate::error::{Error, Result};
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Connection, Pool, Runtime};
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Pooled connections when `REDIS_POOL_SIZE` is unset.
const DEFAULT_POOL_SIZE: u32 = 16;

const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u32,
    pub pool_size: u32,
    /// Upper bound on waiting for a pooled connection and on opening a new one.
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    pub fn connection_string(&self) -> String {
        if let Some(password) = &self.password {
            if let Some(username) = &self.username {
                format!(
                    "redis://{}:{}@{}:{}/{}",
                    username, password, self.host, self.port, self.database
                )
            } else {
                format!(
                    "redis://default:{}@{}:{}/{}",
                    password, self.host, self.port, self.database
                )
            }
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        }
    }

    /// Read configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `REDIS_HOST`, `REDIS_PORT`, `REDIS_USERNAME`,
    /// `REDIS_PASSWORD`, `REDIS_DB`, `REDIS_POOL_SIZE`, `REDIS_TIMEOUT_MS`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn parse<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>> {
            raw.map(|value| {
                value
                    .parse()
                    .map_err(|_| Error::ConfigError(format!("{} is not valid: {}", name, value)))
            })
            .transpose()
        }

        let defaults = RedisConfig::default();
        Ok(RedisConfig {
            host: lookup("REDIS_HOST").unwrap_or(defaults.host),
            port: parse("REDIS_PORT", lookup("REDIS_PORT"))?.unwrap_or(defaults.port),
            username: lookup("REDIS_USERNAME"),
            password: lookup("REDIS_PASSWORD"),
            database: parse("REDIS_DB", lookup("REDIS_DB"))?.unwrap_or(defaults.database),
            pool_size: parse("REDIS_POOL_SIZE", lookup("REDIS_POOL_SIZE"))?
                .unwrap_or(defaults.pool_size),
            connection_timeout: parse::<u64>("REDIS_TIMEOUT_MS", lookup("REDIS_TIMEOUT_MS"))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.connection_timeout),
        })
    }
}

/// Redis backend with connection pooling and async operations.
///
/// Tag-sets are native Redis sets (`SADD`/`SMEMBERS`), so bulk invalidation
/// deletes them with the same `DEL` that removes their members.
///
/// # Example
///
/// ```no_run
/// # use tag_cache::backend::{RedisBackend, RedisConfig, CacheBackend};
/// # use tag_cache::error::Result;
/// # async fn example() -> Result<()> {
/// let config = RedisConfig::default();
/// let backend = RedisBackend::new(config).await?;
///
/// backend.set("key", b"value".to_vec(), None).await?;
/// let value = backend.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Create new Redis backend from configuration.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = Self::build_pool(
            &config.connection_string(),
            config.pool_size,
            config.connection_timeout,
        )?;

        info!(
            "✓ Redis backend initialized: {}:{}",
            config.host, config.port
        );

        Ok(RedisBackend { pool })
    }

    /// Connect to `conn_str`, taking pool size and timeout from the
    /// environment (see [`RedisConfig::from_env`]).
    ///
    /// # Errors
    /// Returns `Err` if the environment holds an unparsable setting or pool
    /// creation fails.
    pub async fn from_connection_string(conn_str: &str) -> Result<Self> {
        let tuning = RedisConfig::from_env()?;
        let pool = Self::build_pool(conn_str, tuning.pool_size, tuning.connection_timeout)?;

        info!(
            "✓ Redis pool ready ({} connections max, {:?} timeout)",
            tuning.pool_size, tuning.connection_timeout
        );

        Ok(RedisBackend { pool })
    }

    fn build_pool(conn_str: &str, pool_size: u32, timeout: Duration) -> Result<Pool> {
        let mut pool_config = deadpool_redis::PoolConfig::new(pool_size as usize);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);

        let mut cfg = PoolConfig::from_url(conn_str);
        cfg.pool = Some(pool_config);

        cfg.create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;

        match ttl.filter(|d| !d.is_zero()) {
            Some(duration) => {
                let millis = duration.as_millis().min(u64::MAX as u128) as u64;
                conn.pset_ex::<_, _, ()>(key, value, millis)
                    .await
                    .map_err(|e| {
                        Error::BackendError(format!("Redis PSETEX failed for key {}: {}", key, e))
                    })?;
                debug!("✓ Redis SET {} (TTL: {}ms)", key, millis);
            }
            None => {
                conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                    Error::BackendError(format!("Redis SET failed for key {}: {}", key, e))
                })?;
                debug!("✓ Redis SET {}", key);
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn mdelete(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;

        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL (bulk) failed: {}", e)))?;

        debug!("✓ Redis MDELETE {} keys", keys.len());
        Ok(())
    }

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.sadd::<_, _, ()>(set_key, member).await.map_err(|e| {
            Error::BackendError(format!("Redis SADD failed for key {}: {}", set_key, e))
        })?;

        debug!("✓ Redis SADD {} {}", set_key, member);
        Ok(())
    }

    async fn members_of(&self, set_key: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;

        let members: Vec<String> = conn.smembers(set_key).await.map_err(|e| {
            Error::BackendError(format!("Redis SMEMBERS failed for key {}: {}", set_key, e))
        })?;

        debug!("✓ Redis SMEMBERS {} -> {} members", set_key, members.len());
        Ok(members)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(key).await.map_err(|e| {
            Error::BackendError(format!("Redis EXISTS failed for key {}: {}", key, e))
        })?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG")
    }

    async fn clear_all(&self) -> Result<()> {
        let mut conn = self.connection().await?;

        deadpool_redis::redis::cmd("FLUSHDB")
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis FLUSHDB failed: {}", e)))?;

        warn!("⚠ Redis FLUSHDB executed - all cache cleared!");
        Ok(())
    }
}
