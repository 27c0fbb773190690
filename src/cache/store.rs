//! Cache store contract and backends.
//!
//! The engine treats caching as strictly best-effort: every error from these
//! stores is logged by the caller and treated as a cache miss, never surfaced
//! to the search caller.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors from a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend unreachable or command failed
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Payload could not be encoded or decoded
    #[error("Cache encoding error: {0}")]
    Encoding(String),
}

/// Key/value store with TTL and prefix-scoped bulk deletion
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value; `None` on miss or expiry
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value with a time-to-live
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Delete one key
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Delete every key starting with `prefix`; returns the number removed
    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64>;
}

struct StoredValue {
    data: Vec<u8>,
    expires_at: Instant,
}

/// In-memory cache store (for MVP and testing)
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.data.clone()));
            }
        }
        // Expired entries are reaped lazily on access
        self.entries
            .remove_if(key, |_, v| v.expires_at <= Instant::now());
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            StoredValue {
                data: value.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();

        let mut removed = 0;
        for key in matching {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Redis-backed cache store
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect and verify the connection with a PING
    pub async fn new(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Backend(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut test_conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis connection test failed: {}", e)))?;

        tracing::info!("Initialized Redis cache store");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        conn.get(key)
            .await
            .map_err(|e| CacheError::Backend(format!("GET {} failed: {}", key, e)))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1) as u64;
        conn.set_ex(key, value, seconds)
            .await
            .map_err(|e| CacheError::Backend(format!("SETEX {} failed: {}", key, e)))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        conn.del(key)
            .await
            .map_err(|e| CacheError::Backend(format!("DEL {} failed: {}", key, e)))
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Backend(format!("SCAN {} failed: {}", pattern, e)))?;

            if !keys.is_empty() {
                let count: u64 = conn
                    .del(keys)
                    .await
                    .map_err(|e| CacheError::Backend(format!("DEL batch failed: {}", e)))?;
                removed += count;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(removed)
    }
}
