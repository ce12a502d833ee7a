//! Redis-backed token store.
//!
//! Compare-and-swap runs as a Lua script so the read and the write happen
//! in one server-side step.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use tracing::{debug, instrument, warn};

use crate::store::{CacheError, TokenStore};

const COMPARE_AND_SWAP: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
else
    return 0
end
";

/// Redis token store with connection pooling.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
    cas_script: Arc<Script>,
}

impl std::fmt::Debug for RedisTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTokenStore").finish_non_exhaustive()
    }
}

/// Redis rejects `EX 0`, so sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl RedisTokenStore {
    /// Creates a new Redis token store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if connection fails.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            cas_script: Arc::new(Script::new(COMPARE_AND_SWAP)),
        })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    #[instrument(skip(self, value), fields(store.operation = "SETEX"))]
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)).await?;

        debug!(store.key = %key, store.ttl_secs = %ttl_secs(ttl), "Token stored");

        Ok(())
    }

    #[instrument(skip(self), fields(store.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(key).await?;
        debug!(store.key = %key, store.hit = value.is_some(), "Token lookup");

        Ok(value)
    }

    #[instrument(skip(self, expected, new_value), fields(store.operation = "CAS"))]
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new_value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();

        let swapped: i32 = self
            .cas_script
            .key(key)
            .arg(expected)
            .arg(new_value)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await?;

        if swapped == 1 {
            debug!(store.key = %key, "Token swapped");
        } else {
            warn!(store.key = %key, "Token swap rejected: stored value did not match");
        }

        Ok(swapped == 1)
    }

    #[instrument(skip(self), fields(store.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(key).await?;

        debug!(store.key = %key, "Token deleted");

        Ok(())
    }
}
