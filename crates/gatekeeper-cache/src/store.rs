use std::time::Duration;

use async_trait::async_trait;

/// Error type for token store operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] ::redis::RedisError),

    #[error("Token store unavailable: {0}")]
    Unavailable(String),
}

/// External key/value store holding refresh-token records.
///
/// Every operation must be safe to call concurrently. `compare_and_swap`
/// must be atomic at the store level: of two callers presenting the same
/// `expected` value, at most one observes `true`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Returns the live value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replaces the value under `key` with `new_value` only if it currently
    /// equals `expected`. Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new_value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
