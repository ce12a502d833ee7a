//! Token store configuration.

use std::env;

/// Which [`TokenStore`](crate::TokenStore) implementation to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Some(Self::Redis),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Token store configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_PREFIX`: Prefix for all keys (default: `gatekeeper`)
/// - `TOKEN_STORE`: `redis` or `memory` (default: `redis`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub redis_url: String,
    pub key_prefix: String,
    pub backend: StoreBackend,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            key_prefix: env::var("CACHE_PREFIX").unwrap_or_else(|_| "gatekeeper".into()),
            backend: env::var("TOKEN_STORE")
                .ok()
                .and_then(|v| StoreBackend::parse(&v))
                .unwrap_or_default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            key_prefix: "gatekeeper".into(),
            backend: StoreBackend::Redis,
        }
    }
}
