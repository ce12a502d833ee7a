//! # Gatekeeper Cache
//!
//! Server-side storage for refresh tokens.
//!
//! This crate provides:
//! - The [`TokenStore`] contract (`put`, `get`, `compare_and_swap`, `delete`)
//! - A Redis backend using an atomic Lua compare-and-swap
//! - An in-memory backend for tests and single-node development
//! - Key builders for refresh records and access-token lookups
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_cache::{CacheConfig, connect};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CacheConfig::from_env();
//!     let store = connect(&config).await.unwrap();
//!
//!     store.put("key", "value", Duration::from_secs(60)).await.unwrap();
//!     let swapped = store.compare_and_swap("key", "value", "next", Duration::from_secs(60)).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use tracing::info;

pub mod config;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::{CacheConfig, StoreBackend};
pub use keys::TokenKeys;
pub use memory::MemoryTokenStore;
pub use redis_store::RedisTokenStore;
pub use store::{CacheError, TokenStore};

/// Builds the token store selected by `config.backend`.
///
/// # Errors
///
/// Returns `CacheError::Connection` if the Redis backend cannot connect.
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn TokenStore>, CacheError> {
    match config.backend {
        StoreBackend::Redis => {
            let store = RedisTokenStore::new(&config.redis_url).await?;
            info!(store.backend = "redis", "Token store connected");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!(store.backend = "memory", "Using in-memory token store");
            Ok(Arc::new(MemoryTokenStore::new()))
        }
    }
}
