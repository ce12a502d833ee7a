//! In-process token store.
//!
//! Entries expire lazily: an expired entry is treated as absent and removed
//! the next time its key is touched.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tracing::{debug, instrument};

use crate::store::{CacheError, TokenStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Token store backed by a sharded concurrent map.
///
/// Compare-and-swap holds the shard write lock for the key while it
/// compares and replaces, so it is atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: DashMap<String, Entry>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    #[instrument(skip(self, value), fields(store.operation = "SETEX"))]
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), Entry::new(value, ttl));
        debug!(store.key = %key, store.ttl_secs = %ttl.as_secs(), "Token stored");
        Ok(())
    }

    #[instrument(skip(self), fields(store.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self
            .entries
            .get(key)
            .filter(|e| e.is_live())
            .map(|e| e.value.clone());

        if value.is_none() {
            self.entries.remove_if(key, |_, e| !e.is_live());
        }

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
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let current = occupied.get();
                if current.is_live() && current.value == expected {
                    occupied.insert(Entry::new(new_value, ttl));
                    debug!(store.key = %key, "Token swapped");
                    Ok(true)
                } else {
                    if !current.is_live() {
                        occupied.remove();
                    }
                    Ok(false)
                }
            }
            MapEntry::Vacant(_) => Ok(false),
        }
    }

    #[instrument(skip(self), fields(store.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        debug!(store.key = %key, "Token deleted");
        Ok(())
    }
}
