//! Read-through TTL cache
//!
//! Entries expire after a fixed TTL. Expired entries are dropped lazily on
//! read and in bulk by [`TtlCache::purge_expired`]. Writers invalidate the
//! keys they touch, so a stale read is bounded by the TTL only when the
//! store is changed by something other than this process.
//!
//! Each key carries a generation bumped by [`TtlCache::invalidate`]. A reader
//! captures it before going to the store and fills the cache with
//! [`TtlCache::set_json_if_current`], which drops the write if a writer
//! invalidated the key in between.

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Shared cache handle, cheap to clone
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    generations: Arc<DashMap<String, u64>>,
    ttl: Duration,
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            generations: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Cached value for `key`, if present, fresh and decodable as `T`
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let entry = self.entries.get(key)?;
            if entry.expires_at > Instant::now() {
                Some(entry.value.clone())
            } else {
                None
            }
        };

        match value {
            Some(value) => serde_json::from_value(value).ok(),
            None => {
                self.entries
                    .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let key = key.into();
        if let Some(value) = self.encode(&key, value) {
            self.entries.insert(key, self.entry(value));
        }
    }

    /// Current generation of `key`, captured before reading the store
    pub fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).map(|g| *g).unwrap_or(0)
    }

    /// Fill `key` unless it was invalidated after `generation` was captured
    ///
    /// Returns whether the value was stored.
    pub fn set_json_if_current<T: Serialize>(
        &self,
        key: impl Into<String>,
        generation: u64,
        value: &T,
    ) -> bool {
        let key = key.into();
        let Some(value) = self.encode(&key, value) else {
            return false;
        };

        // Holding the generation shard blocks a concurrent invalidate until
        // the entry is in place, so it is removed right after
        let current = self.generations.entry(key.clone()).or_insert(0);
        if *current != generation {
            tracing::debug!(key = %key, "Skipping stale cache fill");
            return false;
        }
        self.entries.insert(key, self.entry(value));
        true
    }

    pub fn invalidate(&self, key: &str) {
        *self.generations.entry(key.to_string()).or_insert(0) += 1;
        self.entries.remove(key);
    }

    fn encode<T: Serialize>(&self, key: &str, value: &T) -> Option<serde_json::Value> {
        serde_json::to_value(value)
            .map_err(|e| tracing::warn!(key = %key, error = %e, "Skipping cache write"))
            .ok()
    }

    fn entry(&self, value: serde_json::Value) -> CacheEntry {
        CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Purge expired entries every `every` until `shutdown` fires
    pub fn spawn_purger(&self, every: Duration, shutdown: CancellationToken) {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Cache purger stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            tracing::debug!(removed, "Purged expired cache entries");
                        }
                    }
                }
            }
        });
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
