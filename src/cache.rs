//! In-memory caching for API responses.
//!
//! This module provides a simple process-local cache with TTL (time-to-live)
//! support. It's used to cache NVD lookups, EPSS score batches, and the KEV
//! catalog so repeated queries don't burn through the upstream rate limits.
//!
//! Entries expire lazily: a stale entry is removed on the first `get` after
//! its TTL has elapsed. There is no background sweep and no capacity bound.
//!
//! # Example
//!
//! ```no_run
//! use cveintel::Cache;
//!
//! let cache = Cache::new();
//!
//! // Store a value
//! cache.set("my_key", &"cached value".to_string()).unwrap();
//!
//! // Retrieve it later (within TTL)
//! let value: Option<String> = cache.get("my_key");
//! assert_eq!(value, Some("cached value".to_string()));
//! ```

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Default cache TTL in hours.
const CACHE_TTL_HOURS: u64 = 24;

struct Entry {
    payload: serde_json::Value,
    inserted_at: Instant,
}

/// A process-local key/value cache with TTL support.
///
/// Values are stored as JSON so callers of different types can share one
/// cache instance. Timestamps use `tokio::time::Instant` so tests can run
/// under paused time and advance the clock past the TTL.
pub struct Cache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Cache {
    /// Creates a new cache with the default 24-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl_hours(CACHE_TTL_HOURS)
    }

    /// Creates a new cache with a custom TTL.
    ///
    /// # Example
    ///
    /// ```
    /// use cveintel::Cache;
    ///
    /// // Cache that expires after 1 hour
    /// let cache = Cache::with_ttl_hours(1);
    /// ```
    pub fn with_ttl_hours(hours: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(hours * 3600),
        }
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, has expired, or the cached
    /// payload doesn't deserialize into `T`. Expired entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();

        let expired = match entries.get(key) {
            Some(entry) => Instant::now().duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };

        if expired {
            entries.remove(key);
            return None;
        }

        let entry = entries.get(key)?;
        serde_json::from_value(entry.payload.clone()).ok()
    }

    /// Stores a value in the cache, overwriting any previous entry and
    /// resetting its insertion time.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized to JSON.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_value(value)?;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                payload,
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of entries, counting stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
