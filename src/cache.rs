//! Field configuration cache.
//!
//! The field type stores its configuration here under a content-derived key
//! so that the upload controller, which only receives the key in a query
//! string, can read the configuration back on a later request.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;

/// Prefix of every field configuration cache key.
pub const CACHE_PREFIX: &str = "files-field_type::";

/// Default lifetime of a cached field configuration.
pub const CONFIG_TTL_SECS: u64 = 30;

/// Build the full cache key for a config key.
pub fn cache_key(key: &str) -> String {
    format!("{CACHE_PREFIX}{key}")
}

/// Key-value cache with per-entry expiry.
pub trait ConfigCache: Send + Sync {
    /// Store a value, replacing any previous value and resetting its expiry.
    fn put(&self, key: &str, value: JsonValue, ttl_secs: u64);

    /// Get a value if present and not expired.
    fn get(&self, key: &str) -> Option<JsonValue>;

    /// Remove a value.
    fn forget(&self, key: &str) -> bool;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: JsonValue,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process [`ConfigCache`] implementation.
#[derive(Debug, Default)]
pub struct MemoryConfigCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryConfigCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| !entry.is_expired(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }
}

impl ConfigCache for MemoryConfigCache {
    fn put(&self, key: &str, value: JsonValue, ttl_secs: u64) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: now + Duration::from_secs(ttl_secs),
        };

        match self.entries.write() {
            Ok(mut entries) => {
                entries.retain(|_, e| !e.is_expired(now));
                entries.insert(key.to_string(), entry);
            }
            Err(e) => tracing::error!(key, "Config cache lock poisoned: {}", e),
        }
    }

    fn get(&self, key: &str) -> Option<JsonValue> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;

        if entry.is_expired(Instant::now()) {
            tracing::debug!(key, "Config cache entry expired");
            return None;
        }

        Some(entry.value.clone())
    }

    fn forget(&self, key: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }
}
