//! In-memory key/value cache with per-entry time-to-live.
//!
//! Entries expire lazily: nothing sweeps the map, an expired entry is dropped
//! the next time it is read. There is no capacity bound.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// TTL cache meant to be shared behind an `Arc`
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the value for `key` unless it is missing or expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Re-check under the write lock, another writer may have refreshed it
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
            debug!("Cache entry expired: {}", key);
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Utc::now() + ttl;
        self.entries
            .write()
            .insert(key.into(), Entry { value, expires_at });
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop every entry whose key starts with `prefix`
    pub fn invalidate_pattern(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        debug!("Invalidated {} cache entries under '{}'", removed, prefix);
        removed
    }

    /// Number of stored entries, expired ones included until they are read
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_value_within_ttl() {
        let cache = TtlCache::new();
        cache.set("listings:{}:page:0", vec![1, 2, 3], Duration::minutes(5));

        assert_eq!(cache.get("listings:{}:page:0"), Some(vec![1, 2, 3]));
        assert!(cache.has("listings:{}:page:0"));
        assert_eq!(cache.get("listings:{}:page:1"), None);
    }

    #[tokio::test]
    async fn entry_misses_after_ttl_elapses() {
        let cache = TtlCache::new();
        cache.set("k", "v".to_string(), Duration::milliseconds(20));
        assert!(cache.has("k"));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(cache.get("k"), None);
        assert!(!cache.has("k"));
        assert!(cache.is_empty());
    }

    #[test]
    fn set_overwrites_existing_value() {
        let cache = TtlCache::new();
        cache.set("k", 1, Duration::minutes(1));
        cache.set("k", 2, Duration::minutes(1));
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_pattern_only_touches_prefix() {
        let cache = TtlCache::new();
        cache.set("listings:abidjan:page:0", 0, Duration::minutes(5));
        cache.set("listings:abidjan:page:1", 1, Duration::minutes(5));
        cache.set("listings:bouake:page:0", 2, Duration::minutes(5));

        let removed = cache.invalidate_pattern("listings:abidjan");

        assert_eq!(removed, 2);
        assert!(!cache.has("listings:abidjan:page:0"));
        assert_eq!(cache.get("listings:bouake:page:0"), Some(2));
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::minutes(5));
        cache.set("b", 2, Duration::minutes(5));
        cache.clear();
        assert!(cache.is_empty());
    }
}
