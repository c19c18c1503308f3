// In-process TTL cache for computed JSON payloads (dashboard stats etc.)
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CachedEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value when present and not expired.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let found = self
            .entries
            .read()
            .ok()
            .and_then(|entries| {
                entries
                    .get(key)
                    .filter(|entry| Instant::now() < entry.expires_at)
                    .map(|entry| entry.value.clone())
            });

        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("📦 Cache hit: {}", key);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.into(),
                CachedEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    /// Removes entries whose key contains `pattern`, or everything when `None`.
    /// Returns how many entries were dropped.
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };

        match pattern {
            Some(pattern) => {
                let before = entries.len();
                entries.retain(|key, _| !key.contains(pattern));
                before - entries.len()
            }
            None => {
                let removed = entries.len();
                entries.clear();
                removed
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage; 0 when the cache was never queried.
    pub fn hit_rate_percent(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = TtlCache::new();
        assert!(cache.get("dashboard_stats").is_none());

        cache.set("dashboard_stats", json!({"totalInvitees": 3}), Duration::from_secs(60));
        assert_eq!(cache.get("dashboard_stats"), Some(json!({"totalInvitees": 3})));

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hit_rate_percent(), 50.0);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = TtlCache::new();
        cache.set("k", json!(1), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_clear_by_pattern() {
        let cache = TtlCache::new();
        cache.set("dashboard_stats", json!(1), Duration::from_secs(60));
        cache.set("dashboard_food", json!(2), Duration::from_secs(60));
        cache.set("invitees_page_1", json!(3), Duration::from_secs(60));

        assert_eq!(cache.clear(Some("dashboard")), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(None), 1);
        assert_eq!(cache.len(), 0);
    }
}
