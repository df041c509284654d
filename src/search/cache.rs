/// Short-lived search result cache
///
/// Entries are keyed by the raw query string, expire after a TTL (checked on
/// read) and are evicted oldest-inserted-first once capacity is exceeded.
/// Overwriting an existing key keeps its original insertion position.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::research::AiSummary;
use crate::record::Publication;

/// Counters reported with every search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub result_count: usize,
    pub local_count: usize,
    pub external_count: usize,
    pub search_time_ms: u64,
    pub has_ai: bool,
    pub has_external: bool,
    #[serde(default)]
    pub cached: bool,
}

/// What a completed search leaves behind for identical follow-up queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSearch {
    pub results: Vec<Publication>,
    pub ai_summary: Option<AiSummary>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: CachedSearch,
    timestamp: DateTime<Utc>,
}

/// Bounded TTL cache owned by one search session.
#[derive(Debug)]
pub struct SearchCache {
    entries: IndexMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl SearchCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        SearchCache {
            entries: IndexMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn get(&mut self, query: &str) -> Option<CachedSearch> {
        self.get_at(query, Utc::now())
    }

    /// Look up `query` as of `now`, dropping the entry if it has expired.
    pub fn get_at(&mut self, query: &str, now: DateTime<Utc>) -> Option<CachedSearch> {
        let entry = self.entries.get(query)?;
        let age = now.signed_duration_since(entry.timestamp);
        let expired = age
            .to_std()
            .map(|age| age > self.ttl)
            .unwrap_or(false);
        if expired {
            self.entries.shift_remove(query);
            return None;
        }
        Some(entry.data.clone())
    }

    pub fn set(&mut self, query: &str, data: CachedSearch) {
        self.set_at(query, data, Utc::now());
    }

    pub fn set_at(&mut self, query: &str, data: CachedSearch, now: DateTime<Utc>) {
        self.entries.insert(
            query.to_string(),
            CacheEntry {
                data,
                timestamp: now,
            },
        );
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: usize) -> CachedSearch {
        CachedSearch {
            results: Vec::new(),
            ai_summary: None,
            stats: SearchStats { result_count: n, ..Default::default() },
        }
    }

    #[test]
    fn test_round_trip_within_ttl() {
        let mut cache = SearchCache::new(Duration::from_secs(300), 50);
        let t0 = Utc::now();
        cache.set_at("bone", data(3), t0);
        let hit = cache.get_at("bone", t0 + chrono::Duration::seconds(299));
        assert_eq!(hit, Some(data(3)));
    }

    #[test]
    fn test_miss_after_ttl_removes_entry() {
        let mut cache = SearchCache::new(Duration::from_secs(300), 50);
        let t0 = Utc::now();
        cache.set_at("bone", data(3), t0);
        assert_eq!(cache.get_at("bone", t0 + chrono::Duration::seconds(301)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_is_raw_query() {
        let mut cache = SearchCache::new(Duration::from_secs(300), 50);
        cache.set("Bone", data(1));
        assert!(cache.get("bone").is_none());
        assert!(cache.get("Bone").is_some());
    }

    #[test]
    fn test_fifo_eviction_by_insertion_order() {
        let mut cache = SearchCache::new(Duration::from_secs(300), 2);
        let t0 = Utc::now();
        cache.set_at("a", data(1), t0);
        cache.set_at("b", data(2), t0);
        // overwrite keeps "a" as the oldest insertion
        cache.set_at("a", data(10), t0);
        cache.set_at("c", data(3), t0);

        assert_eq!(cache.len(), 2);
        assert!(cache.get_at("a", t0).is_none());
        assert_eq!(cache.get_at("b", t0), Some(data(2)));
        assert_eq!(cache.get_at("c", t0), Some(data(3)));
    }

    #[test]
    fn test_clear() {
        let mut cache = SearchCache::new(Duration::from_secs(300), 50);
        cache.set("a", data(1));
        cache.clear();
        assert!(cache.get("a").is_none());
    }
}
