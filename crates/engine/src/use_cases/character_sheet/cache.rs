//! Bounded, expiring memo cache for derived sheets.
//!
//! Entries expire after a TTL and the cache never holds more than its
//! capacity: when full, expired entries are dropped first, then the oldest.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sheetforge_domain::DerivedStats;

pub struct SheetCache {
    entries: DashMap<String, CachedSheet>,
    ttl: Duration,
    capacity: usize,
}

struct CachedSheet {
    stats: DerivedStats,
    inserted_at: Instant,
}

impl SheetCache {
    /// A capacity of zero is treated as one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// The cached stats for `key`, unless missing or expired.
    pub fn get(&self, key: &str) -> Option<DerivedStats> {
        let fresh = self.entries.get(key).map(|entry| {
            (entry.inserted_at.elapsed() < self.ttl).then(|| entry.stats.clone())
        })?;
        if fresh.is_none() {
            self.entries
                .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        }
        fresh
    }

    pub fn insert(&self, key: String, stats: DerivedStats) {
        self.insert_at(key, stats, Instant::now());
    }

    fn insert_at(&self, key: String, stats: DerivedStats, inserted_at: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let expired = self.cleanup_expired();
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            tracing::debug!(expired, capacity = self.capacity, "Sheet cache full");
        }
        self.entries.insert(key, CachedSheet { stats, inserted_at });
    }

    /// Drop expired entries, returning how many went.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    /// Entries held, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetforge_domain::value_objects::{AbilityScores, CharacterName};
    use sheetforge_domain::{rules, Character, RuleTables};

    fn sample_stats() -> DerivedStats {
        let name = CharacterName::new("Lidda").expect("valid name");
        let character = Character::new(name, "halfling", "rogue", AbilityScores::uniform(10));
        rules::derive_stats(&character, &RuleTables::srd()).expect("valid")
    }

    fn ago(age: Duration) -> Instant {
        Instant::now().checked_sub(age).expect("clock far enough along")
    }

    #[test]
    fn insert_and_get() {
        let cache = SheetCache::new(Duration::from_secs(60), 4);
        cache.insert("a".to_string(), sample_stats());
        assert_eq!(cache.get("a"), Some(sample_stats()));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let ttl = Duration::from_secs(10);
        let cache = SheetCache::new(ttl, 4);
        cache.insert_at("old".to_string(), sample_stats(), ago(ttl * 2));

        assert_eq!(cache.get("old"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cleanup_removes_only_expired_entries() {
        let ttl = Duration::from_secs(10);
        let cache = SheetCache::new(ttl, 8);
        cache.insert_at("old1".to_string(), sample_stats(), ago(ttl * 2));
        cache.insert_at("old2".to_string(), sample_stats(), ago(ttl * 3));
        cache.insert("new".to_string(), sample_stats());

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("new").is_some());
    }

    #[test]
    fn full_cache_evicts_the_oldest_entry() {
        let cache = SheetCache::new(Duration::from_secs(600), 2);
        cache.insert_at("first".to_string(), sample_stats(), ago(Duration::from_secs(3)));
        cache.insert_at("second".to_string(), sample_stats(), ago(Duration::from_secs(2)));
        cache.insert("third".to_string(), sample_stats());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first"), None);
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn full_cache_prefers_dropping_expired_entries() {
        let ttl = Duration::from_secs(60);
        let cache = SheetCache::new(ttl, 2);
        cache.insert_at("oldest".to_string(), sample_stats(), ago(Duration::from_secs(30)));
        cache.insert_at("stale".to_string(), sample_stats(), ago(ttl * 2));
        cache.insert("fresh".to_string(), sample_stats());

        assert!(cache.get("oldest").is_some());
        assert!(cache.get("fresh").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replacing_a_key_does_not_evict() {
        let cache = SheetCache::new(Duration::from_secs(60), 1);
        cache.insert("a".to_string(), sample_stats());
        cache.insert("a".to_string(), sample_stats());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_some());
    }
}
