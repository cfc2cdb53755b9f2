//! In-memory TTL cache for provider responses.
//!
//! Entries expire `ttl` after they were stored. Expired entries are treated as
//! absent and evicted by the lookup that finds them; there is no background
//! sweep. The map is bounded by `max_entries`: inserting a new key into a full
//! cache purges expired entries first and then drops the least recently used.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock, Reference};
use tokio::sync::Mutex;

use crate::config::CacheConfig;

#[derive(Debug, Clone)]
struct CacheEntry<V, I> {
    value: V,
    stored_at: I,
    touched: u64,
}

#[derive(Debug)]
struct CacheInner<V, I> {
    map: HashMap<String, CacheEntry<V, I>>,
    ttl: Duration,
    max_entries: usize,
    tick: u64,
}

impl<V: Clone, I: Reference> CacheInner<V, I> {
    fn new(config: &CacheConfig) -> Self {
        Self {
            map: HashMap::new(),
            ttl: config.ttl,
            max_entries: config.max_entries.max(1),
            tick: 0,
        }
    }

    fn is_fresh(&self, stored_at: I, now: I) -> bool {
        Duration::from(now.duration_since(stored_at)) <= self.ttl
    }

    fn next_tick(&mut self) -> u64 {
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    fn get(&mut self, key: &str, now: I) -> Option<V> {
        let stored_at = self.map.get(key)?.stored_at;
        if !self.is_fresh(stored_at, now) {
            self.map.remove(key);
            return None;
        }

        let tick = self.next_tick();
        let entry = self.map.get_mut(key)?;
        entry.touched = tick;
        Some(entry.value.clone())
    }

    fn put(&mut self, key: String, value: V, now: I) -> Option<String> {
        let mut evicted = None;
        if !self.map.contains_key(&key) && self.map.len() >= self.max_entries {
            self.purge_expired(now);
            if self.map.len() >= self.max_entries {
                evicted = self.evict_least_recent();
            }
        }

        let touched = self.next_tick();
        self.map.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                touched,
            },
        );
        evicted
    }

    fn evict_least_recent(&mut self) -> Option<String> {
        let victim = self
            .map
            .iter()
            .min_by_key(|(_, entry)| entry.touched)
            .map(|(key, _)| key.clone())?;
        self.map.remove(&victim);
        Some(victim)
    }

    fn purge_expired(&mut self, now: I) -> usize {
        let before = self.map.len();
        let ttl = self.ttl;
        self.map
            .retain(|_, entry| Duration::from(now.duration_since(entry.stored_at)) <= ttl);
        before - self.map.len()
    }
}

/// Shared, bounded, TTL-expiring cache keyed by request key.
pub struct CacheStore<V, C: Clock = DefaultClock> {
    inner: Arc<Mutex<CacheInner<V, C::Instant>>>,
    clock: C,
}

impl<V, C: Clock> Clone for CacheStore<V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            clock: self.clock.clone(),
        }
    }
}

impl<V, C: Clock> Debug for CacheStore<V, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl<V: Clone> CacheStore<V, DefaultClock> {
    /// Create a cache driven by the wall clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, DefaultClock::default())
    }

    /// Create a cache with the default five-minute TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Create a disabled cache; every lookup misses.
    pub fn disabled() -> Self {
        Self::new(CacheConfig {
            ttl: Duration::ZERO,
            ..CacheConfig::default()
        })
    }
}

impl<V: Clone, C: Clock> CacheStore<V, C> {
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::new(&config))),
            clock,
        }
    }

    /// Returns the stored value if present and unexpired.
    ///
    /// An expired entry is removed as a side effect of the lookup.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.inner.lock().await;
        store.get(key, now)
    }

    /// Stores `value` under `key` stamped with the current time, replacing any
    /// prior entry. No-op when the cache is disabled.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let now = self.clock.now();
        let mut store = self.inner.lock().await;

        if store.ttl == Duration::ZERO {
            return;
        }

        if let Some(evicted) = store.put(key.into(), value, now) {
            tracing::debug!(key = %evicted, "cache full; evicted least recently used entry");
        }
    }

    /// Removes a single entry, returning whether it existed.
    pub async fn remove(&self, key: &str) -> bool {
        let mut store = self.inner.lock().await;
        store.map.remove(key).is_some()
    }

    /// Removes expired entries and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.inner.lock().await;
        store.purge_expired(now)
    }

    /// Removes all entries.
    pub async fn clear(&self) {
        let mut store = self.inner.lock().await;
        store.map.clear();
    }

    /// Number of entries held, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        let store = self.inner.lock().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor::clock::FakeRelativeClock;

    fn cache(ttl_ms: u64, max_entries: usize) -> (CacheStore<String, FakeRelativeClock>, FakeRelativeClock) {
        let clock = FakeRelativeClock::default();
        let config = CacheConfig {
            ttl: Duration::from_millis(ttl_ms),
            max_entries,
        };
        (CacheStore::with_clock(config, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let (cache, _) = cache(1_000, 16);

        assert!(cache.get("key1").await.is_none());

        cache.set("key1", "value1".to_string()).await;
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        cache.set("key1", "value2".to_string()).await;
        assert_eq!(cache.get("key1").await, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expiry_is_inclusive_of_ttl() {
        let (cache, clock) = cache(100, 16);

        cache.set("key1", "value1".to_string()).await;
        clock.advance(Duration::from_millis(100));
        assert!(cache.get("key1").await.is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_lookup_evicts_entry() {
        let (cache, clock) = cache(100, 16);

        cache.set("key1", "value1".to_string()).await;
        cache.set("key2", "value2".to_string()).await;
        clock.advance(Duration::from_millis(150));

        assert!(cache.get("key1").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_overwrite_restarts_ttl() {
        let (cache, clock) = cache(100, 16);

        cache.set("key1", "value1".to_string()).await;
        clock.advance(Duration::from_millis(80));
        cache.set("key1", "value2".to_string()).await;
        clock.advance(Duration::from_millis(80));

        assert_eq!(cache.get("key1").await, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_full_cache_evicts_least_recently_used() {
        let (cache, _) = cache(60_000, 2);

        cache.set("a", "1".to_string()).await;
        cache.set("b", "2".to_string()).await;
        assert!(cache.get("a").await.is_some());

        cache.set("c", "3".to_string()).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("a").await.is_some());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_full_cache_prefers_purging_expired_entries() {
        let (cache, clock) = cache(100, 2);

        cache.set("old", "1".to_string()).await;
        clock.advance(Duration::from_millis(90));
        cache.set("young", "2".to_string()).await;
        assert!(cache.get("old").await.is_some());
        clock.advance(Duration::from_millis(20));

        cache.set("new", "3".to_string()).await;

        assert!(cache.get("young").await.is_some());
        assert!(cache.get("new").await.is_some());
    }

    #[tokio::test]
    async fn test_cache_purge_expired() {
        let (cache, clock) = cache(100, 16);

        cache.set("key1", "value1".to_string()).await;
        cache.set("key2", "value2".to_string()).await;
        assert_eq!(cache.len().await, 2);

        clock.advance(Duration::from_millis(150));
        assert_eq!(cache.purge_expired().await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_clear_all() {
        let (cache, _) = cache(60_000, 16);

        cache.set("key1", "value1".to_string()).await;
        cache.set("key2", "value2".to_string()).await;
        cache.clear().await;

        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let cache: CacheStore<String> = CacheStore::disabled();

        cache.set("key1", "value1".to_string()).await;
        assert!(cache.get("key1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }
}
