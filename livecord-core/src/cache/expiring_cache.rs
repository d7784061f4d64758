// File: src/cache/expiring_cache.rs

use std::hash::Hash;
use std::time::Duration;
use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Key/value map whose entries stop being visible once their TTL elapses.
///
/// Reads past the deadline miss but leave the entry in place; [`ExpiringCache::sweep`]
/// (driven by the cache maintenance task) is what actually frees memory.
pub struct ExpiringCache<K, V> {
    name: String,
    entries: DashMap<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(name: &str, default_ttl: Duration) -> Self {
        Self {
            name: name.to_string(),
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Anything the cache maintenance task can sweep.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &str;
    fn sweep(&self) -> usize;
}

impl<K, V> Sweep for ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        ExpiringCache::name(self)
    }

    fn sweep(&self) -> usize {
        ExpiringCache::sweep(self)
    }
}
