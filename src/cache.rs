use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Bounded TTL cache: `key → (value, expiry)` with oldest-entry eviction.
///
/// Lookups never return expired entries — an entry past its TTL is removed on
/// access, so callers observe it as absent. When an insert pushes the map past
/// `capacity`, the entry expiring soonest is evicted first.
///
/// The cache itself is not synchronized; callers that share one across tasks
/// wrap it in a `Mutex`, which keeps the eviction policy swappable without
/// touching call sites.
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some((expires_at, value)) if Instant::now() < *expires_at => Some(value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.insert(key, (expires_at, value));
        if self.entries.len() > self.capacity {
            self.evict_oldest();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (expires_at, _))| *expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
