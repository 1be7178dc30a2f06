use std::hash::Hash;

use lru::LruCache;

/// Least-recently-used map with a soft capacity.
///
/// Inserts never fail; `expire` trims back down to capacity, skipping keys the
/// caller still needs for the current frame.
pub struct TileCache<K: Hash + Eq, V> {
    capacity: usize,
    entries: LruCache<K, V>,
}

impl<K: Eq + Hash + Clone, V> TileCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: LruCache::unbounded(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Look up and mark as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Look up without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.peek(key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.put(key, value)
    }

    /// Replace a value in place, keeping its recency. No-op for unknown keys.
    pub fn replace(&mut self, key: &K, value: V) -> bool {
        match self.entries.peek_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key)
    }

    /// Evict least recently used entries until within capacity. Keys for which
    /// `keep` returns true survive even if that leaves the cache over capacity.
    pub fn expire(&mut self, mut keep: impl FnMut(&K) -> bool) -> Vec<(K, V)> {
        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }
        let victims: Vec<K> = self
            .entries
            .iter()
            .rev()
            .map(|(key, _)| key)
            .filter(|key| !keep(*key))
            .take(excess)
            .cloned()
            .collect();
        victims
            .into_iter()
            .filter_map(|key| self.entries.pop_entry(&key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expire_drops_least_recently_used_first() {
        let mut cache = TileCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        let evicted = cache.expire(|_| false);
        assert_eq!(evicted, vec![("a", 1)]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = TileCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));
        cache.insert("c", 3);
        let evicted = cache.expire(|_| false);
        assert_eq!(evicted, vec![("b", 2)]);
        assert!(cache.contains_key(&"a"));
    }

    #[test]
    fn kept_keys_survive_expiry() {
        let mut cache = TileCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        let evicted = cache.expire(|k| *k == "a");
        assert_eq!(evicted, vec![("b", 2)]);
        assert!(cache.contains_key(&"a"));
        assert!(cache.contains_key(&"c"));
    }

    #[test]
    fn reinsert_replaces_value_and_recency() {
        let mut cache = TileCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.insert("a", 10), Some(1));
        cache.insert("c", 3);
        cache.expire(|_| false);
        assert_eq!(cache.peek(&"a"), Some(&10));
        assert_eq!(cache.peek(&"b"), None);
    }

    #[test]
    fn replace_keeps_position() {
        let mut cache = TileCache::new(1);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.replace(&"a", 5));
        assert!(!cache.replace(&"z", 5));
        let evicted = cache.expire(|_| false);
        assert_eq!(evicted, vec![("a", 5)]);
    }

    #[test]
    fn capacity_is_soft_until_expire() {
        let mut cache = TileCache::new(1);
        for i in 0..5u32 {
            cache.insert(i, i);
        }
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.capacity(), 1);
        let evicted: Vec<u32> = cache.expire(|_| false).into_iter().map(|(k, _)| k).collect();
        assert_eq!(evicted, vec![0, 1, 2, 3]);
        assert_eq!(cache.peek(&4), Some(&4));
    }

    #[test]
    fn remove_forgets_entry() {
        let mut cache = TileCache::new(4);
        cache.insert(1u32, "x");
        assert_eq!(cache.remove(&1), Some("x"));
        assert!(cache.is_empty());
        assert_eq!(cache.remove(&1), None);
    }
}
