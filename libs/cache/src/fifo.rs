//! Cache which keeps the last `max_size` items by insertion order
//!
//! Built on [`LruCache`] with reads going through `peek`, so lookups never
//! reorder entries and the "least recently used" end is always the oldest
//! insertion. Writing an existing key moves it to the newest position, the
//! same as deleting and reinserting it.

use crate::Cache;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Bounded cache evicting the oldest inserted entry once full.
#[derive(Debug)]
pub struct FifoCache<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
}

#[derive(Debug)]
struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    /// Zero disables storage; `LruCache` itself needs a non-zero capacity.
    max_size: usize,
}

impl<K, V> FifoCache<K, V>
where
    K: Hash + Eq,
{
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity(max_size)),
                max_size,
            }),
        }
    }

    /// Change the capacity. Shrinking evicts the oldest entries until the
    /// cache fits; growing only affects later inserts.
    pub fn set_max_size(&self, max_size: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.max_size = max_size;
        if max_size == 0 {
            inner.entries.clear();
        }
        inner.entries.resize(capacity(max_size));
    }

    /// Keys from oldest to newest insertion.
    #[cfg(test)]
    fn keys_oldest_first(&self) -> Vec<K>
    where
        K: Clone,
    {
        let inner = self.inner.lock().unwrap();
        inner.entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }
}

fn capacity(max_size: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN)
}

impl<K, V> Cache<K, V> for FifoCache<K, V>
where
    K: Eq + Hash + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        let inner = self.inner.lock().unwrap();
        inner.entries.peek(key).cloned()
    }

    fn set(&self, key: K, value: V) {
        let mut inner = self.inner.lock().unwrap();
        if inner.max_size == 0 {
            return;
        }
        // `put` refreshes an existing key, otherwise pops the oldest entry
        // when full. Both happen under the same lock.
        inner.entries.put(key, value);
    }

    fn contains(&self, key: &K) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.entries.contains(key)
    }

    fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.entries.len()
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn evicts_oldest_when_full() {
        let cache = FifoCache::new(3);
        for key in 1..=4 {
            cache.set(key, key * 10);
        }
        assert!(!cache.contains(&1));
        for key in 2..=4 {
            assert_eq!(cache.get(&key), Some(key * 10));
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn reads_do_not_reorder() {
        let cache = FifoCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        cache.set("c", 3);
        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn overwrite_keeps_size_and_refreshes_position() {
        let n = 4;
        let cache = FifoCache::new(n);
        for key in 0..n {
            cache.set(key, 0);
        }
        // key 1 sits second oldest; overwriting moves it to the back.
        cache.set(1, 100);
        assert_eq!(cache.len(), n);
        assert_eq!(cache.keys_oldest_first(), vec![0, 2, 3, 1]);

        // Three fresh keys push out 0, 2 and 3 but not the refreshed key.
        for key in 10..13 {
            cache.set(key, 0);
        }
        assert_eq!(cache.get(&1), Some(100));
        assert!(!cache.contains(&0));
        assert!(!cache.contains(&2));
        assert!(!cache.contains(&3));
        assert_eq!(cache.len(), n);
    }

    #[test]
    fn shrinking_evicts_oldest() {
        let cache = FifoCache::new(5);
        for key in 0..5 {
            cache.set(key, key);
        }
        cache.set_max_size(2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys_oldest_first(), vec![3, 4]);
    }

    #[test]
    fn growing_applies_to_later_inserts() {
        let cache = FifoCache::new(1);
        cache.set(1, 1);
        cache.set_max_size(3);
        assert_eq!(cache.len(), 1);
        cache.set(2, 2);
        cache.set(3, 3);
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&1));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = FifoCache::new(0);
        cache.set(1, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);

        let cache = FifoCache::new(2);
        cache.set(1, 1);
        cache.set_max_size(0);
        assert!(cache.is_empty());
        cache.set(2, 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_writers_respect_capacity() {
        let cache = Arc::new(FifoCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.set(t * 1000 + i, i);
                        let _ = cache.get(&(t * 1000 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
