//! Cache which keeps everything

use crate::Cache;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

/// Unbounded cache. `set` always succeeds and nothing is ever evicted.
#[derive(Debug)]
pub struct CompleteCache<K, V> {
    lookup: Mutex<HashMap<K, V>>,
}

impl<K, V> CompleteCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            lookup: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for CompleteCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V> for CompleteCache<K, V>
where
    K: Eq + Hash + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        let lookup = self.lookup.lock().unwrap();
        lookup.get(key).cloned()
    }

    fn set(&self, key: K, value: V) {
        let mut lookup = self.lookup.lock().unwrap();
        lookup.insert(key, value);
    }

    fn contains(&self, key: &K) -> bool {
        let lookup = self.lookup.lock().unwrap();
        lookup.contains_key(key)
    }

    fn len(&self) -> usize {
        let lookup = self.lookup.lock().unwrap();
        lookup.len()
    }

    fn clear(&self) {
        let mut lookup = self.lookup.lock().unwrap();
        lookup.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_returns_none() {
        let cache: CompleteCache<String, u32> = CompleteCache::new();
        assert_eq!(cache.get(&"missing".to_string()), None);
        assert!(!cache.contains(&"missing".to_string()));
        assert!(cache.is_empty());
    }

    #[test]
    fn keeps_every_entry() {
        let cache = CompleteCache::new();
        for i in 0..1000u32 {
            cache.set(i, i * 2);
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.get(&0), Some(0));
        assert_eq!(cache.get(&999), Some(1998));
    }

    #[test]
    fn overwrite_replaces_value() {
        let cache = CompleteCache::new();
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn clear_empties_cache() {
        let cache = CompleteCache::new();
        cache.set(1, "a");
        cache.set(2, "b");
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(&1));
    }
}
