//! Result caches for the query layer
//!
//! Two stores share the [`Cache`] contract:
//! - [`CompleteCache`]: keeps everything until cleared
//! - [`FifoCache`]: keeps the most recently inserted `max_size` entries
//!
//! Both are safe to share between request workers; every operation takes
//! `&self` and locks an internal mutex for its duration.

pub mod complete;
pub mod fifo;

pub use complete::CompleteCache;
pub use fifo::FifoCache;

/// Key/value store contract shared by the cache implementations.
///
/// `get` hands back a clone of the stored value, so values are usually
/// cheap handles such as `Arc<T>`.
pub trait Cache<K, V>: Send + Sync {
    /// Look up a value; `None` when the key is absent.
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or overwrite a value.
    fn set(&self, key: K, value: V);

    fn contains(&self, key: &K) -> bool;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn clear(&self);
}
