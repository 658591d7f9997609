//! Lock-free copy-on-write cache.
//!
//! # Responsibilities
//! - Serve concurrent reads without blocking (single atomic load)
//! - Publish new entries by swapping in a fresh immutable map
//!
//! # Design Decisions
//! - Writes are rare (first use of a pattern or expression), reads are hot
//! - A racing writer retries through `ArcSwap::rcu`; if another writer already
//!   published the key, its value wins and is returned to every caller
//! - Entries are never removed; the whole cache is dropped with its owner

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// A process-wide map that is read lock-free and updated by compare-and-swap.
pub struct CopyOnWriteCache<K, V> {
    entries: ArcSwap<HashMap<K, V>>,
}

impl<K, V> CopyOnWriteCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Look up a cached value.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.load().get(key).cloned()
    }

    /// Return the cached value for `key`, building and publishing it on a miss.
    ///
    /// `build` may run more than once when threads race on the same key, but
    /// only one result is ever published and all callers observe that one.
    pub fn get_or_insert_with<Q, F>(&self, key: &Q, build: F) -> V
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ToOwned<Owned = K> + ?Sized,
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let candidate = build();
        let owned = key.to_owned();

        self.entries.rcu(|current| {
            if current.contains_key(key) {
                Arc::clone(current)
            } else {
                let mut next = HashMap::clone(current);
                next.insert(owned.clone(), candidate.clone());
                Arc::new(next)
            }
        });

        self.get(key).unwrap_or(candidate)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}

impl<K, V> Default for CopyOnWriteCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for CopyOnWriteCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyOnWriteCache")
            .field("len", &self.entries.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_insert_and_get() {
        let cache: CopyOnWriteCache<String, usize> = CopyOnWriteCache::new();
        assert!(cache.is_empty());

        let value = cache.get_or_insert_with("a", || 1);
        assert_eq!(value, 1);

        // Second call must not rebuild
        let value = cache.get_or_insert_with("a", || 2);
        assert_eq!(value, 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_first_use_publishes_once() {
        let cache: Arc<CopyOnWriteCache<String, Arc<usize>>> = Arc::new(CopyOnWriteCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                let builds = builds.clone();
                std::thread::spawn(move || {
                    cache.get_or_insert_with("key", || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Arc::new(i)
                    })
                })
            })
            .collect();

        let results: Vec<Arc<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every caller sees the single published value
        let first = &results[0];
        assert!(results.iter().all(|r| Arc::ptr_eq(r, first)));
        assert_eq!(cache.len(), 1);
        assert!(builds.load(Ordering::SeqCst) >= 1);
    }
}
