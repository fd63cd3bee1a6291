//! Run-scoped memoization shared between worker threads.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock};

/// A concurrent get-or-compute map.
///
/// Each key owns a [`OnceLock`]: the first caller for a key runs the producer while
/// later callers for the same key block on that cell, so a producer runs at most
/// once per key. Distinct keys never wait on each other.
pub struct MemoCache<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceLock<V>>>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `producer` on first use.
    pub fn get_or_compute<F>(&self, key: &K, producer: F) -> V
    where
        F: FnOnce() -> V,
    {
        let cell = {
            // A poisoned map only means a producer panicked; the map itself is intact.
            let mut cells = self
                .cells
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(cells.entry(key.clone()).or_default())
        };
        cell.get_or_init(producer).clone()
    }

    /// The cached value for `key`, if it has been computed.
    pub fn get(&self, key: &K) -> Option<V> {
        let cells = self
            .cells
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys that have been requested.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_producer_runs_once_per_key() {
        let cache: MemoCache<String, usize> = MemoCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_compute(&"a".to_string(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            42
        });
        let second = cache.get_or_compute(&"a".to_string(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            7
        });

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(42));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn test_concurrent_callers_share_one_computation() {
        let cache: MemoCache<u32, u32> = MemoCache::new();
        let calls = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    let value = cache.get_or_compute(&1, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        99
                    });
                    assert_eq!(value, 99);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
