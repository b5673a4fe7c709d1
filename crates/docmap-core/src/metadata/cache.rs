use arc_swap::ArcSwap;
use std::{borrow::Borrow, collections::HashMap, hash::Hash, sync::Arc};

///
/// SnapshotCache
///
/// Read-mostly map published as an immutable snapshot.
///
/// Readers load the current snapshot without blocking. A miss computes the
/// entry outside any lock and publishes `old + new` through an atomic
/// read-copy-update, so a published map is never mutated in place.
/// Concurrent first accesses may compute the same entry twice; the first
/// published value wins and is returned to every caller.
///

pub struct SnapshotCache<K, V> {
    snapshot: ArcSwap<HashMap<K, V>>,
}

impl<K, V> SnapshotCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.snapshot.load().get(key).cloned()
    }

    /// Cached value for `key`, computing and publishing it on a miss.
    /// Errors are returned to the caller and never cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }

        let value = compute()?;
        self.snapshot.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.entry(key.clone()).or_insert_with(|| value.clone());
            next
        });

        Ok(self.get(&key).unwrap_or(value))
    }

    /// Publish `value` for `key`, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        self.snapshot.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), value.clone());
            next
        });
    }

    /// Publish a snapshot without the entries rejected by `keep`.
    pub fn retain(&self, keep: impl Fn(&K, &V) -> bool) {
        self.snapshot.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.retain(|k, v| keep(k, v));
            next
        });
    }

    /// The current snapshot; stays valid while held.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<K, V>> {
        self.snapshot.load_full()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for SnapshotCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    #[test]
    fn miss_computes_once_then_hits() {
        let cache = SnapshotCache::<&'static str, u32>::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with("k", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(7)
                })
                .unwrap();
            assert_eq!(v, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SnapshotCache::<&'static str, u32>::new();

        assert!(cache.get_or_try_insert_with("k", || Err("boom")).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_try_insert_with("k", || Ok::<_, ()>(1)), Ok(1));
    }

    #[test]
    fn held_snapshot_is_never_mutated() {
        let cache = SnapshotCache::<u32, u32>::new();
        cache.insert(1, 1);
        let before = cache.snapshot();

        cache.insert(2, 2);

        assert_eq!(before.len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_first_access_publishes_one_value() {
        let cache = Arc::new(SnapshotCache::<u32, usize>::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    (0..64u32)
                        .map(|k| cache.get_or_try_insert_with(k, || Ok::<_, ()>(i)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let seen: Vec<Vec<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 64);
        for k in 0..64usize {
            let published = cache.get(&(k as u32)).unwrap();
            assert!(seen.iter().all(|row| row[k] == published));
        }
    }
}
