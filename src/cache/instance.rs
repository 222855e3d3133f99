//! InstanceCache builds one value per key, at most once.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A per-key build gate. Waiters block until the owning build finishes.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }

    fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }
}

/// InstanceCache memoizes one shared value per key.
///
/// Hits read the value map without taking any gate. On a miss the first
/// caller registers a gate and builds; concurrent callers for the same key
/// wait on the gate and then re-check. A failed or panicking build publishes
/// nothing, so a waiter goes on to build itself. Distinct keys never wait on
/// each other.
pub struct InstanceCache<K, V> {
    values: DashMap<K, Arc<V>>,
    gates: DashMap<K, Arc<Gate>>,
}

impl<K, V> Default for InstanceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        InstanceCache {
            values: DashMap::new(),
            gates: DashMap::new(),
        }
    }
}

impl<K, V> fmt::Debug for InstanceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCache")
            .field("values", &self.values.len())
            .field("building", &self.gates.len())
            .finish()
    }
}

/// Owns the gate of one key while building; releases it on every exit path.
struct Ownership<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    cache: &'a InstanceCache<K, V>,
    key: K,
    gate: Arc<Gate>,
}

impl<K, V> Drop for Ownership<'_, K, V>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        self.cache
            .gates
            .remove_if(&self.key, |_, gate| Arc::ptr_eq(gate, &self.gate));
        self.gate.open();
    }
}

impl<K, V> InstanceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        InstanceCache::default()
    }

    /// Returns the cached value for `key`, if one has been built.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.values.get(key).map(|v| Arc::clone(v.value()))
    }

    /// Returns the cached value for `key`, building it with `build` on a miss.
    ///
    /// `build` runs at most once per call, and only on the caller that owns
    /// the key's gate. Errors are returned to that caller and leave the key
    /// unbuilt.
    pub fn get_or_try_build<E, F>(&self, key: K, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let ownership = loop {
            if let Some(value) = self.get(&key) {
                log::trace!("cache hit for {:?}", key);
                return Ok(value);
            }
            let waiting = match self.gates.entry(key.clone()) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    let gate = Arc::new(Gate::default());
                    entry.insert(Arc::clone(&gate));
                    break Ownership {
                        cache: self,
                        key: key.clone(),
                        gate,
                    };
                }
            };
            log::trace!("waiting for concurrent build of {:?}", key);
            waiting.wait();
        };

        // A build may have been published between the miss and taking the gate.
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = Arc::new(build()?);
        self.values.insert(key, Arc::clone(&value));
        drop(ownership);
        Ok(value)
    }

    /// Returns the value for `key`, building it with an infallible `build`.
    pub fn get_or_build<F>(&self, key: K, build: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_build::<std::convert::Infallible, _>(key, || Ok(build())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
