/*!
 * Lock Striping Pattern
 * Concurrent map with per-key atomic compound updates
 *
 * Keys are hashed onto a fixed array of `RwLock<HashMap>` stripes. Every
 * operation locks exactly one stripe for its own duration, so operations
 * on keys in different stripes never wait for each other and compound
 * updates (`compute`, `merge`, `put_if_absent`) are atomic per key.
 *
 * User functions passed to compound updates run exactly once, under the
 * stripe's write lock. They must not block and must not call back into
 * the same map.
 */

use crate::core::errors::ConfigResult;
use crate::core::sync::config::MapConfig;
use ahash::RandomState;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

type Stripe<K, V> = RwLock<HashMap<K, V, RandomState>>;

/// Lock-striped concurrent hash map
///
/// # Performance
///
/// - **Contention reduction**: N-way striping reduces lock contention by ~N
/// - **Reads**: shared stripe lock, concurrent with other readers
/// - **Compound updates**: one exclusive stripe lock, no retry loop
///
/// # Example
///
/// ```
/// use sync_toolkit::ConcurrentMap;
///
/// let map = ConcurrentMap::new();
/// assert_eq!(map.put_if_absent("k", 1), 1);
/// assert_eq!(map.put_if_absent("k", 2), 1);
///
/// map.compute("hits", |v: Option<&u32>| Some(v.copied().unwrap_or(0) + 1));
/// map.merge("hits", 10, |old, new| Some(old + new));
/// assert_eq!(map.get("hits"), Some(11));
/// ```
pub struct ConcurrentMap<K, V> {
    stripes: Box<[Stripe<K, V>]>,
    stripe_mask: usize,
}

impl<K: Hash + Eq, V> ConcurrentMap<K, V> {
    /// Create a map with the default stripe count
    pub fn new() -> Self {
        Self::build(MapConfig::default())
    }

    /// Create a map with explicit striping
    pub fn with_config(config: MapConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MapConfig) -> Self {
        let stripes = (0..config.stripes)
            .map(|_| {
                RwLock::new(HashMap::with_capacity_and_hasher(
                    config.stripe_capacity,
                    RandomState::new(),
                ))
            })
            .collect();

        Self {
            stripes,
            stripe_mask: config.stripes - 1,
        }
    }

    /// Get stripe index for key
    ///
    /// Fixed-key hashing here, randomly seeded hashing inside the stripes,
    /// so keys sharing a stripe do not also share hash-table buckets.
    #[inline]
    fn stripe_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = ahash::AHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & self.stripe_mask
    }

    #[inline]
    fn stripe<Q>(&self, key: &Q) -> &Stripe<K, V>
    where
        Q: Hash + ?Sized,
    {
        &self.stripes[self.stripe_index(key)]
    }

    /// Read a value in place (shared lock only)
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        self.stripe(key).read().get(key).map(f)
    }

    /// Clone of the value for `key`
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stripe(key).read().contains_key(key)
    }

    /// Insert or replace, returning the previous value
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.stripe(&key).write().insert(key, value)
    }

    /// Remove `key`, returning its value
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stripe(key).write().remove(key)
    }

    /// Insert `value` only if `key` is absent
    ///
    /// Returns the value stored for `key` afterwards: the existing one if
    /// another caller got there first, otherwise `value`. Among concurrent
    /// callers for the same key exactly one inserts.
    pub fn put_if_absent(&self, key: K, value: V) -> V
    where
        V: Clone,
    {
        let mut stripe = self.stripe(&key).write();
        match stripe.entry(key) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => entry.insert(value).clone(),
        }
    }

    /// Atomically replace the entry for `key` with `f(current)`
    ///
    /// `f` sees the current value (or `None`) and no other operation on
    /// the key can interleave with it. Returning `None` removes the key.
    /// Returns the new value.
    pub fn compute<F>(&self, key: K, f: F) -> Option<V>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
        V: Clone,
    {
        let mut stripe = self.stripe(&key).write();
        match stripe.entry(key) {
            Entry::Occupied(mut entry) => match f(Some(entry.get())) {
                Some(value) => {
                    entry.insert(value);
                    Some(entry.get().clone())
                }
                None => {
                    entry.remove();
                    None
                }
            },
            Entry::Vacant(entry) => f(None).map(|value| entry.insert(value).clone()),
        }
    }

    /// Atomically insert `f(&key)` if `key` is absent
    ///
    /// `f` is not called when the key is present. Returns the value stored
    /// for `key` afterwards.
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(&K) -> V,
        V: Clone,
    {
        let mut stripe = self.stripe(&key).write();
        match stripe.entry(key) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let value = f(entry.key());
                entry.insert(value).clone()
            }
        }
    }

    /// Atomically replace an existing value with `f(current)`
    ///
    /// Does nothing for an absent key. Returning `None` removes the key.
    pub fn compute_if_present<Q, F>(&self, key: &Q, f: F) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> Option<V>,
        V: Clone,
    {
        let mut stripe = self.stripe(key).write();
        let next = f(stripe.get(key)?);
        match next {
            Some(value) => {
                let slot = stripe.get_mut(key)?;
                *slot = value;
                Some(slot.clone())
            }
            None => {
                stripe.remove(key);
                None
            }
        }
    }

    /// Combine `value` with the existing value for `key`
    ///
    /// Absent keys simply get `value`. Otherwise the entry becomes
    /// `f(existing, value)`, and `None` removes it. Returns the new value.
    pub fn merge<F>(&self, key: K, value: V, f: F) -> Option<V>
    where
        F: FnOnce(&V, V) -> Option<V>,
        V: Clone,
    {
        self.compute(key, move |current| match current {
            Some(existing) => f(existing, value),
            None => Some(value),
        })
    }

    /// Total number of entries across all stripes
    ///
    /// Stripes are counted one at a time, so under concurrent writes this
    /// is a moment-by-moment approximation.
    pub fn len(&self) -> usize {
        self.stripes.iter().map(|stripe| stripe.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stripes.iter().all(|stripe| stripe.read().is_empty())
    }

    /// Clear all entries
    pub fn clear(&self) {
        for stripe in self.stripes.iter() {
            stripe.write().clear();
        }
    }

    /// Visit every entry, one stripe at a time
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for stripe in self.stripes.iter() {
            let guard = stripe.read();
            for (k, v) in guard.iter() {
                f(k, v);
            }
        }
    }

    /// Snapshot of the keys
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::new();
        self.for_each(|k, _| keys.push(k.clone()));
        keys
    }

    #[inline]
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }
}

impl<K: Hash + Eq, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("len", &self.len())
            .field("stripes", &self.stripe_count())
            .finish()
    }
}
