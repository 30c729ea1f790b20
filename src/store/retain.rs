//! Bounded strong retention for recently used results.
//!
//! [`WeakStore`](super::WeakStore) alone frees a result the moment its last
//! caller drops it. `SoftRetainer` keeps strong pins on up to `capacity`
//! results, chosen by a CLOCK ring: a hit sets the pin's reference bit, and
//! inserting into a full ring releases the first unreferenced pin. Once a
//! pin is released the value lives only as long as callers hold it.
//!
//! `reclaim` drops every pin at once, the equivalent of the memory manager
//! clearing soft references under pressure.
//!
//! `touch` runs on every cache hit and never blocks: it uses `try_lock` and
//! skips the mark when another thread holds the ring. A missed mark only
//! makes that pin an earlier candidate for the next eviction.
//!
//! A zero capacity disables retention entirely and never takes a lock.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ds::ClockRing;

/// CLOCK-managed set of strong pins.
#[derive(Debug)]
pub struct SoftRetainer<K, V, S = RandomState> {
    ring: Option<Mutex<ClockRing<K, Arc<V>, S>>>,
    capacity: usize,
}

impl<K, V> SoftRetainer<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> SoftRetainer<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        let ring = (capacity > 0).then(|| Mutex::new(ClockRing::with_hasher(capacity, hasher)));
        Self { ring, capacity }
    }

    /// Maximum number of pins.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pins currently held.
    pub fn len(&self) -> usize {
        self.ring.as_ref().map_or(0, |ring| ring.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_retained(&self, key: &K) -> bool {
        self.ring.as_ref().is_some_and(|ring| ring.lock().contains(key))
    }

    /// Pins `value` under `key`.
    ///
    /// Returns the pin released to make room, if another key lost its pin.
    /// The caller decides where that last strong reference is dropped.
    pub fn retain(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        let ring = self.ring.as_ref()?;
        let released = ring.lock().insert(key.clone(), value);
        released.and_then(|(released_key, pin)| (released_key != key).then_some(pin))
    }

    /// Marks `key`'s pin as recently used, unless the ring is busy.
    ///
    /// Returns whether the mark was applied.
    pub fn touch(&self, key: &K) -> bool {
        let Some(ring) = &self.ring else {
            return false;
        };
        match ring.try_lock() {
            Some(mut ring) => ring.touch(key),
            None => false,
        }
    }

    /// Drops every pin. Returns how many were released.
    pub fn reclaim(&self) -> usize {
        let Some(ring) = &self.ring else {
            return 0;
        };
        let released = ring.lock().clear();
        released.len()
    }

    /// Visits every pin while holding the ring lock.
    pub(crate) fn for_each_pin(&self, mut f: impl FnMut(&K, &Arc<V>)) {
        if let Some(ring) = &self.ring {
            let ring = ring.lock();
            for key in ring.keys() {
                if let Some(value) = ring.peek(key) {
                    f(key, value);
                }
            }
        }
    }
}
