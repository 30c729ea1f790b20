//! Sharded store of weakly held results.
//!
//! ## Architecture
//! - Each shard is a `parking_lot::RwLock<HashMap<K, Weak<V>, S>>`.
//! - `store` downgrades the caller's `Arc<V>` immediately; the store never
//!   keeps a value alive on its own.
//! - A slot whose value was dropped stays in the map as an empty `Weak`
//!   until a reader discards it or `purge_reclaimed` sweeps it.
//!
//! ## Key Components
//! - [`WeakStore`]: the store itself.
//! - [`Slot`]: the three states a probe can observe.
//!
//! ## Core Operations
//! - `lookup`: upgrade the slot under the shard read lock.
//! - `probe`: like `lookup`, but distinguishes "empty slot" from "no slot".
//! - `store`: insert a weak handle under the shard write lock.
//! - `discard_if_reclaimed`: remove a slot only if it is still empty.
//! - `purge_reclaimed`: sweep every shard for empty slots.
//!
//! ## Thread Safety
//! - `WeakStore` is `Send + Sync` when `K`, `V` and `S` are.
//! - Readers on different shards never contend; readers on the same shard
//!   share its read lock.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//!
//! use memokit::store::WeakStore;
//!
//! let store: WeakStore<u64, String> = WeakStore::new(4);
//! let value = Arc::new("seven".to_string());
//! store.store(7, &value);
//! assert_eq!(store.lookup(&7).as_deref(), Some(&"seven".to_string()));
//!
//! drop(value);
//! assert!(store.lookup(&7).is_none());
//! assert!(store.discard_if_reclaimed(&7));
//! assert_eq!(store.slot_count(), 0);
//! ```

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::ds::ShardSelector;

/// Result of probing a single slot.
#[derive(Debug)]
pub enum Slot<V> {
    /// The value is still alive.
    Live(Arc<V>),
    /// A slot exists but its value has been dropped.
    Reclaimed,
    /// No slot exists for the key.
    Vacant,
}

/// Sharded map from keys to weakly held values.
///
/// Has no capacity: it grows with the key space and shrinks only when
/// empty slots are discarded.
#[derive(Debug)]
pub struct WeakStore<K, V, S = RandomState> {
    shards: Vec<RwLock<HashMap<K, Weak<V>, S>>>,
    selector: ShardSelector<S>,
}

impl<K, V> WeakStore<K, V, RandomState>
where
    K: Eq + Hash,
{
    /// Creates a store with `shards` shards and the default hasher.
    pub fn new(shards: usize) -> Self {
        Self::with_hasher(shards, RandomState::new())
    }
}

impl<K, V, S> WeakStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    /// Creates a store with `shards` shards (clamped to at least 1) and a custom hasher.
    pub fn with_hasher(shards: usize, hasher: S) -> Self {
        let selector = ShardSelector::new(shards, hasher);
        let shards = (0..selector.shard_count())
            .map(|_| RwLock::new(HashMap::with_hasher(selector.hasher().clone())))
            .collect();
        Self { shards, selector }
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    fn shard(&self, key: &K) -> &RwLock<HashMap<K, Weak<V>, S>> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    /// Returns the live value for `key`, treating an empty slot as a miss.
    pub fn lookup(&self, key: &K) -> Option<Arc<V>> {
        self.shard(key).read().get(key).and_then(Weak::upgrade)
    }

    /// Reports whether `key` is live, reclaimed, or has no slot at all.
    pub fn probe(&self, key: &K) -> Slot<V> {
        match self.shard(key).read().get(key) {
            Some(weak) => weak.upgrade().map_or(Slot::Reclaimed, Slot::Live),
            None => Slot::Vacant,
        }
    }

    /// Returns `true` if a slot exists for `key`, live or not.
    pub fn contains_slot(&self, key: &K) -> bool {
        self.shard(key).read().contains_key(key)
    }

    /// Stores a weak handle to `value`; the caller keeps ownership.
    pub fn store(&self, key: K, value: &Arc<V>) {
        self.shard(&key).write().insert(key, Arc::downgrade(value));
    }

    /// Removes the slot for `key` if its value has been dropped.
    ///
    /// The check is repeated under the write lock, so a slot refilled since
    /// the caller's probe is left alone. Returns whether a slot was removed.
    pub fn discard_if_reclaimed(&self, key: &K) -> bool {
        let mut map = self.shard(key).write();
        let reclaimed = map.get(key).is_some_and(|weak| weak.strong_count() == 0);
        if reclaimed {
            map.remove(key);
        }
        reclaimed
    }

    /// Drops every empty slot. Returns the number removed.
    pub fn purge_reclaimed(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                let mut map = shard.write();
                let before = map.len();
                map.retain(|_, weak| weak.strong_count() > 0);
                before - map.len()
            })
            .sum()
    }

    /// Number of slots, including ones whose value has been dropped.
    pub fn slot_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Number of slots whose value is still alive.
    pub fn live_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .values()
                    .filter(|weak| weak.strong_count() > 0)
                    .count()
            })
            .sum()
    }
}
