//! Clock-sweep ring for second-chance retention.
//!
//! Fixed-size slot array with a hand pointer. A hit sets the entry's
//! referenced bit; when the ring is full the hand clears referenced bits
//! until it finds an unreferenced entry and replaces it. Used by
//! [`SoftRetainer`](crate::store::SoftRetainer) to decide which strong pins
//! survive.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                        ClockRing<K, V>                            │
//!   │                                                                   │
//!   │   index: HashMap<K, usize>        slots: Vec<Option<Entry>>       │
//!   │   ┌───────┬─────┐                 [0] A ref=1                     │
//!   │   │ key A │  0  │                 [1] B ref=0   ◄── hand          │
//!   │   │ key B │  1  │                 [2] C ref=1                     │
//!   │   │ key C │  2  │                 [3] -                           │
//!   │   └───────┴─────┘                                                 │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Performance Characteristics
//!
//! | Operation  | Time        | Notes                                 |
//! |------------|-------------|---------------------------------------|
//! | `insert`   | O(1) amort. | At most two laps of the hand          |
//! | `touch`    | O(1)        | Sets reference bit                    |
//! | `clear`    | O(n)        | Returns every evicted value           |

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    referenced: bool,
}

/// Fixed-size ring implementing the CLOCK (second-chance) algorithm.
#[derive(Debug)]
pub struct ClockRing<K, V, S = RandomState> {
    slots: Vec<Option<Entry<K, V>>>,
    index: HashMap<K, usize, S>,
    hand: usize,
    len: usize,
}

impl<K, V> ClockRing<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    /// Creates a new ring with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> ClockRing<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Creates a new ring with `capacity` slots and a custom hasher.
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            index: HashMap::with_capacity_and_hasher(capacity, hasher),
            hand: 0,
            len: 0,
        }
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns `key`'s value without setting the reference bit.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots.get(idx)?.as_ref().map(|entry| &entry.value)
    }

    /// Sets the reference bit for `key`; returns `false` if missing.
    pub fn touch(&mut self, key: &K) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        match self.slots.get_mut(idx).and_then(|slot| slot.as_mut()) {
            Some(entry) => {
                entry.referenced = true;
                true
            },
            None => false,
        }
    }

    /// Inserts or replaces `key`.
    ///
    /// Replacing returns the previous value. Inserting into a full ring
    /// evicts the first unreferenced entry and returns it. A zero-capacity
    /// ring hands the new entry straight back.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity() == 0 {
            return Some((key, value));
        }

        if let Some(&idx) = self.index.get(&key)
            && let Some(entry) = self.slots.get_mut(idx).and_then(|slot| slot.as_mut())
        {
            let old = std::mem::replace(&mut entry.value, value);
            entry.referenced = true;
            return Some((key, old));
        }

        let evicted = if self.len == self.capacity() {
            self.find_victim().and_then(|idx| self.take_slot(idx))
        } else {
            None
        };

        // The hand now rests on a free slot, or one is ahead of it.
        while self.slots[self.hand].is_some() {
            self.advance_hand();
        }
        let idx = self.hand;
        self.slots[idx] = Some(Entry {
            key: key.clone(),
            value,
            referenced: false,
        });
        self.index.insert(key, idx);
        self.len += 1;
        self.advance_hand();
        evicted
    }

    /// Removes every entry, returning the values in slot order.
    pub fn clear(&mut self) -> Vec<V> {
        self.index.clear();
        self.len = 0;
        self.hand = 0;
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.take().map(|entry| entry.value))
            .collect()
    }

    /// Iterates over the keys currently held, in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.iter().flatten().map(|entry| &entry.key)
    }

    /// Moves the hand to the first unreferenced entry, clearing bits on the way.
    fn find_victim(&mut self) -> Option<usize> {
        // Two laps: the first may only clear reference bits.
        for _ in 0..self.capacity() * 2 {
            let idx = self.hand;
            match self.slots[idx].as_mut() {
                Some(entry) if entry.referenced => entry.referenced = false,
                Some(_) => return Some(idx),
                None => {},
            }
            self.advance_hand();
        }
        None
    }

    fn take_slot(&mut self, idx: usize) -> Option<(K, V)> {
        let entry = self.slots.get_mut(idx)?.take()?;
        self.index.remove(&entry.key);
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    fn advance_hand(&mut self) {
        let cap = self.capacity();
        self.hand = if cap == 0 { 0 } else { (self.hand + 1) % cap };
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let slot_count = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(self.len, slot_count);
        assert_eq!(self.len, self.index.len());

        if self.capacity() == 0 {
            assert_eq!(self.hand, 0);
        } else {
            assert!(self.hand < self.capacity());
        }

        for (key, &idx) in &self.index {
            let entry = self.slots[idx].as_ref();
            assert!(entry.is_some_and(|entry| &entry.key == key));
        }
    }
}
