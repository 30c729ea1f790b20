//! Single-flight memoizer over weakly held results.
//!
//! ## Architecture
//!
//! ```text
//!   get(&k)
//!     │
//!     ├─► WeakStore::lookup(k) ── live ──────────────────────────► return
//!     │        (shard read lock only)
//!     ▼ miss
//!   ┌─ coordination lock ───────────────────────────────────────────────┐
//!   │  loop {                                                           │
//!   │    probe(k): live → return │ reclaimed → discard │ vacant → ·     │
//!   │    try_claim(k): claimed → break                                  │
//!   │    wait()  (released by any key; re-check)                        │
//!   │  }                                                                │
//!   └───────────────────────────────────────────────────────────────────┘
//!     ▼ claimed, no lock held
//!   Compute::compute(&k)
//!     │ Ok(v)  ─► lock: store + pin + release(k) + notify_all ─► return v
//!     │ Err(e) ─► lock: release(k) + notify_all ─────────────► return e
//!     │ panic  ─► Claim::drop releases k during unwinding
//! ```
//!
//! ## Guarantees
//!
//! - At most one `compute` runs per key at any instant; callers for the same
//!   key wait on the claimant and then read its result.
//! - Errors are never cached and only reach the claimant. Waiters re-check
//!   after waking and, finding no result, claim and compute themselves.
//! - Results are published to the store while holding the coordination lock,
//!   so a key is never both pending and holding a slot.
//! - A result is recomputed once every strong reference to it is gone,
//!   including the soft retainer's pin.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use memokit::memo::Memoizer;
//!
//! let memo = Memoizer::new(|k: &u64| k * 2);
//! let first = memo.get(&5);
//! let second = memo.get(&5);
//! assert_eq!(*first, 10);
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(memo.metrics().computations, 1);
//! ```

use std::collections::hash_map::RandomState;
use std::convert::Infallible;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::builder::MemoizerBuilder;
use crate::error::{InvariantError, MemoError};
use crate::memo::inflight::{InFlight, PendingGuard};
use crate::metrics::{MemoCounters, MemoMetricsSnapshot};
use crate::store::{Slot, SoftRetainer, WeakStore};
use crate::traits::{Compute, FromFn, TryFromFn};

/// Thread-safe memoizer with single-flight computation per key.
///
/// Values are returned as `Arc<V>`. The memoizer itself holds them weakly,
/// plus at most `soft_capacity` strong pins on recently used results
/// ([`DEFAULT_SOFT_CAPACITY`](crate::builder::DEFAULT_SOFT_CAPACITY) unless
/// configured).
pub struct Memoizer<K, V, C, S = RandomState> {
    compute: C,
    store: WeakStore<K, V, S>,
    retainer: SoftRetainer<K, V, S>,
    inflight: InFlight<K>,
    counters: MemoCounters,
}

impl<K, V, F> Memoizer<K, V, FromFn<F>, RandomState>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> V,
{
    /// Memoizes an infallible function with default settings.
    pub fn new(function: F) -> Self {
        MemoizerBuilder::new().build(function)
    }
}

impl<K, V, E, F> Memoizer<K, V, TryFromFn<F>, RandomState>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> Result<V, E>,
{
    /// Memoizes a fallible function with default settings.
    pub fn fallible(function: F) -> Self {
        MemoizerBuilder::new().build_fallible(function)
    }
}

impl<K, V, C> Memoizer<K, V, C, RandomState>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
{
    /// Memoizes a [`Compute`] implementation with default settings.
    pub fn with_compute(compute: C) -> Self {
        MemoizerBuilder::new().build_with(compute)
    }
}

enum Acquired<'a, K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
    S: BuildHasher + Clone,
{
    Hit(Arc<V>),
    Claimed(Claim<'a, K, V, C, S>),
}

impl<K, V, C, S> Memoizer<K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
    S: BuildHasher + Clone,
{
    pub(crate) fn from_parts(compute: C, shards: usize, soft_capacity: usize, hasher: S) -> Self {
        Self {
            compute,
            store: WeakStore::with_hasher(shards, hasher.clone()),
            retainer: SoftRetainer::with_hasher(soft_capacity, hasher),
            inflight: InFlight::new(),
            counters: MemoCounters::default(),
        }
    }

    /// Returns the cached value for `key`, computing it if necessary.
    ///
    /// Blocks while another thread computes the same key. An error from the
    /// underlying function is returned to this caller only and nothing is
    /// cached; the next call for `key` tries again.
    pub fn try_get(&self, key: &K) -> Result<Arc<V>, C::Error> {
        if let Some(value) = self.lookup_fast(key) {
            return Ok(value);
        }

        let acquired = self
            .acquire(key, |guard| {
                guard.wait();
                Ok::<(), Infallible>(())
            })
            .unwrap_or_else(|never| match never {});

        match acquired {
            Acquired::Hit(value) => Ok(value),
            Acquired::Claimed(claim) => claim.run(),
        }
    }

    /// Like [`try_get`](Self::try_get), but waits at most `timeout` for
    /// another thread's computation of the same key.
    ///
    /// The bound applies to waiting only. Once this caller claims the key it
    /// runs the computation to completion.
    pub fn get_timeout(&self, key: &K, timeout: Duration) -> Result<Arc<V>, MemoError<C::Error>> {
        if let Some(value) = self.lookup_fast(key) {
            return Ok(value);
        }

        let deadline = Instant::now().checked_add(timeout);
        let acquired = self.acquire(key, |guard| {
            let Some(deadline) = deadline else {
                guard.wait();
                return Ok(());
            };
            if guard.wait_until(deadline) && guard.is_pending(key) {
                self.counters.inc_timeout();
                tracing::debug!(?timeout, "gave up waiting for in-flight computation");
                return Err(MemoError::<C::Error>::TimedOut);
            }
            Ok(())
        })?;

        match acquired {
            Acquired::Hit(value) => Ok(value),
            Acquired::Claimed(claim) => claim.run().map_err(MemoError::Compute),
        }
    }

    /// Returns the cached value for `key` without computing or waiting.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.store.lookup(key)
    }

    /// Returns `true` while a computation for `key` is in progress.
    pub fn is_pending(&self, key: &K) -> bool {
        self.inflight.lock().is_pending(key)
    }

    /// Number of computations currently in progress.
    pub fn pending_len(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Number of results still alive.
    pub fn len(&self) -> usize {
        self.store.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of result slots, including ones whose value has been dropped.
    pub fn slot_count(&self) -> usize {
        self.store.slot_count()
    }

    pub fn shard_count(&self) -> usize {
        self.store.shard_count()
    }

    /// Number of results pinned by the soft retainer.
    pub fn retained_len(&self) -> usize {
        self.retainer.len()
    }

    pub fn soft_capacity(&self) -> usize {
        self.retainer.capacity()
    }

    /// Releases every soft pin, as a memory manager would under pressure.
    ///
    /// Results still held by callers stay cached; the rest are freed and
    /// will be recomputed on their next request. Returns the number of pins
    /// released.
    pub fn reclaim(&self) -> usize {
        let released = self.retainer.reclaim();
        tracing::debug!(released, "released soft pins");
        released
    }

    /// Discards every slot whose value has been dropped. Returns the number removed.
    pub fn purge_reclaimed(&self) -> usize {
        let purged = self.store.purge_reclaimed();
        tracing::debug!(purged, "purged reclaimed slots");
        purged
    }

    pub fn metrics(&self) -> MemoMetricsSnapshot {
        self.counters.snapshot()
    }

    /// Verifies that no pending key holds a result slot and that every soft
    /// pin is the value its slot points at.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let guard = self.inflight.lock();
        let overlapping = guard
            .keys()
            .filter(|key| self.store.contains_slot(key))
            .count();
        if overlapping > 0 {
            return Err(InvariantError::new(format!(
                "{overlapping} pending key(s) also hold a result slot"
            )));
        }

        let mut orphaned = 0usize;
        self.retainer.for_each_pin(|key, pin| match self.store.lookup(key) {
            Some(value) if Arc::ptr_eq(&value, pin) => {},
            _ => orphaned += 1,
        });
        drop(guard);

        if orphaned > 0 {
            return Err(InvariantError::new(format!(
                "{orphaned} soft pin(s) do not match their result slot"
            )));
        }
        Ok(())
    }

    /// Shard read lock plus a non-blocking pin mark; never waits on another hit.
    fn lookup_fast(&self, key: &K) -> Option<Arc<V>> {
        let value = self.store.lookup(key)?;
        self.counters.inc_hit();
        self.retainer.touch(key);
        Some(value)
    }

    /// Slow path: re-check under the coordination lock, then claim or wait.
    ///
    /// `wait` blocks on the condvar; an `Err` from it abandons the call.
    fn acquire<'a, T>(
        &'a self,
        key: &'a K,
        mut wait: impl FnMut(&mut PendingGuard<'_, K>) -> Result<(), T>,
    ) -> Result<Acquired<'a, K, V, C, S>, T> {
        let mut guard = self.inflight.lock();
        let mut counted_miss = false;

        loop {
            match self.store.probe(key) {
                Slot::Live(value) => {
                    drop(guard);
                    self.counters.inc_slow_hit();
                    self.retainer.touch(key);
                    return Ok(Acquired::Hit(value));
                },
                Slot::Reclaimed => {
                    if self.store.discard_if_reclaimed(key) {
                        self.counters.inc_stale_discard();
                    }
                },
                Slot::Vacant => {},
            }

            // Only a publish inserts slots, and publishing needs this lock.
            debug_assert!(
                !self.store.contains_slot(key),
                "result slot present for a key about to be claimed"
            );

            if !counted_miss {
                counted_miss = true;
                self.counters.inc_miss();
            }

            if guard.try_claim(key) {
                drop(guard);
                tracing::trace!("claimed key for computation");
                return Ok(Acquired::Claimed(Claim {
                    memo: self,
                    key,
                    armed: true,
                }));
            }

            self.counters.inc_wait();
            tracing::trace!("key is in flight, waiting");
            wait(&mut guard)?;
        }
    }
}

impl<K, V, C, S> Memoizer<K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V, Error = Infallible>,
    S: BuildHasher + Clone,
{
    /// Returns the cached value for `key`, computing it if necessary.
    ///
    /// Blocks while another thread computes the same key. A panic in the
    /// underlying function propagates to the caller that ran it; the key is
    /// released and the next call computes again.
    pub fn get(&self, key: &K) -> Arc<V> {
        self.try_get(key).unwrap_or_else(|never| match never {})
    }
}

impl<K, V, C, S> fmt::Debug for Memoizer<K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoizer")
            .field("shards", &self.store.shard_count())
            .field("slots", &self.store.slot_count())
            .field("pending", &self.pending_len())
            .field("retained", &self.retainer.len())
            .field("soft_capacity", &self.retainer.capacity())
            .finish()
    }
}

/// Ownership of one key's computation.
///
/// Dropping an armed claim (error or panic) releases the key without
/// publishing anything.
struct Claim<'a, K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
    S: BuildHasher + Clone,
{
    memo: &'a Memoizer<K, V, C, S>,
    key: &'a K,
    armed: bool,
}

impl<K, V, C, S> Claim<'_, K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
    S: BuildHasher + Clone,
{
    fn run(self) -> Result<Arc<V>, C::Error> {
        self.memo.counters.inc_computation();
        match self.memo.compute.compute(self.key) {
            Ok(value) => Ok(self.publish(Arc::new(value))),
            Err(err) => {
                self.memo.counters.inc_failure();
                tracing::debug!("computation failed, releasing claim");
                Err(err)
            },
        }
    }

    fn publish(mut self, value: Arc<V>) -> Arc<V> {
        let memo = self.memo;
        let guard = memo.inflight.lock();
        memo.store.store(self.key.clone(), &value);
        let released_pin = memo.retainer.retain(self.key.clone(), Arc::clone(&value));
        self.armed = false;
        guard.release(self.key);

        if released_pin.is_some() {
            memo.counters.inc_soft_eviction();
        }
        drop(released_pin);
        value
    }
}

impl<K, V, C, S> Drop for Claim<'_, K, V, C, S>
where
    K: Eq + Hash + Clone,
    C: Compute<K, V>,
    S: BuildHasher + Clone,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if std::thread::panicking() {
            self.memo.counters.inc_failure();
            tracing::debug!("computation panicked, releasing claim");
        }
        self.memo.inflight.lock().release(self.key);
    }
}
