//! In-flight coordination: which keys are being computed right now.
//!
//! A single monitor (`parking_lot::Mutex` over an `FxHashSet` of pending
//! keys, plus one `Condvar`) arbitrates claims. Holding the [`PendingGuard`]
//! is holding the coordination lock; every operation below happens under it.
//!
//! ```text
//!   try_claim(k) ── k ∉ pending ──► insert, caller owns k
//!                └─ k ∈ pending ──► caller waits, then re-checks
//!
//!   release(k)  ──► remove k, notify_all
//! ```
//!
//! Release wakes every waiter regardless of key. Each waiter re-validates
//! its own key after waking, so broadcast and spurious wake-ups are both
//! harmless.

use std::hash::Hash;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::FxHashSet;

/// Pending set plus its wake-up channel.
#[derive(Debug)]
pub(crate) struct InFlight<K> {
    pending: Mutex<FxHashSet<K>>,
    released: Condvar,
}

impl<K> InFlight<K>
where
    K: Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(FxHashSet::default()),
            released: Condvar::new(),
        }
    }

    /// Acquires the coordination lock.
    pub(crate) fn lock(&self) -> PendingGuard<'_, K> {
        PendingGuard {
            pending: self.pending.lock(),
            released: &self.released,
        }
    }
}

/// The coordination lock, held.
pub(crate) struct PendingGuard<'a, K> {
    pending: MutexGuard<'a, FxHashSet<K>>,
    released: &'a Condvar,
}

impl<K> PendingGuard<'_, K>
where
    K: Eq + Hash,
{
    /// Claims `key` if nobody else has. Returns `true` if the caller now owns it.
    pub(crate) fn try_claim(&mut self, key: &K) -> bool
    where
        K: Clone,
    {
        if self.pending.contains(key) {
            return false;
        }
        self.pending.insert(key.clone());
        true
    }

    pub(crate) fn is_pending(&self, key: &K) -> bool {
        self.pending.contains(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &K> {
        self.pending.iter()
    }

    /// Releases the lock until the next `release`, then re-acquires it.
    pub(crate) fn wait(&mut self) {
        self.released.wait(&mut self.pending);
    }

    /// Like [`wait`](Self::wait), giving up at `deadline`. Returns `true` on timeout.
    pub(crate) fn wait_until(&mut self, deadline: Instant) -> bool {
        self.released
            .wait_until(&mut self.pending, deadline)
            .timed_out()
    }

    /// Removes `key` from the pending set and wakes every waiter.
    pub(crate) fn release(mut self, key: &K) {
        let removed = self.pending.remove(key);
        debug_assert!(removed, "released a key that was not pending");
        drop(self.pending);
        self.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn claim_is_exclusive() {
        let inflight: InFlight<u32> = InFlight::new();
        let mut guard = inflight.lock();
        assert!(guard.try_claim(&1));
        assert!(!guard.try_claim(&1));
        assert!(guard.try_claim(&2));
        assert!(guard.is_pending(&1));
        assert_eq!(guard.len(), 2);

        guard.release(&1);
        let mut guard = inflight.lock();
        assert!(!guard.is_pending(&1));
        assert!(guard.try_claim(&1));
    }

    #[test]
    fn wait_until_times_out_without_release() {
        let inflight: InFlight<u32> = InFlight::new();
        let mut guard = inflight.lock();
        assert!(guard.try_claim(&1));
        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(guard.wait_until(deadline));
        assert!(guard.is_pending(&1));
    }

    #[test]
    fn release_wakes_waiter() {
        let inflight: Arc<InFlight<u32>> = Arc::new(InFlight::new());
        assert!(inflight.lock().try_claim(&7));

        let woke = Arc::new(AtomicBool::new(false));
        let waiter = {
            let inflight = Arc::clone(&inflight);
            let woke = Arc::clone(&woke);
            thread::spawn(move || {
                let mut guard = inflight.lock();
                while guard.is_pending(&7) {
                    guard.wait();
                }
                woke.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!woke.load(Ordering::SeqCst));
        inflight.lock().release(&7);
        waiter.join().unwrap();
        assert!(woke.load(Ordering::SeqCst));
    }
}
