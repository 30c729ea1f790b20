/// Point-in-time copy of a memoizer's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoMetricsSnapshot {
    pub hits: u64,      // served by the lock-free fast path
    pub slow_hits: u64, // served after re-checking under the coordination lock
    pub misses: u64,    // calls that reached the claim step at least once

    pub computations: u64, // underlying function invocations
    pub failures: u64,     // invocations that returned an error or panicked

    pub waits: u64,    // condvar waits on another thread's claim
    pub timeouts: u64, // bounded waits that gave up

    pub stale_discards: u64, // empty slots discarded on the slow path
    pub soft_evictions: u64, // pins released by the CLOCK ring
}

impl MemoMetricsSnapshot {
    /// Total calls answered from the store without computing.
    pub fn total_hits(&self) -> u64 {
        self.hits + self.slow_hits
    }

    /// Fraction of answered calls that were hits, or `0.0` before any call.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.total_hits();
        let answered = hits + self.computations.saturating_sub(self.failures);
        if answered == 0 {
            0.0
        } else {
            hits as f64 / answered as f64
        }
    }
}
