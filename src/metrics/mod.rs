//! Memoizer counters.
//!
//! Counters are relaxed atomics updated on every `get`; a
//! [`MemoMetricsSnapshot`] copies them out for inspection.

pub mod snapshot;

use std::sync::atomic::{AtomicU64, Ordering};

pub use snapshot::MemoMetricsSnapshot;

/// Live counters owned by one memoizer.
#[derive(Debug, Default)]
pub(crate) struct MemoCounters {
    hits: AtomicU64,
    slow_hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
    failures: AtomicU64,
    waits: AtomicU64,
    timeouts: AtomicU64,
    stale_discards: AtomicU64,
    soft_evictions: AtomicU64,
}

macro_rules! counter {
    ($($inc:ident => $field:ident),* $(,)?) => {
        $(
            #[inline]
            pub(crate) fn $inc(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl MemoCounters {
    counter! {
        inc_hit => hits,
        inc_slow_hit => slow_hits,
        inc_miss => misses,
        inc_computation => computations,
        inc_failure => failures,
        inc_wait => waits,
        inc_timeout => timeouts,
        inc_stale_discard => stale_discards,
        inc_soft_eviction => soft_evictions,
    }

    pub(crate) fn snapshot(&self) -> MemoMetricsSnapshot {
        MemoMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            slow_hits: self.slow_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            stale_discards: self.stale_discards.load(Ordering::Relaxed),
            soft_evictions: self.soft_evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let counters = MemoCounters::default();
        counters.inc_hit();
        counters.inc_hit();
        counters.inc_miss();
        counters.inc_computation();
        counters.inc_wait();

        let snap = counters.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.computations, 1);
        assert_eq!(snap.waits, 1);
        assert_eq!(snap.failures, 0);
    }
}
