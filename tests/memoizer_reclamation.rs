// ==============================================
// RECLAMATION TESTS (integration)
// ==============================================
//
// Results live exactly as long as a strong reference exists: a caller's
// `Arc` or a soft pin. These tests drive that lifecycle from the outside
// and check invocation counts against a simple ownership model.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use memokit::builder::{DEFAULT_SOFT_CAPACITY, MemoizerBuilder};
use memokit::memo::Memoizer;
use proptest::prelude::*;

fn counted(calls: Arc<AtomicUsize>) -> impl Fn(&u64) -> u64 {
    move |k: &u64| {
        calls.fetch_add(1, Ordering::SeqCst);
        k + 1
    }
}

// ==============================================
// Stability and recompute-after-reclamation
// ==============================================

mod lifecycle {
    use super::*;

    #[test]
    fn held_result_is_stable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memoizer::new(counted(Arc::clone(&calls)));

        let first = memo.get(&7);
        let second = memo.get(&7);
        assert_eq!(*first, 8);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sequential_gets_share_one_computation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memoizer::new(counted(Arc::clone(&calls)));

        let a = *memo.get(&7);
        let b = *memo.get(&7);
        assert_eq!((a, b), (8, 8));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cleared_result_is_recomputed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = MemoizerBuilder::new()
            .soft_capacity(8)
            .build(counted(Arc::clone(&calls)));

        let first = memo.get(&7);
        assert_eq!(*first, 8);
        drop(first);
        assert!(memo.peek(&7).is_some(), "soft pin keeps the result");

        memo.reclaim();
        assert!(memo.peek(&7).is_none());

        let second = memo.get(&7);
        assert_eq!(*second, 8);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let third = memo.get(&7);
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn caller_reference_outlives_reclaim() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = MemoizerBuilder::new()
            .soft_capacity(8)
            .build(counted(Arc::clone(&calls)));

        let held = memo.get(&1);
        memo.reclaim();
        assert!(Arc::ptr_eq(&held, &memo.get(&1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cycle_repeats_indefinitely() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memoizer::new(counted(Arc::clone(&calls)));

        for round in 1..=50 {
            assert_eq!(*memo.get(&3), 4);
            assert_eq!(*memo.get(&3), 4);
            assert_eq!(calls.load(Ordering::SeqCst), round);
            assert_eq!(memo.reclaim(), 1);
        }
        assert_eq!(memo.slot_count(), 1);
        memo.check_invariants().unwrap();
    }
}

// ==============================================
// Unbounded key space
// ==============================================

mod key_space {
    use super::*;

    #[test]
    fn accepts_many_distinct_keys_without_capacity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memoizer::new(counted(Arc::clone(&calls)));

        let held: Vec<_> = (0..20_000u64).map(|k| memo.get(&k)).collect();
        assert_eq!(memo.len(), 20_000);
        assert_eq!(calls.load(Ordering::SeqCst), 20_000);
        assert!(held.iter().enumerate().all(|(k, v)| **v == k as u64 + 1));

        drop(held);
        assert_eq!(memo.len(), DEFAULT_SOFT_CAPACITY);
        assert_eq!(memo.retained_len(), DEFAULT_SOFT_CAPACITY);

        memo.reclaim();
        assert!(memo.is_empty());
        assert_eq!(memo.purge_reclaimed(), 20_000);
        assert_eq!(memo.slot_count(), 0);
    }
}

// ==============================================
// Ownership model
// ==============================================
//
// With soft retention off, a `get` computes iff no strong reference to the key's
// previous result is still held by the test.

#[derive(Debug, Clone)]
enum Op {
    Get { key: u64, hold: bool },
    Release { key: u64 },
    Purge,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..8, any::<bool>()).prop_map(|(key, hold)| Op::Get { key, hold }),
        2 => (0u64..8).prop_map(|key| Op::Release { key }),
        1 => Just(Op::Purge),
    ]
}

proptest! {
    /// Property: invocation count matches the ownership model
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_computes_only_when_unheld(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = MemoizerBuilder::new()
            .shards(3)
            .soft_capacity(0)
            .build(counted(Arc::clone(&calls)));
        let mut held: HashMap<u64, Vec<Arc<u64>>> = HashMap::new();
        let mut expected = 0usize;

        for op in ops {
            match op {
                Op::Get { key, hold } => {
                    let slot = held.entry(key).or_default();
                    if slot.is_empty() {
                        expected += 1;
                    }
                    let value = memo.get(&key);
                    prop_assert_eq!(*value, key + 1);
                    if let Some(existing) = slot.first() {
                        prop_assert!(Arc::ptr_eq(existing, &value));
                    }
                    if hold {
                        slot.push(value);
                    }
                },
                Op::Release { key } => {
                    if let Some(slot) = held.get_mut(&key) {
                        slot.pop();
                    }
                },
                Op::Purge => {
                    memo.purge_reclaimed();
                },
            }
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
            prop_assert!(memo.check_invariants().is_ok());
        }

        let live = held.values().filter(|slot| !slot.is_empty()).count();
        prop_assert_eq!(memo.len(), live);
    }
}
