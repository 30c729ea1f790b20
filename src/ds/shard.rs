//! Key-to-shard mapping for the sharded result store.
//!
//! ## Architecture
//!
//! ```text
//!   key ──► BuildHasher::hash_one(key) ──► mix ──► % shards ──► shard index
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Shard 0 │ Shard 1 │ Shard 2 │ Shard 3 │
//!   │  A, E   │  B, F   │  C, G   │  D, H   │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! The selector hashes with the same `BuildHasher` the shard maps use, so a
//! custom hasher (e.g. `rustc_hash::FxBuildHasher`) is honored end to end.
//! The upper hash bits are folded in before the modulo; per-shard maps use
//! the lower bits for bucket selection.
//!
//! ## Example Usage
//!
//! ```
//! use std::collections::hash_map::RandomState;
//!
//! use memokit::ds::ShardSelector;
//!
//! let selector = ShardSelector::new(4, RandomState::new());
//! let shard = selector.shard_for_key(&"user:123");
//! assert!(shard < 4);
//! assert_eq!(selector.shard_for_key(&"user:123"), shard);
//! ```

use std::hash::{BuildHasher, Hash};

/// Deterministic shard selector over a shared `BuildHasher`.
#[derive(Debug, Clone)]
pub struct ShardSelector<S> {
    shards: usize,
    hasher: S,
}

impl<S: BuildHasher> ShardSelector<S> {
    /// Creates a selector for `shards` shards. The count is clamped to at least 1.
    pub fn new(shards: usize, hasher: S) -> Self {
        Self {
            shards: shards.max(1),
            hasher,
        }
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Returns the hasher shared with the shard maps.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Maps a key to a shard index in `[0, shards)`.
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        let hash = self.hasher.hash_one(key);
        ((hash ^ (hash >> 32)) as usize) % self.shards
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::RandomState;

    use rustc_hash::FxBuildHasher;

    use super::*;

    #[test]
    fn zero_shards_clamped_to_one() {
        let selector = ShardSelector::new(0, RandomState::new());
        assert_eq!(selector.shard_count(), 1);
        assert_eq!(selector.shard_for_key(&42u64), 0);
    }

    #[test]
    fn mapping_is_deterministic() {
        let selector = ShardSelector::new(8, FxBuildHasher);
        for key in 0..256u64 {
            let shard = selector.shard_for_key(&key);
            assert!(shard < 8);
            assert_eq!(selector.shard_for_key(&key), shard);
        }
    }

    #[test]
    fn keys_spread_over_all_shards() {
        let selector = ShardSelector::new(4, FxBuildHasher);
        let mut seen = [false; 4];
        for key in 0..1024u64 {
            seen[selector.shard_for_key(&key)] = true;
        }
        assert!(seen.iter().all(|&hit| hit), "some shard never selected: {seen:?}");
    }

    #[test]
    fn unsized_keys_are_accepted() {
        let selector = ShardSelector::new(4, RandomState::new());
        let shard = selector.shard_for_key("borrowed str");
        assert_eq!(selector.shard_for_key("borrowed str"), shard);
    }
}
