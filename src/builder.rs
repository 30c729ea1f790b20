//! Builder for configuring [`Memoizer`] instances.
//!
//! Every setting has a default, so `MemoizerBuilder::new().build(f)` is the
//! same as `Memoizer::new(f)`.
//!
//! | Setting         | Default        | Meaning                                      |
//! |-----------------|----------------|----------------------------------------------|
//! | `shards`        | 16             | Result-store shards (read-lock partitions)   |
//! | `soft_capacity` | 1024           | Strong pins kept by the CLOCK retainer       |
//! | `hasher`        | `RandomState`  | Hasher for the store and the retainer        |
//!
//! ## Example
//!
//! ```rust
//! use memokit::builder::MemoizerBuilder;
//! use rustc_hash::FxBuildHasher;
//!
//! let memo = MemoizerBuilder::new()
//!     .shards(8)
//!     .soft_capacity(256)
//!     .hasher(FxBuildHasher)
//!     .build(|k: &u64| k.count_ones());
//!
//! assert_eq!(*memo.get(&0b1011), 3);
//! assert_eq!(memo.retained_len(), 1);
//! ```

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use crate::error::ConfigError;
use crate::memo::Memoizer;
use crate::traits::{Compute, FromFn, TryFromFn};

/// Default number of result-store shards.
pub const DEFAULT_SHARDS: usize = 16;

/// Default number of results kept alive after their callers drop them.
pub const DEFAULT_SOFT_CAPACITY: usize = 1024;

/// Upper bound accepted by the `try_build*` methods.
pub const MAX_SHARDS: usize = 4096;

/// Builder for [`Memoizer`].
#[derive(Debug, Clone)]
pub struct MemoizerBuilder<S = RandomState> {
    shards: usize,
    soft_capacity: usize,
    hasher: S,
}

impl MemoizerBuilder<RandomState> {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            soft_capacity: DEFAULT_SOFT_CAPACITY,
            hasher: RandomState::new(),
        }
    }
}

impl Default for MemoizerBuilder<RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MemoizerBuilder<S>
where
    S: BuildHasher + Clone,
{
    /// Sets the number of result-store shards.
    ///
    /// `build*` clamps zero to one shard; `try_build*` rejects it.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Sets how many recently used results are kept alive after their
    /// callers drop them.
    ///
    /// Zero keeps results only while callers hold them, so a caller that
    /// drops its `Arc` before asking again pays for a second computation.
    pub fn soft_capacity(mut self, soft_capacity: usize) -> Self {
        self.soft_capacity = soft_capacity;
        self
    }

    /// Replaces the hasher used by the store and the retainer.
    pub fn hasher<S2>(self, hasher: S2) -> MemoizerBuilder<S2>
    where
        S2: BuildHasher + Clone,
    {
        MemoizerBuilder {
            shards: self.shards,
            soft_capacity: self.soft_capacity,
            hasher,
        }
    }

    /// Checks the configuration without building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::new("shards must be > 0"));
        }
        if self.shards > MAX_SHARDS {
            return Err(ConfigError::new(format!(
                "shards must be <= {MAX_SHARDS}, got {}",
                self.shards
            )));
        }
        Ok(())
    }

    /// Builds a memoizer over an infallible function.
    pub fn build<K, V, F>(self, function: F) -> Memoizer<K, V, FromFn<F>, S>
    where
        K: Eq + Hash + Clone,
        F: Fn(&K) -> V,
    {
        self.build_with(FromFn(function))
    }

    /// Builds a memoizer over a fallible function.
    pub fn build_fallible<K, V, E, F>(self, function: F) -> Memoizer<K, V, TryFromFn<F>, S>
    where
        K: Eq + Hash + Clone,
        F: Fn(&K) -> Result<V, E>,
    {
        self.build_with(TryFromFn(function))
    }

    /// Builds a memoizer over a [`Compute`] implementation.
    pub fn build_with<K, V, C>(self, compute: C) -> Memoizer<K, V, C, S>
    where
        K: Eq + Hash + Clone,
        C: Compute<K, V>,
    {
        Memoizer::from_parts(compute, self.shards, self.soft_capacity, self.hasher)
    }

    /// Validating variant of [`build`](Self::build).
    pub fn try_build<K, V, F>(self, function: F) -> Result<Memoizer<K, V, FromFn<F>, S>, ConfigError>
    where
        K: Eq + Hash + Clone,
        F: Fn(&K) -> V,
    {
        self.validate()?;
        Ok(self.build(function))
    }

    /// Validating variant of [`build_fallible`](Self::build_fallible).
    pub fn try_build_fallible<K, V, E, F>(
        self,
        function: F,
    ) -> Result<Memoizer<K, V, TryFromFn<F>, S>, ConfigError>
    where
        K: Eq + Hash + Clone,
        F: Fn(&K) -> Result<V, E>,
    {
        self.validate()?;
        Ok(self.build_fallible(function))
    }

    /// Validating variant of [`build_with`](Self::build_with).
    pub fn try_build_with<K, V, C>(self, compute: C) -> Result<Memoizer<K, V, C, S>, ConfigError>
    where
        K: Eq + Hash + Clone,
        C: Compute<K, V>,
    {
        self.validate()?;
        Ok(self.build_with(compute))
    }
}
