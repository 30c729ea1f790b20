//! The seam between a [`Memoizer`](crate::memo::Memoizer) and the function it
//! caches.
//!
//! ## Key Components
//!
//! - [`Compute`]: implemented by anything that can produce a value for a key.
//! - [`FromFn`]: adapts an infallible `Fn(&K) -> V`.
//! - [`TryFromFn`]: adapts a fallible `Fn(&K) -> Result<V, E>`.
//!
//! The memoizer may call `compute` again for a key whose earlier result was
//! reclaimed, and concurrently for different keys, but never concurrently
//! for the same key. Implementations should therefore be deterministic.
//!
//! ## Example Usage
//!
//! ```
//! use std::convert::Infallible;
//!
//! use memokit::memo::Memoizer;
//! use memokit::traits::Compute;
//!
//! struct Square;
//!
//! impl Compute<u64, u64> for Square {
//!     type Error = Infallible;
//!
//!     fn compute(&self, key: &u64) -> Result<u64, Infallible> {
//!         Ok(key * key)
//!     }
//! }
//!
//! let memo = Memoizer::with_compute(Square);
//! assert_eq!(*memo.get(&12), 144);
//! ```

use std::convert::Infallible;

/// Produces the value for a key.
pub trait Compute<K, V> {
    /// Error reported to the caller that ran the computation.
    type Error;

    /// Computes the value for `key`. Called with no memoizer lock held.
    fn compute(&self, key: &K) -> Result<V, Self::Error>;
}

/// Adapter for infallible closures.
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(pub F);

impl<K, V, F> Compute<K, V> for FromFn<F>
where
    F: Fn(&K) -> V,
{
    type Error = Infallible;

    #[inline]
    fn compute(&self, key: &K) -> Result<V, Infallible> {
        Ok((self.0)(key))
    }
}

/// Adapter for fallible closures.
#[derive(Debug, Clone, Copy)]
pub struct TryFromFn<F>(pub F);

impl<K, V, E, F> Compute<K, V> for TryFromFn<F>
where
    F: Fn(&K) -> Result<V, E>,
{
    type Error = E;

    #[inline]
    fn compute(&self, key: &K) -> Result<V, E> {
        (self.0)(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_wraps_value() {
        let double = FromFn(|k: &u32| k * 2);
        assert_eq!(double.compute(&21), Ok(42));
    }

    #[test]
    fn try_from_fn_passes_errors_through() {
        let parse = TryFromFn(|k: &&str| k.parse::<u32>().map_err(|_| "not a number"));
        assert_eq!(parse.compute(&"17"), Ok(17));
        assert_eq!(parse.compute(&"x"), Err("not a number"));
    }
}
