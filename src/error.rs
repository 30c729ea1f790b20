//! Error types for the memokit library.
//!
//! ## Key Components
//!
//! - [`MemoError`]: Returned by [`Memoizer::get_timeout`] when the underlying
//!   function fails or the wait for another thread's computation runs out.
//! - [`ConfigError`]: Returned when builder parameters are invalid
//!   (e.g. zero shards).
//! - [`InvariantError`]: Returned by `check_invariants` when the in-flight
//!   bookkeeping and the result store disagree.
//!
//! ## Example Usage
//!
//! ```
//! use memokit::builder::MemoizerBuilder;
//! use memokit::error::ConfigError;
//!
//! let bad = MemoizerBuilder::new()
//!     .shards(0)
//!     .try_build(|k: &u32| k + 1);
//! let err: ConfigError = bad.unwrap_err();
//! assert!(err.to_string().contains("shards"));
//! ```
//!
//! [`Memoizer::get_timeout`]: crate::memo::Memoizer::get_timeout

use std::fmt;

// ---------------------------------------------------------------------------
// MemoError
// ---------------------------------------------------------------------------

/// Error returned by bounded lookups on a [`Memoizer`](crate::memo::Memoizer).
///
/// `Compute` carries the underlying function's own error. It is only ever
/// seen by the caller that ran the computation; waiters on the same key
/// retry instead of sharing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoError<E> {
    /// The underlying function returned an error.
    Compute(E),
    /// The deadline passed while another thread still held the claim.
    TimedOut,
}

impl<E> MemoError<E> {
    /// Returns the computation error, if this is one.
    pub fn into_compute(self) -> Option<E> {
        match self {
            MemoError::Compute(err) => Some(err),
            MemoError::TimedOut => None,
        }
    }

    /// Returns `true` if the wait timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MemoError::TimedOut)
    }
}

impl<E: fmt::Display> fmt::Display for MemoError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoError::Compute(err) => write!(f, "computation failed: {err}"),
            MemoError::TimedOut => f.write_str("timed out waiting for in-flight computation"),
        }
    }
}

impl<E> std::error::Error for MemoError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MemoError::Compute(err) => Some(err),
            MemoError::TimedOut => None,
        }
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal memoizer invariants are violated.
///
/// Produced by [`Memoizer::check_invariants`](crate::memo::Memoizer::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when memoizer configuration parameters are invalid.
///
/// Produced by the `try_build*` methods on
/// [`MemoizerBuilder`](crate::builder::MemoizerBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    // -- MemoError --------------------------------------------------------

    #[test]
    fn memo_display_wraps_compute_error() {
        let err: MemoError<Boom> = MemoError::Compute(Boom);
        assert_eq!(err.to_string(), "computation failed: boom");
    }

    #[test]
    fn memo_display_timeout() {
        let err: MemoError<Boom> = MemoError::TimedOut;
        assert!(err.to_string().contains("timed out"));
        assert!(err.is_timeout());
    }

    #[test]
    fn memo_source_points_at_compute_error() {
        use std::error::Error;

        let err: MemoError<Boom> = MemoError::Compute(Boom);
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".into()));
        assert!(MemoError::<Boom>::TimedOut.source().is_none());
    }

    #[test]
    fn memo_into_compute() {
        assert_eq!(MemoError::Compute(7).into_compute(), Some(7));
        assert_eq!(MemoError::<i32>::TimedOut.into_compute(), None);
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("key pending with live slot");
        assert_eq!(err.to_string(), "key pending with live slot");
        assert_eq!(err.message(), "key pending with live slot");
    }

    #[test]
    fn invariant_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("shards must be > 0");
        assert_eq!(err.to_string(), "shards must be > 0");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
