//! Single-flight memoization.
//!
//! [`Memoizer`] is the public entry point; `inflight` holds the monitor that
//! decides which caller computes a key.

mod inflight;
pub mod memoizer;

pub use memoizer::Memoizer;
