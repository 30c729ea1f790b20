//! memokit: single-flight memoization over weakly held results.
//!
//! A [`Memoizer`] wraps a function `K -> V`. Concurrent callers for the same
//! key share one computation; results are handed out as `Arc<V>` and kept
//! only weakly, so a result lives as long as someone uses it (or the
//! soft retainer pins it) and is recomputed afterwards.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod ds;
pub mod ecc;
pub mod error;
pub mod memo;
pub mod metrics;
pub mod prelude;
pub mod store;
pub mod traits;

pub use crate::builder::MemoizerBuilder;
pub use crate::memo::Memoizer;
