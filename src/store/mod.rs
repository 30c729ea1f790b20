//! Result storage for the memoizer.
//!
//! [`WeakStore`] maps keys to weakly held results; [`SoftRetainer`] decides
//! which of those results are kept alive beyond their callers.

pub mod retain;
pub mod weak;

pub use retain::SoftRetainer;
pub use weak::{Slot, WeakStore};
