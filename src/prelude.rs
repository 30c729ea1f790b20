pub use crate::builder::MemoizerBuilder;
pub use crate::ecc::Ecc;
pub use crate::error::{ConfigError, InvariantError, MemoError};
pub use crate::memo::Memoizer;
pub use crate::metrics::MemoMetricsSnapshot;
pub use crate::traits::{Compute, FromFn, TryFromFn};
