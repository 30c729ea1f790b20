pub mod clock_ring;
pub mod shard;

pub use clock_ring::ClockRing;
pub use shard::ShardSelector;
