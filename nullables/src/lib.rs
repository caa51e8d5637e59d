//! Nullable infrastructure for deterministic testing.

pub mod clock;

pub use clock::NullChainClock;
