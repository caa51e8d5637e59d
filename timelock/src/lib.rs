//! Timelock executor for the Agora governance module.
//!
//! Accepts operation batches tagged with a deterministic id, enforces a
//! minimum delay between scheduling and execution, and reports readiness.
//! Governance queues succeeded proposals here and dispatches their calls only
//! once the timelock reports the operation ready.

pub mod error;
pub mod executor;

pub use error::TimelockError;
pub use executor::{Timelock, TimelockExecutor};
