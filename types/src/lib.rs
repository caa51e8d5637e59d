//! Fundamental types for the Agora governance module.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: addresses, hashes, vote weights, block numbers, and timestamps.

pub mod address;
pub mod amount;
pub mod hash;
pub mod time;

pub use address::Address;
pub use amount::VoteWeight;
pub use hash::{ContentHash, OperationId};
pub use time::{BlockNumber, ChainTime, Timestamp};
