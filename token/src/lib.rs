//! Vote-power token for the Agora governance module.
//!
//! Answers the two questions governance asks of it: "how much weighted voting
//! power did address A have at block B" and "what was the total supply at
//! block B". Both are exact historical lookups over block-indexed
//! checkpoints, so a vote recorded at block N is unaffected by transfers at
//! block N+1.
//!
//! Every holder is self-delegated by default; `delegate` redirects a holder's
//! entire balance-derived power to a representative.

pub mod checkpoint;
pub mod error;
pub mod token;

pub use checkpoint::{Checkpoint, CheckpointHistory};
pub use error::TokenError;
pub use token::{VotePowerSource, VoteToken};
