//! On-chain governance for Agora.
//!
//! Proposals are created, approved by a maintainer set, voted on by
//! token-weighted holders, queued through a time-lock, and executed:
//!
//! propose → approve → vote → Succeeded/Defeated → queue → execute
//!
//! Lifecycle state is computed on read from stored facts — never persisted —
//! and every transition-inducing call is validated in full before any state
//! changes. Governance parameters are mutable only through the execution
//! path itself (proposals targeting the module's own address).

pub mod approval;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod params;
pub mod proposal;
pub mod state;
pub mod store;
pub mod tally;

pub use approval::{ApprovalGate, ApprovalRecord};
pub use dispatch::{Call, CallDispatcher, DispatchError, RecordingDispatcher};
pub use engine::{GovernanceEngine, ProposalInfo};
pub use error::GovernanceError;
pub use params::{GovernanceCall, GovernanceParams};
pub use proposal::{Proposal, ProposalState, VoteSupport};
pub use state::{derive_state, is_vote_successful};
pub use store::ProposalStore;
pub use tally::{TallyTotals, VoteReceipt, VoteTally};
