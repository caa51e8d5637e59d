//! Proposal records and the derived lifecycle states.

use agora_types::{Address, BlockNumber, ContentHash, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// The lifecycle states of a proposal.
///
/// Never stored: always computed from the facts on the record (flags, timing,
/// approval, tally, timelock status) by [`crate::state::derive_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProposalState {
    Pending = 0,
    Active = 1,
    Canceled = 2,
    Defeated = 3,
    Succeeded = 4,
    Queued = 5,
    Expired = 6,
    Executed = 7,
}

impl ProposalState {
    /// Single-state bitmask, used in `UnexpectedProposalState` diagnostics.
    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// Combined bitmask of several states.
    pub fn mask_of(states: &[ProposalState]) -> u8 {
        states.iter().fold(0, |acc, s| acc | s.mask())
    }

    /// Whether no transition can ever leave this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Defeated | Self::Expired | Self::Executed
        )
    }
}

/// A voter's stance. Wire values match the Governor convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteSupport {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl TryFrom<u8> for VoteSupport {
    type Error = GovernanceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Against),
            1 => Ok(Self::For),
            2 => Ok(Self::Abstain),
            other => Err(GovernanceError::InvalidVoteType(other)),
        }
    }
}

/// A governance proposal — a batch of (target, value, calldata) actions plus
/// metadata, subject to approval, voting, and timelocked execution.
///
/// Append-only ledger entry: action payload and timing fields are immutable
/// after creation; `canceled`/`executed` flip false→true exactly once; `eta`
/// is set once at queue time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential id, unique, assigned at creation.
    pub id: u64,
    /// Canonical digest of (targets, values, calldatas, description hash).
    pub content_hash: ContentHash,
    pub proposer: Address,
    /// Parallel action sequences; equal length, non-empty.
    pub targets: Vec<Address>,
    pub values: Vec<u128>,
    pub calldatas: Vec<Vec<u8>>,
    pub title: String,
    pub description: String,
    pub create_block: BlockNumber,
    /// `create_block + voting_delay`.
    pub start_block: BlockNumber,
    /// `start_block + voting_period`.
    pub end_block: BlockNumber,
    pub canceled: bool,
    pub executed: bool,
    /// Execution-ready timestamp; epoch (zero) until queued.
    pub eta: Timestamp,
}

impl Proposal {
    /// Whether the proposal has been queued into the timelock.
    pub fn is_queued(&self) -> bool {
        !self.eta.is_epoch()
    }

    /// Number of actions in the batch.
    pub fn action_count(&self) -> usize {
        self.targets.len()
    }
}
