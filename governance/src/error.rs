use crate::proposal::ProposalState;
use agora_timelock::TimelockError;
use thiserror::Error;

use crate::dispatch::DispatchError;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("caller {caller} lacks the {capability} capability")]
    Unauthorized {
        caller: String,
        capability: &'static str,
    },

    #[error(
        "proposal {hash} is in state {actual:?}, expected one of mask {allowed:#010b}"
    )]
    UnexpectedProposalState {
        hash: String,
        actual: ProposalState,
        allowed: u8,
    },

    #[error("voter {0} has already cast a vote on this proposal")]
    AlreadyCastVote(String),

    #[error("invalid vote type {0}, expected 0 (against), 1 (for), or 2 (abstain)")]
    InvalidVoteType(u8),

    #[error("proposer votes {have} below the proposal threshold {need}")]
    InsufficientProposerVotes { have: u128, need: u128 },

    #[error(
        "invalid proposal action lengths: {targets} targets, {values} values, {calldatas} calldatas"
    )]
    InvalidProposalLength {
        targets: usize,
        values: usize,
        calldatas: usize,
    },

    #[error("proposal {0} not found")]
    ProposalNotFound(String),

    #[error("maintainer {approver} already approved proposal {proposal}")]
    DuplicateApproval { proposal: u64, approver: String },

    #[error("invalid governance parameter: {0}")]
    InvalidParameter(String),

    #[error("undecodable governance calldata: {0}")]
    InvalidCalldata(String),

    #[error("arithmetic overflow in vote bookkeeping")]
    Overflow,

    #[error("timelock error: {0}")]
    Timelock(#[from] TimelockError),

    #[error(transparent)]
    CallFailed(#[from] DispatchError),
}
