//! Governance parameters and the self-targeting calls that change them.
//!
//! Parameters are shared mutable configuration whose ONLY sanctioned mutator
//! is the proposal-execution path: a proposal targets the governance module's
//! own address with a bincode-encoded [`GovernanceCall`], and the change lands
//! when that proposal executes. No direct external setter exists.

use agora_types::VoteWeight;
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Process-wide governance configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Minimum proposer voting power (absolute weight, sampled at the block
    /// preceding proposal creation).
    pub proposal_threshold: VoteWeight,
    /// Blocks between proposal creation and the start of voting.
    pub voting_delay: u64,
    /// Blocks the voting window stays open.
    pub voting_period: u64,
    /// Quorum fraction: participation must satisfy
    /// `votes * denominator >= supply * numerator`.
    pub quorum_numerator: u128,
    pub quorum_denominator: u128,
    /// Required for/(for+against) percentage, in [0, 100].
    pub vote_success_threshold: u8,
    /// Maintainer approvals required to activate voting. The shipped default
    /// of 1 gives the single-admission gate.
    pub approve_threshold: u32,
    /// Seconds past `eta` during which a queued proposal may still execute.
    pub timelock_grace_period: u64,
    /// First proposal id handed out.
    pub proposal_id_floor: u64,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            proposal_threshold: VoteWeight::new(1000),
            voting_delay: 10,
            voting_period: 100,
            quorum_numerator: 30,
            quorum_denominator: 100,
            vote_success_threshold: 50,
            approve_threshold: 1,
            timelock_grace_period: 14 * 24 * 3600,
            proposal_id_floor: 1,
        }
    }
}

impl GovernanceParams {
    /// Check every invariant; all setters funnel through this.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.vote_success_threshold > 100 {
            return Err(GovernanceError::InvalidParameter(format!(
                "vote_success_threshold {} exceeds 100",
                self.vote_success_threshold
            )));
        }
        if self.quorum_denominator == 0 {
            return Err(GovernanceError::InvalidParameter(
                "quorum_denominator must be positive".into(),
            ));
        }
        if self.quorum_numerator > self.quorum_denominator {
            return Err(GovernanceError::InvalidParameter(format!(
                "quorum {}/{} exceeds 1",
                self.quorum_numerator, self.quorum_denominator
            )));
        }
        if self.approve_threshold == 0 {
            return Err(GovernanceError::InvalidParameter(
                "approve_threshold must be at least 1".into(),
            ));
        }
        if self.voting_period == 0 {
            return Err(GovernanceError::InvalidParameter(
                "voting_period must be at least 1 block".into(),
            ));
        }
        Ok(())
    }
}

/// A parameter change executed through a self-targeting proposal.
///
/// Encoded with bincode as the calldata of an action whose target is the
/// governance module's own address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceCall {
    SetProposalThreshold(u128),
    SetVoteSuccessThreshold(u8),
    UpdateQuorumNumerator(u128),
    SetVotingDelay(u64),
    SetVotingPeriod(u64),
    /// Change the timelock's minimum schedule-to-execute delay.
    UpdateTimelock { min_delay_secs: u64 },
}

impl GovernanceCall {
    /// Encode as calldata bytes.
    pub fn encode(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(self).map_err(|e| GovernanceError::InvalidCalldata(e.to_string()))
    }

    /// Decode calldata bytes targeting the governance module.
    pub fn decode(calldata: &[u8]) -> Result<Self, GovernanceError> {
        bincode::deserialize(calldata).map_err(|e| GovernanceError::InvalidCalldata(e.to_string()))
    }

    /// Apply this call to a parameter set. Callers validate the result before
    /// committing it.
    pub fn apply(&self, params: &mut GovernanceParams) {
        match self {
            Self::SetProposalThreshold(raw) => params.proposal_threshold = VoteWeight::new(*raw),
            Self::SetVoteSuccessThreshold(pct) => params.vote_success_threshold = *pct,
            Self::UpdateQuorumNumerator(num) => params.quorum_numerator = *num,
            Self::SetVotingDelay(blocks) => params.voting_delay = *blocks,
            Self::SetVotingPeriod(blocks) => params.voting_period = *blocks,
            Self::UpdateTimelock { .. } => {}
        }
    }
}
