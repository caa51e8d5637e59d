//! Per-proposal vote bookkeeping.
//!
//! Weight is snapshotted at the block the vote transaction executes, not at
//! proposal creation: a voter's power may float during the voting window and
//! each receipt reflects power at its own vote time. Each address votes at
//! most once per proposal.

use std::collections::HashMap;

use agora_types::{Address, BlockNumber, VoteWeight};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::proposal::VoteSupport;

/// One voter's recorded vote on one proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub support: VoteSupport,
    /// Power at the block the vote was cast.
    pub weight: VoteWeight,
    /// The block the vote was recorded.
    pub block: BlockNumber,
    pub reason: String,
}

/// Monotonically increasing per-proposal accumulators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyTotals {
    pub for_votes: VoteWeight,
    pub against_votes: VoteWeight,
    pub abstain_votes: VoteWeight,
}

impl TallyTotals {
    /// Total participation across all three buckets.
    pub fn participation(&self) -> Option<VoteWeight> {
        self.for_votes
            .checked_add(self.against_votes)?
            .checked_add(self.abstain_votes)
    }
}

/// Authoritative per-proposal vote accumulator and receipt store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoteTally {
    receipts: HashMap<u64, HashMap<Address, VoteReceipt>>,
    /// Distinct voters per proposal, in insertion order, for enumeration.
    voters: HashMap<u64, Vec<Address>>,
    totals: HashMap<u64, TallyTotals>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a first vote from `voter` on `proposal_id`.
    ///
    /// Fails with `AlreadyCastVote` if a receipt exists; the failed attempt
    /// leaves totals and the voter list untouched.
    pub fn cast_vote(
        &mut self,
        proposal_id: u64,
        voter: &Address,
        support: VoteSupport,
        weight: VoteWeight,
        block: BlockNumber,
        reason: String,
    ) -> Result<(), GovernanceError> {
        let proposal_receipts = self.receipts.entry(proposal_id).or_default();
        if proposal_receipts.contains_key(voter) {
            return Err(GovernanceError::AlreadyCastVote(voter.to_string()));
        }

        let mut totals = self.totals.get(&proposal_id).copied().unwrap_or_default();
        let bucket = match support {
            VoteSupport::For => &mut totals.for_votes,
            VoteSupport::Against => &mut totals.against_votes,
            VoteSupport::Abstain => &mut totals.abstain_votes,
        };
        *bucket = bucket.checked_add(weight).ok_or(GovernanceError::Overflow)?;

        proposal_receipts.insert(
            voter.clone(),
            VoteReceipt {
                support,
                weight,
                block,
                reason,
            },
        );
        self.voters.entry(proposal_id).or_default().push(voter.clone());
        self.totals.insert(proposal_id, totals);
        Ok(())
    }

    pub fn has_voted(&self, proposal_id: u64, voter: &Address) -> bool {
        self.receipts
            .get(&proposal_id)
            .map(|r| r.contains_key(voter))
            .unwrap_or(false)
    }

    pub fn receipt(&self, proposal_id: u64, voter: &Address) -> Option<&VoteReceipt> {
        self.receipts.get(&proposal_id)?.get(voter)
    }

    pub fn totals(&self, proposal_id: u64) -> TallyTotals {
        self.totals.get(&proposal_id).copied().unwrap_or_default()
    }

    /// Distinct voters in the order their votes were recorded.
    pub fn voters(&self, proposal_id: u64) -> &[Address] {
        self.voters
            .get(&proposal_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
