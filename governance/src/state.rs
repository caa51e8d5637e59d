//! Pure state derivation for proposals.
//!
//! State is computed on read from stored facts — never persisted — so a
//! stored enum can never drift from the time-derived truth.

use agora_types::{ChainTime, VoteWeight};

use crate::params::GovernanceParams;
use crate::proposal::{Proposal, ProposalState};
use crate::tally::TallyTotals;

/// Derive the current lifecycle state of a proposal.
///
/// Inputs are the immutable record, the vote totals, the approval flag, the
/// total-supply snapshot at `end_block`, and the ledger's current
/// block/timestamp. Precedence: terminal flags first, then the queue path,
/// then the approval/voting timeline.
pub fn derive_state(
    proposal: &Proposal,
    totals: &TallyTotals,
    approved: bool,
    total_supply: VoteWeight,
    params: &GovernanceParams,
    at: ChainTime,
) -> ProposalState {
    if proposal.canceled {
        return ProposalState::Canceled;
    }
    if proposal.executed {
        return ProposalState::Executed;
    }
    if proposal.is_queued() {
        // Queueing implies the vote already succeeded; only the grace window
        // matters from here.
        if proposal
            .eta
            .has_elapsed(params.timelock_grace_period.saturating_add(1), at.timestamp)
        {
            return ProposalState::Expired;
        }
        return ProposalState::Queued;
    }
    if !approved {
        // Approval may still arrive any time up to the end of the voting
        // window; past it, an unapproved proposal can only be defeated.
        if at.block <= proposal.end_block {
            return ProposalState::Pending;
        }
        return ProposalState::Defeated;
    }
    if at.block <= proposal.end_block {
        return ProposalState::Active;
    }
    if is_vote_successful(totals, total_supply, params) {
        ProposalState::Succeeded
    } else {
        ProposalState::Defeated
    }
}

/// The pluggable success condition over a final tally.
///
/// Requires BOTH participation quorum and approval ratio, via division-free
/// cross-multiplication (no rounding bias):
///   (for + against + abstain) * quorum_denominator >= supply * quorum_numerator
///   for * 100 >= (for + against) * vote_success_threshold
///
/// Zero votes cast fails both by definition, as does any comparison whose
/// cross-multiplication overflows u128 (it cannot be evaluated exactly).
pub fn is_vote_successful(
    totals: &TallyTotals,
    total_supply: VoteWeight,
    params: &GovernanceParams,
) -> bool {
    let participation = match totals.participation() {
        Some(p) => p,
        None => return false,
    };
    if participation.is_zero() {
        return false;
    }

    // Overflow fails closed: saturating both sides to the u128 cap would let
    // them compare equal and spuriously pass.
    let quorum_met = match (
        participation.checked_mul(params.quorum_denominator),
        total_supply.checked_mul(params.quorum_numerator),
    ) {
        (Some(votes), Some(required)) => votes >= required,
        _ => false,
    };
    if !quorum_met {
        return false;
    }

    // `participation` did not overflow, so neither does this sum.
    let decisive = totals.for_votes + totals.against_votes;
    match (
        totals.for_votes.checked_mul(100),
        decisive.checked_mul(params.vote_success_threshold as u128),
    ) {
        (Some(weighted_for), Some(required)) => weighted_for >= required,
        _ => false,
    }
}
