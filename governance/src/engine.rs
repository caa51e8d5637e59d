//! The governance engine — validates and applies every transition-inducing
//! call, and derives proposal state on read.
//!
//! Every mutating operation validates completely before touching state, so a
//! failed call leaves the engine byte-for-byte unchanged. The surrounding
//! ledger serializes calls globally and supplies `ChainTime`; there is no
//! intra-operation parallelism to defend against.

use agora_crypto::hash_operation;
use agora_timelock::TimelockExecutor;
use agora_token::VotePowerSource;
use agora_types::{Address, BlockNumber, ChainTime, OperationId, Timestamp, VoteWeight};
use serde::Serialize;

use crate::approval::ApprovalGate;
use crate::dispatch::{Call, CallDispatcher};
use crate::error::GovernanceError;
use crate::params::{GovernanceCall, GovernanceParams};
use crate::proposal::{Proposal, ProposalState, VoteSupport};
use crate::state::{derive_state, is_vote_successful};
use crate::store::ProposalStore;
use crate::tally::{TallyTotals, VoteReceipt, VoteTally};

/// A full read-side view of one proposal: the record plus everything derived
/// from it.
#[derive(Clone, Debug, Serialize)]
pub struct ProposalInfo {
    pub proposal: Proposal,
    pub state: ProposalState,
    pub totals: TallyTotals,
    pub approvers: Vec<Address>,
    pub approved: bool,
}

/// The proposal state machine and vote-tallying engine.
///
/// Generic over its three collaborators: the vote-power source, the timelock
/// executor, and the external-call dispatcher.
pub struct GovernanceEngine<P, T, D>
where
    P: VotePowerSource,
    T: TimelockExecutor,
    D: CallDispatcher,
{
    /// The engine's own ledger address. Proposals targeting it carry
    /// parameter changes; it also acts as the timelock proposer/executor.
    self_address: Address,
    params: GovernanceParams,
    store: ProposalStore,
    tally: VoteTally,
    approvals: ApprovalGate,
    power: P,
    timelock: T,
    dispatcher: D,
}

impl<P, T, D> GovernanceEngine<P, T, D>
where
    P: VotePowerSource,
    T: TimelockExecutor,
    D: CallDispatcher,
{
    pub fn new(
        self_address: Address,
        params: GovernanceParams,
        maintainers: impl IntoIterator<Item = Address>,
        power: P,
        timelock: T,
        dispatcher: D,
    ) -> Result<Self, GovernanceError> {
        params.validate()?;
        Ok(Self {
            self_address,
            store: ProposalStore::new(params.proposal_id_floor),
            params,
            tally: VoteTally::new(),
            approvals: ApprovalGate::new(maintainers),
            power,
            timelock,
            dispatcher,
        })
    }

    pub fn self_address(&self) -> &Address {
        &self.self_address
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    /// Mutable access to the vote-power source (mint/delegate/transfer are
    /// ledger operations outside governance's authority).
    pub fn power_mut(&mut self) -> &mut P {
        &mut self.power
    }

    pub fn timelock(&self) -> &T {
        &self.timelock
    }

    /// Mutable access to the timelock (role grants are a deployment concern
    /// outside governance's authority).
    pub fn timelock_mut(&mut self) -> &mut T {
        &mut self.timelock
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn add_maintainer(&mut self, addr: Address) {
        self.approvals.add_maintainer(addr);
    }

    pub fn is_maintainer(&self, addr: &Address) -> bool {
        self.approvals.is_maintainer(addr)
    }

    // ---- write surface -------------------------------------------------

    /// Submit a proposal with an empty title.
    pub fn propose(
        &mut self,
        proposer: &Address,
        targets: Vec<Address>,
        values: Vec<u128>,
        calldatas: Vec<Vec<u8>>,
        description: String,
        at: ChainTime,
    ) -> Result<u64, GovernanceError> {
        self.propose_with_title(
            proposer,
            String::new(),
            targets,
            values,
            calldatas,
            description,
            at,
        )
    }

    /// Submit a proposal.
    ///
    /// The proposer's weight is sampled at the immediately preceding block
    /// and must meet `proposal_threshold`. A proposal whose content hash
    /// matches a live (non-terminal) proposal is rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn propose_with_title(
        &mut self,
        proposer: &Address,
        title: String,
        targets: Vec<Address>,
        values: Vec<u128>,
        calldatas: Vec<Vec<u8>>,
        description: String,
        at: ChainTime,
    ) -> Result<u64, GovernanceError> {
        if targets.is_empty() || targets.len() != values.len() || targets.len() != calldatas.len()
        {
            return Err(GovernanceError::InvalidProposalLength {
                targets: targets.len(),
                values: values.len(),
                calldatas: calldatas.len(),
            });
        }

        let weight = self.power.votes_at(proposer, at.block.prev());
        if weight < self.params.proposal_threshold {
            return Err(GovernanceError::InsufficientProposerVotes {
                have: weight.raw(),
                need: self.params.proposal_threshold.raw(),
            });
        }

        let hash = ProposalStore::content_hash_for(&targets, &values, &calldatas, &description);
        if let Some(existing) = self.store.id_by_hash(hash) {
            let actual = self.state_of(self.store.get(existing)?, at);
            if !actual.is_terminal() {
                return Err(GovernanceError::UnexpectedProposalState {
                    hash: hash.to_string(),
                    actual,
                    allowed: ProposalState::mask_of(&[
                        ProposalState::Canceled,
                        ProposalState::Defeated,
                        ProposalState::Expired,
                        ProposalState::Executed,
                    ]),
                });
            }
        }

        let proposal = self.store.create(
            proposer.clone(),
            title,
            targets,
            values,
            calldatas,
            description,
            at.block,
            self.params.voting_delay,
            self.params.voting_period,
        )?;
        let id = proposal.id;
        tracing::info!(
            id,
            proposer = %proposer,
            hash = %proposal.content_hash,
            start = %proposal.start_block,
            end = %proposal.end_block,
            "proposal created"
        );
        Ok(id)
    }

    /// Record a maintainer approval. The proposal must be `Pending`; once
    /// enough approvals arrive the gate flips and voting opens.
    pub fn approve_proposal(
        &mut self,
        caller: &Address,
        id: u64,
        at: ChainTime,
    ) -> Result<(), GovernanceError> {
        self.require_maintainer(caller)?;
        self.require_state(id, &[ProposalState::Pending], at)?;
        let flipped = self
            .approvals
            .record_approval(id, caller, self.params.approve_threshold)?;
        tracing::info!(id, approver = %caller, activated = flipped, "proposal approved");
        Ok(())
    }

    /// Cancel a proposal that has not started executing. Maintainer-gated;
    /// allowed only while `Pending` or `Active`. Recorded votes become moot,
    /// not deleted.
    pub fn cancel_by_id(
        &mut self,
        caller: &Address,
        id: u64,
        at: ChainTime,
    ) -> Result<(), GovernanceError> {
        self.require_maintainer(caller)?;
        self.require_state(id, &[ProposalState::Pending, ProposalState::Active], at)?;
        self.store.get_mut(id)?.canceled = true;
        tracing::warn!(id, canceled_by = %caller, "proposal canceled");
        Ok(())
    }

    /// Maintainer-gated emergency cancellation, valid in any non-terminal
    /// state. A queued proposal's timelock operation is cancelled with it,
    /// so the batch can never fire.
    pub fn emergency_shutdown_proposal(
        &mut self,
        caller: &Address,
        id: u64,
        at: ChainTime,
    ) -> Result<(), GovernanceError> {
        self.require_maintainer(caller)?;
        let state = self.require_state(
            id,
            &[
                ProposalState::Pending,
                ProposalState::Active,
                ProposalState::Succeeded,
                ProposalState::Queued,
            ],
            at,
        )?;
        if state == ProposalState::Queued {
            let operation = self.operation_id(self.store.get(id)?);
            let gov = self.self_address.clone();
            self.timelock.cancel(&gov, operation)?;
        }
        self.store.get_mut(id)?.canceled = true;
        tracing::warn!(id, shutdown_by = %caller, from_state = ?state, "emergency shutdown");
        Ok(())
    }

    /// Cast a weighted vote. The proposal must be `Active`; weight is the
    /// voter's power at the block the vote executes. Returns the recorded
    /// weight.
    pub fn vote(
        &mut self,
        voter: &Address,
        id: u64,
        support: u8,
        reason: String,
        at: ChainTime,
    ) -> Result<VoteWeight, GovernanceError> {
        self.require_state(id, &[ProposalState::Active], at)?;
        let support = VoteSupport::try_from(support)?;
        let weight = self.power.votes_at(voter, at.block);
        self.tally
            .cast_vote(id, voter, support, weight, at.block, reason)?;
        tracing::info!(id, voter = %voter, support = ?support, weight = %weight, "vote cast");
        Ok(weight)
    }

    /// Queue a succeeded proposal into the timelock. Returns the `eta` at
    /// which execution becomes possible.
    pub fn queue_by_id(&mut self, id: u64, at: ChainTime) -> Result<Timestamp, GovernanceError> {
        self.require_state(id, &[ProposalState::Succeeded], at)?;

        let proposal = self.store.get(id)?;
        let targets = proposal.targets.clone();
        let values = proposal.values.clone();
        let calldatas = proposal.calldatas.clone();
        let salt = *proposal.content_hash.as_bytes();

        let delay = self.timelock.min_delay();
        let caller = self.self_address.clone();
        let (operation, eta) = self.timelock.schedule(
            &caller,
            &targets,
            &values,
            &calldatas,
            OperationId::ZERO,
            &salt,
            delay,
            at.timestamp,
        )?;

        self.store.get_mut(id)?.eta = eta;
        tracing::info!(id, operation = %operation, eta = %eta, "proposal queued");
        Ok(eta)
    }

    /// Execute a queued, ready proposal: dispatch external calls atomically,
    /// apply self-targeting parameter changes, and mark the record executed.
    pub fn execute_by_id(
        &mut self,
        caller: &Address,
        id: u64,
        at: ChainTime,
    ) -> Result<(), GovernanceError> {
        self.require_state(id, &[ProposalState::Queued], at)?;

        let proposal = self.store.get(id)?;
        let operation = self.operation_id(proposal);
        if !self.timelock.is_operation_ready(operation, at.timestamp) {
            return Err(GovernanceError::UnexpectedProposalState {
                hash: proposal.content_hash.to_string(),
                actual: ProposalState::Queued,
                allowed: ProposalState::Queued.mask(),
            });
        }

        // Phase 1: validate every action before any side effect. The executor
        // role must be held up front: external calls commit before the
        // timelock is told to execute, so a role failure there would leave the
        // batch dispatched with the proposal still Queued and retryable.
        // Self-calls must decode and leave the parameter set valid; an
        // UpdateTimelock call additionally needs the admin role.
        if !self.timelock.has_executor_role(&self.self_address) {
            return Err(GovernanceError::Unauthorized {
                caller: self.self_address.to_string(),
                capability: "timelock executor",
            });
        }
        let mut scratch = self.params.clone();
        let mut self_calls = Vec::new();
        let mut external = Vec::new();
        for i in 0..proposal.action_count() {
            if proposal.targets[i] == self.self_address {
                let call = GovernanceCall::decode(&proposal.calldatas[i])?;
                if matches!(call, GovernanceCall::UpdateTimelock { .. })
                    && !self.timelock.has_admin_role(&self.self_address)
                {
                    return Err(GovernanceError::Unauthorized {
                        caller: self.self_address.to_string(),
                        capability: "timelock admin",
                    });
                }
                call.apply(&mut scratch);
                self_calls.push(call);
            } else {
                external.push(Call {
                    target: proposal.targets[i].clone(),
                    value: proposal.values[i],
                    calldata: proposal.calldatas[i].clone(),
                });
            }
        }
        scratch.validate()?;

        // Phase 2: commit. The dispatcher's batch contract is all-or-nothing,
        // so a revert here aborts with no state change and the proposal
        // remains Queued.
        if !external.is_empty() {
            self.dispatcher.dispatch_batch(&external)?;
        }
        let gov = self.self_address.clone();
        self.timelock.execute(&gov, operation, at.timestamp)?;
        for call in &self_calls {
            if let GovernanceCall::UpdateTimelock { min_delay_secs } = call {
                // Role verified in phase 1.
                self.timelock.update_min_delay(&gov, *min_delay_secs)?;
            }
        }
        self.params = scratch;
        self.store.get_mut(id)?.executed = true;
        tracing::info!(id, executed_by = %caller, operation = %operation, "proposal executed");
        Ok(())
    }

    // ---- read surface --------------------------------------------------

    /// Current lifecycle state of a proposal, by id.
    pub fn state_by_id(&self, id: u64, at: ChainTime) -> Result<ProposalState, GovernanceError> {
        Ok(self.state_of(self.store.get(id)?, at))
    }

    /// Current lifecycle state of the latest proposal carrying `hash`.
    pub fn state(
        &self,
        hash: agora_types::ContentHash,
        at: ChainTime,
    ) -> Result<ProposalState, GovernanceError> {
        let id = self
            .store
            .id_by_hash(hash)
            .ok_or_else(|| GovernanceError::ProposalNotFound(hash.to_string()))?;
        self.state_by_id(id, at)
    }

    /// Everything about one proposal.
    pub fn get_proposal_all_info(
        &self,
        id: u64,
        at: ChainTime,
    ) -> Result<ProposalInfo, GovernanceError> {
        let proposal = self.store.get(id)?;
        let (approvers, approved) = self.approvals.approval_flow(id);
        Ok(ProposalInfo {
            state: self.state_of(proposal, at),
            totals: self.tally.totals(id),
            proposal: proposal.clone(),
            approvers,
            approved,
        })
    }

    /// A bounded, id-ordered page of proposal views. An offset past the end
    /// yields an empty page.
    pub fn get_proposal_info_page(&self, offset: u64, count: u64, at: ChainTime) -> Vec<ProposalInfo> {
        self.store
            .page(offset, count)
            .into_iter()
            .map(|proposal| {
                let (approvers, approved) = self.approvals.approval_flow(proposal.id);
                ProposalInfo {
                    state: self.state_of(proposal, at),
                    totals: self.tally.totals(proposal.id),
                    proposal: proposal.clone(),
                    approvers,
                    approved,
                }
            })
            .collect()
    }

    pub fn proposal_votes(&self, id: u64) -> Result<TallyTotals, GovernanceError> {
        self.store.get(id)?;
        Ok(self.tally.totals(id))
    }

    pub fn proposal_voters(&self, id: u64) -> Result<Vec<Address>, GovernanceError> {
        self.store.get(id)?;
        Ok(self.tally.voters(id).to_vec())
    }

    pub fn proposal_voter_weight(
        &self,
        id: u64,
        voter: &Address,
    ) -> Result<Option<VoteWeight>, GovernanceError> {
        self.store.get(id)?;
        Ok(self.tally.receipt(id, voter).map(|r| r.weight))
    }

    pub fn proposal_voter_block(
        &self,
        id: u64,
        voter: &Address,
    ) -> Result<Option<BlockNumber>, GovernanceError> {
        self.store.get(id)?;
        Ok(self.tally.receipt(id, voter).map(|r| r.block))
    }

    pub fn get_receipt(
        &self,
        id: u64,
        voter: &Address,
    ) -> Result<Option<&VoteReceipt>, GovernanceError> {
        self.store.get(id)?;
        Ok(self.tally.receipt(id, voter))
    }

    pub fn has_voted(&self, id: u64, voter: &Address) -> Result<bool, GovernanceError> {
        self.store.get(id)?;
        Ok(self.tally.has_voted(id, voter))
    }

    /// `(approvers, approved)` for a proposal.
    pub fn get_proposal_approval_flow(
        &self,
        id: u64,
    ) -> Result<(Vec<Address>, bool), GovernanceError> {
        self.store.get(id)?;
        Ok(self.approvals.approval_flow(id))
    }

    pub fn proposal_count(&self) -> u64 {
        self.store.count()
    }

    pub fn latest_proposal_id(&self) -> Option<u64> {
        self.store.latest_id()
    }

    /// Evaluate the success condition over an arbitrary tally, against the
    /// total supply at the current block.
    pub fn is_vote_successful(
        &self,
        for_votes: VoteWeight,
        against_votes: VoteWeight,
        abstain_votes: VoteWeight,
        at: ChainTime,
    ) -> bool {
        let totals = TallyTotals {
            for_votes,
            against_votes,
            abstain_votes,
        };
        is_vote_successful(&totals, self.power.total_supply_at(at.block), &self.params)
    }

    // ---- internals -----------------------------------------------------

    fn require_maintainer(&self, caller: &Address) -> Result<(), GovernanceError> {
        if self.approvals.is_maintainer(caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized {
                caller: caller.to_string(),
                capability: "maintainer",
            })
        }
    }

    /// Derive the proposal's current state from stored facts.
    fn state_of(&self, proposal: &Proposal, at: ChainTime) -> ProposalState {
        derive_state(
            proposal,
            &self.tally.totals(proposal.id),
            self.approvals.is_approved(proposal.id),
            self.power.total_supply_at(proposal.end_block),
            &self.params,
            at,
        )
    }

    fn require_state(
        &self,
        id: u64,
        allowed: &[ProposalState],
        at: ChainTime,
    ) -> Result<ProposalState, GovernanceError> {
        let proposal = self.store.get(id)?;
        let actual = self.state_of(proposal, at);
        if allowed.contains(&actual) {
            Ok(actual)
        } else {
            Err(GovernanceError::UnexpectedProposalState {
                hash: proposal.content_hash.to_string(),
                actual,
                allowed: ProposalState::mask_of(allowed),
            })
        }
    }

    /// The timelock operation identity of a proposal's batch. The content
    /// hash doubles as the scheduling salt, so re-proposals of identical
    /// content map to the same operation.
    fn operation_id(&self, proposal: &Proposal) -> OperationId {
        hash_operation(
            &proposal.targets,
            &proposal.values,
            &proposal.calldatas,
            OperationId::ZERO,
            proposal.content_hash.as_bytes(),
        )
    }
}
