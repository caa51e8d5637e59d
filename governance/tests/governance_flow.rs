//! Integration tests exercising the full governance pipeline:
//! propose → approve → vote → succeed/defeat → queue → execute,
//! wired against the real vote token, timelock, and call dispatcher.

use agora_governance::{
    GovernanceCall, GovernanceEngine, GovernanceError, GovernanceParams, ProposalState,
    RecordingDispatcher,
};
use agora_nullables::NullChainClock;
use agora_timelock::{Timelock, TimelockExecutor};
use agora_token::VoteToken;
use agora_types::{Address, VoteWeight};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MIN_DELAY_SECS: u64 = 3600;
const SECS_PER_BLOCK: u64 = 12;

type Engine = GovernanceEngine<VoteToken, Timelock, RecordingDispatcher>;

fn addr(n: u8) -> Address {
    Address::new(format!("agr_{:0>60}", n))
}

fn gov_address() -> Address {
    Address::new("agr_governance")
}

fn owner() -> Address {
    addr(0)
}

fn maintainer() -> Address {
    addr(1)
}

struct Fixture {
    engine: Engine,
    clock: NullChainClock,
}

impl Fixture {
    fn new() -> Self {
        let token = VoteToken::new(owner());
        let mut timelock = Timelock::new(MIN_DELAY_SECS, gov_address());
        timelock.grant_proposer(gov_address());
        timelock.grant_executor(gov_address());
        let engine = GovernanceEngine::new(
            gov_address(),
            GovernanceParams::default(),
            [maintainer()],
            token,
            timelock,
            RecordingDispatcher::new(),
        )
        .expect("valid default params");
        Self {
            engine,
            clock: NullChainClock::new(100, 100_000, SECS_PER_BLOCK),
        }
    }

    fn fund(&mut self, who: &Address, amount: u128) {
        let minter = owner();
        let block = self.clock.now().block;
        self.engine
            .power_mut()
            .mint(&minter, who, VoteWeight::new(amount), block)
            .expect("mint");
        // A snapshot at the preceding block must already see the grant.
        self.clock.advance_blocks(1);
    }

    fn propose(&mut self, proposer: &Address, tag: u8) -> u64 {
        self.engine
            .propose(
                proposer,
                vec![addr(200)],
                vec![0],
                vec![vec![tag]],
                format!("action {tag}"),
                self.clock.now(),
            )
            .expect("propose")
    }

    fn propose_calls(
        &mut self,
        proposer: &Address,
        targets: Vec<Address>,
        calldatas: Vec<Vec<u8>>,
        description: &str,
    ) -> u64 {
        let values = vec![0; targets.len()];
        self.engine
            .propose(
                proposer,
                targets,
                values,
                calldatas,
                description.to_string(),
                self.clock.now(),
            )
            .expect("propose")
    }

    fn approve(&mut self, id: u64) {
        self.engine
            .approve_proposal(&maintainer(), id, self.clock.now())
            .expect("approve");
    }

    fn vote(&mut self, voter: &Address, id: u64, support: u8) -> VoteWeight {
        self.engine
            .vote(voter, id, support, String::new(), self.clock.now())
            .expect("vote")
    }

    fn state(&self, id: u64) -> ProposalState {
        self.engine
            .state_by_id(id, self.clock.now())
            .expect("state")
    }

    /// Advance past the proposal's voting window.
    fn close_voting(&mut self, id: u64) {
        let end = self
            .engine
            .get_proposal_all_info(id, self.clock.now())
            .expect("info")
            .proposal
            .end_block;
        let now = self.clock.now().block.height();
        self.clock.advance_blocks(end.height() - now + 1);
    }
}

/// Propose, approve, and carry a proposal to Succeeded with one For vote.
fn succeeded_proposal(fix: &mut Fixture, proposer: &Address, tag: u8) -> u64 {
    let id = fix.propose(proposer, tag);
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(proposer, id, 1);
    fix.close_voting(id);
    assert_eq!(fix.state(id), ProposalState::Succeeded);
    id
}

// ---------------------------------------------------------------------------
// 1. Lifecycle timing invariants
// ---------------------------------------------------------------------------

#[test]
fn proposal_timing_fields_follow_parameters() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);

    let create_block = fix.clock.now().block;
    let id = fix.propose(&proposer, 1);
    let info = fix
        .engine
        .get_proposal_all_info(id, fix.clock.now())
        .unwrap();

    let params = fix.engine.params();
    assert_eq!(info.proposal.create_block, create_block);
    assert_eq!(
        info.proposal.start_block,
        create_block.offset(params.voting_delay)
    );
    assert_eq!(
        info.proposal.end_block,
        info.proposal.start_block.offset(params.voting_period)
    );
    assert!(info.proposal.start_block < info.proposal.end_block);
    assert_eq!(info.state, ProposalState::Pending);
}

// ---------------------------------------------------------------------------
// 2. Proposer threshold scenario
// ---------------------------------------------------------------------------

#[test]
fn underfunded_proposer_rejected_until_granted_and_self_delegated() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 500);

    let result = fix.engine.propose(
        &proposer,
        vec![addr(200)],
        vec![0],
        vec![vec![1]],
        "d".into(),
        fix.clock.now(),
    );
    match result.unwrap_err() {
        GovernanceError::InsufficientProposerVotes { have, need } => {
            assert_eq!(have, 500);
            assert_eq!(need, 1000);
        }
        other => panic!("expected InsufficientProposerVotes, got {other:?}"),
    }
    assert_eq!(fix.engine.proposal_count(), 0);

    // Top up past the threshold and (re-)delegate to self.
    fix.fund(&proposer, 500);
    let block = fix.clock.now().block;
    fix.engine
        .power_mut()
        .delegate(&proposer, &proposer, block)
        .unwrap();
    fix.clock.advance_blocks(1);

    let id = fix.propose(&proposer, 1);
    assert_eq!(fix.engine.proposal_count(), 1);
    assert_eq!(fix.engine.latest_proposal_id(), Some(id));
}

// ---------------------------------------------------------------------------
// 3. Approval gate
// ---------------------------------------------------------------------------

#[test]
fn pending_to_active_needs_exactly_one_maintainer_approval() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);

    assert_eq!(fix.state(id), ProposalState::Pending);
    fix.approve(id);
    assert_eq!(fix.state(id), ProposalState::Active);

    let (approvers, approved) = fix.engine.get_proposal_approval_flow(id).unwrap();
    assert_eq!(approvers, vec![maintainer()]);
    assert!(approved);

    // Second approval attempt after activation is rejected.
    let result = fix
        .engine
        .approve_proposal(&maintainer(), id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::UnexpectedProposalState { .. })
    ));
}

#[test]
fn unapproved_proposal_defeats_after_the_window() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);

    fix.close_voting(id);
    assert_eq!(fix.state(id), ProposalState::Defeated);

    // Too late for approval now.
    let result = fix
        .engine
        .approve_proposal(&maintainer(), id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::UnexpectedProposalState { .. })
    ));
}

// ---------------------------------------------------------------------------
// 4. Voting and tallies
// ---------------------------------------------------------------------------

#[test]
fn tally_totals_match_receipts_across_mixed_votes() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    let against = addr(3);
    let abstainer = addr(4);
    fix.fund(&proposer, 5100);
    fix.fund(&against, 3000);
    fix.fund(&abstainer, 1900);

    let id = fix.propose(&proposer, 1);
    fix.approve(id);
    fix.clock.advance_blocks(1);

    fix.vote(&proposer, id, 1);
    fix.vote(&against, id, 0);
    fix.vote(&abstainer, id, 2);

    let totals = fix.engine.proposal_votes(id).unwrap();
    assert_eq!(totals.for_votes, VoteWeight::new(5100));
    assert_eq!(totals.against_votes, VoteWeight::new(3000));
    assert_eq!(totals.abstain_votes, VoteWeight::new(1900));

    let voters = fix.engine.proposal_voters(id).unwrap();
    assert_eq!(voters, vec![proposer.clone(), against, abstainer]);
    let receipt_sum: u128 = voters
        .iter()
        .map(|v| {
            fix.engine
                .proposal_voter_weight(id, v)
                .unwrap()
                .unwrap()
                .raw()
        })
        .sum();
    assert_eq!(totals.participation().unwrap().raw(), receipt_sum);

    // Supply 10000, participation 10000, approval 5100/8100 = 63% >= 50%.
    fix.close_voting(id);
    assert_eq!(fix.state(id), ProposalState::Succeeded);
}

#[test]
fn zero_votes_resolves_to_defeated() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);
    fix.approve(id);
    fix.close_voting(id);
    assert_eq!(fix.state(id), ProposalState::Defeated);
}

#[test]
fn quorum_shortfall_defeats_a_winning_ratio() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    let whale = addr(3);
    fix.fund(&proposer, 1000);
    // Whale never votes: supply 11000, quorum 30% needs 3300 participating.
    fix.fund(&whale, 10_000);

    let id = fix.propose(&proposer, 1);
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(&proposer, id, 1);
    fix.close_voting(id);
    assert_eq!(fix.state(id), ProposalState::Defeated);
}

#[test]
fn double_vote_rejected_and_tally_unchanged() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(&proposer, id, 1);

    let before = fix.engine.proposal_votes(id).unwrap();
    let result = fix
        .engine
        .vote(&proposer, id, 0, String::new(), fix.clock.now());
    assert!(matches!(result, Err(GovernanceError::AlreadyCastVote(_))));
    assert_eq!(fix.engine.proposal_votes(id).unwrap(), before);
}

// ---------------------------------------------------------------------------
// 5. Queue / execute round-trip
// ---------------------------------------------------------------------------

#[test]
fn execute_fails_until_timelock_delay_elapses_then_succeeds_once() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = succeeded_proposal(&mut fix, &proposer, 1);

    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");
    assert_eq!(fix.state(id), ProposalState::Queued);

    // Same block, before the minimum delay: not ready.
    let result = fix
        .engine
        .execute_by_id(&proposer, id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::UnexpectedProposalState { .. })
    ));
    assert_eq!(fix.state(id), ProposalState::Queued);

    fix.clock.advance_secs(MIN_DELAY_SECS);
    fix.engine
        .execute_by_id(&proposer, id, fix.clock.now())
        .expect("execute");
    assert_eq!(fix.state(id), ProposalState::Executed);

    // Exactly once: the repeat fails because state is now Executed.
    let result = fix
        .engine
        .execute_by_id(&proposer, id, fix.clock.now());
    match result.unwrap_err() {
        GovernanceError::UnexpectedProposalState { actual, .. } => {
            assert_eq!(actual, ProposalState::Executed);
        }
        other => panic!("expected UnexpectedProposalState, got {other:?}"),
    }
}

#[test]
fn external_batch_revert_aborts_and_proposal_stays_queued() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);

    let bad_target = addr(66);
    let id = fix.propose_calls(
        &proposer,
        vec![addr(200), bad_target.clone()],
        vec![vec![1], vec![2]],
        "one good call, one reverting call",
    );
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(&proposer, id, 1);
    fix.close_voting(id);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");
    fix.clock.advance_secs(MIN_DELAY_SECS);

    // Make the second call revert; all-or-nothing dispatch must abort.
    fix.engine.dispatcher_mut().revert_on(bad_target);
    let result = fix.engine.execute_by_id(&proposer, id, fix.clock.now());
    assert!(matches!(result, Err(GovernanceError::CallFailed(_))));
    assert_eq!(fix.state(id), ProposalState::Queued);
    assert!(fix.engine.dispatcher().committed().is_empty());
}

#[test]
fn missing_executor_role_fails_before_any_external_dispatch() {
    let token = VoteToken::new(owner());
    let mut timelock = Timelock::new(MIN_DELAY_SECS, gov_address());
    timelock.grant_proposer(gov_address());
    // Executor role deliberately not granted.
    let engine = GovernanceEngine::new(
        gov_address(),
        GovernanceParams::default(),
        [maintainer()],
        token,
        timelock,
        RecordingDispatcher::new(),
    )
    .expect("valid default params");
    let mut fix = Fixture {
        engine,
        clock: NullChainClock::new(100, 100_000, SECS_PER_BLOCK),
    };
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = succeeded_proposal(&mut fix, &proposer, 1);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");
    fix.clock.advance_secs(MIN_DELAY_SECS);

    let result = fix.engine.execute_by_id(&proposer, id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::Unauthorized {
            capability: "timelock executor",
            ..
        })
    ));
    // The role check fires before dispatch: nothing committed, proposal
    // still Queued and cleanly retryable.
    assert!(fix.engine.dispatcher().committed().is_empty());
    assert_eq!(fix.state(id), ProposalState::Queued);

    // Once the role is granted the retry dispatches the batch exactly once.
    fix.engine.timelock_mut().grant_executor(gov_address());
    fix.engine
        .execute_by_id(&proposer, id, fix.clock.now())
        .expect("execute");
    assert_eq!(fix.state(id), ProposalState::Executed);
    assert_eq!(fix.engine.dispatcher().committed().len(), 1);
}

#[test]
fn queued_proposal_expires_after_the_grace_window() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = succeeded_proposal(&mut fix, &proposer, 1);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");

    let grace = fix.engine.params().timelock_grace_period;
    fix.clock.advance_secs(MIN_DELAY_SECS + grace + 1);
    assert_eq!(fix.state(id), ProposalState::Expired);

    let result = fix
        .engine
        .execute_by_id(&proposer, id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::UnexpectedProposalState { .. })
    ));
}

#[test]
fn queue_requires_succeeded_state() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);

    let result = fix.engine.queue_by_id(id, fix.clock.now());
    match result.unwrap_err() {
        GovernanceError::UnexpectedProposalState { actual, allowed, .. } => {
            assert_eq!(actual, ProposalState::Pending);
            assert_eq!(allowed, ProposalState::Succeeded.mask());
        }
        other => panic!("expected UnexpectedProposalState, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 6. Governance-of-governance: parameter changes via self-targeting proposals
// ---------------------------------------------------------------------------

#[test]
fn parameter_change_lands_only_through_executed_proposal() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);

    let calldata = GovernanceCall::SetVotingPeriod(50).encode().unwrap();
    let id = fix.propose_calls(
        &proposer,
        vec![gov_address()],
        vec![calldata],
        "shorten the voting period",
    );
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(&proposer, id, 1);
    fix.close_voting(id);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");

    // Nothing changed while merely queued.
    assert_eq!(fix.engine.params().voting_period, 100);

    fix.clock.advance_secs(MIN_DELAY_SECS);
    fix.engine
        .execute_by_id(&proposer, id, fix.clock.now())
        .expect("execute");
    assert_eq!(fix.engine.params().voting_period, 50);
    // Self-calls never reach the external dispatcher.
    assert!(fix.engine.dispatcher().committed().is_empty());
}

#[test]
fn invalid_parameter_payload_aborts_execution_entirely() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);

    let calldata = GovernanceCall::SetVoteSuccessThreshold(150).encode().unwrap();
    let id = fix.propose_calls(
        &proposer,
        vec![gov_address()],
        vec![calldata],
        "threshold beyond 100 percent",
    );
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(&proposer, id, 1);
    fix.close_voting(id);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");
    fix.clock.advance_secs(MIN_DELAY_SECS);

    let result = fix.engine.execute_by_id(&proposer, id, fix.clock.now());
    assert!(matches!(result, Err(GovernanceError::InvalidParameter(_))));
    assert_eq!(fix.state(id), ProposalState::Queued);
    assert_eq!(fix.engine.params().vote_success_threshold, 50);
}

#[test]
fn update_timelock_changes_the_minimum_delay() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);

    let calldata = GovernanceCall::UpdateTimelock {
        min_delay_secs: 7200,
    }
    .encode()
    .unwrap();
    let id = fix.propose_calls(
        &proposer,
        vec![gov_address()],
        vec![calldata],
        "double the timelock delay",
    );
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.vote(&proposer, id, 1);
    fix.close_voting(id);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");
    fix.clock.advance_secs(MIN_DELAY_SECS);
    fix.engine
        .execute_by_id(&proposer, id, fix.clock.now())
        .expect("execute");

    assert_eq!(fix.engine.timelock().min_delay(), 7200);
}

// ---------------------------------------------------------------------------
// 7. Cancellation paths
// ---------------------------------------------------------------------------

#[test]
fn emergency_shutdown_cancels_a_queued_proposal_and_its_operation() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = succeeded_proposal(&mut fix, &proposer, 1);
    fix.engine.queue_by_id(id, fix.clock.now()).expect("queue");

    fix.engine
        .emergency_shutdown_proposal(&maintainer(), id, fix.clock.now())
        .expect("shutdown");
    assert_eq!(fix.state(id), ProposalState::Canceled);

    // Even past the delay, the batch can never fire.
    fix.clock.advance_secs(MIN_DELAY_SECS);
    let result = fix
        .engine
        .execute_by_id(&proposer, id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::UnexpectedProposalState { .. })
    ));
}

#[test]
fn emergency_shutdown_requires_maintainer() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);

    let result = fix
        .engine
        .emergency_shutdown_proposal(&proposer, id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::Unauthorized { .. })
    ));
}

#[test]
fn cancel_after_voting_window_is_rejected() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = succeeded_proposal(&mut fix, &proposer, 1);

    // Succeeded is outside the Pending/Active cancel window.
    let result = fix.engine.cancel_by_id(&maintainer(), id, fix.clock.now());
    assert!(matches!(
        result,
        Err(GovernanceError::UnexpectedProposalState { .. })
    ));
}

// ---------------------------------------------------------------------------
// 8. Read surface
// ---------------------------------------------------------------------------

#[test]
fn pagination_is_stable_and_empty_past_the_end() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    for tag in 0..5 {
        fix.propose(&proposer, tag);
        fix.clock.advance_blocks(1);
    }

    let now = fix.clock.now();
    let first: Vec<u64> = fix
        .engine
        .get_proposal_info_page(0, 2, now)
        .iter()
        .map(|i| i.proposal.id)
        .collect();
    let second: Vec<u64> = fix
        .engine
        .get_proposal_info_page(2, 2, now)
        .iter()
        .map(|i| i.proposal.id)
        .collect();
    let third: Vec<u64> = fix
        .engine
        .get_proposal_info_page(4, 2, now)
        .iter()
        .map(|i| i.proposal.id)
        .collect();
    assert_eq!(first, vec![1, 2]);
    assert_eq!(second, vec![3, 4]);
    assert_eq!(third, vec![5]);

    assert!(fix.engine.get_proposal_info_page(5, 2, now).is_empty());
    assert!(fix.engine.get_proposal_info_page(999, 2, now).is_empty());
}

#[test]
fn state_is_reachable_by_content_hash() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);
    let hash = fix
        .engine
        .get_proposal_all_info(id, fix.clock.now())
        .unwrap()
        .proposal
        .content_hash;

    assert_eq!(
        fix.engine.state(hash, fix.clock.now()).unwrap(),
        ProposalState::Pending
    );
}

#[test]
fn vote_reason_is_preserved_on_the_receipt() {
    let mut fix = Fixture::new();
    let proposer = addr(2);
    fix.fund(&proposer, 1000);
    let id = fix.propose(&proposer, 1);
    fix.approve(id);
    fix.clock.advance_blocks(1);
    fix.engine
        .vote(
            &proposer,
            id,
            1,
            "strongly in favor".into(),
            fix.clock.now(),
        )
        .expect("vote");

    let receipt = fix.engine.get_receipt(id, &proposer).unwrap().unwrap();
    assert_eq!(receipt.reason, "strongly in favor");
}
