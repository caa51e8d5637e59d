//! The vote token — owner-gated minting, transfers, and delegation, with
//! checkpointed historical lookups.

use std::collections::HashMap;

use crate::checkpoint::CheckpointHistory;
use crate::error::TokenError;
use agora_types::{Address, BlockNumber, VoteWeight};
use serde::{Deserialize, Serialize};

/// Read side consumed by governance: weighted power and supply, by block.
pub trait VotePowerSource {
    /// Weighted voting power of `addr` as of `block`.
    fn votes_at(&self, addr: &Address, block: BlockNumber) -> VoteWeight;

    /// Total token supply as of `block`.
    fn total_supply_at(&self, block: BlockNumber) -> VoteWeight;
}

/// An in-memory vote token with block-indexed checkpoints.
///
/// Every holder is self-delegated by default, so an undelegated balance
/// still counts as voting power. `delegate` redirects the holder's entire
/// balance to a representative; the representative's checkpointed power
/// moves with every mint/transfer of the delegator's balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteToken {
    /// Holder of the mint capability.
    owner: Address,
    /// Current balances (checkpointed power lives in `vote_history`).
    balances: HashMap<Address, VoteWeight>,
    /// Explicit delegations; an absent entry means self-delegation.
    delegates: HashMap<Address, Address>,
    /// Per-delegate voting-power history.
    vote_history: HashMap<Address, CheckpointHistory>,
    /// Total-supply history.
    supply_history: CheckpointHistory,
}

impl VoteToken {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            balances: HashMap::new(),
            delegates: HashMap::new(),
            vote_history: HashMap::new(),
            supply_history: CheckpointHistory::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Current balance of `addr`.
    pub fn balance_of(&self, addr: &Address) -> VoteWeight {
        self.balances.get(addr).copied().unwrap_or(VoteWeight::ZERO)
    }

    /// Current total supply.
    pub fn total_supply(&self) -> VoteWeight {
        self.supply_history.latest()
    }

    /// The address `addr`'s balance currently counts toward.
    pub fn delegate_of(&self, addr: &Address) -> Address {
        self.delegates.get(addr).cloned().unwrap_or_else(|| addr.clone())
    }

    /// Mint `amount` to `to` as of `at`. Restricted to the owner role.
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: VoteWeight,
        at: BlockNumber,
    ) -> Result<(), TokenError> {
        if caller != &self.owner {
            return Err(TokenError::Unauthorized(caller.to_string()));
        }
        if amount.is_zero() {
            return Err(TokenError::ZeroAmount);
        }
        let balance = self.balance_of(to);
        let new_balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        let new_supply = self
            .supply_history
            .latest()
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert(to.clone(), new_balance);
        let delegate = self.delegate_of(to);
        self.add_power(&delegate, amount, at)?;
        self.supply_history.record(at, new_supply);
        Ok(())
    }

    /// Transfer `amount` from `from` to `to` as of `at`.
    ///
    /// Moves checkpointed power between the two holders' delegates, so a
    /// voter's recorded weight at an earlier block is unaffected.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: VoteWeight,
        at: BlockNumber,
    ) -> Result<(), TokenError> {
        if amount.is_zero() {
            return Err(TokenError::ZeroAmount);
        }
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                needed: amount.raw(),
                available: from_balance.raw(),
            });
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert(from.clone(), from_balance - amount);
        self.balances.insert(to.clone(), to_balance);

        let from_delegate = self.delegate_of(from);
        let to_delegate = self.delegate_of(to);
        if from_delegate != to_delegate {
            self.remove_power(&from_delegate, amount, at)?;
            self.add_power(&to_delegate, amount, at)?;
        }
        Ok(())
    }

    /// Redirect `who`'s balance-derived power to `to` as of `at`.
    ///
    /// Delegating to oneself restores the default. No-op if unchanged.
    pub fn delegate(
        &mut self,
        who: &Address,
        to: &Address,
        at: BlockNumber,
    ) -> Result<(), TokenError> {
        let old = self.delegate_of(who);
        if &old == to {
            return Ok(());
        }
        let moved = self.balance_of(who);
        if !moved.is_zero() {
            self.remove_power(&old, moved, at)?;
            self.add_power(to, moved, at)?;
        }
        if to == who {
            self.delegates.remove(who);
        } else {
            self.delegates.insert(who.clone(), to.clone());
        }
        Ok(())
    }

    fn add_power(
        &mut self,
        delegate: &Address,
        amount: VoteWeight,
        at: BlockNumber,
    ) -> Result<(), TokenError> {
        let history = self.vote_history.entry(delegate.clone()).or_default();
        let new = history
            .latest()
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        history.record(at, new);
        Ok(())
    }

    fn remove_power(
        &mut self,
        delegate: &Address,
        amount: VoteWeight,
        at: BlockNumber,
    ) -> Result<(), TokenError> {
        let history = self.vote_history.entry(delegate.clone()).or_default();
        let new = history
            .latest()
            .checked_sub(amount)
            .ok_or(TokenError::Overflow)?;
        history.record(at, new);
        Ok(())
    }
}

impl VotePowerSource for VoteToken {
    fn votes_at(&self, addr: &Address, block: BlockNumber) -> VoteWeight {
        self.vote_history
            .get(addr)
            .map(|h| h.value_at(block))
            .unwrap_or(VoteWeight::ZERO)
    }

    fn total_supply_at(&self, block: BlockNumber) -> VoteWeight {
        self.supply_history.value_at(block)
    }
}
