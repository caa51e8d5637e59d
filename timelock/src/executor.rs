//! Operation scheduling with minimum-delay enforcement.

use std::collections::{HashMap, HashSet};

use crate::error::TimelockError;
use agora_crypto::hash_operation;
use agora_types::{Address, OperationId, Timestamp};
use serde::{Deserialize, Serialize};

/// The scheduling/execution contract governance consumes.
///
/// Implementations never dispatch the underlying calls — they only gate
/// *when* a batch may be dispatched. Call dispatch stays with the caller so
/// batch atomicity is decided in one place.
pub trait TimelockExecutor {
    /// Schedule a batch. Returns the operation id and its `eta` (the earliest
    /// timestamp at which it becomes ready).
    #[allow(clippy::too_many_arguments)]
    fn schedule(
        &mut self,
        caller: &Address,
        targets: &[Address],
        values: &[u128],
        calldatas: &[Vec<u8>],
        predecessor: OperationId,
        salt: &[u8; 32],
        delay_secs: u64,
        now: Timestamp,
    ) -> Result<(OperationId, Timestamp), TimelockError>;

    /// Whether the operation is scheduled, past its eta, unexecuted, and its
    /// predecessor (if any) is done.
    fn is_operation_ready(&self, id: OperationId, now: Timestamp) -> bool;

    /// Whether the operation has been executed.
    fn is_operation_done(&self, id: OperationId) -> bool;

    /// The eta of a scheduled operation.
    fn operation_eta(&self, id: OperationId) -> Option<Timestamp>;

    /// Mark a ready operation as executed.
    fn execute(&mut self, caller: &Address, id: OperationId, now: Timestamp)
        -> Result<(), TimelockError>;

    /// Drop a scheduled, unexecuted operation.
    fn cancel(&mut self, caller: &Address, id: OperationId) -> Result<(), TimelockError>;

    /// The minimum schedule-to-execute delay in seconds.
    fn min_delay(&self) -> u64;

    /// Whether `caller` may execute ready operations. Like `has_admin_role`,
    /// consulted by callers that must validate a batch fully before applying
    /// any part of it.
    fn has_executor_role(&self, caller: &Address) -> bool;

    /// Whether `caller` may change the minimum delay. Consulted by callers
    /// that must validate a batch fully before applying any part of it.
    fn has_admin_role(&self, caller: &Address) -> bool;

    /// Change the minimum delay. Admin-gated; governance reaches this through
    /// an executed `UpdateTimelock` proposal.
    fn update_min_delay(&mut self, caller: &Address, new_delay: u64) -> Result<(), TimelockError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Operation {
    eta: Timestamp,
    predecessor: OperationId,
    done: bool,
}

/// In-memory timelock with proposer/executor/admin roles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timelock {
    min_delay_secs: u64,
    admin: Address,
    proposers: HashSet<Address>,
    executors: HashSet<Address>,
    operations: HashMap<OperationId, Operation>,
}

impl Timelock {
    pub fn new(min_delay_secs: u64, admin: Address) -> Self {
        Self {
            min_delay_secs,
            admin,
            proposers: HashSet::new(),
            executors: HashSet::new(),
            operations: HashMap::new(),
        }
    }

    /// Grant the proposer role (may schedule and cancel).
    pub fn grant_proposer(&mut self, addr: Address) {
        self.proposers.insert(addr);
    }

    /// Grant the executor role (may execute ready operations).
    pub fn grant_executor(&mut self, addr: Address) {
        self.executors.insert(addr);
    }

    pub fn has_proposer_role(&self, addr: &Address) -> bool {
        self.proposers.contains(addr)
    }

    fn require_proposer(&self, caller: &Address) -> Result<(), TimelockError> {
        if self.has_proposer_role(caller) {
            Ok(())
        } else {
            Err(TimelockError::Unauthorized {
                caller: caller.to_string(),
                role: "proposer",
            })
        }
    }

    fn require_executor(&self, caller: &Address) -> Result<(), TimelockError> {
        if self.has_executor_role(caller) {
            Ok(())
        } else {
            Err(TimelockError::Unauthorized {
                caller: caller.to_string(),
                role: "executor",
            })
        }
    }
}

impl TimelockExecutor for Timelock {
    fn schedule(
        &mut self,
        caller: &Address,
        targets: &[Address],
        values: &[u128],
        calldatas: &[Vec<u8>],
        predecessor: OperationId,
        salt: &[u8; 32],
        delay_secs: u64,
        now: Timestamp,
    ) -> Result<(OperationId, Timestamp), TimelockError> {
        self.require_proposer(caller)?;
        if delay_secs < self.min_delay_secs {
            return Err(TimelockError::DelayTooShort {
                have: delay_secs,
                need: self.min_delay_secs,
            });
        }
        let id = hash_operation(targets, values, calldatas, predecessor, salt);
        if self.operations.contains_key(&id) {
            return Err(TimelockError::OperationAlreadyScheduled(id.to_string()));
        }
        let eta = now.offset(delay_secs);
        self.operations.insert(
            id,
            Operation {
                eta,
                predecessor,
                done: false,
            },
        );
        tracing::debug!(operation = %id, eta = %eta, "operation scheduled");
        Ok((id, eta))
    }

    fn is_operation_ready(&self, id: OperationId, now: Timestamp) -> bool {
        match self.operations.get(&id) {
            Some(op) if !op.done && now >= op.eta => {
                op.predecessor.is_zero() || self.is_operation_done(op.predecessor)
            }
            _ => false,
        }
    }

    fn is_operation_done(&self, id: OperationId) -> bool {
        self.operations.get(&id).map(|op| op.done).unwrap_or(false)
    }

    fn operation_eta(&self, id: OperationId) -> Option<Timestamp> {
        self.operations.get(&id).map(|op| op.eta)
    }

    fn execute(
        &mut self,
        caller: &Address,
        id: OperationId,
        now: Timestamp,
    ) -> Result<(), TimelockError> {
        self.require_executor(caller)?;
        if !self.operations.contains_key(&id) {
            return Err(TimelockError::OperationNotFound(id.to_string()));
        }
        if self.is_operation_done(id) {
            return Err(TimelockError::OperationAlreadyDone(id.to_string()));
        }
        if !self.is_operation_ready(id, now) {
            return Err(TimelockError::OperationNotReady(id.to_string()));
        }
        // Mutation after all checks so failed calls leave state untouched.
        if let Some(op) = self.operations.get_mut(&id) {
            op.done = true;
        }
        tracing::debug!(operation = %id, "operation executed");
        Ok(())
    }

    fn cancel(&mut self, caller: &Address, id: OperationId) -> Result<(), TimelockError> {
        self.require_proposer(caller)?;
        match self.operations.get(&id) {
            None => Err(TimelockError::OperationNotFound(id.to_string())),
            Some(op) if op.done => Err(TimelockError::OperationAlreadyDone(id.to_string())),
            Some(_) => {
                self.operations.remove(&id);
                tracing::debug!(operation = %id, "operation canceled");
                Ok(())
            }
        }
    }

    fn min_delay(&self) -> u64 {
        self.min_delay_secs
    }

    fn has_executor_role(&self, caller: &Address) -> bool {
        self.executors.contains(caller)
    }

    fn has_admin_role(&self, caller: &Address) -> bool {
        caller == &self.admin
    }

    fn update_min_delay(&mut self, caller: &Address, new_delay: u64) -> Result<(), TimelockError> {
        if caller != &self.admin {
            return Err(TimelockError::Unauthorized {
                caller: caller.to_string(),
                role: "admin",
            });
        }
        tracing::info!(old = self.min_delay_secs, new = new_delay, "timelock min delay updated");
        self.min_delay_secs = new_delay;
        Ok(())
    }
}
