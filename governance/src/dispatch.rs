//! External call dispatch for executed proposals.
//!
//! Self-targeting actions (parameter changes) are applied by the engine
//! itself; everything else goes through a [`CallDispatcher`], whose batch
//! contract is all-or-nothing: a single reverted call aborts the whole batch
//! with no partial side effects observable anywhere.

use agora_types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One external (target, value, calldata) action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub value: u128,
    pub calldata: Vec<u8>,
}

#[derive(Debug, Error)]
#[error("call to {target} reverted: {reason}")]
pub struct DispatchError {
    pub target: String,
    pub reason: String,
}

/// The ledger-side executor of external calls.
///
/// `dispatch_batch` MUST be atomic: either every call commits or none does.
pub trait CallDispatcher {
    fn dispatch_batch(&mut self, calls: &[Call]) -> Result<(), DispatchError>;
}

/// A dispatcher that records every committed batch; calls to targets in the
/// revert set fail before anything commits. The default dispatcher for tests
/// and in-process deployments with no external call surface.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    committed: Vec<Vec<Call>>,
    reverting_targets: Vec<Address>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make any batch containing a call to `target` revert.
    pub fn revert_on(&mut self, target: Address) {
        self.reverting_targets.push(target);
    }

    /// Batches committed so far, in dispatch order.
    pub fn committed(&self) -> &[Vec<Call>] {
        &self.committed
    }
}

impl CallDispatcher for RecordingDispatcher {
    fn dispatch_batch(&mut self, calls: &[Call]) -> Result<(), DispatchError> {
        // All-or-nothing: scan for reverts before committing anything.
        for call in calls {
            if self.reverting_targets.contains(&call.target) {
                return Err(DispatchError {
                    target: call.target.to_string(),
                    reason: "target configured to revert".into(),
                });
            }
        }
        self.committed.push(calls.to_vec());
        Ok(())
    }
}
