//! Maintainer capability and per-proposal approval records.
//!
//! Approval is a single-admission gate, not an N-of-M quorum: with the
//! default `approve_threshold` of 1, the first qualifying maintainer
//! approval immediately opens voting.

use std::collections::{HashMap, HashSet};

use agora_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Ordered, duplicate-free approver log for one proposal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Approvers in the order their approvals were recorded.
    pub approvers: Vec<Address>,
    /// Flips true once, when enough approvals have been recorded.
    pub approved: bool,
}

/// Tracks maintainer capability and records approval actions per proposal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApprovalGate {
    maintainers: HashSet<Address>,
    records: HashMap<u64, ApprovalRecord>,
}

impl ApprovalGate {
    pub fn new(maintainers: impl IntoIterator<Item = Address>) -> Self {
        Self {
            maintainers: maintainers.into_iter().collect(),
            records: HashMap::new(),
        }
    }

    pub fn add_maintainer(&mut self, addr: Address) {
        self.maintainers.insert(addr);
    }

    pub fn remove_maintainer(&mut self, addr: &Address) {
        self.maintainers.remove(addr);
    }

    pub fn is_maintainer(&self, addr: &Address) -> bool {
        self.maintainers.contains(addr)
    }

    /// Record an approval from `approver`. Returns whether this approval
    /// flipped the proposal to approved.
    ///
    /// The caller is responsible for the maintainer-capability and
    /// proposal-state checks; this only enforces the duplicate-free log and
    /// the threshold flip.
    pub fn record_approval(
        &mut self,
        proposal_id: u64,
        approver: &Address,
        approve_threshold: u32,
    ) -> Result<bool, GovernanceError> {
        let record = self.records.entry(proposal_id).or_default();
        if record.approvers.contains(approver) {
            return Err(GovernanceError::DuplicateApproval {
                proposal: proposal_id,
                approver: approver.to_string(),
            });
        }
        record.approvers.push(approver.clone());
        let flipped = !record.approved && record.approvers.len() as u32 >= approve_threshold;
        if flipped {
            record.approved = true;
        }
        Ok(flipped)
    }

    pub fn is_approved(&self, proposal_id: u64) -> bool {
        self.records
            .get(&proposal_id)
            .map(|r| r.approved)
            .unwrap_or(false)
    }

    /// The approver log and approval flag: `(approvers, approved)`.
    pub fn approval_flow(&self, proposal_id: u64) -> (Vec<Address>, bool) {
        self.records
            .get(&proposal_id)
            .map(|r| (r.approvers.clone(), r.approved))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new(format!("agr_{:0>60}", n))
    }

    #[test]
    fn first_approval_flips_with_threshold_one() {
        let mut gate = ApprovalGate::new([addr(1)]);
        assert!(!gate.is_approved(7));
        let flipped = gate.record_approval(7, &addr(1), 1).unwrap();
        assert!(flipped);
        assert!(gate.is_approved(7));

        let (approvers, approved) = gate.approval_flow(7);
        assert_eq!(approvers, vec![addr(1)]);
        assert!(approved);
    }

    #[test]
    fn duplicate_approver_rejected() {
        let mut gate = ApprovalGate::new([addr(1)]);
        gate.record_approval(7, &addr(1), 2).unwrap();
        let result = gate.record_approval(7, &addr(1), 2);
        assert!(matches!(
            result,
            Err(GovernanceError::DuplicateApproval { proposal: 7, .. })
        ));
        // The log is unchanged by the failed attempt.
        assert_eq!(gate.approval_flow(7).0.len(), 1);
    }

    #[test]
    fn higher_threshold_needs_more_approvers() {
        let mut gate = ApprovalGate::new([addr(1), addr(2)]);
        assert!(!gate.record_approval(3, &addr(1), 2).unwrap());
        assert!(!gate.is_approved(3));
        assert!(gate.record_approval(3, &addr(2), 2).unwrap());
        assert!(gate.is_approved(3));
    }

    #[test]
    fn maintainer_set_membership() {
        let mut gate = ApprovalGate::new([addr(1)]);
        assert!(gate.is_maintainer(&addr(1)));
        assert!(!gate.is_maintainer(&addr(2)));
        gate.add_maintainer(addr(2));
        assert!(gate.is_maintainer(&addr(2)));
        gate.remove_maintainer(&addr(1));
        assert!(!gate.is_maintainer(&addr(1)));
    }

    #[test]
    fn unknown_proposal_has_empty_flow() {
        let gate = ApprovalGate::new([addr(1)]);
        let (approvers, approved) = gate.approval_flow(99);
        assert!(approvers.is_empty());
        assert!(!approved);
    }
}
