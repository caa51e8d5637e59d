//! The authoritative proposal record store.
//!
//! Owns id allocation, record creation, the content-hash index, and
//! order-stable pagination. Records are never deleted — the store is an
//! append-only ledger of proposals.

use std::collections::{BTreeMap, HashMap};

use agora_crypto::{hash_description, hash_proposal_content};
use agora_types::{Address, BlockNumber, ContentHash, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::proposal::Proposal;

/// Mapping from proposal id to record, plus the content-hash index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalStore {
    /// BTreeMap gives id-ordered iteration for stable pagination.
    proposals: BTreeMap<u64, Proposal>,
    /// Latest proposal carrying each content hash.
    by_hash: HashMap<ContentHash, u64>,
    next_id: u64,
}

impl ProposalStore {
    /// Create a store whose first allocated id is `id_floor`.
    pub fn new(id_floor: u64) -> Self {
        Self {
            proposals: BTreeMap::new(),
            by_hash: HashMap::new(),
            next_id: id_floor,
        }
    }

    /// Create and index a proposal record. Validates the parallel-sequence
    /// invariant; all other admission checks live with the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        proposer: Address,
        title: String,
        targets: Vec<Address>,
        values: Vec<u128>,
        calldatas: Vec<Vec<u8>>,
        description: String,
        create_block: BlockNumber,
        voting_delay: u64,
        voting_period: u64,
    ) -> Result<&Proposal, GovernanceError> {
        if targets.is_empty() || targets.len() != values.len() || targets.len() != calldatas.len()
        {
            return Err(GovernanceError::InvalidProposalLength {
                targets: targets.len(),
                values: values.len(),
                calldatas: calldatas.len(),
            });
        }

        let description_hash = hash_description(&description);
        let content_hash =
            hash_proposal_content(&targets, &values, &calldatas, &description_hash);

        let id = self.next_id;
        let start_block = create_block.offset(voting_delay);
        let proposal = Proposal {
            id,
            content_hash,
            proposer,
            targets,
            values,
            calldatas,
            title,
            description,
            create_block,
            start_block,
            end_block: start_block.offset(voting_period),
            canceled: false,
            executed: false,
            eta: Timestamp::EPOCH,
        };

        self.next_id += 1;
        self.by_hash.insert(content_hash, id);
        self.proposals.insert(id, proposal);
        Ok(&self.proposals[&id])
    }

    pub fn get(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(&id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: u64) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    /// The id of the latest proposal carrying `hash`, if any.
    pub fn id_by_hash(&self, hash: ContentHash) -> Option<u64> {
        self.by_hash.get(&hash).copied()
    }

    /// Compute the content hash a `create` call with these actions would get.
    pub fn content_hash_for(
        targets: &[Address],
        values: &[u128],
        calldatas: &[Vec<u8>],
        description: &str,
    ) -> ContentHash {
        hash_proposal_content(targets, values, calldatas, &hash_description(description))
    }

    pub fn count(&self) -> u64 {
        self.proposals.len() as u64
    }

    /// Highest allocated id, if any proposal exists.
    pub fn latest_id(&self) -> Option<u64> {
        self.proposals.keys().next_back().copied()
    }

    /// A bounded, id-ordered slice of proposals.
    ///
    /// An offset at or beyond the end yields an empty slice, never an error;
    /// sequential offsets yield stable, non-overlapping pages.
    pub fn page(&self, offset: u64, count: u64) -> Vec<&Proposal> {
        self.proposals
            .values()
            .skip(offset as usize)
            .take(count as usize)
            .collect()
    }

    /// All proposals in id order (read-only).
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }
}
