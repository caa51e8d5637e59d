//! Block-indexed value history with binary-search lookups.

use agora_types::{BlockNumber, VoteWeight};
use serde::{Deserialize, Serialize};

/// A (block, value) pair recording a weight change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub block: BlockNumber,
    pub value: VoteWeight,
}

/// An append-only history of checkpoints, sorted by block.
///
/// Writes at the same block overwrite the previous checkpoint (one checkpoint
/// per block per history). The surrounding ledger guarantees writes arrive in
/// non-decreasing block order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckpointHistory {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as of `block`.
    pub fn record(&mut self, block: BlockNumber, value: VoteWeight) {
        match self.checkpoints.last_mut() {
            Some(last) if last.block == block => last.value = value,
            Some(last) => {
                debug_assert!(last.block < block, "checkpoints must arrive in block order");
                self.checkpoints.push(Checkpoint { block, value });
            }
            None => self.checkpoints.push(Checkpoint { block, value }),
        }
    }

    /// The value as of `block` — the latest checkpoint at or before it.
    ///
    /// Returns zero before the first checkpoint. O(log n) binary search.
    pub fn value_at(&self, block: BlockNumber) -> VoteWeight {
        let pos = self.checkpoints.partition_point(|c| c.block <= block);
        if pos == 0 {
            VoteWeight::ZERO
        } else {
            self.checkpoints[pos - 1].value
        }
    }

    /// The most recent value, regardless of block.
    pub fn latest(&self) -> VoteWeight {
        self.checkpoints
            .last()
            .map(|c| c.value)
            .unwrap_or(VoteWeight::ZERO)
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(n: u64) -> BlockNumber {
        BlockNumber::new(n)
    }

    fn wt(n: u128) -> VoteWeight {
        VoteWeight::new(n)
    }

    #[test]
    fn empty_history_is_zero_everywhere() {
        let h = CheckpointHistory::new();
        assert_eq!(h.value_at(block(0)), VoteWeight::ZERO);
        assert_eq!(h.value_at(block(1_000_000)), VoteWeight::ZERO);
        assert_eq!(h.latest(), VoteWeight::ZERO);
    }

    #[test]
    fn lookup_before_first_checkpoint_is_zero() {
        let mut h = CheckpointHistory::new();
        h.record(block(10), wt(500));
        assert_eq!(h.value_at(block(9)), VoteWeight::ZERO);
        assert_eq!(h.value_at(block(10)), wt(500));
        assert_eq!(h.value_at(block(11)), wt(500));
    }

    #[test]
    fn lookup_finds_latest_at_or_before() {
        let mut h = CheckpointHistory::new();
        h.record(block(10), wt(100));
        h.record(block(20), wt(250));
        h.record(block(30), wt(50));

        assert_eq!(h.value_at(block(15)), wt(100));
        assert_eq!(h.value_at(block(20)), wt(250));
        assert_eq!(h.value_at(block(29)), wt(250));
        assert_eq!(h.value_at(block(30)), wt(50));
        assert_eq!(h.value_at(block(99)), wt(50));
        assert_eq!(h.latest(), wt(50));
    }

    #[test]
    fn same_block_write_overwrites() {
        let mut h = CheckpointHistory::new();
        h.record(block(10), wt(100));
        h.record(block(10), wt(175));
        assert_eq!(h.len(), 1);
        assert_eq!(h.value_at(block(10)), wt(175));
    }
}
