//! Nullable chain clock — deterministic block/time progression for testing.

use agora_types::{BlockNumber, ChainTime, Timestamp};
use std::cell::Cell;

/// A deterministic ledger clock for testing.
///
/// Block height and timestamp only advance when you tell them to; advancing
/// blocks moves time forward by a fixed seconds-per-block.
pub struct NullChainClock {
    block: Cell<u64>,
    timestamp: Cell<u64>,
    secs_per_block: u64,
}

impl NullChainClock {
    pub fn new(initial_block: u64, initial_secs: u64, secs_per_block: u64) -> Self {
        Self {
            block: Cell::new(initial_block),
            timestamp: Cell::new(initial_secs),
            secs_per_block,
        }
    }

    /// The ledger's current view of "now".
    pub fn now(&self) -> ChainTime {
        ChainTime::new(
            BlockNumber::new(self.block.get()),
            Timestamp::new(self.timestamp.get()),
        )
    }

    /// Advance by a number of blocks, moving time along with them.
    pub fn advance_blocks(&self, blocks: u64) {
        self.block.set(self.block.get() + blocks);
        self.timestamp
            .set(self.timestamp.get() + blocks * self.secs_per_block);
    }

    /// Advance time only (within the current block's wall time).
    pub fn advance_secs(&self, secs: u64) {
        self.timestamp.set(self.timestamp.get() + secs);
    }

    /// Jump to a specific block and timestamp.
    pub fn set(&self, block: u64, secs: u64) {
        self.block.set(block);
        self.timestamp.set(secs);
    }
}
