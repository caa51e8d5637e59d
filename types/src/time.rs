//! Block numbers and timestamps — the only clocks the core knows.
//!
//! The surrounding ledger supplies both; the core never sleeps, polls, or
//! reads a wall clock. "Waiting" is expressed purely as comparisons against
//! these monotonically increasing values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger block height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub const GENESIS: Self = Self(0);

    pub fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn height(&self) -> u64 {
        self.0
    }

    /// The block `delta` blocks after this one (saturating).
    pub fn offset(&self, delta: u64) -> Self {
        Self(self.0.saturating_add(delta))
    }

    /// The immediately preceding block (saturating at genesis).
    pub fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero). Also the "not set" sentinel for `eta` fields.
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn is_epoch(&self) -> bool {
        self.0 == 0
    }

    /// The timestamp `secs` seconds after this one (saturating).
    pub fn offset(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_elapsed(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// The ledger's view of "now": current block height and block timestamp.
///
/// Every state-mutating or state-deriving call receives one of these from the
/// surrounding ledger. Monotonicity across calls is the ledger's guarantee,
/// not enforced here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTime {
    pub block: BlockNumber,
    pub timestamp: Timestamp,
}

impl ChainTime {
    pub fn new(block: BlockNumber, timestamp: Timestamp) -> Self {
        Self { block, timestamp }
    }
}

impl fmt::Display for ChainTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.block, self.timestamp)
    }
}
