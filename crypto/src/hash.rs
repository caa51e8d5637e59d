//! Blake2b hashing for proposal content and timelock operations.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use agora_types::{Address, ContentHash, OperationId};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash a proposal description to its 32-byte digest.
pub fn hash_description(description: &str) -> [u8; 32] {
    blake2b_256(description.as_bytes())
}

/// Compute the canonical content hash of a proposal's action payload.
///
/// Every element is length-prefixed so that `(["ab"], ["c"])` and
/// `(["a"], ["bc"])` can never collide. The digest depends only on the
/// ordered (target, value, calldata) triples and the description hash —
/// never on the proposal id, proposer, or timing fields.
pub fn hash_proposal_content(
    targets: &[Address],
    values: &[u128],
    calldatas: &[Vec<u8>],
    description_hash: &[u8; 32],
) -> ContentHash {
    let mut hasher = Blake2b256::new();
    hasher.update((targets.len() as u64).to_le_bytes());
    for target in targets {
        let bytes = target.as_str().as_bytes();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    for value in values {
        hasher.update(value.to_le_bytes());
    }
    for calldata in calldatas {
        hasher.update((calldata.len() as u64).to_le_bytes());
        hasher.update(calldata);
    }
    hasher.update(description_hash);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    ContentHash::new(output)
}

/// Compute the identity of a timelock operation batch.
///
/// Same framing rules as `hash_proposal_content`, extended with the
/// predecessor operation (all-zero when absent) and the scheduling salt.
pub fn hash_operation(
    targets: &[Address],
    values: &[u128],
    calldatas: &[Vec<u8>],
    predecessor: OperationId,
    salt: &[u8; 32],
) -> OperationId {
    let mut hasher = Blake2b256::new();
    hasher.update((targets.len() as u64).to_le_bytes());
    for target in targets {
        let bytes = target.as_str().as_bytes();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    for value in values {
        hasher.update(value.to_le_bytes());
    }
    for calldata in calldatas {
        hasher.update((calldata.len() as u64).to_le_bytes());
        hasher.update(calldata);
    }
    hasher.update(predecessor.as_bytes());
    hasher.update(salt);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    OperationId::new(output)
}
