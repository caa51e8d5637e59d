//! Hashing primitives for the Agora governance module.
//!
//! Blake2b-256 digests give proposals and timelock operations their canonical
//! identities. Both sides of the governance/timelock boundary must derive the
//! same digest from the same action batch, so all framing lives here.

pub mod hash;

pub use hash::{
    blake2b_256, blake2b_256_multi, hash_description, hash_operation, hash_proposal_content,
};
