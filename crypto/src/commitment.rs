//! Vote commitment hashing.
//!
//! Layout: `keccak256(voter[20] || candidateId[32] || nonce[32] || salt[32])`, i.e.
//! `abi.encodePacked(address, uint256, uint256, bytes32)`. The contract recomputes the
//! same bytes at reveal time, so the field order and widths must never change.

use ballot_types::{Address, CandidateId, Commitment, Nonce, Salt};

use crate::hash::{keccak256_multi, uint256_word};

/// Derive the commitment for a (voter, candidate, nonce, salt) quadruple.
pub fn compute_commitment(
    voter: &Address,
    candidate: CandidateId,
    nonce: Nonce,
    salt: &Salt,
) -> Commitment {
    let candidate = uint256_word(candidate.index());
    let nonce = uint256_word(nonce.value());
    Commitment::new(keccak256_multi(&[
        voter.as_bytes(),
        &candidate,
        &nonce,
        salt.as_bytes(),
    ]))
}

/// Recompute and compare against an expected commitment.
pub fn verify_commitment(
    expected: &Commitment,
    voter: &Address,
    candidate: CandidateId,
    nonce: Nonce,
    salt: &Salt,
) -> bool {
    compute_commitment(voter, candidate, nonce, salt) == *expected
}
