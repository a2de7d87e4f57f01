//! Cryptographic primitives for the ballot client.
//!
//! - **keccak-256** for commitments, selectors and address derivation
//! - **secp256k1** (recoverable ECDSA) for transaction and EIP-712 signatures
//! - Commitment hashing and nonce/salt generation for the commit-reveal workflow
//! - EIP-55 checksummed address rendering

pub mod address;
pub mod commitment;
pub mod eip712;
pub mod error;
pub mod hash;
pub mod keys;
pub mod secret;
pub mod sign;

pub use address::{parse_checksummed, to_checksum};
pub use commitment::{compute_commitment, verify_commitment};
pub use eip712::{Eip712Domain, MetaCommit};
pub use error::CryptoError;
pub use hash::{keccak256, keccak256_multi, selector, uint256_word};
pub use keys::LocalKey;
pub use secret::{generate_secret, EntropySource, OsEntropy};
pub use sign::{personal_message_hash, recover_address, verify_signer, RecoverableSignature};
