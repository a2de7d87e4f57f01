use ballot_types::Address;
use thiserror::Error;

use crate::revert::RevertReason;

#[derive(Debug, Error)]
pub enum ContractError {
    /// The node could not be reached or returned a non-JSON-RPC response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error that is not a revert.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The contract rejected the call.
    #[error("contract reverted: {0}")]
    Reverted(RevertReason),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("no signing key configured for writes")]
    NoSigner,

    #[error("signing failed: {0}")]
    Signer(String),

    #[error("no contract deployed at {0}")]
    NotDeployed(Address),
}

impl From<ballot_crypto::CryptoError> for ContractError {
    fn from(e: ballot_crypto::CryptoError) -> Self {
        Self::Signer(e.to_string())
    }
}
