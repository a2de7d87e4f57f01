use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("public key recovery failed")]
    Recovery,

    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("address checksum mismatch for {0}")]
    BadChecksum(String),

    #[error(transparent)]
    Type(#[from] ballot_types::TypeError),
}
