//! Nonce and salt generation for commit attempts.

use ballot_types::{Nonce, Salt, SecretMaterial};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// A source of cryptographically strong random bytes.
pub trait EntropySource {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// The operating system's CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|e| CryptoError::Entropy(e.to_string()))
    }
}

/// Draw fresh secret material: a nonce uniform in `[0, 2^53)` and an independent 256-bit salt.
///
/// Every call yields a new pair; callers treat each pair as single-use.
pub fn generate_secret<E: EntropySource + ?Sized>(
    entropy: &E,
) -> Result<SecretMaterial, CryptoError> {
    let mut nonce_bytes = [0u8; 8];
    entropy.fill(&mut nonce_bytes)?;
    let nonce = u64::from_be_bytes(nonce_bytes) & (Nonce::GENERATED_BOUND - 1);
    nonce_bytes.zeroize();

    let mut salt_bytes = [0u8; 32];
    entropy.fill(&mut salt_bytes)?;
    let salt = Salt::new(salt_bytes);
    salt_bytes.zeroize();

    Ok(SecretMaterial::new(Nonce::new(nonce), salt))
}
