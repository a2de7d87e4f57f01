//! secp256k1 signing keys and address derivation.

use ballot_types::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use std::fmt;
use std::str::FromStr;

use crate::error::CryptoError;
use crate::hash::keccak256;
use crate::sign::RecoverableSignature;

/// Derive the account address of a public key: the last 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
pub fn address_of(verifying_key: &VerifyingKey) -> Address {
    let point = verifying_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::new(bytes)
}

/// A locally held secp256k1 private key with its derived address.
///
/// `Debug` never prints key material; the inner `SigningKey` zeroizes on drop.
#[derive(Clone)]
pub struct LocalKey {
    signing_key: SigningKey,
    address: Address,
}

impl LocalKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let address = address_of(signing_key.verifying_key());
        Ok(Self {
            signing_key,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash, returning `r || s || v` with `v` in {27, 28}.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Ok(RecoverableSignature::new(bytes))
    }
}

impl FromStr for LocalKey {
    type Err = CryptoError;

    /// Parse a hex private key, with or without `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(digits).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let key = Self::from_bytes(&bytes);
        zeroize::Zeroize::zeroize(&mut bytes);
        key
    }
}

impl fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalKey({})", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> LocalKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        LocalKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn address_of_key_one() {
        assert_eq!(
            key_one().address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn parse_hex_key() {
        let key: LocalKey = "0x0000000000000000000000000000000000000000000000000000000000000001"
            .parse()
            .unwrap();
        assert_eq!(key.address(), key_one().address());
    }

    #[test]
    fn zero_key_rejected() {
        assert!(LocalKey::from_bytes(&[0u8; 32]).is_err());
        assert!("0xnothex".parse::<LocalKey>().is_err());
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", key_one());
        assert!(rendered.starts_with("LocalKey(0x7e5f"));
    }

    #[test]
    fn signatures_are_deterministic() {
        let key = key_one();
        let a = key.sign_hash(&[7u8; 32]).unwrap();
        let b = key.sign_hash(&[7u8; 32]).unwrap();
        assert_eq!(a, b);
        assert!(a.v() == 27 || a.v() == 28);
    }
}
