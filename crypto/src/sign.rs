//! Recoverable secp256k1 signatures (65-byte `r || s || v`).

use ballot_types::Address;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use std::fmt;
use std::str::FromStr;

use crate::error::CryptoError;
use crate::hash::keccak256_multi;
use crate::keys::address_of;

/// A 65-byte signature, `v` in {27, 28}.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; 65]);

impl RecoverableSignature {
    pub fn new(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 65] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature(format!("expected 65 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn r(&self) -> [u8; 32] {
        let mut r = [0u8; 32];
        r.copy_from_slice(&self.0[..32]);
        r
    }

    pub fn s(&self) -> [u8; 32] {
        let mut s = [0u8; 32];
        s.copy_from_slice(&self.0[32..64]);
        s
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// Recovery parity (0 or 1). Accepts both the raw and the +27 forms of `v`.
    pub fn recovery_parity(&self) -> Result<u8, CryptoError> {
        match self.0[64] {
            0 | 27 => Ok(0),
            1 | 28 => Ok(1),
            v => Err(CryptoError::InvalidSignature(format!("bad v value {v}"))),
        }
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for RecoverableSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

/// Recover the signer address of a 32-byte prehash.
pub fn recover_address(
    hash: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let sig = Signature::from_slice(&signature.as_bytes()[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_parity()?)
        .ok_or_else(|| CryptoError::InvalidSignature("bad recovery id".into()))?;
    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|_| CryptoError::Recovery)?;
    Ok(address_of(&key))
}

/// True when `signature` over `hash` recovers to `expected`.
pub fn verify_signer(hash: &[u8; 32], signature: &RecoverableSignature, expected: &Address) -> bool {
    recover_address(hash, signature).is_ok_and(|a| a == *expected)
}

/// EIP-191 `personal_sign` hash: `keccak256("\x19Ethereum Signed Message:\n" || len || message)`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    keccak256_multi(&[prefix.as_bytes(), message])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::LocalKey;

    fn key(byte: u8) -> LocalKey {
        LocalKey::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn sign_and_recover() {
        let k = key(0x42);
        let hash = [9u8; 32];
        let sig = k.sign_hash(&hash).unwrap();
        assert_eq!(recover_address(&hash, &sig).unwrap(), k.address());
        assert!(verify_signer(&hash, &sig, &k.address()));
    }

    #[test]
    fn wrong_hash_recovers_other_address() {
        let k = key(0x42);
        let sig = k.sign_hash(&[9u8; 32]).unwrap();
        assert!(!verify_signer(&[8u8; 32], &sig, &k.address()));
    }

    #[test]
    fn wrong_key_fails() {
        let sig = key(0x42).sign_hash(&[1u8; 32]).unwrap();
        assert!(!verify_signer(&[1u8; 32], &sig, &key(0x43).address()));
    }

    #[test]
    fn raw_parity_accepted() {
        let k = key(0x42);
        let hash = [3u8; 32];
        let mut bytes = *k.sign_hash(&hash).unwrap().as_bytes();
        bytes[64] -= 27;
        let sig = RecoverableSignature::new(bytes);
        assert_eq!(recover_address(&hash, &sig).unwrap(), k.address());
    }

    #[test]
    fn bad_v_rejected() {
        let mut bytes = [1u8; 65];
        bytes[64] = 30;
        assert!(recover_address(&[0u8; 32], &RecoverableSignature::new(bytes)).is_err());
    }

    #[test]
    fn hex_roundtrip() {
        let sig = key(0x42).sign_hash(&[5u8; 32]).unwrap();
        let parsed: RecoverableSignature = sig.to_string().parse().unwrap();
        assert_eq!(parsed, sig);
        assert!("0x1234".parse::<RecoverableSignature>().is_err());
    }

    #[test]
    fn personal_hash_vector() {
        assert_eq!(
            hex::encode(personal_message_hash(b"hello")),
            "50b2c43fd39106bafbba0da34fc430e1f91e3c96ea2acee2bc34119f92b37750"
        );
    }
}
