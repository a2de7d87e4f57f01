//! Secret material a voter must retain between commit and reveal.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::TypeError;
use crate::hash::decode_fixed_hex;

/// The numeric vote nonce. Encoded as a `uint256` on the wire.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nonce(u64);

impl Nonce {
    /// Exclusive upper bound of generated nonces (2^53).
    pub const GENERATED_BOUND: u64 = 1 << 53;

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce(..)")
    }
}

impl FromStr for Nonce {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidNumber(format!("nonce: {e}")))
    }
}

/// A 256-bit random salt. Zeroized on drop; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Salt([u8; 32]);

impl Salt {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex, for handing the salt back to the voter.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(..)")
    }
}

impl FromStr for Salt {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed_hex::<32>(s.trim()).map(Self)
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The `{ nonce, salt }` pair generated for one commit attempt. Single-use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMaterial {
    pub nonce: Nonce,
    pub salt: Salt,
}

impl SecretMaterial {
    pub fn new(nonce: Nonce, salt: Salt) -> Self {
        Self { nonce, salt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = SecretMaterial::new(Nonce::new(42), Salt::new([0x11; 32]));
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("42"));
        assert!(!rendered.contains("1111"));
    }

    #[test]
    fn salt_hex_roundtrip() {
        let salt = Salt::new([0xab; 32]);
        let parsed: Salt = salt.to_hex().parse().unwrap();
        assert_eq!(parsed, salt);
    }

    #[test]
    fn secret_serializes_for_storage() {
        let secret = SecretMaterial::new(Nonce::new(7), Salt::new([1; 32]));
        let json = serde_json::to_string(&secret).unwrap();
        assert!(json.contains("\"nonce\":7"));
        let back: SecretMaterial = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn nonce_parse() {
        assert_eq!("42".parse::<Nonce>().unwrap().value(), 42);
        assert!("x".parse::<Nonce>().is_err());
    }
}
