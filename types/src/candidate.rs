//! Candidates (proposals) and their fixed-width on-chain names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Index of a proposal in the contract's proposal array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(u64);

impl CandidateId {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn index(&self) -> u64 {
        self.0
    }

    /// Whether this index addresses one of `proposal_count` proposals.
    pub fn is_within(&self, proposal_count: u64) -> bool {
        self.0 < proposal_count
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CandidateId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidNumber(format!("candidate id {s:?}: {e}")))
    }
}

/// A proposal with its decoded display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
}

impl Candidate {
    /// Longest name that fits a `bytes32` slot while leaving a terminating NUL.
    pub const MAX_NAME_BYTES: usize = 31;

    /// Decode a `bytes32` name: bytes up to the first NUL, UTF-8 (lossy), trimmed.
    ///
    /// Returns `None` for an all-zero or whitespace-only slot.
    pub fn decode_name(raw: &[u8; 32]) -> Option<String> {
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        let name = String::from_utf8_lossy(&raw[..end]).trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Encode a display name into a right-padded `bytes32` slot.
    pub fn encode_name(name: &str) -> Result<[u8; 32], TypeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TypeError::InvalidName("name is empty".into()));
        }
        if name.len() > Self::MAX_NAME_BYTES {
            return Err(TypeError::InvalidName(format!(
                "{name:?} is {} bytes, max {}",
                name.len(),
                Self::MAX_NAME_BYTES
            )));
        }
        let mut slot = [0u8; 32];
        slot[..name.len()].copy_from_slice(name.as_bytes());
        Ok(slot)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_stops_at_nul() {
        let mut raw = [0u8; 32];
        raw[..5].copy_from_slice(b"Alice");
        raw[6] = b'x';
        assert_eq!(Candidate::decode_name(&raw).as_deref(), Some("Alice"));
    }

    #[test]
    fn decode_empty_slot_is_none() {
        assert_eq!(Candidate::decode_name(&[0u8; 32]), None);
        let mut raw = [0u8; 32];
        raw[..3].copy_from_slice(b"   ");
        assert_eq!(Candidate::decode_name(&raw), None);
    }

    #[test]
    fn decode_full_width_name() {
        let raw = [b'a'; 32];
        assert_eq!(Candidate::decode_name(&raw).unwrap().len(), 32);
    }

    #[test]
    fn encode_then_decode() {
        let slot = Candidate::encode_name(" Bob ").unwrap();
        assert_eq!(&slot[..3], b"Bob");
        assert_eq!(Candidate::decode_name(&slot).as_deref(), Some("Bob"));
    }

    #[test]
    fn encode_rejects_long_and_empty() {
        assert!(Candidate::encode_name(&"x".repeat(32)).is_err());
        assert!(Candidate::encode_name(&"x".repeat(31)).is_ok());
        assert!(Candidate::encode_name("  ").is_err());
    }

    #[test]
    fn candidate_id_bounds() {
        assert!(CandidateId::new(2).is_within(3));
        assert!(!CandidateId::new(3).is_within(3));
        assert_eq!("7".parse::<CandidateId>().unwrap(), CandidateId::new(7));
        assert!("-1".parse::<CandidateId>().is_err());
    }
}
