//! Decoding of revert data into the contract's typed errors.

use ballot_crypto::selector;
use std::fmt;

use crate::abi::AbiDecoder;

/// The contract's custom errors (all parameterless).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BallotError {
    AlreadyHasVotingRight,
    AlreadyRevealed,
    AlreadyVoted,
    InvalidCommitment,
    InvalidNonce,
    InvalidProposalIndex,
    InvalidSignature,
    InvalidTimeRange,
    NoRightToVote,
    NotWithinRevealPeriod,
    NotWithinVotingPeriod,
    OnlyChairperson,
    ResultsNotYetPublic,
    VotingInProgress,
}

impl BallotError {
    pub const ALL: [BallotError; 14] = [
        Self::AlreadyHasVotingRight,
        Self::AlreadyRevealed,
        Self::AlreadyVoted,
        Self::InvalidCommitment,
        Self::InvalidNonce,
        Self::InvalidProposalIndex,
        Self::InvalidSignature,
        Self::InvalidTimeRange,
        Self::NoRightToVote,
        Self::NotWithinRevealPeriod,
        Self::NotWithinVotingPeriod,
        Self::OnlyChairperson,
        Self::ResultsNotYetPublic,
        Self::VotingInProgress,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AlreadyHasVotingRight => "AlreadyHasVotingRight",
            Self::AlreadyRevealed => "AlreadyRevealed",
            Self::AlreadyVoted => "AlreadyVoted",
            Self::InvalidCommitment => "InvalidCommitment",
            Self::InvalidNonce => "InvalidNonce",
            Self::InvalidProposalIndex => "InvalidProposalIndex",
            Self::InvalidSignature => "InvalidSignature",
            Self::InvalidTimeRange => "InvalidTimeRange",
            Self::NoRightToVote => "NoRightToVote",
            Self::NotWithinRevealPeriod => "NotWithinRevealPeriod",
            Self::NotWithinVotingPeriod => "NotWithinVotingPeriod",
            Self::OnlyChairperson => "OnlyChairperson",
            Self::ResultsNotYetPublic => "ResultsNotYetPublic",
            Self::VotingInProgress => "VotingInProgress",
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&format!("{}()", self.name()))
    }

    pub fn from_selector(sel: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.selector() == sel)
    }
}

const ERROR_STRING: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const PANIC_UINT: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Why the contract rejected a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevertReason {
    Custom(BallotError),
    /// `Error(string)` from a `require` with a message.
    Message(String),
    /// `Panic(uint256)` from a failed assertion or arithmetic fault.
    Panic(u64),
    /// Revert data with a selector this client does not know.
    Unknown([u8; 4]),
    /// Reverted without data.
    Reverted,
}

impl RevertReason {
    pub fn decode(data: &[u8]) -> Self {
        let Some(sel) = data.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) else {
            return Self::Reverted;
        };
        let body = AbiDecoder::new(&data[4..]);
        match sel {
            ERROR_STRING => body
                .string(0)
                .map(Self::Message)
                .unwrap_or(Self::Unknown(sel)),
            PANIC_UINT => body.uint64(0).map(Self::Panic).unwrap_or(Self::Unknown(sel)),
            _ => BallotError::from_selector(sel)
                .map(Self::Custom)
                .unwrap_or(Self::Unknown(sel)),
        }
    }

    pub fn is(&self, error: BallotError) -> bool {
        matches!(self, Self::Custom(e) if *e == error)
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(e) => f.write_str(e.name()),
            Self::Message(m) => write!(f, "{m}"),
            Self::Panic(code) => write!(f, "panic 0x{code:02x}"),
            Self::Unknown(sel) => write!(f, "unknown error 0x{}", hex::encode(sel)),
            Self::Reverted => f.write_str("reverted without reason"),
        }
    }
}
