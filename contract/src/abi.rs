//! Solidity ABI encoding for the handful of types the ballot contract uses.
//!
//! Every static value occupies one 32-byte big-endian word. Dynamic values (`bytes`,
//! `string`, `T[]`) put an offset in the head and a length-prefixed, zero-padded body
//! in the tail.

use ballot_crypto::selector;
use ballot_types::Address;

use crate::error::ContractError;

/// Canonical signatures of the contract's functions.
pub mod signatures {
    pub const GET_VOTING_STATUS: &str = "getVotingStatus()";
    pub const GET_ALL_PROPOSALS: &str = "getAllProposals()";
    pub const GET_COMMITMENT_STATUS: &str = "getCommitmentStatus(address)";
    pub const VOTE_COMMITMENTS: &str = "voteCommitments(address)";
    pub const REVEALED: &str = "revealed(address)";
    pub const NONCES: &str = "nonces(address)";
    pub const START_TIME: &str = "startTime()";
    pub const END_TIME: &str = "endTime()";
    pub const REVEAL_TIME: &str = "revealTime()";
    pub const CHAIRPERSON: &str = "chairperson()";
    pub const GET_WINNING_PROPOSAL: &str = "getWinningProposal()";

    pub const COMMIT_VOTE: &str = "commitVote(bytes32)";
    pub const META_COMMIT_VOTE: &str = "metaCommitVote(address,bytes32,uint256,bytes)";
    pub const REVEAL_VOTE: &str = "revealVote(uint256,uint256,bytes32)";

    pub const SET_VOTING_TIME: &str = "setVotingTime(uint256,uint256)";
    pub const DELAY_VOTING_START: &str = "delayVotingStart(uint256)";
    pub const START_VOTING_EARLY: &str = "startVotingEarly()";
    pub const EMERGENCY_STOP: &str = "emergencyStop()";
    pub const FORCE_REVEAL_RESULTS: &str = "forceRevealResults()";
    pub const GIVE_RIGHT_TO_VOTE: &str = "giveRightToVote(address)";
    pub const BATCH_GIVE_RIGHT_TO_VOTE: &str = "batchGiveRightToVote(address[])";
    pub const RESET_VOTING: &str = "resetVoting(bytes32[],uint256,uint256,uint256,bool)";
    pub const CLEAR_VOTER_HISTORY: &str = "clearVoterHistory()";
}

/// A value to encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Address(Address),
    Bool(bool),
    FixedBytes([u8; 32]),
    Bytes(Vec<u8>),
    Array(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes(_) | Self::Array(_))
    }
}

pub fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn static_word(token: &Token) -> [u8; 32] {
    match token {
        Token::Uint(v) => uint_word(*v),
        Token::Address(a) => a.to_word(),
        Token::Bool(b) => uint_word(u128::from(*b)),
        Token::FixedBytes(b) => *b,
        Token::Bytes(_) | Token::Array(_) => [0u8; 32],
    }
}

fn dynamic_body(token: &Token) -> Vec<u8> {
    match token {
        Token::Bytes(bytes) => {
            let mut out = uint_word(bytes.len() as u128).to_vec();
            out.extend_from_slice(bytes);
            let padding = (32 - bytes.len() % 32) % 32;
            out.resize(out.len() + padding, 0);
            out
        }
        Token::Array(items) => {
            let mut out = uint_word(items.len() as u128).to_vec();
            out.extend(encode(items));
            out
        }
        _ => Vec::new(),
    }
}

/// Encode a tuple of tokens (no selector).
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = 32 * tokens.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            tail.extend(dynamic_body(token));
        } else {
            head.extend_from_slice(&static_word(token));
        }
    }
    head.extend(tail);
    head
}

/// Selector of `signature` followed by the encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode(tokens));
    data
}

/// Positional reader over ABI-encoded return data.
pub struct AbiDecoder<'a> {
    data: &'a [u8],
}

impl<'a> AbiDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8; 32], ContractError> {
        self.data
            .get(offset..offset.saturating_add(32))
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                ContractError::Decode(format!(
                    "word at byte {offset} past end of {}-byte payload",
                    self.data.len()
                ))
            })
    }

    /// The raw 32-byte word of head slot `index`.
    pub fn word(&self, index: usize) -> Result<&'a [u8; 32], ContractError> {
        self.word_at(index.saturating_mul(32))
    }

    fn usize_at(&self, offset: usize) -> Result<usize, ContractError> {
        let value = word_to_u64(self.word_at(offset)?)?;
        usize::try_from(value).map_err(|_| ContractError::Decode(format!("{value} overflows usize")))
    }

    pub fn uint64(&self, index: usize) -> Result<u64, ContractError> {
        word_to_u64(self.word(index)?)
    }

    pub fn boolean(&self, index: usize) -> Result<bool, ContractError> {
        match word_to_u64(self.word(index)?)? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(ContractError::Decode(format!("invalid bool word {v}"))),
        }
    }

    pub fn address(&self, index: usize) -> Result<Address, ContractError> {
        Address::from_word(self.word(index)?).map_err(|e| ContractError::Decode(e.to_string()))
    }

    pub fn bytes32(&self, index: usize) -> Result<[u8; 32], ContractError> {
        Ok(*self.word(index)?)
    }

    /// Start offset and element count of the dynamic value referenced by head slot `index`.
    fn dynamic(&self, index: usize, elem_size: usize) -> Result<(usize, usize), ContractError> {
        let offset = self.usize_at(index.saturating_mul(32))?;
        let len = self.usize_at(offset)?;
        let start = offset.saturating_add(32);
        let needed = len.saturating_mul(elem_size);
        if start.saturating_add(needed) > self.data.len() {
            return Err(ContractError::Decode(format!(
                "dynamic value of {len} elements overruns {}-byte payload",
                self.data.len()
            )));
        }
        Ok((start, len))
    }

    pub fn bytes32_array(&self, index: usize) -> Result<Vec<[u8; 32]>, ContractError> {
        let (start, len) = self.dynamic(index, 32)?;
        (0..len).map(|i| self.word_at(start + 32 * i).copied()).collect()
    }

    pub fn uint64_array(&self, index: usize) -> Result<Vec<u64>, ContractError> {
        let (start, len) = self.dynamic(index, 32)?;
        (0..len)
            .map(|i| word_to_u64(self.word_at(start + 32 * i)?))
            .collect()
    }

    pub fn bytes(&self, index: usize) -> Result<Vec<u8>, ContractError> {
        let (start, len) = self.dynamic(index, 1)?;
        Ok(self.data[start..start + len].to_vec())
    }

    pub fn string(&self, index: usize) -> Result<String, ContractError> {
        let bytes = self.bytes(index)?;
        String::from_utf8(bytes).map_err(|e| ContractError::Decode(format!("invalid utf-8: {e}")))
    }
}

/// Read a `uint256` word that must fit in 64 bits.
pub fn word_to_u64(word: &[u8; 32]) -> Result<u64, ContractError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode(format!(
            "uint256 0x{} exceeds u64",
            hex::encode(word)
        )));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}
