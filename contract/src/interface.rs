//! The versioned interface the client expects from the voting contract.
//!
//! Exactly one name per operation; there is no probing for alternative methods.

use ballot_crypto::RecoverableSignature;
use ballot_types::{
    Address, CandidateId, Commitment, CommitmentStatus, Nonce, Salt, TxHash, VotingSchedule,
    VotingStatus, WinningProposal,
};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// A mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
}

/// What became of a submitted write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// Mined and successful.
    Confirmed(TxReceipt),
    /// Broadcast, but no receipt was observed while waiting. Its on-chain effect is unknown.
    Pending(TxHash),
}

impl TxOutcome {
    pub fn tx_hash(&self) -> TxHash {
        match self {
            Self::Confirmed(receipt) => receipt.tx_hash,
            Self::Pending(hash) => *hash,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// One raw entry of `getAllProposals()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposalRecord {
    pub name: [u8; 32],
    pub votes: u64,
}

/// Arguments of `metaCommitVote`: a commitment the voter signed for a relayer to submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetaCommitRequest {
    pub voter: Address,
    pub commitment: Commitment,
    /// The contract's `nonces(voter)` value the signature was made over.
    pub nonce: u64,
    pub signature: RecoverableSignature,
}

/// Reads and voter writes.
#[allow(async_fn_in_trait)]
pub trait VotingContract {
    /// Address of the deployed contract.
    fn address(&self) -> Address;

    /// Chain the contract lives on, for EIP-712 domains.
    fn chain_id(&self) -> u64;

    /// Account that signs direct writes, if any.
    fn signer(&self) -> Option<Address>;

    async fn voting_status(&self) -> Result<VotingStatus, ContractError>;

    async fn all_proposals(&self) -> Result<Vec<ProposalRecord>, ContractError>;

    async fn commitment_status(&self, voter: Address) -> Result<CommitmentStatus, ContractError>;

    /// The per-voter commitment slot; `Commitment::ZERO` when unused.
    async fn vote_commitment(&self, voter: Address) -> Result<Commitment, ContractError>;

    async fn has_revealed(&self, voter: Address) -> Result<bool, ContractError>;

    /// Replay counter for relayed commits.
    async fn meta_nonce(&self, voter: Address) -> Result<u64, ContractError>;

    /// `startTime()`, `endTime()` and `revealTime()`.
    async fn schedule(&self) -> Result<VotingSchedule, ContractError>;

    async fn winning_proposal(&self) -> Result<WinningProposal, ContractError>;

    async fn chairperson(&self) -> Result<Address, ContractError>;

    async fn commit_vote(&self, commitment: Commitment) -> Result<TxOutcome, ContractError>;

    async fn meta_commit_vote(
        &self,
        request: &MetaCommitRequest,
    ) -> Result<TxOutcome, ContractError>;

    async fn reveal_vote(
        &self,
        candidate: CandidateId,
        nonce: Nonce,
        salt: &Salt,
    ) -> Result<TxOutcome, ContractError>;
}

/// Chairperson-only writes.
#[allow(async_fn_in_trait)]
pub trait AdminContract: VotingContract {
    async fn set_voting_time(&self, start: u64, end: u64) -> Result<TxOutcome, ContractError>;

    async fn delay_voting_start(&self, delay_secs: u64) -> Result<TxOutcome, ContractError>;

    async fn start_voting_early(&self) -> Result<TxOutcome, ContractError>;

    async fn emergency_stop(&self) -> Result<TxOutcome, ContractError>;

    async fn force_reveal_results(&self) -> Result<TxOutcome, ContractError>;

    async fn give_right_to_vote(&self, voter: Address) -> Result<TxOutcome, ContractError>;

    async fn batch_give_right_to_vote(
        &self,
        voters: &[Address],
    ) -> Result<TxOutcome, ContractError>;

    async fn reset_voting(
        &self,
        proposal_names: &[[u8; 32]],
        start: u64,
        end: u64,
        reveal: u64,
        privacy_mode: bool,
    ) -> Result<TxOutcome, ContractError>;

    async fn clear_voter_history(&self) -> Result<TxOutcome, ContractError>;
}
