//! Status records read back from the voting contract.

use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateId};
use crate::hash::Commitment;

/// Result of `getVotingStatus()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingStatus {
    pub has_ended: bool,
    pub is_active: bool,
    pub is_reveal_period: bool,
    pub results_public: bool,
    pub proposal_count: u64,
}

/// Result of `getCommitmentStatus(voter)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentStatus {
    pub has_committed: bool,
    pub has_revealed: bool,
    pub commitment: Commitment,
}

impl CommitmentStatus {
    pub const NONE: Self = Self {
        has_committed: false,
        has_revealed: false,
        commitment: Commitment::ZERO,
    };
}

/// One entry of `getAllProposals()` with its decoded name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTally {
    pub candidate: Candidate,
    pub votes: u64,
}

/// Result of `getWinningProposal()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningProposal {
    pub index: CandidateId,
    pub vote_count: u64,
    pub is_tie: bool,
}
