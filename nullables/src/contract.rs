//! Nullable voting contract — an in-memory ballot with the on-chain rules.
//!
//! Enforces the deployed contract's checks: phase windows, one commit per voter,
//! commitment verification on reveal, EIP-712 meta-commits with a replay nonce and
//! chairperson-only admin. Voting rights are enforced on commits once
//! [`NullContract::require_voting_rights`] is switched on. Violations are reported as the
//! matching custom revert.

use ballot_contract::{
    AdminContract, BallotError, ContractError, MetaCommitRequest, ProposalRecord, RevertReason,
    TxOutcome, TxReceipt, VotingContract,
};
use ballot_crypto::{compute_commitment, Eip712Domain, MetaCommit};
use ballot_types::{
    Address, CandidateId, Clock, Commitment, CommitmentStatus, Nonce, Salt, Timestamp, TxHash,
    VotingPhase, VotingSchedule, VotingStatus, WinningProposal,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::clock::NullClock;

/// A write the contract received, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    CommitVote {
        sender: Address,
        commitment: Commitment,
    },
    MetaCommitVote {
        relayer: Address,
        voter: Address,
        commitment: Commitment,
    },
    RevealVote {
        sender: Address,
        candidate: CandidateId,
        nonce: Nonce,
    },
    Admin {
        sender: Address,
        method: &'static str,
    },
}

/// A failure to inject into the next write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The write never reaches the contract.
    Transport(String),
    /// The contract rejects the write.
    Revert(RevertReason),
}

impl Failure {
    fn into_error(self) -> ContractError {
        match self {
            Self::Transport(message) => ContractError::Transport(message),
            Self::Revert(reason) => ContractError::Reverted(reason),
        }
    }
}

#[derive(Default)]
struct BallotState {
    schedule: Option<VotingSchedule>,
    proposals: Vec<ProposalRecord>,
    chairperson: Address,
    commitments: HashMap<Address, Commitment>,
    revealed: HashSet<Address>,
    meta_nonces: HashMap<Address, u64>,
    voting_rights: HashSet<Address>,
    results_public: bool,
    privacy_mode: bool,
}

/// In-memory stand-in for a deployed ballot.
pub struct NullContract {
    address: Address,
    chain_id: u64,
    clock: NullClock,
    signer: Cell<Option<Address>>,
    state: RefCell<BallotState>,
    calls: RefCell<Vec<ContractCall>>,
    reads: Cell<usize>,
    next_failure: RefCell<Option<Failure>>,
    pending: Cell<bool>,
    rights_required: Cell<bool>,
    block: Cell<u64>,
}

impl NullContract {
    /// A ballot over `proposals` following `schedule`, with `chairperson` as admin.
    pub fn new(
        address: Address,
        chain_id: u64,
        clock: NullClock,
        proposals: &[[u8; 32]],
        schedule: VotingSchedule,
        chairperson: Address,
    ) -> Self {
        let state = BallotState {
            schedule: Some(schedule),
            proposals: proposals
                .iter()
                .map(|name| ProposalRecord {
                    name: *name,
                    votes: 0,
                })
                .collect(),
            chairperson,
            ..BallotState::default()
        };
        Self {
            address,
            chain_id,
            clock,
            signer: Cell::new(None),
            state: RefCell::new(state),
            calls: RefCell::new(Vec::new()),
            reads: Cell::new(0),
            next_failure: RefCell::new(None),
            pending: Cell::new(false),
            rights_required: Cell::new(false),
            block: Cell::new(1),
        }
    }

    /// Set the account that sends writes.
    pub fn set_signer(&self, signer: Option<Address>) {
        self.signer.set(signer);
    }

    /// Fail the next write with `failure`, leaving state untouched.
    pub fn fail_next_write(&self, failure: Failure) {
        *self.next_failure.borrow_mut() = Some(failure);
    }

    /// When set, writes take effect but report `TxOutcome::Pending`.
    pub fn set_pending(&self, pending: bool) {
        self.pending.set(pending);
    }

    /// When set, commits from voters without a granted right revert with `NoRightToVote`.
    pub fn require_voting_rights(&self, required: bool) {
        self.rights_required.set(required);
    }

    /// Record a commitment directly, as if a transaction from an earlier session landed.
    pub fn seed_commitment(&self, voter: Address, commitment: Commitment) {
        self.state.borrow_mut().commitments.insert(voter, commitment);
    }

    pub fn set_schedule(&self, schedule: VotingSchedule) {
        self.state.borrow_mut().schedule = Some(schedule);
    }

    /// Writes received so far, including rejected ones.
    pub fn calls(&self) -> Vec<ContractCall> {
        self.calls.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn is_revealed(&self, voter: &Address) -> bool {
        self.state.borrow().revealed.contains(voter)
    }

    pub fn has_voting_right(&self, voter: &Address) -> bool {
        self.state.borrow().voting_rights.contains(voter)
    }

    pub fn votes(&self) -> Vec<u64> {
        self.state.borrow().proposals.iter().map(|p| p.votes).collect()
    }

    pub fn privacy_mode(&self) -> bool {
        self.state.borrow().privacy_mode
    }

    fn read(&self) {
        self.reads.set(self.reads.get() + 1);
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn phase(&self) -> Option<VotingPhase> {
        self.state
            .borrow()
            .schedule
            .map(|schedule| schedule.phase_at(self.now()))
    }

    /// Log the call, then apply any injected failure.
    fn begin_write(&self, call: ContractCall) -> Result<(), ContractError> {
        self.calls.borrow_mut().push(call);
        match self.next_failure.borrow_mut().take() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn may_vote(&self, state: &BallotState, voter: &Address) -> bool {
        !self.rights_required.get() || state.voting_rights.contains(voter)
    }

    fn sender(&self) -> Result<Address, ContractError> {
        self.signer.get().ok_or(ContractError::NoSigner)
    }

    fn outcome(&self) -> TxOutcome {
        let block = self.block.get();
        self.block.set(block + 1);
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&block.to_be_bytes());
        hash[8..28].copy_from_slice(self.address.as_bytes());
        let tx_hash = TxHash::new(hash);
        if self.pending.get() {
            TxOutcome::Pending(tx_hash)
        } else {
            TxOutcome::Confirmed(TxReceipt {
                tx_hash,
                block_number: block,
                gas_used: 50_000,
            })
        }
    }

    fn admin_write(
        &self,
        method: &'static str,
        apply: impl FnOnce(&mut BallotState, Timestamp) -> Result<(), BallotError>,
    ) -> Result<TxOutcome, ContractError> {
        let sender = self.sender()?;
        self.begin_write(ContractCall::Admin { sender, method })?;
        let now = self.now();
        let mut state = self.state.borrow_mut();
        if sender != state.chairperson {
            return Err(revert(BallotError::OnlyChairperson));
        }
        apply(&mut state, now).map_err(revert)?;
        drop(state);
        Ok(self.outcome())
    }
}

fn revert(error: BallotError) -> ContractError {
    ContractError::Reverted(RevertReason::Custom(error))
}

fn ensure(condition: bool, error: BallotError) -> Result<(), ContractError> {
    if condition {
        Ok(())
    } else {
        Err(revert(error))
    }
}

impl VotingContract for NullContract {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn signer(&self) -> Option<Address> {
        self.signer.get()
    }

    async fn voting_status(&self) -> Result<VotingStatus, ContractError> {
        self.read();
        let phase = self.phase();
        let state = self.state.borrow();
        let has_ended = state
            .schedule
            .map_or(false, |schedule| self.now() >= schedule.end);
        Ok(VotingStatus {
            has_ended,
            is_active: phase == Some(VotingPhase::Open),
            is_reveal_period: phase == Some(VotingPhase::AwaitingReveal),
            results_public: state.results_public
                || (!state.privacy_mode
                    && matches!(phase, Some(VotingPhase::Revealed | VotingPhase::Closed))),
            proposal_count: state.proposals.len() as u64,
        })
    }

    async fn all_proposals(&self) -> Result<Vec<ProposalRecord>, ContractError> {
        self.read();
        Ok(self.state.borrow().proposals.clone())
    }

    async fn commitment_status(&self, voter: Address) -> Result<CommitmentStatus, ContractError> {
        self.read();
        let state = self.state.borrow();
        let commitment = state
            .commitments
            .get(&voter)
            .copied()
            .unwrap_or(Commitment::ZERO);
        Ok(CommitmentStatus {
            has_committed: !commitment.is_empty(),
            has_revealed: state.revealed.contains(&voter),
            commitment,
        })
    }

    async fn vote_commitment(&self, voter: Address) -> Result<Commitment, ContractError> {
        self.read();
        Ok(self
            .state
            .borrow()
            .commitments
            .get(&voter)
            .copied()
            .unwrap_or(Commitment::ZERO))
    }

    async fn has_revealed(&self, voter: Address) -> Result<bool, ContractError> {
        self.read();
        Ok(self.state.borrow().revealed.contains(&voter))
    }

    async fn meta_nonce(&self, voter: Address) -> Result<u64, ContractError> {
        self.read();
        Ok(self
            .state
            .borrow()
            .meta_nonces
            .get(&voter)
            .copied()
            .unwrap_or(0))
    }

    async fn schedule(&self) -> Result<VotingSchedule, ContractError> {
        self.read();
        self.state
            .borrow()
            .schedule
            .ok_or_else(|| ContractError::Decode("schedule not configured".into()))
    }

    async fn winning_proposal(&self) -> Result<WinningProposal, ContractError> {
        self.read();
        let phase = self.phase();
        let state = self.state.borrow();
        let public = state.results_public
            || (!state.privacy_mode
                && matches!(phase, Some(VotingPhase::Revealed | VotingPhase::Closed)));
        ensure(public, BallotError::ResultsNotYetPublic)?;
        let mut winner = WinningProposal {
            index: CandidateId::new(0),
            vote_count: 0,
            is_tie: false,
        };
        for (index, proposal) in state.proposals.iter().enumerate() {
            if proposal.votes > winner.vote_count {
                winner = WinningProposal {
                    index: CandidateId::new(index as u64),
                    vote_count: proposal.votes,
                    is_tie: false,
                };
            } else if proposal.votes == winner.vote_count && index > 0 {
                winner.is_tie = true;
            }
        }
        Ok(winner)
    }

    async fn chairperson(&self) -> Result<Address, ContractError> {
        self.read();
        Ok(self.state.borrow().chairperson)
    }

    async fn commit_vote(&self, commitment: Commitment) -> Result<TxOutcome, ContractError> {
        let sender = self.sender()?;
        self.begin_write(ContractCall::CommitVote { sender, commitment })?;
        ensure(
            self.phase() == Some(VotingPhase::Open),
            BallotError::NotWithinVotingPeriod,
        )?;
        ensure(!commitment.is_empty(), BallotError::InvalidCommitment)?;
        let mut state = self.state.borrow_mut();
        ensure(
            self.may_vote(&state, &sender),
            BallotError::NoRightToVote,
        )?;
        ensure(
            !state.commitments.contains_key(&sender),
            BallotError::AlreadyVoted,
        )?;
        state.commitments.insert(sender, commitment);
        drop(state);
        Ok(self.outcome())
    }

    async fn meta_commit_vote(
        &self,
        request: &MetaCommitRequest,
    ) -> Result<TxOutcome, ContractError> {
        let relayer = self.sender()?;
        self.begin_write(ContractCall::MetaCommitVote {
            relayer,
            voter: request.voter,
            commitment: request.commitment,
        })?;
        ensure(
            self.phase() == Some(VotingPhase::Open),
            BallotError::NotWithinVotingPeriod,
        )?;
        ensure(!request.commitment.is_empty(), BallotError::InvalidCommitment)?;
        let mut state = self.state.borrow_mut();
        ensure(
            self.may_vote(&state, &request.voter),
            BallotError::NoRightToVote,
        )?;
        let expected = state.meta_nonces.get(&request.voter).copied().unwrap_or(0);
        ensure(request.nonce == expected, BallotError::InvalidNonce)?;
        let message = MetaCommit {
            voter: request.voter,
            commitment: request.commitment,
            nonce: request.nonce,
        };
        let domain = Eip712Domain::ballot(self.chain_id, self.address);
        ensure(
            message.verify(&domain, &request.signature),
            BallotError::InvalidSignature,
        )?;
        ensure(
            !state.commitments.contains_key(&request.voter),
            BallotError::AlreadyVoted,
        )?;
        state.commitments.insert(request.voter, request.commitment);
        state.meta_nonces.insert(request.voter, expected + 1);
        drop(state);
        Ok(self.outcome())
    }

    async fn reveal_vote(
        &self,
        candidate: CandidateId,
        nonce: Nonce,
        salt: &Salt,
    ) -> Result<TxOutcome, ContractError> {
        let sender = self.sender()?;
        self.begin_write(ContractCall::RevealVote {
            sender,
            candidate,
            nonce,
        })?;
        ensure(
            self.phase() == Some(VotingPhase::AwaitingReveal),
            BallotError::NotWithinRevealPeriod,
        )?;
        let mut state = self.state.borrow_mut();
        let committed = state
            .commitments
            .get(&sender)
            .copied()
            .ok_or_else(|| revert(BallotError::NoRightToVote))?;
        ensure(
            !state.revealed.contains(&sender),
            BallotError::AlreadyRevealed,
        )?;
        ensure(
            candidate.is_within(state.proposals.len() as u64),
            BallotError::InvalidProposalIndex,
        )?;
        ensure(
            compute_commitment(&sender, candidate, nonce, salt) == committed,
            BallotError::InvalidCommitment,
        )?;
        state.revealed.insert(sender);
        state.proposals[candidate.index() as usize].votes += 1;
        drop(state);
        Ok(self.outcome())
    }
}

impl AdminContract for NullContract {
    async fn set_voting_time(&self, start: u64, end: u64) -> Result<TxOutcome, ContractError> {
        self.admin_write("setVotingTime", |state, _| {
            if start >= end {
                return Err(BallotError::InvalidTimeRange);
            }
            let reveal = state.schedule.and_then(|s| s.reveal);
            state.schedule = Some(VotingSchedule::new(
                Timestamp::new(start),
                Timestamp::new(end),
                reveal,
            ));
            Ok(())
        })
    }

    async fn delay_voting_start(&self, delay_secs: u64) -> Result<TxOutcome, ContractError> {
        self.admin_write("delayVotingStart", |state, now| {
            let schedule = state.schedule.ok_or(BallotError::InvalidTimeRange)?;
            if now >= schedule.start {
                return Err(BallotError::VotingInProgress);
            }
            state.schedule = Some(VotingSchedule::new(
                schedule.start.saturating_add(delay_secs),
                schedule.end.saturating_add(delay_secs),
                schedule.reveal.map(|r| r.saturating_add(delay_secs)),
            ));
            Ok(())
        })
    }

    async fn start_voting_early(&self) -> Result<TxOutcome, ContractError> {
        self.admin_write("startVotingEarly", |state, now| {
            let schedule = state.schedule.ok_or(BallotError::InvalidTimeRange)?;
            if now >= schedule.start {
                return Err(BallotError::VotingInProgress);
            }
            state.schedule = Some(VotingSchedule::new(now, schedule.end, schedule.reveal));
            Ok(())
        })
    }

    async fn emergency_stop(&self) -> Result<TxOutcome, ContractError> {
        self.admin_write("emergencyStop", |state, now| {
            let schedule = state.schedule.ok_or(BallotError::InvalidTimeRange)?;
            state.schedule = Some(VotingSchedule::new(schedule.start, now, schedule.reveal));
            Ok(())
        })
    }

    async fn force_reveal_results(&self) -> Result<TxOutcome, ContractError> {
        self.admin_write("forceRevealResults", |state, _| {
            state.results_public = true;
            Ok(())
        })
    }

    async fn give_right_to_vote(&self, voter: Address) -> Result<TxOutcome, ContractError> {
        self.admin_write("giveRightToVote", |state, _| {
            if !state.voting_rights.insert(voter) {
                return Err(BallotError::AlreadyHasVotingRight);
            }
            Ok(())
        })
    }

    async fn batch_give_right_to_vote(
        &self,
        voters: &[Address],
    ) -> Result<TxOutcome, ContractError> {
        self.admin_write("batchGiveRightToVote", |state, _| {
            state.voting_rights.extend(voters.iter().copied());
            Ok(())
        })
    }

    async fn reset_voting(
        &self,
        proposal_names: &[[u8; 32]],
        start: u64,
        end: u64,
        reveal: u64,
        privacy_mode: bool,
    ) -> Result<TxOutcome, ContractError> {
        self.admin_write("resetVoting", |state, _| {
            let schedule = VotingSchedule::from_raw(start, end, reveal);
            if !schedule.is_well_formed() {
                return Err(BallotError::InvalidTimeRange);
            }
            state.schedule = Some(schedule);
            state.proposals = proposal_names
                .iter()
                .map(|name| ProposalRecord {
                    name: *name,
                    votes: 0,
                })
                .collect();
            state.commitments.clear();
            state.revealed.clear();
            state.results_public = false;
            state.privacy_mode = privacy_mode;
            Ok(())
        })
    }

    async fn clear_voter_history(&self) -> Result<TxOutcome, ContractError> {
        self.admin_write("clearVoterHistory", |state, _| {
            state.commitments.clear();
            state.revealed.clear();
            Ok(())
        })
    }
}
