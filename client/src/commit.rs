//! CommitSubmitter: direct and relayed commits.
//!
//! Order of operations for every commit attempt:
//! 1. the phase must be open and the candidate index in range;
//! 2. the voter's on-chain commitment slot must be empty;
//! 3. fresh secret material is drawn and the commitment computed;
//! 4. the secret is persisted as `Pending` before anything is broadcast;
//! 5. the commit is submitted and its confirmation awaited.
//!
//! A record is discarded only when the contract rejects the commit. After a network
//! failure or an unconfirmed submission the on-chain effect is unknown, so the secret is
//! kept for [`VotingClient::status`] to reconcile.

use ballot_contract::{ContractError, MetaCommitRequest, TxOutcome, VotingContract};
use ballot_crypto::{compute_commitment, EntropySource, Eip712Domain, LocalKey, MetaCommit};
use ballot_store::{SecretRecord, SecretStore};
use ballot_types::{Address, CandidateId, Clock, Commitment, TxHash, VotingPhase};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ClientError, PreconditionFailure};
use crate::workflow::VotingClient;

/// The result of a commit that reached the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub voter: Address,
    pub candidate: CandidateId,
    pub commitment: Commitment,
    pub tx_hash: TxHash,
    /// Block of the confirmed transaction; `None` while pending.
    pub block_number: Option<u64>,
    pub relayed: bool,
}

impl CommitReceipt {
    fn new(
        voter: Address,
        candidate: CandidateId,
        commitment: Commitment,
        outcome: &TxOutcome,
        relayed: bool,
    ) -> Self {
        let block_number = match outcome {
            TxOutcome::Confirmed(receipt) => Some(receipt.block_number),
            TxOutcome::Pending(_) => None,
        };
        Self {
            voter,
            candidate,
            commitment,
            tx_hash: outcome.tx_hash(),
            block_number,
            relayed,
        }
    }

    /// Broadcast but not yet confirmed. Not a failure; requery later.
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

impl<C, S, K, E> VotingClient<C, S, K, E>
where
    C: VotingContract,
    S: SecretStore,
    K: Clock,
    E: EntropySource,
{
    /// Commit a vote for `candidate` from the contract handle's own signer.
    pub async fn commit(&self, candidate: CandidateId) -> Result<CommitReceipt, ClientError> {
        let voter = self.voter()?;
        self.check_commit(voter, candidate).await?;
        let record = self.retain_secret(voter, candidate)?;

        let result = self.contract.commit_vote(record.commitment).await;
        self.settle_commit(record, result, false)
    }

    /// Commit a vote signed by `voter_key` and submitted by the contract handle's relayer.
    ///
    /// The voter signs an EIP-712 `MetaCommit` over the contract's replay nonce; a
    /// transport failure of the relay is reported as `Network { relayed: true }`.
    pub async fn commit_relayed(
        &self,
        voter_key: &LocalKey,
        candidate: CandidateId,
    ) -> Result<CommitReceipt, ClientError> {
        if self.contract.signer().is_none() {
            return Err(ClientError::Configuration("no relayer key configured".into()));
        }
        let voter = voter_key.address();
        self.check_commit(voter, candidate).await?;
        let meta_nonce = self.contract.meta_nonce(voter).await?;
        let record = self.retain_secret(voter, candidate)?;

        let message = MetaCommit {
            voter,
            commitment: record.commitment,
            nonce: meta_nonce,
        };
        let domain = Eip712Domain::ballot(self.contract.chain_id(), self.contract.address());
        let signature = message
            .sign(&domain, voter_key)
            .map_err(|e| ClientError::Configuration(format!("cannot sign relayed commit: {e}")))?;
        let request = MetaCommitRequest {
            voter,
            commitment: record.commitment,
            nonce: meta_nonce,
            signature,
        };

        let result = self.contract.meta_commit_vote(&request).await;
        self.settle_commit(record, result, true)
    }

    async fn check_commit(&self, voter: Address, candidate: CandidateId) -> Result<(), ClientError> {
        let snapshot = self.tracker.observe(&self.contract).await?;
        snapshot.require(VotingPhase::Open)?;

        let status = self.contract.voting_status().await?;
        if !candidate.is_within(status.proposal_count) {
            return Err(ClientError::Validation(format!(
                "candidate {candidate} out of range (ballot has {} proposals)",
                status.proposal_count
            )));
        }

        let existing = self.contract.vote_commitment(voter).await?;
        if !existing.is_empty() {
            return Err(PreconditionFailure::AlreadyCommitted {
                commitment: existing,
            }
            .into());
        }
        Ok(())
    }

    /// Draw a secret and persist it. Nothing is submitted.
    fn retain_secret(
        &self,
        voter: Address,
        candidate: CandidateId,
    ) -> Result<SecretRecord, ClientError> {
        let secret = self.fresh_secret()?;
        let commitment = compute_commitment(&voter, candidate, secret.nonce, &secret.salt);
        let record = SecretRecord::new(
            self.contract.address(),
            voter,
            candidate,
            secret,
            commitment,
            self.tracker.now(),
        );
        self.store.save(&record)?;
        debug!(%voter, %commitment, "retained secret before submission");
        Ok(record)
    }

    fn settle_commit(
        &self,
        mut record: SecretRecord,
        result: Result<TxOutcome, ContractError>,
        relayed: bool,
    ) -> Result<CommitReceipt, ClientError> {
        let now = self.tracker.now();
        match result {
            Ok(outcome) => {
                match outcome {
                    TxOutcome::Confirmed(receipt) => {
                        info!(
                            voter = %record.voter,
                            commitment = %record.commitment,
                            tx = %receipt.tx_hash,
                            block = receipt.block_number,
                            relayed,
                            "commit confirmed"
                        );
                        record.mark_committed(Some(receipt.tx_hash), Some(receipt.block_number), now);
                    }
                    TxOutcome::Pending(hash) => {
                        info!(
                            voter = %record.voter,
                            commitment = %record.commitment,
                            tx = %hash,
                            relayed,
                            "commit submitted, confirmation pending"
                        );
                        record.mark_submitted(hash, now);
                    }
                }
                self.save_progress(&record);
                Ok(CommitReceipt::new(
                    record.voter,
                    record.candidate,
                    record.commitment,
                    &outcome,
                    relayed,
                ))
            }
            Err(err) => {
                let err = ClientError::from_contract(err, relayed);
                if let ClientError::ContractRejection(reason) = &err {
                    warn!(voter = %record.voter, %reason, relayed, "commit rejected by contract");
                    if let Err(e) =
                        self.store
                            .discard(&record.contract, &record.voter, &record.commitment)
                    {
                        warn!(error = %e, "could not discard rejected secret");
                    }
                } else {
                    warn!(
                        voter = %record.voter,
                        commitment = %record.commitment,
                        error = %err,
                        "commit outcome unknown, secret retained"
                    );
                }
                Err(err)
            }
        }
    }
}
