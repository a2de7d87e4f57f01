//! RevealSubmitter: open a confirmed commitment with its retained secret.

use ballot_contract::{TxOutcome, VotingContract};
use ballot_crypto::{compute_commitment, EntropySource};
use ballot_store::SecretStore;
use ballot_types::{Address, CandidateId, Clock, Commitment, SecretMaterial, TxHash};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ClientError, PreconditionFailure};
use crate::workflow::VotingClient;

/// The result of a reveal that reached the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RevealReceipt {
    pub voter: Address,
    pub candidate: CandidateId,
    pub commitment: Commitment,
    pub tx_hash: TxHash,
    /// Block of the confirmed transaction; `None` while pending.
    pub block_number: Option<u64>,
}

impl RevealReceipt {
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

/// A local recomputation compared against the on-chain commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub voter: Address,
    pub stored: Commitment,
    pub computed: Commitment,
}

impl VerifyReport {
    pub fn matches(&self) -> bool {
        !self.stored.is_empty() && self.stored == self.computed
    }
}

impl<C, S, K, E> VotingClient<C, S, K, E>
where
    C: VotingContract,
    S: SecretStore,
    K: Clock,
    E: EntropySource,
{
    /// Reveal the signer's on-chain commitment using the secret retained when it was made.
    pub async fn reveal(&self) -> Result<RevealReceipt, ClientError> {
        self.reveal_inner(None).await
    }

    /// Reveal with an explicitly supplied secret, e.g. one restored from a backup.
    pub async fn reveal_with(
        &self,
        candidate: CandidateId,
        secret: &SecretMaterial,
    ) -> Result<RevealReceipt, ClientError> {
        self.reveal_inner(Some((candidate, secret.clone()))).await
    }

    /// Recompute the commitment for `(candidate, secret)` and compare it with the one the
    /// contract stores for `voter`. Submits nothing.
    pub async fn verify(
        &self,
        voter: Address,
        candidate: CandidateId,
        secret: &SecretMaterial,
    ) -> Result<VerifyReport, ClientError> {
        let stored = self.contract.vote_commitment(voter).await?;
        let computed = compute_commitment(&voter, candidate, secret.nonce, &secret.salt);
        Ok(VerifyReport {
            voter,
            stored,
            computed,
        })
    }

    async fn reveal_inner(
        &self,
        explicit: Option<(CandidateId, SecretMaterial)>,
    ) -> Result<RevealReceipt, ClientError> {
        let voter = self.voter()?;
        let snapshot = self.tracker.observe(&self.contract).await?;
        snapshot.require_reveal_window()?;

        let on_chain = self.contract.commitment_status(voter).await?;
        if on_chain.has_revealed {
            return Err(PreconditionFailure::AlreadyRevealed.into());
        }
        if !on_chain.has_committed || on_chain.commitment.is_empty() {
            return Err(PreconditionFailure::NotCommitted.into());
        }

        let contract = self.contract.address();
        let record = self.store.find(&contract, &voter, &on_chain.commitment)?;
        let (candidate, secret) = match (explicit, &record) {
            (Some(pair), _) => pair,
            (None, Some(record)) => (record.candidate, record.secret.clone()),
            (None, None) => {
                return Err(PreconditionFailure::NoRetainedSecret {
                    commitment: on_chain.commitment,
                }
                .into())
            }
        };

        let status = self.contract.voting_status().await?;
        if !candidate.is_within(status.proposal_count) {
            return Err(ClientError::Validation(format!(
                "candidate {candidate} out of range (ballot has {} proposals)",
                status.proposal_count
            )));
        }

        if self.verify_before_reveal {
            let computed = compute_commitment(&voter, candidate, secret.nonce, &secret.salt);
            if computed != on_chain.commitment {
                warn!(%voter, stored = %on_chain.commitment, %computed, "reveal data does not match commitment");
                return Err(ClientError::Mismatch {
                    stored: on_chain.commitment,
                    computed,
                });
            }
        }

        let outcome = self
            .contract
            .reveal_vote(candidate, secret.nonce, &secret.salt)
            .await
            .map_err(ClientError::from)?;

        let block_number = match outcome {
            TxOutcome::Confirmed(receipt) => {
                info!(%voter, tx = %receipt.tx_hash, block = receipt.block_number, "reveal confirmed");
                if let Some(mut record) = record {
                    record.mark_revealed(self.tracker.now());
                    self.save_progress(&record);
                }
                Some(receipt.block_number)
            }
            TxOutcome::Pending(hash) => {
                info!(%voter, tx = %hash, "reveal submitted, confirmation pending");
                None
            }
        };

        Ok(RevealReceipt {
            voter,
            candidate,
            commitment: on_chain.commitment,
            tx_hash: outcome.tx_hash(),
            block_number,
        })
    }
}
