//! The voting workflow facade: one voter, one contract, one secret store.

use ballot_contract::VotingContract;
use ballot_crypto::{generate_secret, EntropySource, OsEntropy};
use ballot_store::{RecordStatus, SecretRecord, SecretStore};
use ballot_types::{Address, Clock, CommitmentStatus, SecretMaterial, SystemClock};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::phase::{PhaseSnapshot, PhaseTracker};

/// Drives commit, reveal and reconciliation against a [`VotingContract`].
///
/// Every external collaborator is injected: the contract handle, the secret store, the
/// clock that gates phases and the entropy source for secret material.
pub struct VotingClient<C, S, K = SystemClock, E = OsEntropy> {
    pub(crate) contract: C,
    pub(crate) store: S,
    pub(crate) tracker: PhaseTracker<K>,
    pub(crate) entropy: E,
    pub(crate) verify_before_reveal: bool,
}

impl<C: VotingContract, S: SecretStore> VotingClient<C, S> {
    pub fn new(contract: C, store: S) -> Self {
        Self {
            contract,
            store,
            tracker: PhaseTracker::new(SystemClock),
            entropy: OsEntropy,
            verify_before_reveal: true,
        }
    }

    /// A client honouring the workflow options of `config`.
    pub fn from_config(contract: C, store: S, config: &ClientConfig) -> Self {
        Self::new(contract, store).verify_before_reveal(config.verify_before_reveal)
    }
}

impl<C, S, K, E> VotingClient<C, S, K, E>
where
    C: VotingContract,
    S: SecretStore,
    K: Clock,
    E: EntropySource,
{
    pub fn with_clock<K2: Clock>(self, clock: K2) -> VotingClient<C, S, K2, E> {
        VotingClient {
            contract: self.contract,
            store: self.store,
            tracker: PhaseTracker::new(clock),
            entropy: self.entropy,
            verify_before_reveal: self.verify_before_reveal,
        }
    }

    pub fn with_entropy<E2: EntropySource>(self, entropy: E2) -> VotingClient<C, S, K, E2> {
        VotingClient {
            contract: self.contract,
            store: self.store,
            tracker: self.tracker,
            entropy,
            verify_before_reveal: self.verify_before_reveal,
        }
    }

    /// Whether reveals first compare the local recomputation with the stored commitment.
    pub fn verify_before_reveal(mut self, enabled: bool) -> Self {
        self.verify_before_reveal = enabled;
        self
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The current phase, freshly derived from the contract's schedule.
    pub async fn phase(&self) -> Result<PhaseSnapshot, ClientError> {
        self.tracker.observe(&self.contract).await
    }

    /// The account direct writes are sent from.
    pub(crate) fn voter(&self) -> Result<Address, ClientError> {
        self.contract
            .signer()
            .ok_or_else(|| ClientError::Configuration("no voter key configured".into()))
    }

    pub(crate) fn fresh_secret(&self) -> Result<SecretMaterial, ClientError> {
        generate_secret(&self.entropy)
            .map_err(|e| ClientError::Configuration(format!("entropy source unavailable: {e}")))
    }

    /// Persist a record update whose loss would not lose the secret itself.
    pub(crate) fn save_progress(&self, record: &SecretRecord) {
        if let Err(e) = self.store.save(record) {
            warn!(commitment = %record.commitment, error = %e, "could not update retained secret");
        }
    }

    /// Requery the contract and bring local records for `voter` in line with it.
    ///
    /// A `Pending` record whose commitment is the one stored on chain becomes `Committed`,
    /// and a `Committed` one becomes `Revealed` once the contract reports the reveal.
    /// Records for other attempts are listed untouched so the voter can decide what to do.
    pub async fn status(&self, voter: Address) -> Result<StatusReport, ClientError> {
        let snapshot = self.tracker.observe(&self.contract).await?;
        let on_chain = self.contract.commitment_status(voter).await?;
        let contract = self.contract.address();
        let now = self.tracker.now();

        let mut records = self.store.load(&contract, &voter)?;
        for record in records.iter_mut() {
            if !on_chain.has_committed || record.commitment != on_chain.commitment {
                continue;
            }
            let updated = match record.status {
                RecordStatus::Pending => {
                    record.mark_committed(None, None, now);
                    if on_chain.has_revealed {
                        record.mark_revealed(now);
                    }
                    true
                }
                RecordStatus::Committed if on_chain.has_revealed => {
                    record.mark_revealed(now);
                    true
                }
                _ => false,
            };
            if updated {
                info!(commitment = %record.commitment, status = ?record.status, "reconciled retained secret");
                self.store.save(record)?;
            }
        }

        Ok(StatusReport {
            voter,
            contract,
            snapshot,
            on_chain,
            records,
        })
    }
}

/// On-chain state next to the voter's retained secrets.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub voter: Address,
    pub contract: Address,
    pub snapshot: PhaseSnapshot,
    pub on_chain: CommitmentStatus,
    pub records: Vec<SecretRecord>,
}

impl StatusReport {
    /// The retained record matching the on-chain commitment, if any.
    pub fn active_record(&self) -> Option<&SecretRecord> {
        if !self.on_chain.has_committed {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.commitment == self.on_chain.commitment)
    }

    /// Records whose commits never landed on chain.
    pub fn orphaned_records(&self) -> impl Iterator<Item = &SecretRecord> {
        self.records
            .iter()
            .filter(move |r| !self.on_chain.has_committed || r.commitment != self.on_chain.commitment)
    }
}
