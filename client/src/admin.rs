//! Admin console: validated chairperson operations.
//!
//! Each operation validates its inputs locally, confirms the signer is the contract's
//! chairperson and then submits exactly once.

use ballot_contract::{AdminContract, ContractError, TxOutcome};
use ballot_types::{Address, Candidate, Clock, VotingSchedule};
use std::collections::HashSet;
use tracing::info;

use crate::error::{ClientError, PreconditionFailure};

/// A fresh ballot for [`AdminConsole::reset_voting`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallotReset {
    pub candidates: Vec<String>,
    pub start: u64,
    pub end: u64,
    /// Reveal deadline; `None` for a ballot without a reveal window.
    pub reveal: Option<u64>,
    /// Keep results private until the chairperson forces them public.
    pub privacy_mode: bool,
}

pub struct AdminConsole<'a, C, K> {
    contract: &'a C,
    clock: K,
}

impl<'a, C: AdminContract, K: Clock> AdminConsole<'a, C, K> {
    pub fn new(contract: &'a C, clock: K) -> Self {
        Self { contract, clock }
    }

    /// Set the commit window. `start` must be in the future and before `end`, and `end`
    /// must stay before the reveal deadline already on chain.
    pub async fn set_voting_time(&self, start: u64, end: u64) -> Result<TxOutcome, ClientError> {
        if start >= end {
            return Err(ClientError::Validation(format!(
                "start {start} must be before end {end}"
            )));
        }
        let now = self.clock.now().as_secs();
        if start <= now {
            return Err(ClientError::Validation(format!(
                "start {start} is not in the future (now {now})"
            )));
        }
        let current = self.contract.schedule().await?;
        if let Some(reveal) = current.reveal {
            if end >= reveal.as_secs() {
                return Err(ClientError::Validation(format!(
                    "end {end} must be before the reveal deadline {}",
                    reveal.as_secs()
                )));
            }
        }
        self.ensure_chairperson().await?;
        self.submitted("setVotingTime", self.contract.set_voting_time(start, end).await)
    }

    pub async fn delay_voting_start(&self, delay_secs: u64) -> Result<TxOutcome, ClientError> {
        if delay_secs == 0 {
            return Err(ClientError::Validation("delay must be positive".into()));
        }
        self.ensure_chairperson().await?;
        self.submitted(
            "delayVotingStart",
            self.contract.delay_voting_start(delay_secs).await,
        )
    }

    pub async fn start_voting_early(&self) -> Result<TxOutcome, ClientError> {
        self.ensure_chairperson().await?;
        self.submitted("startVotingEarly", self.contract.start_voting_early().await)
    }

    pub async fn emergency_stop(&self) -> Result<TxOutcome, ClientError> {
        self.ensure_chairperson().await?;
        self.submitted("emergencyStop", self.contract.emergency_stop().await)
    }

    pub async fn force_reveal_results(&self) -> Result<TxOutcome, ClientError> {
        self.ensure_chairperson().await?;
        self.submitted(
            "forceRevealResults",
            self.contract.force_reveal_results().await,
        )
    }

    pub async fn give_right_to_vote(&self, voter: Address) -> Result<TxOutcome, ClientError> {
        validate_voters(&[voter])?;
        self.ensure_chairperson().await?;
        self.submitted(
            "giveRightToVote",
            self.contract.give_right_to_vote(voter).await,
        )
    }

    pub async fn batch_give_right_to_vote(
        &self,
        voters: &[Address],
    ) -> Result<TxOutcome, ClientError> {
        validate_voters(voters)?;
        self.ensure_chairperson().await?;
        self.submitted(
            "batchGiveRightToVote",
            self.contract.batch_give_right_to_vote(voters).await,
        )
    }

    /// Replace the ballot: new candidates, new schedule, history cleared.
    pub async fn reset_voting(&self, reset: &BallotReset) -> Result<TxOutcome, ClientError> {
        if reset.candidates.is_empty() {
            return Err(ClientError::Validation("candidate list is empty".into()));
        }
        let names = reset
            .candidates
            .iter()
            .map(|name| {
                Candidate::encode_name(name.trim())
                    .map_err(|e| ClientError::Validation(format!("candidate {name:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let schedule = VotingSchedule::from_raw(reset.start, reset.end, reset.reveal.unwrap_or(0));
        if reset.reveal == Some(0) || !schedule.is_well_formed() {
            return Err(ClientError::Validation(format!(
                "schedule must satisfy start < end < reveal (got {}, {}, {:?})",
                reset.start, reset.end, reset.reveal
            )));
        }
        self.ensure_chairperson().await?;
        self.submitted(
            "resetVoting",
            self.contract
                .reset_voting(
                    &names,
                    reset.start,
                    reset.end,
                    reset.reveal.unwrap_or(0),
                    reset.privacy_mode,
                )
                .await,
        )
    }

    pub async fn clear_voter_history(&self) -> Result<TxOutcome, ClientError> {
        self.ensure_chairperson().await?;
        self.submitted(
            "clearVoterHistory",
            self.contract.clear_voter_history().await,
        )
    }

    async fn ensure_chairperson(&self) -> Result<(), ClientError> {
        let signer = self
            .contract
            .signer()
            .ok_or_else(|| ClientError::Configuration("no admin key configured".into()))?;
        let chairperson = self.contract.chairperson().await?;
        if chairperson != signer {
            return Err(PreconditionFailure::NotChairperson {
                chairperson,
                signer,
            }
            .into());
        }
        Ok(())
    }

    fn submitted(
        &self,
        method: &'static str,
        result: Result<TxOutcome, ContractError>,
    ) -> Result<TxOutcome, ClientError> {
        let outcome = result?;
        info!(
            method,
            tx = %outcome.tx_hash(),
            confirmed = outcome.is_confirmed(),
            "admin transaction submitted"
        );
        Ok(outcome)
    }
}

fn validate_voters(voters: &[Address]) -> Result<(), ClientError> {
    if voters.is_empty() {
        return Err(ClientError::Validation("voter list is empty".into()));
    }
    let mut seen = HashSet::with_capacity(voters.len());
    for voter in voters {
        if voter.is_zero() {
            return Err(ClientError::Validation("zero address in voter list".into()));
        }
        if !seen.insert(voter) {
            return Err(ClientError::Validation(format!(
                "duplicate voter {voter}"
            )));
        }
    }
    Ok(())
}
