//! The retained secret of one commit attempt.

use ballot_types::{Address, CandidateId, Commitment, SecretMaterial, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Saved before submission; the commit's on-chain effect is not yet known.
    Pending,
    /// The commit transaction was confirmed.
    Committed,
    /// The reveal transaction was confirmed.
    Revealed,
}

/// Everything a voter needs to reveal later, plus bookkeeping about the attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub contract: Address,
    pub voter: Address,
    pub candidate: CandidateId,
    pub secret: SecretMaterial,
    pub commitment: Commitment,
    pub status: RecordStatus,
    #[serde(default)]
    pub tx_hash: Option<TxHash>,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SecretRecord {
    pub fn new(
        contract: Address,
        voter: Address,
        candidate: CandidateId,
        secret: SecretMaterial,
        commitment: Commitment,
        now: Timestamp,
    ) -> Self {
        Self {
            contract,
            voter,
            candidate,
            secret,
            commitment,
            status: RecordStatus::Pending,
            tx_hash: None,
            block_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Note a broadcast transaction whose receipt has not been seen.
    pub fn mark_submitted(&mut self, tx_hash: TxHash, now: Timestamp) {
        self.tx_hash = Some(tx_hash);
        self.updated_at = now;
    }

    pub fn mark_committed(
        &mut self,
        tx_hash: Option<TxHash>,
        block_number: Option<u64>,
        now: Timestamp,
    ) {
        self.status = RecordStatus::Committed;
        if tx_hash.is_some() {
            self.tx_hash = tx_hash;
        }
        if block_number.is_some() {
            self.block_number = block_number;
        }
        self.updated_at = now;
    }

    pub fn mark_revealed(&mut self, now: Timestamp) {
        self.status = RecordStatus::Revealed;
        self.updated_at = now;
    }
}
