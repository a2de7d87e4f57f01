//! Client-side retention of commit secrets.
//!
//! A voter's nonce and salt exist nowhere else: if they are lost the vote can never be
//! revealed. Every backend implements [`SecretStore`]; the workflow depends only on the
//! trait.

pub mod encrypted;
pub mod error;
mod file;
pub mod memory;
pub mod record;

pub use encrypted::{EncryptedSecretStore, KdfParams};
pub use error::StoreError;
pub use file::FileSecretStore;
pub use memory::MemorySecretStore;
pub use record::{RecordStatus, SecretRecord};

use ballot_types::{Address, Commitment};

/// Storage of commit secrets, keyed by (contract, voter) and then by commitment.
pub trait SecretStore {
    /// Insert or replace the record with the same contract, voter and commitment.
    fn save(&self, record: &SecretRecord) -> Result<(), StoreError>;

    /// All records for a voter on a contract, oldest first.
    fn load(&self, contract: &Address, voter: &Address) -> Result<Vec<SecretRecord>, StoreError>;

    /// Remove one record. Returns whether it existed.
    fn discard(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError>;

    /// Remove every record for a voter on a contract.
    fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError>;

    fn find(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<Option<SecretRecord>, StoreError> {
        Ok(self
            .load(contract, voter)?
            .into_iter()
            .find(|r| r.commitment == *commitment))
    }
}

impl<T: SecretStore + ?Sized> SecretStore for Box<T> {
    fn save(&self, record: &SecretRecord) -> Result<(), StoreError> {
        (**self).save(record)
    }

    fn load(&self, contract: &Address, voter: &Address) -> Result<Vec<SecretRecord>, StoreError> {
        (**self).load(contract, voter)
    }

    fn discard(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError> {
        (**self).discard(contract, voter, commitment)
    }

    fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError> {
        (**self).clear(contract, voter)
    }
}

/// Replace the record with `record.commitment` in `records`, or append it.
pub(crate) fn upsert(records: &mut Vec<SecretRecord>, record: &SecretRecord) {
    match records.iter_mut().find(|r| r.commitment == record.commitment) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
    records.sort_by_key(|r| r.created_at);
}
