//! Process-local secret store. Secrets vanish when the process exits.

use ballot_types::{Address, Commitment};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::record::SecretRecord;
use crate::{upsert, SecretStore};

type Key = (Address, Address);

#[derive(Default)]
pub struct MemorySecretStore {
    records: Mutex<HashMap<Key, Vec<SecretRecord>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Key, Vec<SecretRecord>>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl SecretStore for MemorySecretStore {
    fn save(&self, record: &SecretRecord) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        upsert(
            records.entry((record.contract, record.voter)).or_default(),
            record,
        );
        Ok(())
    }

    fn load(&self, contract: &Address, voter: &Address) -> Result<Vec<SecretRecord>, StoreError> {
        Ok(self
            .lock()?
            .get(&(*contract, *voter))
            .cloned()
            .unwrap_or_default())
    }

    fn discard(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError> {
        let mut records = self.lock()?;
        let Some(list) = records.get_mut(&(*contract, *voter)) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|r| r.commitment != *commitment);
        Ok(list.len() != before)
    }

    fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError> {
        self.lock()?.remove(&(*contract, *voter));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStatus;
    use ballot_types::{CandidateId, Nonce, Salt, SecretMaterial, Timestamp};

    fn record(commitment: u8, at: u64) -> SecretRecord {
        SecretRecord::new(
            Address::new([1; 20]),
            Address::new([2; 20]),
            CandidateId::new(0),
            SecretMaterial::new(Nonce::new(u64::from(commitment)), Salt::new([commitment; 32])),
            Commitment::new([commitment; 32]),
            Timestamp::new(at),
        )
    }

    #[test]
    fn save_load_discard() {
        let store = MemorySecretStore::new();
        let (c, v) = (Address::new([1; 20]), Address::new([2; 20]));
        store.save(&record(2, 20)).unwrap();
        store.save(&record(1, 10)).unwrap();

        let loaded = store.load(&c, &v).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].commitment, Commitment::new([1; 32]));

        assert!(store.discard(&c, &v, &Commitment::new([1; 32])).unwrap());
        assert!(!store.discard(&c, &v, &Commitment::new([1; 32])).unwrap());
        assert_eq!(store.load(&c, &v).unwrap().len(), 1);
    }

    #[test]
    fn save_replaces_same_commitment() {
        let store = MemorySecretStore::new();
        let mut r = record(1, 10);
        store.save(&r).unwrap();
        r.mark_committed(None, Some(5), Timestamp::new(11));
        store.save(&r).unwrap();

        let found = store
            .find(&r.contract, &r.voter, &r.commitment)
            .unwrap()
            .unwrap();
        assert_eq!(found.status, RecordStatus::Committed);
        assert_eq!(store.load(&r.contract, &r.voter).unwrap().len(), 1);
    }

    #[test]
    fn voters_are_isolated() {
        let store = MemorySecretStore::new();
        store.save(&record(1, 10)).unwrap();
        assert!(store
            .load(&Address::new([1; 20]), &Address::new([3; 20]))
            .unwrap()
            .is_empty());
        store
            .clear(&Address::new([1; 20]), &Address::new([2; 20]))
            .unwrap();
        assert!(store
            .load(&Address::new([1; 20]), &Address::new([2; 20]))
            .unwrap()
            .is_empty());
    }
}
