//! Nullable secret store — in-memory with failure injection.

use ballot_store::{MemorySecretStore, SecretRecord, SecretStore, StoreError};
use ballot_types::{Address, Commitment};
use std::cell::Cell;

/// An in-memory `SecretStore` whose saves can be made to fail.
#[derive(Default)]
pub struct NullSecretStore {
    inner: MemorySecretStore,
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
}

impl NullSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail until reset.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl SecretStore for NullSecretStore {
    fn save(&self, record: &SecretRecord) -> Result<(), StoreError> {
        if self.fail_saves.get() {
            return Err(StoreError::Io("null store configured to fail".into()));
        }
        self.inner.save(record)?;
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load(&self, contract: &Address, voter: &Address) -> Result<Vec<SecretRecord>, StoreError> {
        self.inner.load(contract, voter)
    }

    fn discard(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError> {
        self.inner.discard(contract, voter, commitment)
    }

    fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError> {
        self.inner.clear(contract, voter)
    }
}
