//! Nullable entropy — reproducible "random" bytes.

use ballot_crypto::{keccak256_multi, CryptoError, EntropySource};
use std::cell::Cell;

/// Deterministic entropy: each `fill` is derived from a seed and a call counter, so
/// successive secrets differ but every test run sees the same sequence.
#[derive(Debug)]
pub struct NullEntropy {
    seed: u64,
    calls: Cell<u64>,
    broken: bool,
}

impl NullEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            calls: Cell::new(0),
            broken: false,
        }
    }

    /// An entropy source that always fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new(0)
        }
    }

    /// Number of `fill` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls.get()
    }
}

impl Default for NullEntropy {
    fn default() -> Self {
        Self::new(0)
    }
}

impl EntropySource for NullEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        if self.broken {
            return Err(CryptoError::Entropy("null entropy configured to fail".into()));
        }
        let call = self.calls.get();
        self.calls.set(call + 1);
        for (block, chunk) in buf.chunks_mut(32).enumerate() {
            let digest = keccak256_multi(&[
                &self.seed.to_be_bytes(),
                &call.to_be_bytes(),
                &(block as u64).to_be_bytes(),
            ]);
            chunk.copy_from_slice(&digest[..chunk.len()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_crypto::generate_secret;

    #[test]
    fn same_seed_same_sequence() {
        let a = NullEntropy::new(7);
        let b = NullEntropy::new(7);
        assert_eq!(generate_secret(&a).unwrap(), generate_secret(&b).unwrap());
        assert_eq!(generate_secret(&a).unwrap(), generate_secret(&b).unwrap());
    }

    #[test]
    fn successive_secrets_differ() {
        let e = NullEntropy::new(7);
        assert_ne!(generate_secret(&e).unwrap(), generate_secret(&e).unwrap());
        assert_eq!(e.calls(), 4);
    }

    #[test]
    fn broken_fails() {
        assert!(generate_secret(&NullEntropy::broken()).is_err());
    }
}
