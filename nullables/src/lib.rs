//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the voting workflow (clock, entropy, the voting contract,
//! secret storage) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod contract;
pub mod entropy;
pub mod store;

pub use clock::NullClock;
pub use contract::{ContractCall, Failure, NullContract};
pub use entropy::NullEntropy;
pub use store::NullSecretStore;
