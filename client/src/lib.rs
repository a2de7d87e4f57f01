//! Commit-reveal voting client.
//!
//! Provides everything a voter or chairperson needs against a deployed ballot contract:
//! - Phase tracking from the contract's schedule
//! - Commit submission, direct or relayed through a second signer
//! - Reveal submission with a local commitment check
//! - Retention and reconciliation of commit secrets
//! - Proposal listing, results and the admin console

pub mod admin;
pub mod commit;
pub mod config;
pub mod connect;
pub mod error;
pub mod phase;
pub mod proposals;
pub mod reveal;
pub mod workflow;

pub use admin::{AdminConsole, BallotReset};
pub use commit::CommitReceipt;
pub use config::{ClientConfig, SecretsBackend};
pub use connect::{connect, open_secret_store};
pub use error::{ClientError, PreconditionFailure};
pub use phase::{PhaseSnapshot, PhaseTracker};
pub use reveal::{RevealReceipt, VerifyReport};
pub use workflow::{StatusReport, VotingClient};
