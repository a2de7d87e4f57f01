//! Fundamental types for the ballot voting client.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, hashes, candidates, secret material, timestamps, the voting schedule and
//! the status records read back from the voting contract.

pub mod address;
pub mod candidate;
pub mod error;
pub mod hash;
pub mod phase;
pub mod secret;
pub mod status;
pub mod time;

pub use address::Address;
pub use candidate::{Candidate, CandidateId};
pub use error::TypeError;
pub use hash::{Commitment, TxHash};
pub use phase::{VotingPhase, VotingSchedule};
pub use secret::{Nonce, Salt, SecretMaterial};
pub use status::{CommitmentStatus, ProposalTally, VotingStatus, WinningProposal};
pub use time::{Clock, SystemClock, Timestamp};
