//! Typed binding to the ballot voting contract.
//!
//! - ABI encoding/decoding of calls, results and revert data
//! - Legacy EIP-155 transactions, RLP-encoded and signed locally
//! - `VotingContract` / `AdminContract` traits and their JSON-RPC implementation

pub mod abi;
pub mod ballot;
pub mod error;
pub mod interface;
pub mod revert;
pub mod rlp;
pub mod rpc;
pub mod transaction;

pub use ballot::{BallotContract, ContractOptions, DeploymentCheck};
pub use error::ContractError;
pub use interface::{
    AdminContract, MetaCommitRequest, ProposalRecord, TxOutcome, TxReceipt, VotingContract,
};
pub use revert::{BallotError, RevertReason};
pub use rpc::RpcClient;
pub use transaction::{LegacyTransaction, SignedTransaction};
