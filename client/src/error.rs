use ballot_contract::{ContractError, RevertReason};
use ballot_store::StoreError;
use ballot_types::{Address, Commitment, VotingPhase};
use thiserror::Error;

/// A local check that failed before anything was submitted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PreconditionFailure {
    #[error("voting phase is {actual}, expected {expected}")]
    WrongPhase {
        expected: VotingPhase,
        actual: VotingPhase,
    },

    #[error("outside the reveal window (phase is {actual})")]
    OutsideRevealWindow { actual: VotingPhase },

    #[error("voter already committed {commitment}")]
    AlreadyCommitted { commitment: Commitment },

    #[error("voter has no commitment on chain")]
    NotCommitted,

    #[error("voter already revealed")]
    AlreadyRevealed,

    #[error("no retained secret for commitment {commitment}")]
    NoRetainedSecret { commitment: Commitment },

    #[error("{signer} is not the chairperson ({chairperson})")]
    NotChairperson {
        chairperson: Address,
        signer: Address,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or malformed endpoint, contract address, key or option.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("precondition failed: {0}")]
    Precondition(PreconditionFailure),

    /// Malformed input caught before any network call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The contract reverted; the reason is echoed as decoded.
    #[error("rejected by contract: {0}")]
    ContractRejection(RevertReason),

    /// The node or relay could not be reached, or answered with something unusable.
    #[error("{}: {message}", network_kind(.relayed))]
    Network { message: String, relayed: bool },

    /// The locally recomputed commitment differs from the one stored on chain.
    #[error("commitment mismatch: stored {stored}, computed {computed}")]
    Mismatch {
        stored: Commitment,
        computed: Commitment,
    },

    #[error("secret store error: {0}")]
    Store(#[from] StoreError),
}

fn network_kind(relayed: &bool) -> &'static str {
    if *relayed {
        "relay submission failed"
    } else {
        "network error"
    }
}

impl ClientError {
    /// Map a contract failure, marking transport failures as relay failures when `relayed`.
    pub fn from_contract(err: ContractError, relayed: bool) -> Self {
        match err {
            ContractError::Reverted(reason) => Self::ContractRejection(reason),
            ContractError::NoSigner => Self::Configuration(if relayed {
                "no relayer key configured".into()
            } else {
                "no signing key configured".into()
            }),
            ContractError::Signer(message) => Self::Configuration(message),
            ContractError::NotDeployed(address) => {
                Self::Configuration(format!("no contract deployed at {address}"))
            }
            ContractError::Transport(message) | ContractError::Decode(message) => {
                Self::Network { message, relayed }
            }
            ContractError::Rpc { code, message } => Self::Network {
                message: format!("rpc error {code}: {message}"),
                relayed,
            },
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

impl From<ContractError> for ClientError {
    fn from(err: ContractError) -> Self {
        Self::from_contract(err, false)
    }
}

impl From<PreconditionFailure> for ClientError {
    fn from(failure: PreconditionFailure) -> Self {
        Self::Precondition(failure)
    }
}
