//! Client configuration with TOML file support.

use ballot_contract::ContractOptions;
use ballot_types::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ClientError;

/// Where commit secrets are retained between commit and reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretsBackend {
    /// Process memory only. Secrets are lost on exit.
    Memory,
    /// Plain JSON files under `secrets_dir`.
    File,
    /// Passphrase-encrypted JSON files under `secrets_dir`.
    Encrypted,
}

impl std::str::FromStr for SecretsBackend {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "encrypted" => Ok(Self::Encrypted),
            other => Err(ClientError::Configuration(format!(
                "unknown secrets backend {other:?} (expected memory, file or encrypted)"
            ))),
        }
    }
}

/// Configuration for the voting client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). It is passed explicitly into every
/// constructor; nothing in the library reads the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of an Ethereum node.
    #[serde(default)]
    pub rpc_url: String,

    /// Address of the deployed ballot contract.
    #[serde(default)]
    pub contract_address: Option<Address>,

    /// Chain the contract is deployed on.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    #[serde(default = "default_secrets_backend")]
    pub secrets_backend: SecretsBackend,

    /// Directory for file-backed secret stores.
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,

    /// Percentage added on top of `eth_estimateGas`.
    #[serde(default = "default_gas_buffer_percent")]
    pub gas_buffer_percent: u64,

    /// Gas limit used when estimation fails for a reason other than a revert.
    #[serde(default = "default_gas_limit")]
    pub default_gas_limit: u64,

    /// Delay between receipt queries.
    #[serde(default = "default_confirmation_poll_ms")]
    pub confirmation_poll_ms: u64,

    /// Receipt queries before a transaction is reported as pending.
    #[serde(default = "default_confirmation_attempts")]
    pub confirmation_attempts: u32,

    /// Recompute the commitment locally and compare with the stored one before revealing.
    #[serde(default = "default_true")]
    pub verify_before_reveal: bool,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_id() -> u64 {
    11_155_111
}

fn default_secrets_backend() -> SecretsBackend {
    SecretsBackend::File
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from("./ballot_secrets")
}

fn default_gas_buffer_percent() -> u64 {
    20
}

fn default_gas_limit() -> u64 {
    200_000
}

fn default_confirmation_poll_ms() -> u64 {
    2_000
}

fn default_confirmation_attempts() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Configuration(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Configuration(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Configuration(e.to_string()))
    }

    /// Check that the endpoint and contract are present and numeric options are sane.
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = self.rpc_url.trim();
        if url.is_empty() {
            return Err(ClientError::Configuration("rpc_url is not set".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "rpc_url must be an http(s) URL, got {url:?}"
            )));
        }
        match self.contract_address {
            None => {
                return Err(ClientError::Configuration(
                    "contract_address is not set".into(),
                ))
            }
            Some(address) if address.is_zero() => {
                return Err(ClientError::Configuration(
                    "contract_address is the zero address".into(),
                ))
            }
            Some(_) => {}
        }
        if self.chain_id == 0 {
            return Err(ClientError::Configuration("chain_id must be non-zero".into()));
        }
        if self.gas_buffer_percent > 500 {
            return Err(ClientError::Configuration(format!(
                "gas_buffer_percent {} exceeds 500",
                self.gas_buffer_percent
            )));
        }
        if self.default_gas_limit < 21_000 {
            return Err(ClientError::Configuration(format!(
                "default_gas_limit {} is below the 21000 intrinsic cost",
                self.default_gas_limit
            )));
        }
        if self.confirmation_attempts == 0 {
            return Err(ClientError::Configuration(
                "confirmation_attempts must be at least 1".into(),
            ));
        }
        if !matches!(self.log_format.as_str(), "human" | "json") {
            return Err(ClientError::Configuration(format!(
                "log_format must be \"human\" or \"json\", got {:?}",
                self.log_format
            )));
        }
        Ok(())
    }

    /// The configured contract address, or a configuration error.
    pub fn contract(&self) -> Result<Address, ClientError> {
        self.contract_address
            .ok_or_else(|| ClientError::Configuration("contract_address is not set".into()))
    }

    /// Transaction settings for the JSON-RPC contract handle.
    pub fn contract_options(&self) -> ContractOptions {
        ContractOptions {
            chain_id: self.chain_id,
            gas_buffer_percent: self.gas_buffer_percent,
            default_gas_limit: self.default_gas_limit,
            confirmation_poll: Duration::from_millis(self.confirmation_poll_ms),
            confirmation_attempts: self.confirmation_attempts,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            contract_address: None,
            chain_id: default_chain_id(),
            secrets_backend: default_secrets_backend(),
            secrets_dir: default_secrets_dir(),
            gas_buffer_percent: default_gas_buffer_percent(),
            default_gas_limit: default_gas_limit(),
            confirmation_poll_ms: default_confirmation_poll_ms(),
            confirmation_attempts: default_confirmation_attempts(),
            verify_before_reveal: default_true(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
