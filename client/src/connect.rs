//! Building the real collaborators from a [`ClientConfig`].

use ballot_contract::{BallotContract, RpcClient};
use ballot_crypto::LocalKey;
use ballot_store::{EncryptedSecretStore, FileSecretStore, MemorySecretStore, SecretStore};
use tracing::info;

use crate::config::{ClientConfig, SecretsBackend};
use crate::error::ClientError;

/// A JSON-RPC handle on the configured contract, sending writes from `signer` if given.
pub fn connect(config: &ClientConfig, signer: Option<LocalKey>) -> Result<BallotContract, ClientError> {
    config.validate()?;
    let address = config.contract()?;
    let rpc = RpcClient::new(config.rpc_url.trim())?;
    let contract = BallotContract::new(rpc, address, config.contract_options());
    Ok(match signer {
        Some(key) => {
            info!(contract = %address, signer = %key.address(), "connected with signer");
            contract.with_signer(key)
        }
        None => {
            info!(contract = %address, "connected read-only");
            contract
        }
    })
}

/// Open the configured secret store. The encrypted backend requires `passphrase`.
pub fn open_secret_store(
    config: &ClientConfig,
    passphrase: Option<&str>,
) -> Result<Box<dyn SecretStore>, ClientError> {
    let store: Box<dyn SecretStore> = match config.secrets_backend {
        SecretsBackend::Memory => Box::new(MemorySecretStore::new()),
        SecretsBackend::File => Box::new(FileSecretStore::open(&config.secrets_dir)?),
        SecretsBackend::Encrypted => {
            let passphrase = passphrase.ok_or_else(|| {
                ClientError::Configuration("encrypted secrets backend needs a passphrase".into())
            })?;
            Box::new(EncryptedSecretStore::open(&config.secrets_dir, passphrase)?)
        }
    };
    Ok(store)
}
