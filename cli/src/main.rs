//! ballot — command-line client for a commit-reveal ballot contract.

mod commands;

use anyhow::Context;
use ballot_client::{ClientConfig, SecretsBackend};
use ballot_types::Address;
use ballot_utils::LogFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ballot", about = "Commit-reveal voting client", version)]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of an Ethereum node.
    #[arg(long, global = true, env = "BALLOT_RPC_URL")]
    rpc_url: Option<String>,

    /// Address of the ballot contract.
    #[arg(long, global = true, env = "BALLOT_CONTRACT")]
    contract: Option<Address>,

    /// Chain id the contract is deployed on.
    #[arg(long, global = true, env = "BALLOT_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Where commit secrets are kept: "memory", "file" or "encrypted".
    #[arg(long, global = true, env = "BALLOT_SECRETS_BACKEND")]
    secrets_backend: Option<SecretsBackend>,

    /// Directory for file-backed secret stores.
    #[arg(long, global = true, env = "BALLOT_SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "BALLOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "BALLOT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    keys: commands::Keys,

    #[command(subcommand)]
    command: commands::Command,
}

impl Cli {
    /// File settings (or defaults), overridden by flags and environment.
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                ClientConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => ClientConfig::default(),
        };
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(contract) = self.contract {
            config.contract_address = Some(contract);
        }
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(backend) = self.secrets_backend {
            config.secrets_backend = backend;
        }
        if let Some(dir) = &self.secrets_dir {
            config.secrets_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    let format: LogFormat = config.log_format.parse()?;
    ballot_utils::init_tracing(&config.log_level, format)?;
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    config.validate()?;
    commands::run(cli.command, &cli.keys, &config, cli.json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ballot",
            "--rpc-url",
            "http://127.0.0.1:8545",
            "--contract",
            "0x2222222222222222222222222222222222222222",
            "--chain-id",
            "31337",
            "--secrets-backend",
            "memory",
            "phase",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.secrets_backend, SecretsBackend::Memory);
        assert_eq!(config.gas_buffer_percent, 20);
        config.validate().unwrap();
    }

    #[test]
    fn admin_reset_parses_candidate_list() {
        let cli = Cli::try_parse_from([
            "ballot", "admin", "reset", "--candidates", "Yes,No", "--start", "100", "--end",
            "200", "--reveal", "300", "--privacy",
        ])
        .unwrap();
        match cli.command {
            commands::Command::Admin {
                action: commands::AdminAction::Reset { candidates, privacy, .. },
            } => {
                assert_eq!(candidates, vec!["Yes", "No"]);
                assert!(privacy);
            }
            _ => panic!("expected admin reset"),
        }
    }
}
