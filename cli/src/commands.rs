//! Subcommands and their handlers.

use anyhow::{bail, Context};
use ballot_client::{
    connect, open_secret_store, proposals, AdminConsole, BallotReset, ClientConfig, ClientError,
    PhaseSnapshot, SecretsBackend, StatusReport, VotingClient,
};
use ballot_contract::{BallotContract, BallotError, TxOutcome};
use ballot_crypto::LocalKey;
use ballot_store::{MemorySecretStore, SecretStore};
use ballot_types::{
    Address, CandidateId, Nonce, ProposalTally, Salt, SecretMaterial, SystemClock, TxHash,
    WinningProposal,
};
use ballot_utils::format_duration;
use serde::Serialize;
use std::time::Duration;

/// Private keys and the store passphrase. Only taken from the environment or flags at startup.
#[derive(clap::Args)]
pub struct Keys {
    /// Hex private key of the voter.
    #[arg(long, global = true, env = "BALLOT_VOTER_KEY", hide_env_values = true)]
    voter_key: Option<String>,

    /// Hex private key of the account that relays meta-commits.
    #[arg(long, global = true, env = "BALLOT_RELAYER_KEY", hide_env_values = true)]
    relayer_key: Option<String>,

    /// Hex private key of the chairperson.
    #[arg(long, global = true, env = "BALLOT_ADMIN_KEY", hide_env_values = true)]
    admin_key: Option<String>,

    /// Passphrase for the encrypted secret store.
    #[arg(long, global = true, env = "BALLOT_SECRETS_PASSPHRASE", hide_env_values = true)]
    secrets_passphrase: Option<String>,
}

impl Keys {
    fn parse(raw: &Option<String>, name: &str) -> anyhow::Result<Option<LocalKey>> {
        raw.as_deref()
            .map(|hex| {
                hex.trim()
                    .parse::<LocalKey>()
                    .with_context(|| format!("{name} is not a valid private key"))
            })
            .transpose()
    }

    fn voter(&self) -> anyhow::Result<Option<LocalKey>> {
        Self::parse(&self.voter_key, "BALLOT_VOTER_KEY")
    }

    fn require_voter(&self) -> anyhow::Result<LocalKey> {
        self.voter()?
            .context("a voter key is required (BALLOT_VOTER_KEY)")
    }

    fn relayer(&self) -> anyhow::Result<LocalKey> {
        Self::parse(&self.relayer_key, "BALLOT_RELAYER_KEY")?
            .context("--relayed needs a relayer key (BALLOT_RELAYER_KEY)")
    }

    fn admin(&self) -> anyhow::Result<LocalKey> {
        Self::parse(&self.admin_key, "BALLOT_ADMIN_KEY")?
            .context("admin commands need the chairperson key (BALLOT_ADMIN_KEY)")
    }
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Show the current voting phase.
    Phase {
        /// Re-check every SECS seconds until interrupted.
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// List the ballot's candidates.
    Proposals,
    /// Show vote counts and the winning proposal.
    Results,
    /// Show a voter's on-chain status and retained secrets.
    Status {
        /// Voter address (defaults to the voter key's address).
        #[arg(long)]
        voter: Option<Address>,
    },
    /// Commit a vote.
    Commit {
        #[arg(long)]
        candidate: u64,
        /// Sign with the voter key and submit through the relayer.
        #[arg(long)]
        relayed: bool,
    },
    /// Reveal the committed vote.
    Reveal {
        /// Supply the secret explicitly instead of using the retained one.
        #[arg(long, requires_all = ["nonce", "salt"])]
        candidate: Option<u64>,
        #[arg(long, requires_all = ["candidate", "salt"])]
        nonce: Option<Nonce>,
        #[arg(long, requires_all = ["candidate", "nonce"])]
        salt: Option<Salt>,
    },
    /// Check a secret against the on-chain commitment without submitting.
    Verify {
        #[arg(long)]
        candidate: u64,
        #[arg(long)]
        nonce: Nonce,
        #[arg(long)]
        salt: Salt,
        /// Voter address (defaults to the voter key's address).
        #[arg(long)]
        voter: Option<Address>,
    },
    /// Chairperson operations.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(clap::Subcommand)]
pub enum AdminAction {
    /// Set the commit window.
    SetTime {
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
    },
    /// Push the schedule back.
    DelayStart {
        #[arg(long)]
        secs: u64,
    },
    /// Open voting now.
    StartEarly,
    /// End voting now.
    EmergencyStop,
    /// Make results public regardless of privacy mode.
    ForceReveal,
    /// Grant one voter the right to vote.
    GiveRight {
        #[arg(long)]
        voter: Address,
    },
    /// Grant several voters the right to vote.
    BatchGiveRight {
        #[arg(long, value_delimiter = ',', required = true)]
        voters: Vec<Address>,
    },
    /// Start a fresh ballot.
    Reset {
        #[arg(long, value_delimiter = ',', required = true)]
        candidates: Vec<String>,
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
        #[arg(long)]
        reveal: Option<u64>,
        /// Keep results private until forced public.
        #[arg(long)]
        privacy: bool,
    },
    /// Forget every commitment and reveal.
    ClearHistory,
}

pub async fn run(
    command: Command,
    keys: &Keys,
    config: &ClientConfig,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Phase { watch } => phase(config, watch, json).await,
        Command::Proposals => {
            let contract = open(config, None).await?;
            let candidates = proposals::candidates(&contract).await?;
            emit(json, &candidates, || {
                candidates
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Results => results(config, json).await,
        Command::Status { voter } => {
            let voter = match voter {
                Some(voter) => voter,
                None => keys.require_voter()?.address(),
            };
            let client = workflow(config, keys, None).await?;
            let report = client.status(voter).await?;
            emit(json, &report, || render_status(&report))
        }
        Command::Commit { candidate, relayed } => {
            require_durable_secrets(config)?;
            let candidate = CandidateId::new(candidate);
            let voter = keys.require_voter()?;
            let receipt = if relayed {
                let client = workflow(config, keys, Some(keys.relayer()?)).await?;
                client.commit_relayed(&voter, candidate).await?
            } else {
                let client = workflow(config, keys, Some(voter)).await?;
                client.commit(candidate).await?
            };
            emit(json, &receipt, || {
                let state = if receipt.is_pending() {
                    "pending (requery with `ballot status`)"
                } else {
                    "confirmed"
                };
                format!(
                    "commitment {} for candidate {}\ntx {} {}\nsecret retained in the {:?} store",
                    receipt.commitment, receipt.candidate, receipt.tx_hash, state, config.secrets_backend
                )
            })
        }
        Command::Reveal {
            candidate,
            nonce,
            salt,
        } => {
            let client = workflow(config, keys, Some(keys.require_voter()?)).await?;
            let receipt = match (candidate, nonce, salt) {
                (Some(candidate), Some(nonce), Some(salt)) => {
                    let secret = SecretMaterial::new(nonce, salt);
                    client
                        .reveal_with(CandidateId::new(candidate), &secret)
                        .await?
                }
                _ => client.reveal().await?,
            };
            emit(json, &receipt, || {
                format!(
                    "revealed candidate {}\ntx {} {}",
                    receipt.candidate,
                    receipt.tx_hash,
                    if receipt.is_pending() { "pending" } else { "confirmed" }
                )
            })
        }
        Command::Verify {
            candidate,
            nonce,
            salt,
            voter,
        } => {
            let voter = match voter {
                Some(voter) => voter,
                None => keys.require_voter()?.address(),
            };
            let client = workflow(config, keys, None).await?;
            let report = client
                .verify(voter, CandidateId::new(candidate), &SecretMaterial::new(nonce, salt))
                .await?;
            emit(json, &report, || {
                format!(
                    "stored   {}\ncomputed {}\n{}",
                    report.stored,
                    report.computed,
                    if report.matches() { "match" } else { "MISMATCH" }
                )
            })?;
            if !report.matches() {
                bail!("secret does not match the on-chain commitment");
            }
            Ok(())
        }
        Command::Admin { action } => admin(config, keys, action, json).await,
    }
}

/// A commit's secret must outlive the process, or the vote can never be revealed.
fn require_durable_secrets(config: &ClientConfig) -> Result<(), ClientError> {
    if config.secrets_backend == SecretsBackend::Memory {
        return Err(ClientError::Configuration(
            "the memory secrets backend loses the commit secret on exit; use file or encrypted"
                .into(),
        ));
    }
    Ok(())
}

/// Connect and confirm a contract is deployed at the configured address.
async fn open(config: &ClientConfig, signer: Option<LocalKey>) -> anyhow::Result<BallotContract> {
    let contract = connect(config, signer)?;
    contract
        .verify_deployment()
        .await
        .map_err(ClientError::from)?;
    Ok(contract)
}

async fn workflow(
    config: &ClientConfig,
    keys: &Keys,
    signer: Option<LocalKey>,
) -> anyhow::Result<VotingClient<BallotContract, Box<dyn SecretStore>>> {
    let contract = open(config, signer).await?;
    let store = open_secret_store(config, keys.secrets_passphrase.as_deref())?;
    Ok(VotingClient::from_config(contract, store, config))
}

async fn phase(config: &ClientConfig, watch: Option<u64>, json: bool) -> anyhow::Result<()> {
    let contract = open(config, None).await?;
    let client = VotingClient::new(contract, MemorySecretStore::new());
    loop {
        let snapshot = client.phase().await?;
        emit(json, &snapshot, || render_phase(&snapshot))?;
        let Some(secs) = watch else {
            return Ok(());
        };
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs.max(1))) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn results(config: &ClientConfig, json: bool) -> anyhow::Result<()> {
    let contract = open(config, None).await?;
    let tallies = proposals::results(&contract).await?;
    let winner = match proposals::winner(&contract).await {
        Ok(winner) => Some(winner),
        Err(ClientError::ContractRejection(reason))
            if reason.is(BallotError::ResultsNotYetPublic) =>
        {
            None
        }
        Err(e) => return Err(e.into()),
    };

    #[derive(Serialize)]
    struct Results<'a> {
        proposals: &'a [ProposalTally],
        winner: Option<WinningProposal>,
    }
    let out = Results {
        proposals: &tallies,
        winner,
    };
    emit(json, &out, || {
        let mut lines: Vec<String> = tallies
            .iter()
            .map(|t| format!("{:<34} {}", t.candidate.to_string(), t.votes))
            .collect();
        match winner {
            Some(w) if w.is_tie => lines.push(format!("tie at {} votes", w.vote_count)),
            Some(w) => lines.push(format!("winner: #{} with {} votes", w.index, w.vote_count)),
            None => lines.push("results are not yet public".into()),
        }
        lines.join("\n")
    })
}

async fn admin(
    config: &ClientConfig,
    keys: &Keys,
    action: AdminAction,
    json: bool,
) -> anyhow::Result<()> {
    let contract = open(config, Some(keys.admin()?)).await?;
    let console = AdminConsole::new(&contract, SystemClock);
    let outcome = match action {
        AdminAction::SetTime { start, end } => console.set_voting_time(start, end).await?,
        AdminAction::DelayStart { secs } => console.delay_voting_start(secs).await?,
        AdminAction::StartEarly => console.start_voting_early().await?,
        AdminAction::EmergencyStop => console.emergency_stop().await?,
        AdminAction::ForceReveal => console.force_reveal_results().await?,
        AdminAction::GiveRight { voter } => console.give_right_to_vote(voter).await?,
        AdminAction::BatchGiveRight { voters } => {
            console.batch_give_right_to_vote(&voters).await?
        }
        AdminAction::Reset {
            candidates,
            start,
            end,
            reveal,
            privacy,
        } => {
            console
                .reset_voting(&BallotReset {
                    candidates,
                    start,
                    end,
                    reveal,
                    privacy_mode: privacy,
                })
                .await?
        }
        AdminAction::ClearHistory => console.clear_voter_history().await?,
    };
    emit_outcome(json, &outcome)
}

fn emit_outcome(json: bool, outcome: &TxOutcome) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Outcome {
        tx_hash: TxHash,
        block_number: Option<u64>,
    }
    let out = Outcome {
        tx_hash: outcome.tx_hash(),
        block_number: match outcome {
            TxOutcome::Confirmed(receipt) => Some(receipt.block_number),
            TxOutcome::Pending(_) => None,
        },
    };
    emit(json, &out, || match out.block_number {
        Some(block) => format!("tx {} confirmed in block {block}", out.tx_hash),
        None => format!("tx {} pending", out.tx_hash),
    })
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human());
    }
    Ok(())
}

fn render_phase(snapshot: &PhaseSnapshot) -> String {
    match snapshot.secs_to_next_transition() {
        Some(secs) => format!("{} (changes in {})", snapshot.phase, format_duration(secs)),
        None => snapshot.phase.to_string(),
    }
}

fn render_status(report: &StatusReport) -> String {
    let mut lines = vec![
        format!("voter     {}", report.voter),
        format!("phase     {}", render_phase(&report.snapshot)),
        format!(
            "on chain  committed={} revealed={}",
            report.on_chain.has_committed, report.on_chain.has_revealed
        ),
    ];
    if report.on_chain.has_committed {
        lines.push(format!("commitment {}", report.on_chain.commitment));
    }
    for record in &report.records {
        lines.push(format!(
            "retained  {} candidate {} {:?}{}",
            record.commitment,
            record.candidate,
            record.status,
            record
                .tx_hash
                .map(|tx| format!(" tx {tx}"))
                .unwrap_or_default()
        ));
    }
    if report.on_chain.has_committed && report.active_record().is_none() {
        lines.push("warning: no retained secret matches the on-chain commitment".into());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_keys() -> Keys {
        Keys {
            voter_key: None,
            relayer_key: None,
            admin_key: None,
            secrets_passphrase: None,
        }
    }

    fn config_with(backend: SecretsBackend) -> ClientConfig {
        ClientConfig {
            rpc_url: "http://127.0.0.1:1".into(),
            contract_address: Some(Address::new([0x22; 20])),
            secrets_backend: backend,
            ..ClientConfig::default()
        }
    }

    #[test]
    fn durable_backends_are_accepted_for_commits() {
        assert!(require_durable_secrets(&config_with(SecretsBackend::File)).is_ok());
        assert!(require_durable_secrets(&config_with(SecretsBackend::Encrypted)).is_ok());
    }

    #[tokio::test]
    async fn commit_with_memory_backend_is_refused_before_connecting() {
        let config = config_with(SecretsBackend::Memory);
        let command = Command::Commit {
            candidate: 0,
            relayed: false,
        };
        let err = run(command, &no_keys(), &config, false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Configuration(msg)) if msg.contains("memory")
        ));
    }
}
