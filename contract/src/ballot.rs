//! `VotingContract` and `AdminContract` over JSON-RPC with locally signed transactions.

use ballot_crypto::LocalKey;
use ballot_types::{
    Address, CandidateId, Commitment, CommitmentStatus, Nonce, Salt, TxHash, VotingSchedule,
    VotingStatus, WinningProposal,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::abi::{encode_call, signatures as sig, AbiDecoder, Token};
use crate::error::ContractError;
use crate::interface::{
    AdminContract, MetaCommitRequest, ProposalRecord, TxOutcome, VotingContract,
};
use crate::revert::RevertReason;
use crate::rpc::RpcClient;
use crate::transaction::LegacyTransaction;

/// Submission and confirmation tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractOptions {
    pub chain_id: u64,
    /// Percentage added on top of `eth_estimateGas`.
    pub gas_buffer_percent: u64,
    /// Used when estimation fails for a reason other than a revert.
    pub default_gas_limit: u64,
    pub confirmation_poll: Duration,
    pub confirmation_attempts: u32,
}

impl Default for ContractOptions {
    fn default() -> Self {
        Self {
            chain_id: 11_155_111,
            gas_buffer_percent: 20,
            default_gas_limit: 200_000,
            confirmation_poll: Duration::from_millis(2000),
            confirmation_attempts: 60,
        }
    }
}

/// Result of checking the configured deployment against the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeploymentCheck {
    pub node_chain_id: u64,
    pub chain_id_matches: bool,
    pub code_size: usize,
}

/// A handle on one deployed ballot contract.
pub struct BallotContract {
    rpc: RpcClient,
    address: Address,
    signer: Option<LocalKey>,
    options: ContractOptions,
}

impl BallotContract {
    pub fn new(rpc: RpcClient, address: Address, options: ContractOptions) -> Self {
        Self {
            rpc,
            address,
            signer: None,
            options,
        }
    }

    /// Attach the key that signs and pays for writes.
    pub fn with_signer(mut self, key: LocalKey) -> Self {
        self.signer = Some(key);
        self
    }

    pub fn options(&self) -> &ContractOptions {
        &self.options
    }

    /// Compare the node's chain id with the configured one and require deployed code.
    pub async fn verify_deployment(&self) -> Result<DeploymentCheck, ContractError> {
        let node_chain_id = self.rpc.chain_id().await?;
        let chain_id_matches = node_chain_id == self.options.chain_id;
        if !chain_id_matches {
            warn!(
                configured = self.options.chain_id,
                node = node_chain_id,
                "chain id mismatch; signatures will be rejected"
            );
        }
        let code = self.rpc.get_code(self.address).await?;
        if code.is_empty() {
            return Err(ContractError::NotDeployed(self.address));
        }
        Ok(DeploymentCheck {
            node_chain_id,
            chain_id_matches,
            code_size: code.len(),
        })
    }

    async fn read(&self, signature: &str, args: &[Token]) -> Result<Vec<u8>, ContractError> {
        debug!(call = signature, contract = %self.address, "contract read");
        self.rpc
            .call(None, self.address, &encode_call(signature, args), None)
            .await
    }

    /// Sign, broadcast and await the receipt of a call to `signature`.
    async fn send(&self, signature: &str, args: &[Token]) -> Result<TxOutcome, ContractError> {
        let key = self.signer.as_ref().ok_or(ContractError::NoSigner)?;
        let from = key.address();
        let data = encode_call(signature, args);

        let nonce = self.rpc.transaction_count(from).await?;
        let gas_price = self.rpc.gas_price().await?;
        let gas_limit = match self.rpc.estimate_gas(from, self.address, &data).await {
            Ok(estimate) => estimate.saturating_mul(100 + self.options.gas_buffer_percent) / 100,
            Err(ContractError::Reverted(reason)) => {
                info!(call = signature, %reason, "estimate reverted, not broadcasting");
                return Err(ContractError::Reverted(reason));
            }
            Err(e) => {
                warn!(
                    call = signature,
                    error = %e,
                    fallback = self.options.default_gas_limit,
                    "gas estimation failed, using default limit"
                );
                self.options.default_gas_limit
            }
        };

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: self.address,
            value: 0,
            data,
            chain_id: self.options.chain_id,
        };
        let signed = tx.sign(key)?;
        let hash = self.rpc.send_raw_transaction(&signed.raw).await?;
        if hash != signed.hash {
            warn!(local = %signed.hash, node = %hash, "node reported a different tx hash");
        }
        info!(call = signature, tx = %hash, from = %from, "transaction submitted");

        self.await_receipt(signature, from, &tx.data, hash).await
    }

    /// Poll for the receipt of `hash`. Query failures while waiting are not fatal: the
    /// transaction is already broadcast, so running out of attempts yields `Pending`.
    async fn await_receipt(
        &self,
        signature: &str,
        from: Address,
        data: &[u8],
        hash: TxHash,
    ) -> Result<TxOutcome, ContractError> {
        for attempt in 0..self.options.confirmation_attempts {
            match self.rpc.transaction_receipt(hash).await {
                Ok(Some(raw)) if raw.success => {
                    info!(
                        call = signature,
                        tx = %hash,
                        block = raw.receipt.block_number,
                        "transaction confirmed"
                    );
                    return Ok(TxOutcome::Confirmed(raw.receipt));
                }
                Ok(Some(raw)) => {
                    let reason = self
                        .replay_revert(from, data, raw.receipt.block_number)
                        .await;
                    warn!(call = signature, tx = %hash, %reason, "transaction reverted");
                    return Err(ContractError::Reverted(reason));
                }
                Ok(None) => {}
                Err(e) => debug!(tx = %hash, attempt, error = %e, "receipt query failed"),
            }
            tokio::time::sleep(self.options.confirmation_poll).await;
        }
        warn!(call = signature, tx = %hash, "no receipt yet; transaction pending");
        Ok(TxOutcome::Pending(hash))
    }

    /// Re-run a failed transaction as `eth_call` at its block to recover the reason.
    async fn replay_revert(&self, from: Address, data: &[u8], block: u64) -> RevertReason {
        match self.rpc.call(Some(from), self.address, data, Some(block)).await {
            Err(ContractError::Reverted(reason)) => reason,
            _ => RevertReason::Reverted,
        }
    }
}

impl VotingContract for BallotContract {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.options.chain_id
    }

    fn signer(&self) -> Option<Address> {
        self.signer.as_ref().map(LocalKey::address)
    }

    async fn voting_status(&self) -> Result<VotingStatus, ContractError> {
        let data = self.read(sig::GET_VOTING_STATUS, &[]).await?;
        let out = AbiDecoder::new(&data);
        Ok(VotingStatus {
            has_ended: out.boolean(0)?,
            is_active: out.boolean(1)?,
            is_reveal_period: out.boolean(2)?,
            results_public: out.boolean(3)?,
            proposal_count: out.uint64(4)?,
        })
    }

    async fn all_proposals(&self) -> Result<Vec<ProposalRecord>, ContractError> {
        let data = self.read(sig::GET_ALL_PROPOSALS, &[]).await?;
        let out = AbiDecoder::new(&data);
        let names = out.bytes32_array(0)?;
        let votes = out.uint64_array(1)?;
        if names.len() != votes.len() {
            return Err(ContractError::Decode(format!(
                "{} proposal names but {} vote counts",
                names.len(),
                votes.len()
            )));
        }
        Ok(names
            .into_iter()
            .zip(votes)
            .map(|(name, votes)| ProposalRecord { name, votes })
            .collect())
    }

    async fn commitment_status(&self, voter: Address) -> Result<CommitmentStatus, ContractError> {
        let data = self
            .read(sig::GET_COMMITMENT_STATUS, &[Token::Address(voter)])
            .await?;
        let out = AbiDecoder::new(&data);
        Ok(CommitmentStatus {
            has_committed: out.boolean(0)?,
            has_revealed: out.boolean(1)?,
            commitment: Commitment::new(out.bytes32(2)?),
        })
    }

    async fn vote_commitment(&self, voter: Address) -> Result<Commitment, ContractError> {
        let data = self
            .read(sig::VOTE_COMMITMENTS, &[Token::Address(voter)])
            .await?;
        Ok(Commitment::new(AbiDecoder::new(&data).bytes32(0)?))
    }

    async fn has_revealed(&self, voter: Address) -> Result<bool, ContractError> {
        let data = self.read(sig::REVEALED, &[Token::Address(voter)]).await?;
        AbiDecoder::new(&data).boolean(0)
    }

    async fn meta_nonce(&self, voter: Address) -> Result<u64, ContractError> {
        let data = self.read(sig::NONCES, &[Token::Address(voter)]).await?;
        AbiDecoder::new(&data).uint64(0)
    }

    async fn schedule(&self) -> Result<VotingSchedule, ContractError> {
        let start = AbiDecoder::new(&self.read(sig::START_TIME, &[]).await?).uint64(0)?;
        let end = AbiDecoder::new(&self.read(sig::END_TIME, &[]).await?).uint64(0)?;
        let reveal = AbiDecoder::new(&self.read(sig::REVEAL_TIME, &[]).await?).uint64(0)?;
        Ok(VotingSchedule::from_raw(start, end, reveal))
    }

    async fn winning_proposal(&self) -> Result<WinningProposal, ContractError> {
        let data = self.read(sig::GET_WINNING_PROPOSAL, &[]).await?;
        let out = AbiDecoder::new(&data);
        Ok(WinningProposal {
            index: CandidateId::new(out.uint64(0)?),
            vote_count: out.uint64(1)?,
            is_tie: out.boolean(2)?,
        })
    }

    async fn chairperson(&self) -> Result<Address, ContractError> {
        let data = self.read(sig::CHAIRPERSON, &[]).await?;
        AbiDecoder::new(&data).address(0)
    }

    async fn commit_vote(&self, commitment: Commitment) -> Result<TxOutcome, ContractError> {
        self.send(sig::COMMIT_VOTE, &[Token::FixedBytes(*commitment.as_bytes())])
            .await
    }

    async fn meta_commit_vote(
        &self,
        request: &MetaCommitRequest,
    ) -> Result<TxOutcome, ContractError> {
        self.send(
            sig::META_COMMIT_VOTE,
            &[
                Token::Address(request.voter),
                Token::FixedBytes(*request.commitment.as_bytes()),
                Token::Uint(u128::from(request.nonce)),
                Token::Bytes(request.signature.as_bytes().to_vec()),
            ],
        )
        .await
    }

    async fn reveal_vote(
        &self,
        candidate: CandidateId,
        nonce: Nonce,
        salt: &Salt,
    ) -> Result<TxOutcome, ContractError> {
        self.send(
            sig::REVEAL_VOTE,
            &[
                Token::Uint(u128::from(candidate.index())),
                Token::Uint(u128::from(nonce.value())),
                Token::FixedBytes(*salt.as_bytes()),
            ],
        )
        .await
    }
}

impl AdminContract for BallotContract {
    async fn set_voting_time(&self, start: u64, end: u64) -> Result<TxOutcome, ContractError> {
        self.send(
            sig::SET_VOTING_TIME,
            &[Token::Uint(u128::from(start)), Token::Uint(u128::from(end))],
        )
        .await
    }

    async fn delay_voting_start(&self, delay_secs: u64) -> Result<TxOutcome, ContractError> {
        self.send(sig::DELAY_VOTING_START, &[Token::Uint(u128::from(delay_secs))])
            .await
    }

    async fn start_voting_early(&self) -> Result<TxOutcome, ContractError> {
        self.send(sig::START_VOTING_EARLY, &[]).await
    }

    async fn emergency_stop(&self) -> Result<TxOutcome, ContractError> {
        self.send(sig::EMERGENCY_STOP, &[]).await
    }

    async fn force_reveal_results(&self) -> Result<TxOutcome, ContractError> {
        self.send(sig::FORCE_REVEAL_RESULTS, &[]).await
    }

    async fn give_right_to_vote(&self, voter: Address) -> Result<TxOutcome, ContractError> {
        self.send(sig::GIVE_RIGHT_TO_VOTE, &[Token::Address(voter)])
            .await
    }

    async fn batch_give_right_to_vote(
        &self,
        voters: &[Address],
    ) -> Result<TxOutcome, ContractError> {
        let voters = voters.iter().copied().map(Token::Address).collect();
        self.send(sig::BATCH_GIVE_RIGHT_TO_VOTE, &[Token::Array(voters)])
            .await
    }

    async fn reset_voting(
        &self,
        proposal_names: &[[u8; 32]],
        start: u64,
        end: u64,
        reveal: u64,
        privacy_mode: bool,
    ) -> Result<TxOutcome, ContractError> {
        let names = proposal_names.iter().copied().map(Token::FixedBytes).collect();
        self.send(
            sig::RESET_VOTING,
            &[
                Token::Array(names),
                Token::Uint(u128::from(start)),
                Token::Uint(u128::from(end)),
                Token::Uint(u128::from(reveal)),
                Token::Bool(privacy_mode),
            ],
        )
        .await
    }

    async fn clear_voter_history(&self) -> Result<TxOutcome, ContractError> {
        self.send(sig::CLEAR_VOTER_HISTORY, &[]).await
    }
}
