//! End-to-end workflow scenarios against the nullable contract.

use ballot_client::{
    proposals, AdminConsole, BallotReset, ClientError, PreconditionFailure, VotingClient,
};
use ballot_contract::{BallotError, RevertReason, VotingContract};
use ballot_crypto::{compute_commitment, LocalKey};
use ballot_nullables::{ContractCall, Failure, NullClock, NullContract, NullEntropy, NullSecretStore};
use ballot_store::{MemorySecretStore, RecordStatus, SecretStore};
use ballot_types::{
    Address, Candidate, CandidateId, Nonce, Salt, SecretMaterial, Timestamp, VotingPhase,
    VotingSchedule,
};

const CHAIN_ID: u64 = 31337;
const CONTRACT: Address = Address::new([0x22; 20]);
const CHAIR: Address = Address::new([0xcc; 20]);

type Client<S = MemorySecretStore> = VotingClient<NullContract, S, NullClock, NullEntropy>;

fn voter_key() -> LocalKey {
    LocalKey::from_bytes(&[0x42; 32]).unwrap()
}

fn relayer() -> Address {
    Address::new([0x77; 20])
}

fn ballot(clock: &NullClock) -> NullContract {
    let names: Vec<[u8; 32]> = ["Alice", "Bob", "Carol"]
        .iter()
        .map(|n| Candidate::encode_name(n).unwrap())
        .collect();
    let contract = NullContract::new(
        CONTRACT,
        CHAIN_ID,
        clock.clone(),
        &names,
        VotingSchedule::from_raw(100, 200, 300),
        CHAIR,
    );
    contract.set_signer(Some(voter_key().address()));
    contract
}

fn client_with<S: SecretStore>(store: S) -> (Client<S>, NullClock) {
    let clock = NullClock::new(50);
    let client = VotingClient::new(ballot(&clock), store)
        .with_clock(clock.clone())
        .with_entropy(NullEntropy::new(1));
    (client, clock)
}

fn client() -> (Client, NullClock) {
    client_with(MemorySecretStore::new())
}

fn voter() -> Address {
    voter_key().address()
}

fn retained(client: &Client) -> Vec<ballot_store::SecretRecord> {
    client.store().load(&CONTRACT, &voter()).unwrap()
}

fn reveal_calls(contract: &NullContract) -> usize {
    contract
        .calls()
        .iter()
        .filter(|c| matches!(c, ContractCall::RevealVote { .. }))
        .count()
}

#[tokio::test]
async fn commit_then_reveal_counts_the_vote() {
    let (client, clock) = client();
    clock.set(150);

    let receipt = client.commit(CandidateId::new(1)).await.unwrap();
    assert!(!receipt.is_pending());
    assert!(!receipt.relayed);

    let records = retained(&client);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, RecordStatus::Committed);
    assert_eq!(records[0].tx_hash, Some(receipt.tx_hash));
    let secret = &records[0].secret;
    assert_eq!(
        compute_commitment(&voter(), CandidateId::new(1), secret.nonce, &secret.salt),
        receipt.commitment
    );
    assert_eq!(
        client.contract().vote_commitment(voter()).await.unwrap(),
        receipt.commitment
    );

    clock.set(250);
    let reveal = client.reveal().await.unwrap();
    assert_eq!(reveal.candidate, CandidateId::new(1));
    assert_eq!(reveal.commitment, receipt.commitment);
    assert_eq!(client.contract().votes(), vec![0, 1, 0]);
    assert_eq!(retained(&client)[0].status, RecordStatus::Revealed);
}

#[tokio::test]
async fn commit_before_start_submits_nothing() {
    let (client, _clock) = client();
    let err = client.commit(CandidateId::new(0)).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::WrongPhase {
            expected: VotingPhase::Open,
            actual: VotingPhase::NotStarted,
        })
    ));
    assert_eq!(client.contract().write_count(), 0);
    assert!(retained(&client).is_empty());
}

#[tokio::test]
async fn second_commit_is_refused_locally() {
    let (client, clock) = client();
    clock.set(150);
    let first = client.commit(CandidateId::new(0)).await.unwrap();

    let err = client.commit(CandidateId::new(2)).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::AlreadyCommitted { commitment })
            if commitment == first.commitment
    ));
    assert_eq!(client.contract().write_count(), 1);
    assert_eq!(retained(&client).len(), 1);
}

#[tokio::test]
async fn reveal_before_end_submits_nothing() {
    let (client, clock) = client();
    clock.set(150);
    client.commit(CandidateId::new(0)).await.unwrap();

    let err = client.reveal().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::OutsideRevealWindow {
            actual: VotingPhase::Open
        })
    ));
    assert_eq!(reveal_calls(client.contract()), 0);
}

#[tokio::test]
async fn reveal_after_deadline_is_outside_window() {
    let (client, clock) = client();
    clock.set(150);
    client.commit(CandidateId::new(0)).await.unwrap();
    clock.set(350);
    let err = client.reveal().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::OutsideRevealWindow {
            actual: VotingPhase::Revealed
        })
    ));
}

#[tokio::test]
async fn relayed_commit_is_signed_by_the_voter() {
    let (client, clock) = client();
    clock.set(150);
    client.contract().set_signer(Some(relayer()));

    let receipt = client
        .commit_relayed(&voter_key(), CandidateId::new(2))
        .await
        .unwrap();
    assert!(receipt.relayed);
    assert_eq!(receipt.voter, voter());
    assert_eq!(client.contract().meta_nonce(voter()).await.unwrap(), 1);
    assert_eq!(
        client.contract().calls(),
        vec![ContractCall::MetaCommitVote {
            relayer: relayer(),
            voter: voter(),
            commitment: receipt.commitment,
        }]
    );
    assert_eq!(retained(&client)[0].status, RecordStatus::Committed);
}

#[tokio::test]
async fn relay_failure_is_a_network_error_and_nothing_is_committed() {
    let (client, clock) = client();
    clock.set(150);
    client.contract().set_signer(Some(relayer()));
    client
        .contract()
        .fail_next_write(Failure::Transport("relay unreachable".into()));

    let err = client
        .commit_relayed(&voter_key(), CandidateId::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Network { relayed: true, .. }));

    let report = client.status(voter()).await.unwrap();
    assert!(!report.on_chain.has_committed);
    assert!(report.active_record().is_none());
    // Outcome unknown at the time of failure, so the secret is kept.
    assert_eq!(report.orphaned_records().count(), 1);
    assert_eq!(report.records[0].status, RecordStatus::Pending);
}

#[tokio::test]
async fn relayed_commit_without_relayer_is_configuration_error() {
    let (client, clock) = client();
    clock.set(150);
    client.contract().set_signer(None);
    let err = client
        .commit_relayed(&voter_key(), CandidateId::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
    assert_eq!(client.contract().write_count(), 0);
}

#[tokio::test]
async fn contract_rejection_discards_the_secret() {
    let (client, clock) = client();
    clock.set(150);
    let reason = RevertReason::Custom(BallotError::NoRightToVote);
    client
        .contract()
        .fail_next_write(Failure::Revert(reason.clone()));

    let err = client.commit(CandidateId::new(0)).await.unwrap_err();
    assert!(matches!(err, ClientError::ContractRejection(r) if r == reason));
    assert!(retained(&client).is_empty());
}

#[tokio::test]
async fn altered_reveal_fields_are_caught_before_submission() {
    let (client, clock) = client();
    clock.set(150);
    let receipt = client.commit(CandidateId::new(1)).await.unwrap();
    let secret = retained(&client)[0].secret.clone();
    clock.set(250);

    let wrong_nonce = SecretMaterial::new(Nonce::new(secret.nonce.value() + 1), secret.salt.clone());
    let wrong_salt = SecretMaterial::new(secret.nonce, Salt::new([0x99; 32]));
    let attempts = [
        (CandidateId::new(1), wrong_nonce),
        (CandidateId::new(1), wrong_salt),
        (CandidateId::new(0), secret.clone()),
    ];
    for (candidate, material) in &attempts {
        let err = client.reveal_with(*candidate, material).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Mismatch { stored, .. } if stored == receipt.commitment
        ));
    }
    assert_eq!(reveal_calls(client.contract()), 0);

    let report = client
        .verify(voter(), CandidateId::new(1), &secret)
        .await
        .unwrap();
    assert!(report.matches());
    client.reveal_with(CandidateId::new(1), &secret).await.unwrap();
}

#[tokio::test]
async fn without_local_check_the_contract_rejects_a_mismatch() {
    let (client, clock) = client();
    let client = client.verify_before_reveal(false);
    clock.set(150);
    client.commit(CandidateId::new(1)).await.unwrap();
    let secret = retained(&client)[0].secret.clone();
    clock.set(250);

    let err = client
        .reveal_with(CandidateId::new(2), &secret)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::ContractRejection(RevertReason::Custom(BallotError::InvalidCommitment))
    ));
    assert_eq!(reveal_calls(client.contract()), 1);
}

#[tokio::test]
async fn second_reveal_is_refused_locally() {
    let (client, clock) = client();
    clock.set(150);
    client.commit(CandidateId::new(0)).await.unwrap();
    clock.set(250);
    client.reveal().await.unwrap();

    let err = client.reveal().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::AlreadyRevealed)
    ));
    assert_eq!(reveal_calls(client.contract()), 1);
}

#[tokio::test]
async fn reveal_without_commit_or_secret() {
    let (client, clock) = client();
    clock.set(250);
    let err = client.reveal().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::NotCommitted)
    ));

    let foreign = ballot_types::Commitment::new([0x5a; 32]);
    client.contract().seed_commitment(voter(), foreign);
    let err = client.reveal().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::NoRetainedSecret { commitment })
            if commitment == foreign
    ));
}

#[tokio::test]
async fn out_of_range_candidate_is_a_validation_error() {
    let (client, clock) = client();
    clock.set(150);
    let err = client.commit(CandidateId::new(3)).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(client.contract().write_count(), 0);
    assert!(retained(&client).is_empty());
}

#[tokio::test]
async fn store_failure_prevents_submission() {
    let (client, clock) = client_with(NullSecretStore::new());
    clock.set(150);
    client.store().fail_saves(true);

    let err = client.commit(CandidateId::new(0)).await.unwrap_err();
    assert!(matches!(err, ClientError::Store(_)));
    assert_eq!(client.contract().write_count(), 0);
}

#[tokio::test]
async fn pending_commit_is_reconciled_by_status() {
    let (client, clock) = client();
    clock.set(150);
    client.contract().set_pending(true);

    let receipt = client.commit(CandidateId::new(0)).await.unwrap();
    assert!(receipt.is_pending());
    let records = retained(&client);
    assert_eq!(records[0].status, RecordStatus::Pending);
    assert_eq!(records[0].tx_hash, Some(receipt.tx_hash));

    let report = client.status(voter()).await.unwrap();
    assert_eq!(report.snapshot.phase, VotingPhase::Open);
    assert!(report.on_chain.has_committed);
    let active = report.active_record().unwrap();
    assert_eq!(active.status, RecordStatus::Committed);
    assert_eq!(retained(&client)[0].status, RecordStatus::Committed);
}

#[tokio::test]
async fn results_and_winner_after_reveal() {
    let (client, clock) = client();
    clock.set(150);
    client.commit(CandidateId::new(2)).await.unwrap();
    clock.set(250);
    client.reveal().await.unwrap();

    let err = proposals::winner(client.contract()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::ContractRejection(RevertReason::Custom(BallotError::ResultsNotYetPublic))
    ));

    clock.set(350);
    let tallies = proposals::results(client.contract()).await.unwrap();
    assert_eq!(tallies.len(), 3);
    assert_eq!(tallies[2].candidate.name, "Carol");
    assert_eq!(tallies[2].votes, 1);
    let winner = proposals::winner(client.contract()).await.unwrap();
    assert_eq!(winner.index, CandidateId::new(2));
    assert!(!winner.is_tie);
}

#[tokio::test]
async fn admin_console_checks_chairperson_and_inputs() {
    let clock = NullClock::new(50);
    let contract = ballot(&clock);
    let console = AdminConsole::new(&contract, clock.clone());

    let err = console.force_reveal_results().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::NotChairperson { .. })
    ));
    assert_eq!(contract.write_count(), 0);

    contract.set_signer(Some(CHAIR));
    assert!(matches!(
        console.set_voting_time(150, 120).await,
        Err(ClientError::Validation(_))
    ));
    assert!(matches!(
        console.set_voting_time(40, 120).await,
        Err(ClientError::Validation(_))
    ));
    assert!(matches!(
        console.batch_give_right_to_vote(&[]).await,
        Err(ClientError::Validation(_))
    ));
    assert_eq!(contract.write_count(), 0);

    console.set_voting_time(60, 120).await.unwrap();
    assert_eq!(
        contract.schedule().await.unwrap(),
        VotingSchedule::from_raw(60, 120, 300)
    );
    console
        .batch_give_right_to_vote(&[voter(), relayer()])
        .await
        .unwrap();
    assert!(contract.has_voting_right(&voter()));
}

#[tokio::test]
async fn admin_reset_validates_the_new_ballot() {
    let clock = NullClock::new(50);
    let contract = ballot(&clock);
    contract.set_signer(Some(CHAIR));
    let console = AdminConsole::new(&contract, clock.clone());

    let too_long = BallotReset {
        candidates: vec!["A candidate name well over the limit".into()],
        start: 100,
        end: 200,
        reveal: Some(300),
        privacy_mode: false,
    };
    assert!(matches!(
        console.reset_voting(&too_long).await,
        Err(ClientError::Validation(_))
    ));
    let bad_schedule = BallotReset {
        candidates: vec!["Yes".into(), "No".into()],
        reveal: Some(150),
        ..too_long.clone()
    };
    assert!(matches!(
        console.reset_voting(&bad_schedule).await,
        Err(ClientError::Validation(_))
    ));
    assert_eq!(contract.write_count(), 0);

    let reset = BallotReset {
        reveal: Some(400),
        privacy_mode: true,
        ..bad_schedule
    };
    console.reset_voting(&reset).await.unwrap();
    let names: Vec<String> = proposals::candidates(&contract)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Yes", "No"]);
    assert!(contract.privacy_mode());
}

#[tokio::test]
async fn voting_time_must_end_before_the_reveal_deadline() {
    let clock = NullClock::new(50);
    let contract = ballot(&clock);
    contract.set_signer(Some(CHAIR));
    let console = AdminConsole::new(&contract, clock.clone());

    for end in [300, 400] {
        assert!(matches!(
            console.set_voting_time(150, end).await,
            Err(ClientError::Validation(_))
        ));
    }
    assert_eq!(contract.write_count(), 0);
    assert_eq!(
        contract.schedule().await.unwrap(),
        VotingSchedule::from_raw(100, 200, 300)
    );

    console.set_voting_time(150, 299).await.unwrap();
    let schedule = contract.schedule().await.unwrap();
    assert!(schedule.is_well_formed());
    assert_eq!(schedule.phase_at(Timestamp::new(299)), VotingPhase::AwaitingReveal);
}

#[tokio::test]
async fn relayed_commit_outside_window_reads_no_meta_nonce() {
    let (direct, _) = client();
    let before = direct.contract().read_count();
    assert!(direct.commit(CandidateId::new(0)).await.is_err());
    let direct_reads = direct.contract().read_count() - before;

    let (relayed, _) = client();
    relayed.contract().set_signer(Some(relayer()));
    let before = relayed.contract().read_count();
    let err = relayed
        .commit_relayed(&voter_key(), CandidateId::new(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Precondition(PreconditionFailure::WrongPhase { .. })
    ));
    assert_eq!(relayed.contract().read_count() - before, direct_reads);
    assert_eq!(relayed.contract().write_count(), 0);
    assert!(relayed.store().load(&CONTRACT, &voter()).unwrap().is_empty());
}

#[tokio::test]
async fn pending_reveal_is_reconciled_by_status() {
    let (client, clock) = client();
    clock.set(150);
    client.commit(CandidateId::new(1)).await.unwrap();
    clock.set(250);
    client.contract().set_pending(true);

    let receipt = client.reveal().await.unwrap();
    assert!(receipt.is_pending());
    assert_eq!(retained(&client)[0].status, RecordStatus::Committed);

    let report = client.status(voter()).await.unwrap();
    assert!(report.on_chain.has_revealed);
    assert_eq!(report.active_record().unwrap().status, RecordStatus::Revealed);
    assert_eq!(retained(&client)[0].status, RecordStatus::Revealed);
}

#[tokio::test]
async fn ballot_requiring_rights_rejects_an_unlisted_voter() {
    let (client, clock) = client();
    clock.set(150);
    client.contract().require_voting_rights(true);

    let err = client.commit(CandidateId::new(0)).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::ContractRejection(RevertReason::Custom(BallotError::NoRightToVote))
    ));
    assert!(retained(&client).is_empty());
}
