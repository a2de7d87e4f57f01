use ballot_crypto::{compute_commitment, generate_secret, keccak256, Eip712Domain, LocalKey, MetaCommit, OsEntropy};
use ballot_types::{Address, CandidateId, Commitment, Nonce, Salt};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn keccak_256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("keccak256_256B", |b| {
        b.iter(|| keccak256(black_box(&data)))
    });
}

fn commitment_bench(c: &mut Criterion) {
    let voter = Address::new([0x11; 20]);
    let salt = Salt::new([0x22; 32]);

    c.bench_function("compute_commitment", |b| {
        b.iter(|| {
            compute_commitment(
                black_box(&voter),
                CandidateId::new(3),
                Nonce::new(42),
                black_box(&salt),
            )
        })
    });
}

fn generate_secret_bench(c: &mut Criterion) {
    c.bench_function("generate_secret_os", |b| {
        b.iter(|| generate_secret(&OsEntropy))
    });
}

fn meta_commit_sign_bench(c: &mut Criterion) {
    let key = LocalKey::from_bytes(&[0x42; 32]).unwrap();
    let domain = Eip712Domain::ballot(11155111, Address::new([0x33; 20]));
    let msg = MetaCommit {
        voter: key.address(),
        commitment: Commitment::new([0x44; 32]),
        nonce: 0,
    };

    c.bench_function("meta_commit_sign", |b| {
        b.iter(|| msg.sign(black_box(&domain), &key))
    });
}

fn recover_bench(c: &mut Criterion) {
    let key = LocalKey::from_bytes(&[0x42; 32]).unwrap();
    let hash = [0x55u8; 32];
    let sig = key.sign_hash(&hash).unwrap();

    c.bench_function("recover_address", |b| {
        b.iter(|| ballot_crypto::recover_address(black_box(&hash), &sig))
    });
}

criterion_group!(
    benches,
    keccak_256_bench,
    commitment_bench,
    generate_secret_bench,
    meta_commit_sign_bench,
    recover_bench,
);
criterion_main!(benches);
