// Signing & verification benchmarks.
//
// Covers key generation, prehash ECDSA signing and verification on both
// curves, and full role-based signing of a single-account transaction.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use flowkit_protocol::crypto::{sign, verify, HashAlgorithm, PrivateKey, SignatureAlgorithm};
use flowkit_protocol::transaction::{
    sign_transaction, Address, Identifier, LocalSigner, ProposalKey, TransactionBuilder,
};

const CURVES: [SignatureAlgorithm; 2] = [
    SignatureAlgorithm::EcdsaP256,
    SignatureAlgorithm::EcdsaSecp256k1,
];

fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa/key_generate");
    for curve in CURVES {
        group.bench_with_input(BenchmarkId::from_parameter(curve), &curve, |b, curve| {
            b.iter(|| PrivateKey::generate(*curve));
        });
    }
    group.finish();
}

fn bench_sign_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa/sign_sha3");
    let message = vec![0xA5u8; 512];
    for curve in CURVES {
        let key = PrivateKey::generate(curve);
        group.bench_with_input(BenchmarkId::from_parameter(curve), &message, |b, msg| {
            b.iter(|| sign(&key, HashAlgorithm::Sha3_256, msg).unwrap());
        });
    }
    group.finish();
}

fn bench_verify_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa/verify_sha3");
    let message = vec![0xA5u8; 512];
    for curve in CURVES {
        let key = PrivateKey::generate(curve);
        let public_key = key.public_key();
        let signature = sign(&key, HashAlgorithm::Sha3_256, &message).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(curve), &message, |b, msg| {
            b.iter(|| verify(&public_key, HashAlgorithm::Sha3_256, msg, &signature));
        });
    }
    group.finish();
}

fn bench_sign_transaction(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let address = Address::from_hex("0xf8d6e0586b0a20c7").unwrap();
    let signer = LocalSigner::new(
        address,
        0,
        PrivateKey::generate(SignatureAlgorithm::EcdsaP256),
        HashAlgorithm::Sha3_256,
    );

    c.bench_function("transaction/sign_single_account", |b| {
        b.iter(|| {
            let mut tx = TransactionBuilder::new()
                .script("transaction { prepare(acct: AuthAccount) { log(acct.address) } }")
                .reference_block_id(Identifier::new([0x42; 32]))
                .gas_limit(9_999)
                .proposal_key(ProposalKey {
                    address,
                    key_index: 0,
                    sequence_number: 42,
                })
                .payer(address)
                .authorizer(address)
                .build()
                .unwrap();
            runtime
                .block_on(sign_transaction(&mut tx, &signer, &[&signer], &signer))
                .unwrap();
            tx
        });
    });
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_sign_message,
    bench_verify_signature,
    bench_sign_transaction,
);
criterion_main!(benches);
