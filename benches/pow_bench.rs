//! Benchmarks for the sponge, the hash codec and the nonce search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use curl_pow::{go_pow, hash_trytes, trits_to_bytes, trytes_to_trits, TRANSACTION_TRINARY_SIZE};

fn bench_transaction_hash(c: &mut Criterion) {
    let tx = "9".repeat(TRANSACTION_TRINARY_SIZE / 3);

    c.bench_function("curl_transaction_hash", |b| {
        b.iter(|| hash_trytes(black_box(&tx)))
    });
}

fn bench_hash_codec(c: &mut Criterion) {
    let trits = trytes_to_trits(&"W".repeat(81)).unwrap();

    c.bench_function("trits_to_bytes", |b| {
        b.iter(|| trits_to_bytes(black_box(&trits)))
    });
}

fn bench_pow(c: &mut Criterion) {
    let tx = "9".repeat(TRANSACTION_TRINARY_SIZE / 3);

    c.bench_function("go_pow_mwm9", |b| {
        b.iter(|| go_pow(black_box(&tx), 9, Some(2)))
    });
}

criterion_group!(benches, bench_transaction_hash, bench_hash_codec, bench_pow);
criterion_main!(benches);
