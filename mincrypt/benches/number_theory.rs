use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mincrypt::dh::DhCommon;
use mincrypt::number_theory::{Approach, generate_key_material, is_prime, modpow};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn bench_is_prime(c: &mut Criterion) {
    // largest primes below 2^32 and 2^64, plus a strong pseudoprime to bases 2..=23
    let inputs: [(u64, &str); 3] = [
        (4_294_967_291, "u32 prime"),
        (18_446_744_073_709_551_557, "u64 prime"),
        (3_825_123_056_546_413_051, "strong pseudoprime"),
    ];

    let mut group = c.benchmark_group("is_prime");
    for (n, label) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(label), &n, |b, &n| {
            b.iter(|| is_prime(black_box(n)))
        });
    }
    group.finish();
}

fn bench_modpow(c: &mut Criterion) {
    c.bench_function("modpow 64-bit", |b| {
        b.iter(|| {
            modpow(
                black_box(0x1234_5678_9abc_def0),
                black_box(u64::MAX - 2),
                black_box(18_446_744_073_709_551_557),
            )
            .expect("non-zero modulus")
        })
    });
}

fn bench_keygen(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_key_material");
    for bits in [16u32, 32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, &bits| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                generate_key_material(seed, bits, Approach::Symmetric).expect("key material")
            });
        });
    }
    group.finish();
}

fn bench_dh_common(c: &mut Criterion) {
    let mut group = c.benchmark_group("DhCommon::generate");
    for bits in [12u32, 32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, &bits| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| DhCommon::generate(&mut rng, bits).expect("dh common"));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_is_prime,
    bench_modpow,
    bench_keygen,
    bench_dh_common
);
criterion_main!(benches);
