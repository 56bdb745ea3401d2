use blazer::{compress, compress_with_flags, default_flags};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn repetitive_1mb() -> Vec<u8> {
    vec![0x41u8; 1024 * 1024]
}

fn random_1mb() -> Vec<u8> {
    let mut x: u32 = 0x1234_5678;
    (0..1024 * 1024)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x & 0xFF) as u8
        })
        .collect()
}

fn bench_compression(c: &mut Criterion) {
    let repetitive = repetitive_1mb();
    let random = random_1mb();

    c.bench_function("compress_repetitive_1mb", |b| {
        b.iter(|| compress(black_box(&repetitive)).unwrap())
    });
    c.bench_function("compress_random_1mb", |b| {
        b.iter(|| compress(black_box(&random)).unwrap())
    });

    let container = compress(&repetitive).unwrap();
    c.bench_function("decompress_repetitive_1mb", |b| {
        b.iter(|| blazer::decompress(black_box(&container)).unwrap())
    });

    let mut encrypted_flags = default_flags();
    encrypted_flags.set_encrypt_inner(true);
    c.bench_function("compress_encrypted_1mb", |b| {
        b.iter(|| compress_with_flags(black_box(&repetitive), encrypted_flags, Some(b"benchmark-password")).unwrap())
    });
}

criterion_group!(benches, bench_compression);
criterion_main!(benches);
