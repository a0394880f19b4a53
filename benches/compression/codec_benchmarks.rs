use bytecodecs::{Compression, Huffman, Lz77, Rle};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn make_text(len: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    pattern.iter().copied().cycle().take(len).collect()
}

fn make_runs(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i / 37) as u8).collect()
}

fn make_random(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x1234_5678);
    (0..len).map(|_| rng.gen()).collect()
}

fn inputs() -> Vec<(&'static str, Vec<u8>)> {
    let len = 64 * 1024;
    vec![
        ("text", make_text(len)),
        ("runs", make_runs(len)),
        ("random", make_random(len)),
    ]
}

fn codecs() -> Vec<Box<dyn Compression>> {
    vec![
        Box::new(Rle::new()),
        Box::new(Huffman::new()),
        Box::new(Lz77::new()),
    ]
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    for (label, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for codec in codecs() {
            group.bench_with_input(BenchmarkId::new(codec.name(), label), &data, |b, data| {
                b.iter(|| codec.compress(black_box(data)).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    for (label, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for codec in codecs() {
            let compressed = codec.compress(&data).unwrap();
            group.bench_with_input(
                BenchmarkId::new(codec.name(), label),
                &compressed,
                |b, compressed| b.iter(|| codec.decompress(black_box(compressed)).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
