//! Criterion benchmarks for the compression pipeline.
//!
//! Run with:
//!   cargo bench --bench roundtrip
//!
//! Measures the full container path (shuffle + split + codec) per codec
//! and level on typed numeric data, the workload Blosc is built for.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use blosc::{Compressor, Context, Filter, SplitMode};

/// Ascending f32 values: highly compressible once shuffled.
fn float_data(nbytes: usize) -> Vec<u8> {
    (0..(nbytes / 4) as u32)
        .flat_map(|i| (i as f32).to_le_bytes())
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");

    for &size in &[1_048_576usize, 8_388_608] {
        let src = float_data(size);
        let mut dst = vec![0u8; size + blosc::MAX_OVERHEAD];
        group.throughput(Throughput::Bytes(size as u64));

        for codec in [
            Compressor::BloscLz,
            Compressor::Lz4,
            Compressor::Zstd,
        ] {
            if !codec.supported() {
                continue;
            }
            let ctx = Context::new().compressor(codec);
            group.bench_with_input(
                BenchmarkId::new(codec.name(), size),
                &src,
                |b, src| {
                    b.iter(|| ctx.compress(5, Filter::Shuffle, 4, src, &mut dst).unwrap())
                },
            );
        }

        // ── split modes, baseline codec ─────────────────────────────────────
        for (label, mode) in [("split", SplitMode::Always), ("nosplit", SplitMode::Never)] {
            let ctx = Context::new().splitmode(mode);
            group.bench_with_input(BenchmarkId::new(label, size), &src, |b, src| {
                b.iter(|| ctx.compress(5, Filter::Shuffle, 4, src, &mut dst).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");

    for &size in &[1_048_576usize, 8_388_608] {
        let src = float_data(size);
        let mut back = vec![0u8; size];
        // Throughput measured in *decompressed* bytes.
        group.throughput(Throughput::Bytes(size as u64));

        for codec in [Compressor::BloscLz, Compressor::Lz4, Compressor::Zstd] {
            if !codec.supported() {
                continue;
            }
            let ctx = Context::new().compressor(codec);
            let mut packed = vec![0u8; size + blosc::MAX_OVERHEAD];
            let cbytes = ctx.compress(5, Filter::Shuffle, 4, &src, &mut packed).unwrap();
            packed.truncate(cbytes);

            group.bench_with_input(
                BenchmarkId::new(codec.name(), size),
                &packed,
                |b, packed| b.iter(|| ctx.decompress(packed, &mut back).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("threads");
    let size = 8_388_608usize;
    let src = float_data(size);
    let mut dst = vec![0u8; size + blosc::MAX_OVERHEAD];
    group.throughput(Throughput::Bytes(size as u64));

    for &nthreads in &[1i32, 2, 4] {
        let ctx = Context::new().nthreads(nthreads);
        group.bench_with_input(
            BenchmarkId::new("compress", nthreads),
            &src,
            |b, src| b.iter(|| ctx.compress(5, Filter::Shuffle, 4, src, &mut dst).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress, bench_threads);
criterion_main!(benches);
