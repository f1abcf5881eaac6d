use casefile_domain::config::InflateStrategy;
use casefile_package::{InflateDispatcher, PackageDecoder};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

#[path = "../tests/fixtures/mod.rs"]
mod fixtures;

fn definition(i: usize) -> Vec<u8> {
    format!(r##"{{"label":"Entity {i}","icon":"icons/e{i}.png","color":"#{i:06x}","shape":"ellipse"}}"##)
        .into_bytes()
}

// ============================================================================
// Benchmark: Raw inflate per strategy
// ============================================================================

fn bench_inflate(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate");

    let data: Vec<u8> = (0..64).flat_map(definition).collect();
    let raw = fixtures::deflate(&data);
    group.throughput(Throughput::Bytes(u64::try_from(data.len()).unwrap_or(u64::MAX)));

    for strategy in [InflateStrategy::Native, InflateStrategy::Software] {
        let dispatcher = InflateDispatcher::new(&[strategy]);
        let name = dispatcher.strategy().unwrap_or("none");
        group.bench_with_input(BenchmarkId::new("raw", name), &raw, |b, raw| {
            b.iter(|| black_box(dispatcher.inflate_raw(raw, data.len()).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Full package decode
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for types in [10, 100, 500] {
        let mut zip = fixtures::ZipBuilder::new().stored("bench/meta.json", br#"{"name":"Bench"}"#);
        for i in 0..types {
            zip = zip
                .deflated(&format!("bench/types/t{i}.json"), &definition(i))
                .stored(&format!("bench/icons/e{i}.png"), fixtures::PNG);
        }
        let archive = zip.finish();
        let decoder = PackageDecoder::default();

        group.bench_with_input(BenchmarkId::new("package", types), &archive, |b, archive| {
            b.iter(|| black_box(decoder.decode(archive).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inflate, bench_decode);
criterion_main!(benches);
