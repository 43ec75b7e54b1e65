//! Criterion benchmarks for the crease build stages.
//!
//! Covers:
//! - Text normalization
//! - Lexicon and forward index construction
//! - Inversion with different shard counts
//! - Barrel partitioning and persistence

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use crease::analysis::analyzer::Analyzer;
use crease::analysis::analyzer::standard::StandardAnalyzer;
use crease::barrel::manager::BarrelManager;
use crease::barrel::partition;
use crease::document::record::RawRecord;
use crease::document::schema::{FieldSpec, RecordSchema};
use crease::inverted::InvertedIndexBuilder;
use crease::pipeline::{IndexConfig, IndexPipeline};
use crease::storage::memory::MemoryStorage;

/// Generate commentary-like records for benchmarking.
fn generate_records(count: usize) -> Vec<RawRecord> {
    let words = [
        "four", "six", "runs", "dot", "ball", "wicket", "caught", "bowled", "edge", "slip",
        "covers", "driven", "pulled", "short", "length", "yorker", "bouncer", "single", "boundary",
        "keeper", "appeal", "umpire", "review", "over", "spin", "pace", "leg", "off", "stump",
        "Kohli", "Dhoni", "Bumrah", "Rashid", "Gayle", "Warner",
    ];

    (0..count)
        .map(|i| {
            let length = 8 + (i % 24);
            let text: Vec<&str> = (0..length)
                .map(|j| words[(i * 7 + j * 13) % words.len()]) // Pseudo-random distribution
                .collect();
            RawRecord::new(i as u64)
                .with("text", text.join(" "))
                .with("over", format!("{}.{}", i / 6, i % 6 + 1))
        })
        .collect()
}

fn config(capacity: u32) -> IndexConfig {
    IndexConfig {
        schema: RecordSchema::new(vec![
            FieldSpec::textual("text").required(),
            FieldSpec::passthrough("over"),
        ]),
        barrel_capacity: capacity,
        ..Default::default()
    }
}

/// Run every in-memory stage up to inversion.
fn inverted_pipeline(records: &[RawRecord]) -> IndexPipeline {
    let mut pipeline = IndexPipeline::new(config(64)).unwrap();
    pipeline.assemble_documents(records).unwrap();
    pipeline.build_lexicon().unwrap();
    pipeline.build_forward_index().unwrap();
    pipeline.build_inverted_index().unwrap();
    pipeline
}

/// Benchmark text normalization.
fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");

    let analyzer = StandardAnalyzer::new();
    let texts: Vec<String> = generate_records(1000)
        .iter()
        .filter_map(|r| r.get("text").flatten().map(str::to_string))
        .collect();

    group.bench_function("normalize_single_record", |b| {
        b.iter(|| black_box(analyzer.terms(black_box(&texts[0]))))
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("normalize_batch_records", |b| {
        b.iter(|| {
            for text in texts.iter().take(100) {
                let _ = black_box(analyzer.terms(black_box(text)));
            }
        })
    });

    group.finish();
}

/// Benchmark document assembly through the forward index.
fn bench_build_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_stages");
    group.sample_size(20);

    for count in [1_000, 10_000] {
        let records = generate_records(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("assemble_and_lexicon", count), &records, |b, records| {
            b.iter(|| {
                let mut pipeline = IndexPipeline::new(config(64)).unwrap();
                pipeline.assemble_documents(records).unwrap();
                black_box(pipeline.build_lexicon().unwrap().len())
            })
        });

        group.bench_with_input(BenchmarkId::new("through_inversion", count), &records, |b, records| {
            b.iter(|| black_box(inverted_pipeline(records).report().posting_count))
        });
    }

    group.finish();
}

/// Benchmark inversion with different shard counts.
fn bench_inversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("inversion");
    group.sample_size(20);

    let pipeline = inverted_pipeline(&generate_records(10_000));
    let forward = pipeline.forward_index().unwrap();
    let lexicon = pipeline.lexicon().unwrap();

    for shards in [1, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(shards), &shards, |b, &shards| {
            let builder = InvertedIndexBuilder::new(shards);
            b.iter(|| black_box(builder.invert(forward.records(), lexicon).unwrap().len()))
        });
    }

    group.finish();
}

/// Benchmark barrel partitioning and persistence.
fn bench_barrels(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrels");
    group.sample_size(20);

    let pipeline = inverted_pipeline(&generate_records(10_000));
    let inverted = pipeline.inverted_index().unwrap();

    for capacity in [4, 16, 2500] {
        group.bench_with_input(BenchmarkId::new("partition", capacity), &capacity, |b, &capacity| {
            b.iter(|| black_box(partition(inverted, capacity).unwrap().len()))
        });

        let barrels = partition(inverted, capacity).unwrap();
        group.bench_with_input(BenchmarkId::new("save_all", capacity), &barrels, |b, barrels| {
            b.iter_with_setup(
                || BarrelManager::new(Arc::new(MemoryStorage::default()), capacity).unwrap(),
                |manager| black_box(manager.save_all(barrels).unwrap().len()),
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_normalization,
    bench_build_stages,
    bench_inversion,
    bench_barrels
);

criterion_main!(benches);
