//! Benchmark for dungeon graph and biome generation.
//!
//! Dungeons are generated on first entry to a town, so one graph must be
//! cheap enough to build on demand.
//!
//! Run with: cargo bench --package geoweave_procedural --bench dungeon_benchmark

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use geoweave_core::{geohash, LocationType, WorldConfig};
use geoweave_procedural::{build_dungeon_graph, BiomeField};

fn benchmark_single_dungeon(c: &mut Criterion) {
    let config = WorldConfig::default();

    c.bench_function("single_dungeon_graph", |b| {
        b.iter(|| black_box(build_dungeon_graph(&config, black_box("u4pru"), LocationType::Dungeon)));
    });
}

fn benchmark_dungeon_row(c: &mut Criterion) {
    let config = WorldConfig::default();
    let towns = geohash::children("u4pr").unwrap_or_default();

    let mut group = c.benchmark_group("dungeon_row");
    group.sample_size(10);
    group.throughput(Throughput::Elements(towns.len() as u64));
    group.bench_function("32_towns", |b| {
        b.iter(|| {
            for town in &towns {
                let _ = black_box(build_dungeon_graph(&config, town, LocationType::Dungeon));
            }
        });
    });
    group.finish();
}

fn benchmark_biome_classify(c: &mut Criterion) {
    let field = BiomeField::new(Arc::new(WorldConfig::default()));
    let cells = geohash::expand_to_precision("u4", 4).unwrap_or_default();

    let mut group = c.benchmark_group("biome");
    group.throughput(Throughput::Elements(cells.len() as u64));
    group.bench_function("classify_1024_cities", |b| {
        b.iter(|| {
            for cell in &cells {
                let _ = black_box(field.classify(cell));
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_dungeon,
    benchmark_dungeon_row,
    benchmark_biome_classify
);
criterion_main!(benches);
