//! # Grid Math Benchmark
//!
//! Neighbour lookups run once per expanded node during pathfinding, and
//! stencil placement expands whole territories. Both must stay cheap.
//!
//! Run with: `cargo bench --package geoweave_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geoweave_core::{geohash, rng, Direction, SeedStream};

fn bench_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_decode");

    for precision in [4usize, 8, 12] {
        let cell = &"u4pruydqqvj8"[..precision];
        group.bench_with_input(BenchmarkId::from_parameter(precision), cell, |b, cell| {
            b.iter(|| {
                let (col, row) = geohash::col_row(black_box(cell)).unwrap_or((0, 0));
                black_box(geohash::encode(col, row, cell.len()))
            });
        });
    }

    group.finish();
}

fn bench_neighbors(c: &mut Criterion) {
    c.bench_function("neighbors_unit_compass", |b| {
        b.iter(|| {
            for direction in Direction::COMPASS {
                let _ = black_box(geohash::neighbor(black_box("u4pruydq"), direction, 1));
            }
        });
    });
}

fn bench_expand(c: &mut Criterion) {
    c.bench_function("expand_town_to_house", |b| {
        b.iter(|| black_box(geohash::expand_to_precision(black_box("u4pru"), 7)));
    });
}

fn bench_rng(c: &mut Criterion) {
    c.bench_function("hash_seed_string", |b| {
        b.iter(|| black_box(rng::hash(black_box("worldu4pruydqdungeonskeleton-camp"))));
    });

    c.bench_function("seed_stream_1k_draws", |b| {
        b.iter(|| {
            let mut stream = SeedStream::new("bench");
            let mut acc = 0.0;
            for _ in 0..1_000 {
                acc += stream.next_f64();
            }
            black_box(acc)
        });
    });
}

criterion_group!(benches, bench_encode_decode, bench_neighbors, bench_expand, bench_rng);
criterion_main!(benches);
