//! Context detection and completion benchmarks
//!
//! Measures:
//! - Tokenizing and parsing a buffer
//! - Cursor-context detection across clause kinds
//! - Segmenting a multi-batch script
//! - Completion against a warm catalog

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sqlctx_context::ContextEngine;
use sqlctx_engine::{EngineConfig, SqlEngine};
use sqlctx_grammar::ParsedBuffer;
use sqlctx_ir::Dialect;
use sqlctx_test_utils::{MockLoaderBuilder, SqlFixtures, split_cursor};

const CASES: [(&str, &str); 6] = [
    ("select_list", SqlFixtures::select_list()),
    ("qualified", SqlFixtures::select_qualified()),
    ("join_on", SqlFixtures::join_on()),
    ("comparison", SqlFixtures::where_comparison()),
    ("insert_values", SqlFixtures::insert_values()),
    ("exec_params", SqlFixtures::exec_params()),
];

/// A long script: the HR script repeated, with the cursor at the very end
fn long_script(repeats: usize) -> String {
    let mut script = SqlFixtures::hr_script().repeat(repeats);
    script.push_str("\nGO\nSELECT e.█ FROM Employees e");
    script
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for repeats in [1, 10, 100] {
        let (sql, _) = split_cursor(&long_script(repeats));
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeats), &sql, |b, sql| {
            b.iter(|| black_box(ParsedBuffer::parse(black_box(sql.as_str()), Dialect::SqlServer)));
        });
    }
    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    for (name, input) in CASES {
        let (sql, pos) = split_cursor(input);
        let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
        group.bench_function(name, |b| {
            b.iter(|| black_box(ContextEngine::new(&buffer).detect_full(black_box(pos))));
        });
    }

    let (sql, pos) = split_cursor(&long_script(100));
    let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
    group.bench_function("long_script", |b| {
        b.iter(|| black_box(ContextEngine::new(&buffer).detect_full(black_box(pos))));
    });
    group.finish();
}

fn bench_segment(c: &mut Criterion) {
    let (sql, _) = split_cursor(&long_script(100));
    let mut group = c.benchmark_group("segment");
    group.throughput(Throughput::Bytes(sql.len() as u64));
    group.bench_function("hr_script_x100", |b| {
        b.iter(|| black_box(sqlctx_segmenter::parse(black_box(&sql), Some("master"))));
    });
    group.finish();
}

fn bench_complete(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let loader = MockLoaderBuilder::new().with_hr_schema().build();
    let config = EngineConfig::new(Dialect::SqlServer).with_connected_database("Hr");
    let engine = runtime.block_on(async { SqlEngine::new(config, Arc::new(loader)).unwrap() });

    let mut group = c.benchmark_group("complete");
    for (name, input) in CASES {
        let (sql, pos) = split_cursor(input);
        engine.open(name, sql);
        // warm the catalog so the benchmark measures lookups, not loads
        runtime.block_on(engine.complete_settled(name, pos)).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(engine.complete(name, black_box(pos)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_detect, bench_segment, bench_complete);
criterion_main!(benches);
