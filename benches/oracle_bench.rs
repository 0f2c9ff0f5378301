//! Oracle benchmarks: screening and query normalization.
//!
//! Run with: cargo bench --bench oracle_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use statement_oracle::{Oracle, Statement};

const STATEMENTS: &[(&str, &str)] = &[
    ("clear", "Paris is the capital of France"),
    ("banned", "That argument is disgusting"),
    ("fallacy_last", "Banning cars will solve climate change"),
    ("opinion", "People who want environmental protection just want to destroy the economy."),
];

fn bench_check_statement(c: &mut Criterion) {
    let oracle = Oracle::with_defaults();
    let mut group = c.benchmark_group("check_statement");

    for (name, text) in STATEMENTS {
        let statement = Statement::new(*text);
        group.bench_with_input(BenchmarkId::from_parameter(name), &statement, |b, s| {
            b.iter(|| oracle.check_statement(black_box(s)))
        });
    }
    group.finish();
}

fn bench_normalize_query(c: &mut Criterion) {
    let oracle = Oracle::with_defaults();
    let mut group = c.benchmark_group("normalize_query");

    for (name, text) in STATEMENTS {
        let statement = Statement::new(*text);
        group.bench_with_input(BenchmarkId::from_parameter(name), &statement, |b, s| {
            b.iter(|| oracle.normalize_query(black_box(s)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_check_statement, bench_normalize_query);
criterion_main!(benches);
