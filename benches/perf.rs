use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use arima_terminal::evaluation::evaluate;
use arima_terminal::loader::{DataFormat, TableCache, parse_table};
use arima_terminal::narrative::prompt::{MAX_PROMPT_ROWS, format_table_for_prompt};
use arima_terminal::ranking::rank;
use arima_terminal::sign_theory::build_plan;
use arima_terminal::table::RaceTable;

const SAMPLE_CSV: &[u8] = include_bytes!("../data/arima_sample.csv");

fn sample_table() -> RaceTable {
    parse_table(SAMPLE_CSV, DataFormat::Csv).expect("valid sample csv")
}

fn bench_parse_sample(c: &mut Criterion) {
    c.bench_function("parse_sample_csv", |b| {
        b.iter(|| {
            let table = parse_table(black_box(SAMPLE_CSV), DataFormat::Csv).unwrap();
            black_box(table.len());
        })
    });
}

fn bench_cached_load(c: &mut Criterion) {
    let cache = TableCache::new();
    cache.load_bytes(SAMPLE_CSV, DataFormat::Csv).unwrap();
    c.bench_function("cached_load", |b| {
        b.iter(|| {
            let table = cache.load_bytes(black_box(SAMPLE_CSV), DataFormat::Csv).unwrap();
            black_box(table.len());
        })
    });
}

fn bench_rank(c: &mut Criterion) {
    let table = sample_table();
    c.bench_function("rank_sample", |b| {
        b.iter(|| {
            let prediction = rank(black_box(&table));
            black_box(prediction.picks.len());
        })
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let table = sample_table();
    c.bench_function("evaluate_all_numbers", |b| {
        b.iter(|| {
            for number in 1..=18 {
                let eval = evaluate(black_box(&table), number);
                black_box(eval.overall_score);
            }
        })
    });
}

fn bench_sign_plan(c: &mut Criterion) {
    c.bench_function("sign_theory_default_plan", |b| {
        b.iter(|| {
            let plan = build_plan(black_box(None));
            black_box(plan.pairs.len());
        })
    });
}

fn bench_prompt_table(c: &mut Criterion) {
    let table = sample_table();
    c.bench_function("prompt_table_csv", |b| {
        b.iter(|| {
            let text = format_table_for_prompt(black_box(&table), MAX_PROMPT_ROWS).unwrap();
            black_box(text.len());
        })
    });
}

criterion_group!(
    benches,
    bench_parse_sample,
    bench_cached_load,
    bench_rank,
    bench_evaluate,
    bench_sign_plan,
    bench_prompt_table
);
criterion_main!(benches);
