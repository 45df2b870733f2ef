//! Performance benchmarks for ingestion, projection, and chart building.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stockview::charts::{build_charts, default_groups};
use stockview::data::{parse_csv_str, DataConfig};
use stockview::projection::{project, ProjectionOptions};
use stockview::render::{chart_to_svg, SvgStyle};
use stockview::symbols::distinct_symbols;

const SYMBOLS: [&str; 8] = ["NABIL", "NICA", "SCB", "HBL", "EBL", "ADBL", "NTC", "UPPER"];

/// Generate a synthetic export with one row per symbol per day.
fn generate_csv(days: usize) -> String {
    let mut text = String::from(
        "SYMBOL,BUSINESS_DATE,OPEN_PRICE,HIGH_PRICE,LOW_PRICE,CLOSE_PRICE,\
         TOTAL_TRADED_QUANTITY,MARKET_CAPITALIZATION,AVERAGE_TRADED_PRICE,\
         PREVIOUS_DAY_CLOSE_PRICE\n",
    );
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

    for day in 0..days {
        let date = start + chrono::Duration::days(day as i64);
        for (s, symbol) in SYMBOLS.iter().enumerate() {
            let noise = ((day as f64 * 0.7).sin() * 2.0 + (s as f64 * 1.3).cos()) * 0.5;
            let price = 100.0 + s as f64 * 50.0 + noise;
            text.push_str(&format!(
                "{},{},{:.2},{:.2},{:.2},{:.2},{},{:.2},{:.2},{:.2}\n",
                symbol,
                date.format("%Y-%m-%d"),
                price - 1.0,
                price + 2.0,
                price - 2.0,
                price + 0.5,
                10_000 + day * 10,
                price * 1_000_000.0,
                price,
                price - 0.5
            ));
        }
    }
    text
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for days in [250, 1000, 5000] {
        let text = generate_csv(days);
        group.bench_with_input(BenchmarkId::new("parse_csv", days), &text, |b, text| {
            b.iter(|| parse_csv_str(black_box(text), "bench", &DataConfig::default()))
        });
    }

    let ds = parse_csv_str(&generate_csv(1000), "bench", &DataConfig::default()).unwrap();
    group.bench_function("distinct_symbols", |b| {
        b.iter(|| distinct_symbols(black_box(&ds)))
    });

    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let ds = parse_csv_str(&generate_csv(1000), "bench", &DataConfig::default()).unwrap();
    let mut group = c.benchmark_group("projection");

    group.bench_function("project_sorted", |b| {
        b.iter(|| project(black_box(&ds), "NTC", &ProjectionOptions::default()))
    });

    let unsorted = ProjectionOptions {
        sort_by_date: false,
        ..Default::default()
    };
    group.bench_function("project_unsorted", |b| {
        b.iter(|| project(black_box(&ds), "NTC", &unsorted))
    });

    group.finish();
}

fn bench_charts(c: &mut Criterion) {
    let ds = parse_csv_str(&generate_csv(1000), "bench", &DataConfig::default()).unwrap();
    let series = project(&ds, "NABIL", &ProjectionOptions::default()).unwrap();
    let groups = default_groups();
    let charts = build_charts(&groups, &series);
    let style = SvgStyle::default();

    let mut group = c.benchmark_group("charts");
    group.bench_function("build_charts", |b| {
        b.iter(|| build_charts(black_box(&groups), black_box(&series)))
    });
    group.bench_function("chart_to_svg", |b| {
        b.iter(|| chart_to_svg(black_box(&charts[0]), &style))
    });
    group.finish();
}

criterion_group!(benches, bench_ingest, bench_projection, bench_charts);
criterion_main!(benches);
