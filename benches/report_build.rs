use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use salesboard::consolidate::consolidate;
use salesboard::data::{RawRecord, Value, record};
use salesboard::dataset::{AccountDatasets, Dataset};
use salesboard::dates::DateRange;
use salesboard::filter::FilterCriteria;
use salesboard::mapping::{CanonicalField, ColumnMapping};
use salesboard::report::DashboardReport;

const BRANDS: [&str; 6] = ["Libas", "Biba", "Roadster", "Puma", "Nike", "HRX"];
const CITIES: [&str; 5] = ["Pune", "Mumbai", "Chennai", "Delhi", "Bengaluru"];

fn generate_orders(rows: usize) -> Vec<RawRecord> {
    (0..rows)
        .map(|i| {
            let day = (i % 28) + 1;
            let month = (i % 12) + 1;
            let status = match i % 4 {
                0 => "CANCELLED",
                1 => "RETURNED",
                _ => "DELIVERED",
            };
            record([
                ("seller order id", Value::text(format!("SO-{}", i / 2))),
                ("seller sku code", Value::text(format!("SKU-{}", i % 97))),
                ("created on", Value::text(format!("2024-{month:02}-{day:02} 10:00:00"))),
                ("brand", Value::text(BRANDS[i % BRANDS.len()])),
                ("city", Value::text(CITIES[i % CITIES.len()])),
                ("order status", Value::text(status)),
                ("final amount", Value::Number((i % 500) as f64 * 3.5)),
                ("discount", Value::Number((i % 60) as f64)),
                ("article type", Value::text(format!("Type{}", i % 20))),
            ])
        })
        .collect()
}

fn myntra_mapping() -> ColumnMapping {
    ColumnMapping::new()
        .with(CanonicalField::OrderId, "seller order id")
        .with(CanonicalField::Sku, "seller sku code")
        .with(CanonicalField::Date, "created on")
        .with(CanonicalField::Brand, "brand")
        .with(CanonicalField::City, "city")
        .with(CanonicalField::OrderStatus, "order status")
        .with(CanonicalField::Revenue, "final amount")
        .with(CanonicalField::Discount, "discount")
        .with(CanonicalField::ArticleType, "article type")
}

fn bench_report_build(c: &mut Criterion) {
    let dataset = Dataset::new(generate_orders(50_000), myntra_mapping());
    let unfiltered = FilterCriteria::all();
    let filtered = FilterCriteria::all()
        .with_range(DateRange::for_days(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
            chrono::NaiveDate::from_ymd_opt(2024, 6, 30),
        ))
        .with_brand("Puma");

    let mut group = c.benchmark_group("dashboard_report");

    group.bench_function("single_domain_unfiltered", |b| {
        b.iter(|| DashboardReport::build(&dataset, &unfiltered, 10));
    });

    group.bench_function("single_domain_filtered", |b| {
        b.iter(|| DashboardReport::build(&dataset, &filtered, 10));
    });

    let mut datasets = AccountDatasets::new();
    datasets.insert("Myntra".to_string(), dataset.clone());
    datasets.insert("AJIO".to_string(), dataset);
    group.bench_function("consolidated_unfiltered", |b| {
        b.iter_batched(
            || (),
            |_| {
                let merged = consolidate(&datasets).expect("datasets have rows");
                DashboardReport::build(&merged, &unfiltered, 10)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_report_build);
criterion_main!(benches);
