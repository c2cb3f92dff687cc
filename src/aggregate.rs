//! Group-by aggregations behind every breakdown chart.
//!
//! All functions take the already filtered rows plus the dataset's mapping
//! and recompute from scratch. Grouping keys are the string form of the
//! mapped cell; the placeholder keys `""`, `"null"` and `"undefined"` never
//! form a group.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    data::RawRecord,
    dataset::Dataset,
    dates,
    mapping::{CanonicalField, ColumnMapping},
    revenue::revenue,
};

/// Leaderboard length used by every top-N breakdown.
pub const DEFAULT_TOP_N: usize = 10;
/// Article types shown in the discount cross-tab.
pub const DISCOUNT_TOP_N: usize = 15;

const PLACEHOLDER_KEYS: [&str; 3] = ["", "null", "undefined"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBucket {
    pub name: String,
    pub revenue: f64,
    pub avg_discount: f64,
}

fn group_key(row: &RawRecord, mapping: &ColumnMapping, field: CanonicalField) -> Option<String> {
    let key = mapping.value(row, field)?.key_string();
    (!PLACEHOLDER_KEYS.contains(&key.as_str())).then_some(key)
}

/// Groups rows on `field` and folds each group with `combine`.
///
/// Output is sorted by descending value, ties by ascending name. An unmapped
/// `field` yields no buckets.
pub fn aggregate_by<'a, I, F>(
    rows: I,
    mapping: &ColumnMapping,
    field: CanonicalField,
    mut combine: F,
) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a RawRecord>,
    F: FnMut(f64, &RawRecord) -> f64,
{
    if !mapping.is_mapped(field) {
        return Vec::new();
    }
    let mut groups: HashMap<String, f64> = HashMap::new();
    for row in rows {
        let Some(key) = group_key(row, mapping, field) else {
            continue;
        };
        let current = groups.entry(key).or_insert(0.0);
        *current = combine(*current, row);
    }
    groups
        .into_iter()
        .map(|(name, value)| Bucket { name, value })
        .sorted_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)))
        .collect()
}

/// Row count per group.
pub fn aggregate_by_count<'a, I>(rows: I, mapping: &ColumnMapping, field: CanonicalField) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    aggregate_by(rows, mapping, field, |current, _| current + 1.0)
}

/// Revenue total per group.
pub fn aggregate_by_revenue<'a, I>(
    rows: I,
    mapping: &ColumnMapping,
    field: CanonicalField,
) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    aggregate_by(rows, mapping, field, |current, row| current + revenue(row, mapping))
}

pub fn top(mut buckets: Vec<Bucket>, n: usize) -> Vec<Bucket> {
    buckets.truncate(n);
    buckets
}

/// Cancellation reasons counted over cancelled rows only.
pub fn cancellation_reasons(rows: &[&RawRecord], mapping: &ColumnMapping) -> Vec<Bucket> {
    if !mapping.is_mapped(CanonicalField::CancelledDate)
        || !mapping.is_mapped(CanonicalField::CancellationReason)
    {
        return Vec::new();
    }
    let cancelled = rows
        .iter()
        .copied()
        .filter(|row| is_present(row, mapping, CanonicalField::CancelledDate));
    aggregate_by_count(cancelled, mapping, CanonicalField::CancellationReason)
}

/// Orders per calendar day (UTC), oldest first; undated rows are skipped.
pub fn daily_counts(rows: &[&RawRecord], mapping: &ColumnMapping) -> Vec<DailyCount> {
    if !mapping.is_mapped(CanonicalField::Date) {
        return Vec::new();
    }
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for row in rows {
        let Some(instant) = mapping
            .value(row, CanonicalField::Date)
            .and_then(dates::parse_date)
        else {
            continue;
        };
        *days.entry(instant.date_naive()).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(day, count)| DailyCount {
            date: day.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// Revenue and revenue-weighted discount percentage per article type.
///
/// The discount column holds a percentage; each row contributes
/// `discount / 100 × revenue` to its group's discount amount.
pub fn discount_vs_revenue(rows: &[&RawRecord], mapping: &ColumnMapping) -> Vec<DiscountBucket> {
    if !mapping.is_mapped(CanonicalField::ArticleType)
        || !mapping.is_mapped(CanonicalField::Discount)
    {
        return Vec::new();
    }
    let mut groups: HashMap<String, (f64, f64)> = HashMap::new();
    for row in rows {
        let Some(key) = group_key(row, mapping, CanonicalField::ArticleType) else {
            continue;
        };
        let row_revenue = revenue(row, mapping);
        let discount = mapping
            .value(row, CanonicalField::Discount)
            .map(|value| value.as_number())
            .unwrap_or(0.0);
        let (total_revenue, total_discount) = groups.entry(key).or_insert((0.0, 0.0));
        *total_revenue += row_revenue;
        *total_discount += discount / 100.0 * row_revenue;
    }
    groups
        .into_iter()
        .map(|(name, (total_revenue, total_discount))| DiscountBucket {
            name,
            revenue: total_revenue,
            avg_discount: if total_revenue > 0.0 {
                total_discount / total_revenue * 100.0
            } else {
                0.0
            },
        })
        .sorted_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)))
        .take(DISCOUNT_TOP_N)
        .collect()
}

/// Distinct brands across the whole, unfiltered dataset, sorted.
pub fn available_brands(dataset: &Dataset) -> Vec<String> {
    if !dataset.mapping.is_mapped(CanonicalField::Brand) {
        return Vec::new();
    }
    dataset
        .rows
        .iter()
        .filter_map(|row| dataset.mapping.value(row, CanonicalField::Brand))
        .filter(|value| !value.is_null())
        .map(|value| value.key_string())
        .filter(|brand| !brand.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Years that have at least one parseable order date, newest first.
pub fn available_years(dataset: &Dataset) -> Vec<i32> {
    dataset
        .rows
        .iter()
        .filter_map(|row| dataset.mapping.value(row, CanonicalField::Date))
        .filter_map(dates::parse_date)
        .map(|instant| instant.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

/// Presence predicate: mapped, not null and not blank.
pub fn is_present(row: &RawRecord, mapping: &ColumnMapping, field: CanonicalField) -> bool {
    mapping
        .value(row, field)
        .is_some_and(|value| value.is_present())
}
