//! Everything one dashboard view shows, computed in a single pass over the filter.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{
        self, Bucket, DailyCount, DiscountBucket, aggregate_by_count, aggregate_by_revenue, top,
    },
    data::RawRecord,
    dataset::Dataset,
    filter::{FilterCriteria, filter_rows},
    kpi::{Kpi, KpiSummary, kpis},
    mapping::CanonicalField,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub row_count: usize,
    pub filtered_count: usize,
    pub kpis: Vec<Kpi>,
    pub summary: KpiSummary,
    pub available_brands: Vec<String>,
    pub top_brands_by_revenue: Vec<Bucket>,
    pub top_cities_by_revenue: Vec<Bucket>,
    pub top_items_by_revenue: Vec<Bucket>,
    pub top_cancellation_reasons: Vec<Bucket>,
    pub order_status_distribution: Vec<Bucket>,
    pub courier_usage: Vec<Bucket>,
    pub top_cities_by_orders: Vec<Bucket>,
    pub top_skus_by_orders: Vec<Bucket>,
    pub top_article_types_by_orders: Vec<Bucket>,
    pub orders_by_state: Vec<Bucket>,
    pub brand_distribution: Vec<Bucket>,
    pub daily_order_volume: Vec<DailyCount>,
    pub discount_vs_revenue: Vec<DiscountBucket>,
}

impl DashboardReport {
    pub fn build(dataset: &Dataset, criteria: &FilterCriteria, top_n: usize) -> Self {
        let rows = filter_rows(dataset, criteria);
        debug!(
            "Building report over {} of {} row(s)",
            rows.len(),
            dataset.len()
        );
        Self::from_rows(dataset, &rows, top_n)
    }

    fn from_rows(dataset: &Dataset, rows: &[&RawRecord], top_n: usize) -> Self {
        let mapping = &dataset.mapping;
        let by_revenue = |field: CanonicalField| {
            top(aggregate_by_revenue(rows.iter().copied(), mapping, field), top_n)
        };
        let by_count =
            |field: CanonicalField| aggregate_by_count(rows.iter().copied(), mapping, field);
        Self {
            row_count: dataset.len(),
            filtered_count: rows.len(),
            kpis: kpis(rows, mapping),
            summary: KpiSummary::compute(rows, mapping),
            available_brands: aggregate::available_brands(dataset),
            top_brands_by_revenue: by_revenue(CanonicalField::Brand),
            top_cities_by_revenue: by_revenue(CanonicalField::City),
            top_items_by_revenue: by_revenue(CanonicalField::Item),
            top_cancellation_reasons: top(aggregate::cancellation_reasons(rows, mapping), top_n),
            order_status_distribution: by_count(CanonicalField::OrderStatus),
            courier_usage: by_count(CanonicalField::Courier),
            top_cities_by_orders: top(by_count(CanonicalField::City), top_n),
            top_skus_by_orders: top(by_count(CanonicalField::Sku), top_n),
            top_article_types_by_orders: top(by_count(CanonicalField::ArticleType), top_n),
            orders_by_state: by_count(CanonicalField::State),
            brand_distribution: by_count(CanonicalField::Brand),
            daily_order_volume: aggregate::daily_counts(rows, mapping),
            discount_vs_revenue: aggregate::discount_vs_revenue(rows, mapping),
        }
    }

    /// True when the view has rows but none survive the filter.
    pub fn is_filtered_empty(&self) -> bool {
        self.row_count > 0 && self.filtered_count == 0
    }
}
