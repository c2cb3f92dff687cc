//! Headline KPIs and their display formatting.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    aggregate::is_present,
    data::RawRecord,
    mapping::{CanonicalField, ColumnMapping},
    revenue::revenue,
};

pub const CURRENCY_SYMBOL: &str = "₹";

/// A display-ready KPI tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    pub title: String,
    pub value: String,
}

impl Kpi {
    fn new(title: &str, value: String) -> Self {
        Self {
            title: title.to_string(),
            value,
        }
    }
}

/// Raw KPI figures before formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub delivered_orders: usize,
    pub cancelled_orders: usize,
    pub total_orders: usize,
    /// Rows carrying a customer value; not a count of distinct customers.
    pub total_customers: usize,
    pub avg_order_value: f64,
    pub returns_created: usize,
    pub return_value: f64,
}

impl KpiSummary {
    pub fn compute(rows: &[&RawRecord], mapping: &ColumnMapping) -> Self {
        let total_revenue = rows.iter().map(|row| revenue(row, mapping)).sum();
        let total_orders = total_orders(rows, mapping);
        let returned = rows
            .iter()
            .filter(|row| is_present(row, mapping, CanonicalField::ReturnDate))
            .collect::<Vec<_>>();
        Self {
            total_revenue,
            delivered_orders: count_present(rows, mapping, CanonicalField::DeliveredDate),
            cancelled_orders: count_present(rows, mapping, CanonicalField::CancelledDate),
            total_orders,
            total_customers: count_present(rows, mapping, CanonicalField::Customer),
            avg_order_value: if total_orders > 0 {
                total_revenue / total_orders as f64
            } else {
                0.0
            },
            returns_created: returned.len(),
            return_value: returned.iter().map(|row| revenue(row, mapping)).sum(),
        }
    }

    pub fn to_kpis(&self) -> Vec<Kpi> {
        vec![
            Kpi::new("Total Revenue", format_currency(self.total_revenue)),
            Kpi::new("Total Delivered Orders", format_count(self.delivered_orders)),
            Kpi::new("Total Cancelled Orders", format_count(self.cancelled_orders)),
            Kpi::new("Total Orders", format_count(self.total_orders)),
            Kpi::new("Total Customers", format_count(self.total_customers)),
            Kpi::new("Avg Order", format_currency(self.avg_order_value)),
            Kpi::new("Total Returns Created", format_count(self.returns_created)),
            Kpi::new("Total Return Value", format_currency(self.return_value)),
        ]
    }
}

/// KPI tiles for `rows`; an empty row set yields no tiles at all.
pub fn kpis(rows: &[&RawRecord], mapping: &ColumnMapping) -> Vec<Kpi> {
    if rows.is_empty() {
        return Vec::new();
    }
    KpiSummary::compute(rows, mapping).to_kpis()
}

fn count_present(rows: &[&RawRecord], mapping: &ColumnMapping, field: CanonicalField) -> usize {
    if !mapping.is_mapped(field) {
        return 0;
    }
    rows.iter()
        .filter(|row| is_present(row, mapping, field))
        .count()
}

/// Distinct order ids when an id column is mapped and populated, else the row count.
pub fn total_orders(rows: &[&RawRecord], mapping: &ColumnMapping) -> usize {
    if !mapping.is_mapped(CanonicalField::OrderId) {
        return rows.len();
    }
    let ids = rows
        .iter()
        .filter_map(|row| mapping.value(row, CanonicalField::OrderId))
        .filter(|value| value.is_present())
        .map(|value| value.key_string())
        .collect::<HashSet<_>>();
    if ids.is_empty() { rows.len() } else { ids.len() }
}

/// `₹` followed by the amount rounded to whole units with Indian digit grouping.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!(
        "{CURRENCY_SYMBOL}{sign}{}",
        group_indian(&format!("{:.0}", rounded.abs()))
    )
}

pub fn format_count(value: usize) -> String {
    group_indian(&value.to_string())
}

/// Groups a digit string as `12,34,56,789`: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}
