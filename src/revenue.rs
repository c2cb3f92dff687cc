//! The one revenue definition shared by every KPI and chart.

use crate::{
    data::RawRecord,
    mapping::{CanonicalField, ColumnMapping},
};

/// Monetary total of one row.
///
/// A mapped revenue column always wins, even when price and quantity are
/// mapped as well. Otherwise price × quantity is used, with any non-numeric
/// factor counting as zero. A mapping with neither signal yields zero.
pub fn revenue(row: &RawRecord, mapping: &ColumnMapping) -> f64 {
    if let Some(value) = mapping.value(row, CanonicalField::Revenue) {
        return value.as_number();
    }
    match (
        mapping.value(row, CanonicalField::Price),
        mapping.value(row, CanonicalField::Quantity),
    ) {
        (Some(price), Some(quantity)) => price.as_number() * quantity.as_number(),
        _ => 0.0,
    }
}

/// Sum of [`revenue`] over `rows`.
pub fn total_revenue<'a, I>(rows: I, mapping: &ColumnMapping) -> f64
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    rows.into_iter().map(|row| revenue(row, mapping)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Value, record};

    #[test]
    fn revenue_column_takes_priority_over_price_and_quantity() {
        let mapping = ColumnMapping::new()
            .with(CanonicalField::Revenue, "rev")
            .with(CanonicalField::Price, "price")
            .with(CanonicalField::Quantity, "qty");
        let row = record([
            ("rev", Value::Number(99.0)),
            ("price", Value::Number(10.0)),
            ("qty", Value::Number(2.0)),
        ]);
        assert_eq!(revenue(&row, &mapping), 99.0);
    }

    #[test]
    fn price_times_quantity_when_revenue_unmapped() {
        let mapping = ColumnMapping::new()
            .with(CanonicalField::Price, "price")
            .with(CanonicalField::Quantity, "qty");
        let rows = vec![
            record([("price", Value::Number(10.0)), ("qty", Value::Number(2.0))]),
            record([("price", Value::Number(5.0)), ("qty", Value::text("x"))]),
        ];
        assert_eq!(revenue(&rows[1], &mapping), 0.0);
        assert_eq!(total_revenue(&rows, &mapping), 20.0);
    }

    #[test]
    fn no_revenue_signal_yields_zero() {
        let mapping = ColumnMapping::new().with(CanonicalField::Price, "price");
        let row = record([("price", Value::Number(10.0))]);
        assert_eq!(revenue(&row, &mapping), 0.0);
    }
}
