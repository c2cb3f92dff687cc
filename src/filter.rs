//! Date-range and brand filtering over a dataset.

use serde::{Deserialize, Serialize};

use crate::{
    data::RawRecord,
    dataset::Dataset,
    dates::{self, DateRange},
    mapping::CanonicalField,
};

/// Per-query filter; `brand: None` means every brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub range: DateRange,
    pub brand: Option<String>,
}

impl FilterCriteria {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// Rows of `dataset` that pass `criteria`, in their original order.
///
/// The brand check applies only when the dataset maps a brand column. The
/// date check applies only when it maps a date column and both bounds are
/// set; a half-open range filters nothing. Under a closed range, rows whose
/// date cannot be parsed are dropped.
pub fn filter_rows<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> Vec<&'a RawRecord> {
    let mapping = &dataset.mapping;
    let brand = criteria
        .brand
        .as_deref()
        .filter(|_| mapping.is_mapped(CanonicalField::Brand));
    let range = Some(criteria.range)
        .filter(|range| range.is_closed() && mapping.is_mapped(CanonicalField::Date));

    dataset
        .rows
        .iter()
        .filter(|row| {
            brand.is_none_or(|wanted| {
                mapping
                    .value(row, CanonicalField::Brand)
                    .is_some_and(|value| value.key_string() == wanted)
            })
        })
        .filter(|row| {
            range.is_none_or(|range| {
                mapping
                    .value(row, CanonicalField::Date)
                    .and_then(dates::parse_date)
                    .is_some_and(|instant| range.contains(&instant))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::record, mapping::ColumnMapping};
    use chrono::{TimeZone, Utc};

    fn dataset() -> Dataset {
        let rows = vec![
            record([("d", "2024-01-01"), ("b", "Nike")]),
            record([("d", "2024-01-15"), ("b", "Puma")]),
            record([("d", "garbage"), ("b", "Nike")]),
        ];
        Dataset::new(
            rows,
            ColumnMapping::new()
                .with(CanonicalField::Date, "d")
                .with(CanonicalField::Brand, "b"),
        )
    }

    #[test]
    fn brand_only_keeps_unparseable_dates() {
        let data = dataset();
        let rows = filter_rows(&data, &FilterCriteria::all().with_brand("Nike"));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn inverted_range_is_empty() {
        let data = dataset();
        let range = DateRange::between(
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(filter_rows(&data, &FilterCriteria::all().with_range(range)).is_empty());
    }

    #[test]
    fn half_open_range_filters_nothing() {
        let data = dataset();
        let from = DateRange {
            start: Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
            end: None,
        };
        let until = DateRange {
            start: None,
            end: Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
        };
        assert_eq!(filter_rows(&data, &FilterCriteria::all().with_range(from)).len(), 3);
        assert_eq!(filter_rows(&data, &FilterCriteria::all().with_range(until)).len(), 3);
    }

    #[test]
    fn closed_range_drops_unparseable_dates() {
        let data = dataset();
        let range = DateRange::between(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
        );
        assert_eq!(filter_rows(&data, &FilterCriteria::all().with_range(range)).len(), 2);
    }

    #[test]
    fn brand_filter_is_ignored_without_brand_column() {
        let mut data = dataset();
        data.mapping = data.mapping.clone().without(CanonicalField::Brand);
        let rows = filter_rows(&data, &FilterCriteria::all().with_brand("Nike"));
        assert_eq!(rows.len(), 3);
    }
}
