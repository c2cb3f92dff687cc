//! Datasets, account collections and the identifiers that scope them.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    data::RawRecord,
    dates,
    mapping::{CanonicalField, ColumnMapping},
};

/// One marketplace's accumulated rows plus the mapping that reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<RawRecord>,
    pub mapping: ColumnMapping,
}

impl Dataset {
    pub fn new(rows: Vec<RawRecord>, mapping: ColumnMapping) -> Self {
        Self { rows, mapping }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of this dataset without the rows selected by `criteria`.
    ///
    /// Rows whose date cannot be parsed are kept, and a dataset without a
    /// date role is returned unchanged unless the whole dataset is targeted.
    pub fn without(&self, criteria: &DeleteCriteria) -> Dataset {
        let Some(year) = criteria.year else {
            return Dataset::new(Vec::new(), self.mapping.clone());
        };
        if !self.mapping.is_mapped(CanonicalField::Date) {
            return self.clone();
        }
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                let parsed = self
                    .mapping
                    .value(row, CanonicalField::Date)
                    .and_then(dates::year_month);
                match parsed {
                    Some((row_year, row_month)) => {
                        !(row_year == year && criteria.month.is_none_or(|m| m == row_month))
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();
        Dataset::new(rows, self.mapping.clone())
    }
}

/// Every dataset owned by one account, keyed by marketplace name.
pub type AccountDatasets = BTreeMap<String, Dataset>;

/// Opaque account identifier issued by whoever authenticated the caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which rows a deletion removes.
///
/// No year removes the whole dataset. A year alone removes every month of it;
/// a year with a month (1-12) removes only that month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCriteria {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl DeleteCriteria {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
        }
    }
}
