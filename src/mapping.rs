//! Canonical fields, per-dataset column mappings and canonical rows.
//!
//! A [`ColumnMapping`] is the only thing that ties an export's headers to the
//! twenty business roles every aggregate is written against. It is built once
//! per upload (by a suggester, a mapping file or a source adapter) and is not
//! mutated afterwards; the builder methods consume and return the mapping.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::data::{RawRecord, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Date,
    Customer,
    Item,
    Quantity,
    Price,
    Revenue,
    City,
    State,
    Zipcode,
    Brand,
    OrderStatus,
    CancellationReason,
    Courier,
    Sku,
    ArticleType,
    Discount,
    DeliveredDate,
    CancelledDate,
    ReturnDate,
    OrderId,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 20] = [
        CanonicalField::Date,
        CanonicalField::Customer,
        CanonicalField::Item,
        CanonicalField::Quantity,
        CanonicalField::Price,
        CanonicalField::Revenue,
        CanonicalField::City,
        CanonicalField::State,
        CanonicalField::Zipcode,
        CanonicalField::Brand,
        CanonicalField::OrderStatus,
        CanonicalField::CancellationReason,
        CanonicalField::Courier,
        CanonicalField::Sku,
        CanonicalField::ArticleType,
        CanonicalField::Discount,
        CanonicalField::DeliveredDate,
        CanonicalField::CancelledDate,
        CanonicalField::ReturnDate,
        CanonicalField::OrderId,
    ];

    /// Roles whose cells are coerced to numbers at ingestion.
    pub const NUMERIC: [CanonicalField; 4] = [
        CanonicalField::Quantity,
        CanonicalField::Price,
        CanonicalField::Revenue,
        CanonicalField::Discount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Customer => "customer",
            CanonicalField::Item => "item",
            CanonicalField::Quantity => "quantity",
            CanonicalField::Price => "price",
            CanonicalField::Revenue => "revenue",
            CanonicalField::City => "city",
            CanonicalField::State => "state",
            CanonicalField::Zipcode => "zipcode",
            CanonicalField::Brand => "brand",
            CanonicalField::OrderStatus => "orderStatus",
            CanonicalField::CancellationReason => "cancellationReason",
            CanonicalField::Courier => "courier",
            CanonicalField::Sku => "sku",
            CanonicalField::ArticleType => "articleType",
            CanonicalField::Discount => "discount",
            CanonicalField::DeliveredDate => "deliveredDate",
            CanonicalField::CancelledDate => "cancelledDate",
            CanonicalField::ReturnDate => "returnDate",
            CanonicalField::OrderId => "orderId",
        }
    }

    pub fn is_numeric(self) -> bool {
        Self::NUMERIC.contains(&self)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown canonical field '{trimmed}'"))
    }
}

/// Role → raw column name for one dataset.
///
/// Serialized as an object carrying all twenty roles, unmapped ones as `null`,
/// which is also the shape accepted from mapping files and model replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: BTreeMap<CanonicalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every role to the column of the same name, as used by consolidated views.
    pub fn identity() -> Self {
        CanonicalField::ALL
            .into_iter()
            .fold(Self::new(), |mapping, field| {
                mapping.with(field, field.as_str())
            })
    }

    /// Returns the mapping with `field` bound to `column`; blank names unmap the role.
    pub fn with(mut self, field: CanonicalField, column: impl Into<String>) -> Self {
        let column = column.into();
        if column.trim().is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, column);
        }
        self
    }

    pub fn without(mut self, field: CanonicalField) -> Self {
        self.columns.remove(&field);
        self
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn mapped(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.columns.iter().map(|(field, column)| (*field, column.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when revenue is mapped, or both price and quantity are.
    pub fn has_revenue_signal(&self) -> bool {
        self.is_mapped(CanonicalField::Revenue)
            || (self.is_mapped(CanonicalField::Price) && self.is_mapped(CanonicalField::Quantity))
    }

    /// Cell of `row` behind `field`, `None` when the role is unmapped.
    ///
    /// A mapped role whose column is missing from the row reads as
    /// [`Value::Null`].
    pub fn value<'a>(&self, row: &'a RawRecord, field: CanonicalField) -> Option<&'a Value> {
        const NULL: &Value = &Value::Null;
        self.get(field).map(|column| row.get(column).unwrap_or(NULL))
    }

    /// Converts a raw row into role-keyed form through this mapping.
    pub fn canonicalize(&self, row: &RawRecord) -> CanonicalRow {
        let mut canonical = CanonicalRow::default();
        for field in CanonicalField::ALL {
            let value = self
                .value(row, field)
                .cloned()
                .unwrap_or(Value::Null);
            canonical.set(field, value);
        }
        canonical
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(CanonicalField::ALL.len()))?;
        for field in CanonicalField::ALL {
            map.serialize_entry(field.as_str(), &self.get(field))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnMapping {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
        Ok(ColumnMapping::from_loose_pairs(raw))
    }
}

impl ColumnMapping {
    /// Builds a mapping from loosely keyed pairs, ignoring unknown role names.
    pub fn from_loose_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: AsRef<str>,
    {
        pairs
            .into_iter()
            .filter_map(|(key, column)| {
                let field = key.as_ref().parse::<CanonicalField>().ok()?;
                Some((field, column?))
            })
            .fold(ColumnMapping::new(), |mapping, (field, column)| {
                mapping.with(field, column)
            })
    }
}

/// A row expressed in canonical roles; unmapped roles hold [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    values: BTreeMap<CanonicalField, Value>,
}

impl CanonicalRow {
    pub fn get(&self, field: CanonicalField) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(&field).unwrap_or(NULL)
    }

    pub fn set(&mut self, field: CanonicalField, value: Value) {
        self.values.insert(field, value);
    }

    /// Raw record keyed by canonical role names, readable through [`ColumnMapping::identity`].
    pub fn into_record(self) -> RawRecord {
        CanonicalField::ALL
            .into_iter()
            .map(|field| (field.as_str().to_string(), self.get(field).clone()))
            .collect()
    }
}
