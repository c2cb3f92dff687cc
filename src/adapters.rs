//! Per-marketplace knowledge: default column names and the natural key that
//! identifies one order line across repeated uploads.

use std::{fmt::Write as _, sync::Arc};

use log::debug;
use sha2::{Digest, Sha256};

use crate::{
    data::{RawRecord, Value},
    mapping::{CanonicalField, CanonicalRow, ColumnMapping},
};

pub trait SourceAdapter: Send + Sync {
    /// Display name of the marketplace, e.g. `Myntra`.
    fn domain(&self) -> &str;

    /// Column mapping used when an export of this marketplace arrives without one.
    fn default_mapping(&self) -> ColumnMapping;

    fn normalize(&self, row: &RawRecord) -> CanonicalRow {
        self.default_mapping().canonicalize(row)
    }

    /// Identity of the order line behind `row`; equal keys mean duplicates.
    /// `None` when the row carries no order id, so it is never merged away.
    fn natural_key(&self, row: &RawRecord, mapping: &ColumnMapping) -> Option<String>;
}

/// The named column when present, else the first present mapped role.
fn key_part(
    row: &RawRecord,
    column: &str,
    mapping: &ColumnMapping,
    roles: &[CanonicalField],
) -> Option<String> {
    row.get(column)
        .filter(|value| value.is_present())
        .or_else(|| {
            roles
                .iter()
                .filter_map(|field| mapping.value(row, *field))
                .find(|value| value.is_present())
        })
        .map(Value::key_string)
}

/// `order|line` where the order part is required and the line part may be empty.
fn order_line_key(
    row: &RawRecord,
    mapping: &ColumnMapping,
    order_column: &str,
    line_column: &str,
) -> Option<String> {
    let order = key_part(row, order_column, mapping, &[CanonicalField::OrderId])?;
    let line = key_part(
        row,
        line_column,
        mapping,
        &[CanonicalField::Sku, CanonicalField::Item],
    )
    .unwrap_or_default();
    Some(format!("{order}|{line}"))
}

fn base_mapping(order_id: &str, regional: bool) -> ColumnMapping {
    let (city, state, zipcode) = if regional {
        (
            "Shipping Address City",
            "Shipping Address State",
            "Shipping Address Pincode",
        )
    } else {
        ("city", "state", "zipcode")
    };
    ColumnMapping::new()
        .with(CanonicalField::Date, "Order Date as dd/mm/yyyy hh:MM:ss")
        .with(CanonicalField::Customer, "customer_name")
        .with(CanonicalField::Item, "SKU Name")
        .with(CanonicalField::Quantity, "quantity")
        .with(CanonicalField::Price, "Selling Price")
        .with(CanonicalField::Revenue, "Total Price")
        .with(CanonicalField::City, city)
        .with(CanonicalField::State, state)
        .with(CanonicalField::Zipcode, zipcode)
        .with(CanonicalField::Brand, "Item Type Brand")
        .with(CanonicalField::OrderStatus, "Sale Order Status")
        .with(CanonicalField::CancellationReason, "Cancellation Reason")
        .with(CanonicalField::Discount, "Discount")
        .with(CanonicalField::Courier, "Shipping Courier")
        .with(CanonicalField::Sku, "SKU Name")
        .with(CanonicalField::ArticleType, "article type")
        .with(CanonicalField::DeliveredDate, "delivered on")
        .with(CanonicalField::CancelledDate, "cancelled on")
        .with(CanonicalField::ReturnDate, "return creation date")
        .with(CanonicalField::OrderId, order_id)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MyntraAdapter;

impl SourceAdapter for MyntraAdapter {
    fn domain(&self) -> &str {
        "Myntra"
    }

    fn default_mapping(&self) -> ColumnMapping {
        base_mapping("seller order id", false)
    }

    fn natural_key(&self, row: &RawRecord, mapping: &ColumnMapping) -> Option<String> {
        let size = key_part(row, "size", mapping, &[]).unwrap_or_else(|| "one-size".to_string());
        order_line_key(row, mapping, "seller order id", "seller sku code")
            .map(|key| format!("{key}|{size}"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AjioAdapter;

impl SourceAdapter for AjioAdapter {
    fn domain(&self) -> &str {
        "AJIO"
    }

    fn default_mapping(&self) -> ColumnMapping {
        base_mapping("Sale Order Code", false)
    }

    fn natural_key(&self, row: &RawRecord, mapping: &ColumnMapping) -> Option<String> {
        order_line_key(row, mapping, "Sale Order Code", "Item Code")
    }
}

/// Sale-order exports keyed by `Sale Order Code | Item SKU Code`: Flipkart,
/// Amazon, Nykaa and any marketplace without a dedicated adapter.
#[derive(Debug, Clone)]
pub struct SaleOrderAdapter {
    domain: String,
    regional_address: bool,
}

impl SaleOrderAdapter {
    pub fn new(domain: impl Into<String>, regional_address: bool) -> Self {
        Self {
            domain: domain.into(),
            regional_address,
        }
    }
}

impl SourceAdapter for SaleOrderAdapter {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn default_mapping(&self) -> ColumnMapping {
        base_mapping("Sale Order Code", self.regional_address)
    }

    fn natural_key(&self, row: &RawRecord, mapping: &ColumnMapping) -> Option<String> {
        order_line_key(row, mapping, "Sale Order Code", "Item SKU Code")
    }
}

/// Adapters by domain, looked up case-insensitively.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            adapters: vec![
                Arc::new(MyntraAdapter),
                Arc::new(AjioAdapter),
                Arc::new(SaleOrderAdapter::new("Flipkart", true)),
                Arc::new(SaleOrderAdapter::new("Amazon", true)),
                Arc::new(SaleOrderAdapter::new("Nykaa", false)),
            ],
        }
    }
}

impl AdapterRegistry {
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters
            .retain(|existing| !existing.domain().eq_ignore_ascii_case(adapter.domain()));
        self.adapters.push(adapter);
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|adapter| adapter.domain())
    }

    /// Adapter for `domain`, or a generic sale-order adapter when none is registered.
    pub fn adapter_for(&self, domain: &str) -> Arc<dyn SourceAdapter> {
        let domain = domain.trim();
        match self
            .adapters
            .iter()
            .find(|adapter| adapter.domain().eq_ignore_ascii_case(domain))
        {
            Some(adapter) => Arc::clone(adapter),
            None => {
                debug!("No adapter registered for '{domain}', using the generic one");
                Arc::new(SaleOrderAdapter::new(domain, false))
            }
        }
    }
}

/// Hex SHA-256 of a natural key, used as the dedupe set entry.
pub fn fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}
