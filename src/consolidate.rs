//! Cross-marketplace view: every domain's rows in canonical shape.

use log::debug;

use crate::{
    data::Value,
    dataset::{AccountDatasets, Dataset},
    mapping::{CanonicalField, ColumnMapping},
};

/// Merges every non-empty dataset into one identity-mapped dataset.
///
/// Each row is read through its own dataset's mapping. When revenue comes out
/// null but price and quantity are both numeric, revenue is set to their
/// product. Returns `None` when no dataset has rows, so callers can tell
/// "nothing uploaded" apart from "everything filtered out".
pub fn consolidate(datasets: &AccountDatasets) -> Option<Dataset> {
    let sources = datasets
        .iter()
        .filter(|(_, dataset)| !dataset.is_empty())
        .collect::<Vec<_>>();
    if sources.is_empty() {
        return None;
    }

    let capacity = sources.iter().map(|(_, dataset)| dataset.len()).sum();
    let mut rows = Vec::with_capacity(capacity);
    for (domain, dataset) in sources {
        debug!("Consolidating {} row(s) from '{domain}'", dataset.len());
        for row in &dataset.rows {
            let mut canonical = dataset.mapping.canonicalize(row);
            if canonical.get(CanonicalField::Revenue).is_null() {
                let price = canonical.get(CanonicalField::Price).try_number();
                let quantity = canonical.get(CanonicalField::Quantity).try_number();
                if let (Some(price), Some(quantity)) = (price, quantity) {
                    canonical.set(CanonicalField::Revenue, Value::Number(price * quantity));
                }
            }
            rows.push(canonical.into_record());
        }
    }
    Some(Dataset::new(rows, ColumnMapping::identity()))
}
