//! Column mapping proposals for freshly uploaded exports.
//!
//! Proposals come from a [`MappingSuggester`]; whatever it returns is passed
//! through [`validate_proposal`] before use, so a mapping never names a
//! column the export does not have.

use heck::ToSnakeCase;
use log::{debug, warn};

use crate::{
    data::RawRecord,
    error::{IngestError, SuggestError},
    ingest::require_revenue_signal,
    mapping::{CanonicalField, ColumnMapping},
};

/// Rows handed to a suggester as samples.
pub const SAMPLE_ROWS: usize = 5;

pub trait MappingSuggester {
    fn propose(
        &self,
        headers: &[String],
        samples: &[RawRecord],
    ) -> Result<ColumnMapping, SuggestError>;
}

/// Keyword matcher over snake-cased headers.
///
/// Roles are resolved in a fixed priority order and each header is claimed by
/// at most one role, so `Total Price` goes to revenue before price gets a look.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicSuggester;

const PRIORITY: [(CanonicalField, &[&str]); 20] = [
    (
        CanonicalField::OrderId,
        &["order id", "transaction id", "order number", "sale order code", "seller order id", "order code"],
    ),
    (
        CanonicalField::Revenue,
        &["final amount", "total price", "revenue", "sale amount", "total amount", "gmv"],
    ),
    (CanonicalField::DeliveredDate, &["delivered on", "delivery date", "delivered at"]),
    (CanonicalField::CancelledDate, &["cancelled on", "cancellation date", "cancelled at"]),
    (CanonicalField::ReturnDate, &["return creation date", "return date", "returned on"]),
    (
        CanonicalField::Date,
        &["order date", "created on", "order created", "purchase date", "date"],
    ),
    (CanonicalField::CancellationReason, &["cancellation reason", "cancel reason", "reason"]),
    (CanonicalField::Discount, &["discount", "discount percent", "discount percentage"]),
    (CanonicalField::Price, &["selling price", "unit price", "item price", "price", "mrp"]),
    (CanonicalField::Quantity, &["quantity", "qty", "units"]),
    (
        CanonicalField::Sku,
        &["sku", "seller sku code", "item sku code", "sku code", "sku id", "item code"],
    ),
    (CanonicalField::ArticleType, &["article type", "category", "product type"]),
    (CanonicalField::Brand, &["brand", "item type brand", "brand name"]),
    (
        CanonicalField::Item,
        &["product name", "sku name", "item name", "product title", "style name", "item", "product"],
    ),
    (CanonicalField::Customer, &["customer name", "customer", "customer id", "buyer name", "buyer"]),
    (
        CanonicalField::Courier,
        &["courier", "shipping courier", "courier name", "shipping provider", "logistics partner"],
    ),
    (CanonicalField::OrderStatus, &["order status", "sale order status", "status"]),
    (
        CanonicalField::Zipcode,
        &["pincode", "zipcode", "zip code", "pin code", "postal code"],
    ),
    (CanonicalField::City, &["city", "shipping city", "customer city"]),
    (CanonicalField::State, &["state", "shipping state", "customer state"]),
];

fn contains_words(header: &str, keyword: &str) -> bool {
    format!("_{header}_").contains(&format!("_{keyword}_"))
}

impl MappingSuggester for HeuristicSuggester {
    fn propose(
        &self,
        headers: &[String],
        _samples: &[RawRecord],
    ) -> Result<ColumnMapping, SuggestError> {
        let normalized = headers
            .iter()
            .map(|header| header.to_snake_case())
            .collect::<Vec<_>>();
        let mut claimed = vec![false; headers.len()];
        let mut mapping = ColumnMapping::new();

        for (field, keywords) in PRIORITY {
            let keywords = keywords
                .iter()
                .map(|keyword| keyword.to_snake_case())
                .collect::<Vec<_>>();
            let free = |idx: &usize| !claimed[*idx];
            let exact = keywords.iter().find_map(|keyword| {
                (0..headers.len())
                    .filter(free)
                    .find(|idx| normalized[*idx] == *keyword)
            });
            let chosen = exact.or_else(|| {
                keywords.iter().find_map(|keyword| {
                    (0..headers.len())
                        .filter(free)
                        .find(|idx| contains_words(&normalized[*idx], keyword))
                })
            });
            if let Some(idx) = chosen {
                claimed[idx] = true;
                debug!("Matched '{}' to {field}", headers[idx]);
                mapping = mapping.with(field, headers[idx].clone());
            }
        }
        Ok(mapping)
    }
}

/// Replays a stored model reply, e.g. one captured from a language model.
#[derive(Debug, Clone)]
pub struct ReplySuggester {
    reply: String,
}

impl ReplySuggester {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl MappingSuggester for ReplySuggester {
    fn propose(
        &self,
        _headers: &[String],
        _samples: &[RawRecord],
    ) -> Result<ColumnMapping, SuggestError> {
        parse_model_reply(&self.reply)
    }
}

/// A mapping decided up front: read from a mapping file or a marketplace default.
#[derive(Debug, Clone)]
pub struct FixedMapping(pub ColumnMapping);

impl MappingSuggester for FixedMapping {
    fn propose(
        &self,
        _headers: &[String],
        _samples: &[RawRecord],
    ) -> Result<ColumnMapping, SuggestError> {
        Ok(self.0.clone())
    }
}

fn strip_fences(text: &str) -> &str {
    let body = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .map(|rest| rest.strip_prefix('\n').unwrap_or(rest));
    match body {
        Some(rest) => {
            let rest = rest.strip_suffix("```").unwrap_or(rest);
            rest.strip_suffix('\n').unwrap_or(rest)
        }
        None => text,
    }
}

/// Parses a role → column JSON object, optionally wrapped in a code fence.
///
/// Unknown roles and non-string values are ignored.
pub fn parse_model_reply(text: &str) -> Result<ColumnMapping, SuggestError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SuggestError::Unavailable("the reply is empty".to_string()));
    }
    let parsed: serde_json::Value = serde_json::from_str(strip_fences(trimmed))?;
    let object = parsed.as_object().ok_or(SuggestError::NotAnObject)?;
    Ok(ColumnMapping::from_loose_pairs(object.iter().map(
        |(role, column)| (role, column.as_str().map(str::to_string)),
    )))
}

/// Drops every role whose column is not among `headers`.
pub fn validate_proposal(proposed: ColumnMapping, headers: &[String]) -> ColumnMapping {
    let missing = proposed
        .mapped()
        .filter(|(_, column)| !headers.iter().any(|header| header.as_str() == *column))
        .map(|(field, column)| {
            warn!("Dropping {field}: column '{column}' is not in the upload");
            field
        })
        .collect::<Vec<_>>();
    missing.into_iter().fold(proposed, ColumnMapping::without)
}

/// Asks `suggester` for a mapping over the first rows, validates it and
/// checks that it can yield revenue.
pub fn suggest_mapping(
    suggester: &dyn MappingSuggester,
    headers: &[String],
    rows: &[RawRecord],
) -> Result<ColumnMapping, IngestError> {
    let samples = &rows[..rows.len().min(SAMPLE_ROWS)];
    let proposed = suggester.propose(headers, samples)?;
    let mapping = validate_proposal(proposed, headers);
    require_revenue_signal(&mapping)?;
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("{}"), "{}");
    }

    #[test]
    fn total_price_goes_to_revenue_not_price() {
        let headers = headers(&["Selling Price", "Total Price", "Quantity"]);
        let mapping = HeuristicSuggester.propose(&headers, &[]).unwrap();
        assert_eq!(mapping.get(CanonicalField::Revenue), Some("Total Price"));
        assert_eq!(mapping.get(CanonicalField::Price), Some("Selling Price"));
        assert_eq!(mapping.get(CanonicalField::Quantity), Some("Quantity"));
    }

    #[test]
    fn dated_lifecycle_columns_are_not_taken_as_order_date() {
        let headers = headers(&["delivered on", "Order Date as dd/mm/yyyy hh:MM:ss", "cancelled on"]);
        let mapping = HeuristicSuggester.propose(&headers, &[]).unwrap();
        assert_eq!(mapping.get(CanonicalField::DeliveredDate), Some("delivered on"));
        assert_eq!(mapping.get(CanonicalField::CancelledDate), Some("cancelled on"));
        assert_eq!(
            mapping.get(CanonicalField::Date),
            Some("Order Date as dd/mm/yyyy hh:MM:ss")
        );
    }
}
