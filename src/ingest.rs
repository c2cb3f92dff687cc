//! Upload sanitation: the gate every batch passes before it is stored.
//!
//! After [`normalize_batch`] the quantity, price, revenue and discount
//! columns hold only numbers or nulls, so nothing downstream has to cope with
//! `"₹1,299.00"` style strings.

use log::{debug, info};

use crate::{
    data::{RawRecord, Value},
    error::IngestError,
    mapping::{CanonicalField, ColumnMapping},
};

/// Fails unless the mapping can produce revenue for a row.
pub fn require_revenue_signal(mapping: &ColumnMapping) -> Result<(), IngestError> {
    if mapping.has_revenue_signal() {
        Ok(())
    } else {
        Err(IngestError::NoRevenueSignal)
    }
}

/// Longest numeric prefix of `text`: an optional sign, digits and at most one
/// decimal point. `999-` reads as 999 and `1.2.3` as 1.2.
fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let (mut digits, mut seen_dot) = (0usize, false);
    while let Some(&byte) = bytes.get(end) {
        match byte {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if digits == 0 {
        return None;
    }
    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerces one numeric cell: blanks become null, everything else is stripped
/// down to digits, `.` and `-` and its leading number kept, with null when
/// there is none.
pub fn sanitize_numeric(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Number(n) if n.is_finite() => Value::Number(*n),
        Value::Number(_) => Value::Null,
        Value::Text(text) => {
            if text.trim().is_empty() {
                return Value::Null;
            }
            let cleaned = text
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect::<String>();
            leading_number(&cleaned)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
    }
}

/// Validates and sanitizes a freshly parsed batch.
///
/// The whole batch is refused when it is empty or when the mapping carries
/// no revenue signal; nothing is partially accepted.
pub fn normalize_batch(
    mut rows: Vec<RawRecord>,
    mapping: &ColumnMapping,
) -> Result<Vec<RawRecord>, IngestError> {
    if rows.is_empty() {
        return Err(IngestError::EmptyBatch);
    }
    require_revenue_signal(mapping)?;

    let numeric_columns = CanonicalField::NUMERIC
        .into_iter()
        .filter_map(|field| mapping.get(field))
        .collect::<Vec<_>>();
    debug!("Sanitizing numeric column(s): {numeric_columns:?}");

    let mut nulled = 0usize;
    for row in &mut rows {
        for column in &numeric_columns {
            let Some(cell) = row.get_mut(*column) else {
                continue;
            };
            let sanitized = sanitize_numeric(cell);
            if sanitized.is_null() && cell.is_present() {
                nulled += 1;
            }
            *cell = sanitized;
        }
    }
    if nulled > 0 {
        info!("{nulled} numeric cell(s) could not be read and were stored as null");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_currency_symbols_and_grouping() {
        assert_eq!(sanitize_numeric(&Value::text("₹1,299.50")), Value::Number(1299.5));
        assert_eq!(sanitize_numeric(&Value::text("-45")), Value::Number(-45.0));
        assert_eq!(sanitize_numeric(&Value::text("Rs 12")), Value::Number(12.0));
    }

    #[test]
    fn blanks_and_unreadable_cells_become_null() {
        assert_eq!(sanitize_numeric(&Value::text("  ")), Value::Null);
        assert_eq!(sanitize_numeric(&Value::text("n/a")), Value::Null);
        assert_eq!(sanitize_numeric(&Value::text("--5")), Value::Null);
        assert_eq!(sanitize_numeric(&Value::text("-")), Value::Null);
        assert_eq!(sanitize_numeric(&Value::Null), Value::Null);
    }

    #[test]
    fn trailing_junk_after_the_amount_is_ignored() {
        assert_eq!(sanitize_numeric(&Value::text("₹999/-")), Value::Number(999.0));
        assert_eq!(sanitize_numeric(&Value::text("1.2.3")), Value::Number(1.2));
        assert_eq!(sanitize_numeric(&Value::text("12-31")), Value::Number(12.0));
        assert_eq!(sanitize_numeric(&Value::text("Rs .5")), Value::Number(0.5));
    }
}
