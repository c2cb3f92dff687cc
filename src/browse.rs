//! Paged row browsing with per-column substring filters.

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::data::RawRecord;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// `column` must contain `needle`, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    needle: String,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, needle: &str) -> Self {
        Self {
            column: column.into(),
            needle: needle.to_lowercase(),
        }
    }

    /// Parses `column=text`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (column, needle) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("Column filter '{raw}' must use the form column=text"))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(anyhow!("Column filter '{raw}' names no column"));
        }
        Ok(Self::new(column, needle.trim()))
    }

    /// Blank needles match everything; null or missing cells match nothing else.
    pub fn matches(&self, row: &RawRecord) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        row.get(&self.column)
            .filter(|value| !value.is_null())
            .is_some_and(|value| value.key_string().to_lowercase().contains(&self.needle))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a> {
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    /// 1-based position of the first row shown, 0 when the page is empty.
    pub first_row: usize,
    pub headers: Vec<String>,
    pub rows: Vec<&'a RawRecord>,
}

/// Applies `filters` and returns page `page` (1-based, clamped to the last page).
pub fn paginate<'a>(
    rows: &[&'a RawRecord],
    filters: &[ColumnFilter],
    page: usize,
    page_size: usize,
) -> Page<'a> {
    let page_size = page_size.max(1);
    let matching = rows
        .iter()
        .copied()
        .filter(|row| filters.iter().all(|filter| filter.matches(row)))
        .collect::<Vec<_>>();
    let total_rows = matching.len();
    let total_pages = total_rows.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;
    let shown = matching
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect::<Vec<_>>();
    let headers = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    Page {
        page,
        total_pages,
        total_rows,
        first_row: if shown.is_empty() { 0 } else { start + 1 },
        headers,
        rows: shown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Value, record};

    #[test]
    fn filter_is_case_insensitive_and_skips_nulls() {
        let filter = ColumnFilter::parse("city=pun").unwrap();
        assert!(filter.matches(&record([("city", "Pune")])));
        assert!(!filter.matches(&record([("city", Value::Null)])));
        assert!(!filter.matches(&record([("state", "Pune")])));
        assert!(ColumnFilter::parse("city").is_err());
    }

    #[test]
    fn pages_are_clamped_to_the_last_one() {
        let rows = (0..25).map(|n| record([("n", n)])).collect::<Vec<_>>();
        let refs = rows.iter().collect::<Vec<_>>();
        let page = paginate(&refs, &[], 9, 10);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.first_row, 21);
        assert_eq!(page.rows.len(), 5);
    }
}
