//! Best-effort date parsing for order exports.
//!
//! Exports mix machine timestamps (`2024-03-01T10:22:05Z`), plain ISO dates
//! and hand-typed day-first dates (`5/1/23`, `05-01-2023 14:30:00`). The
//! parser tries each shape in turn and answers `None` instead of failing, so
//! a bad cell only removes its own row from date-based views.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::Value;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

fn day_first_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4}|\d{2})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$",
        )
        .expect("day-first date pattern is valid")
    })
}

/// Parses any cell into a UTC instant, `None` when no reading applies.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Null => None,
        Value::Number(millis) => from_epoch_millis(*millis),
        Value::Text(text) => parse_date_str(text),
    }
}

pub fn parse_date_str(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_general(trimmed).or_else(|| parse_day_first(trimmed))
}

/// Numbers are epoch milliseconds; zero is treated as "no date".
fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis == 0.0 || millis.fract() != 0.0 {
        return None;
    }
    if millis.abs() > 8.64e15 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
}

fn parse_general(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    // chrono's %Y takes any digit count, which would read `5/1/23` as year 5.
    if !leads_with_year(text) {
        return None;
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&parsed.and_time(NaiveTime::MIN)));
        }
    }
    None
}

fn leads_with_year(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && matches!(bytes[4], b'-' | b'/')
}

fn parse_day_first(text: &str) -> Option<DateTime<Utc>> {
    let captures = day_first_pattern().captures(text)?;
    let number = |idx: usize| -> Option<u32> { captures.get(idx)?.as_str().parse().ok() };
    let day = number(1)?;
    let month = number(2)?;
    let mut year = i32::try_from(number(3)?).ok()?;
    if year < 100 {
        year += 2000;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = match number(4) {
        Some(hour) => NaiveTime::from_hms_opt(hour, number(5)?, number(6).unwrap_or(0))?,
        None => NaiveTime::MIN,
    };
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Inclusive date interval. Filtering needs both bounds; a lone bound is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Expands calendar days to `00:00:00.000` on `start` through `23:59:59.999` on `end`.
    pub fn for_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let start = start.map(|day| Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)));
        let end = end.map(|day| {
            Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)) + Duration::days(1)
                - Duration::milliseconds(1)
        });
        Self { start, end }
    }

    /// Both bounds set; only a closed range filters rows.
    pub fn is_closed(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| *instant >= start)
            && self.end.is_none_or(|end| *instant <= end)
    }
}

/// Year and month (1-12) of a parsed cell, used for deletion criteria.
pub fn year_month(value: &Value) -> Option<(i32, u32)> {
    parse_date(value).map(|instant| (instant.year(), instant.month()))
}
