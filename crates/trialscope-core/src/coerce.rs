//! Lenient scalar coercions used during table assembly.
//!
//! Both parsers return `None` for anything they cannot interpret; callers
//! store that as a missing value rather than failing the row.

use chrono::{Datelike, NaiveDate};

/// Days from 0001-01-01 (CE) to 1970-01-01, the Arrow `Date32` epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Full-date formats tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Parse a numeric value, accepting integers and decimals. Non-finite → `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date from the mixed formats seen in registry data.
///
/// Month-precision dates ("2020-01", "January 2020") resolve to the first of
/// the month, year-only dates to 1 January.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // ISO date-time: keep the date part.
    if s.len() > 10
        && s.is_char_boundary(10)
        && matches!(s.as_bytes()[10], b'T' | b' ')
        && let Some(date) = parse_date(&s[..10])
    {
        return Some(date);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    // Month precision.
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {s}"), "%d %B %Y") {
        return Some(date);
    }

    // Year precision.
    if s.len() == 4
        && s.bytes().all(|b| b.is_ascii_digit())
        && let Ok(year) = s.parse::<i32>()
    {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    None
}

/// Convert a date to Arrow `Date32` (days since 1970-01-01).
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Convert Arrow `Date32` days back to a date.
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}
