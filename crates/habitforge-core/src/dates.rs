//! Text formats for timestamps and calendar dates in storage.
//!
//! Timestamps are RFC3339, calendar dates are `YYYY-MM-DD`; both sort
//! lexically in date order so plain range scans stay correct.

use chrono::{DateTime, NaiveDate, Utc};

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

/// Parse a stored date with fallback to the epoch on corrupt data.
pub(crate) fn parse_date_fallback(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, DATE_FMT)
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

/// Parse a stored RFC3339 timestamp with fallback to the current time.
pub(crate) fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(parse_date_fallback(&format_date(date)), date);
    }

    #[test]
    fn corrupt_date_falls_back_to_epoch() {
        assert_eq!(
            parse_date_fallback("not-a-date"),
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        );
    }
}
