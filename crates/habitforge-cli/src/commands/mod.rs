pub mod boss;
pub mod energy;
pub mod rewards;
pub mod streak;

use chrono::{Local, NaiveDate};

/// Parse `--date YYYY-MM-DD`, defaulting to the local calendar day.
pub fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date: '{s}'. Use YYYY-MM-DD").into()),
        None => Ok(Local::now().date_naive()),
    }
}
