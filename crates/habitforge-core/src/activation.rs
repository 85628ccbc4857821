//! Read-only seam to the habit activation history.
//!
//! Activation days are owned by the buff subsystem; the streak engine only
//! needs the distinct calendar dates inside a window, so that is the whole
//! contract.

use chrono::NaiveDate;
use rusqlite::params;

use crate::dates::{format_date, parse_date_fallback};
use crate::error::Result;
use crate::storage::Database;

/// Source of per-day habit activation history.
pub trait ActivationLog {
    /// Distinct dates in `[since, until]` on which the habit was activated,
    /// ascending.
    fn activation_dates(
        &self,
        habit_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;
}

/// Activation history backed by the local `habit_activations` table.
pub struct SqliteActivationLog<'a> {
    db: &'a Database,
}

impl<'a> SqliteActivationLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record an activation for a habit on a date.
    ///
    /// Returns `false` when that day was already recorded (benign no-op).
    pub fn record(&self, habit_id: &str, date: NaiveDate) -> Result<bool> {
        let changed = self.db.conn().execute(
            "INSERT OR IGNORE INTO habit_activations (habit_id, date) VALUES (?1, ?2)",
            params![habit_id, format_date(date)],
        )?;
        Ok(changed > 0)
    }
}

impl ActivationLog for SqliteActivationLog<'_> {
    fn activation_dates(
        &self,
        habit_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT DISTINCT date FROM habit_activations
             WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt.query_map(
            params![habit_id, format_date(since), format_date(until)],
            |row| row.get::<_, String>(0),
        )?;
        let mut dates = Vec::new();
        for row in rows {
            dates.push(parse_date_fallback(&row?));
        }
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_is_idempotent_per_day() {
        let db = Database::open_memory().unwrap();
        let log = SqliteActivationLog::new(&db);
        assert!(log.record("reading", day(2026, 2, 1)).unwrap());
        assert!(!log.record("reading", day(2026, 2, 1)).unwrap());
        assert_eq!(
            log.activation_dates("reading", day(2026, 1, 1), day(2026, 3, 1))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn window_is_inclusive_and_per_habit() {
        let db = Database::open_memory().unwrap();
        let log = SqliteActivationLog::new(&db);
        log.record("reading", day(2026, 2, 1)).unwrap();
        log.record("reading", day(2026, 2, 3)).unwrap();
        log.record("running", day(2026, 2, 2)).unwrap();

        let dates = log
            .activation_dates("reading", day(2026, 2, 1), day(2026, 2, 3))
            .unwrap();
        assert_eq!(dates, vec![day(2026, 2, 1), day(2026, 2, 3)]);
    }
}
