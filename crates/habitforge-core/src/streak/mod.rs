//! Habit streak engine.
//!
//! Streak length is never stored; it is derived on read by walking backward
//! from today through the union of activation days, freeze days, and
//! shield-use days until the first gap. The per-habit record only carries
//! the monotonic pieces: the longest streak ever seen and the highest
//! milestone already claimed.
//!
//! A streak survives the current day only through an activation, a freeze
//! scheduled for today, or a shield burned for today. Activity that stopped
//! yesterday reads as length 0 with `is_at_risk` set, which is what drives
//! "act now or lose it" prompts.

mod milestones;
mod shield;

pub use milestones::{Milestone, MILESTONES};
pub use shield::{ShieldBatch, ShieldQueue, ShieldUse};

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::activation::ActivationLog;
use crate::dates::{format_date, parse_date_fallback};
use crate::error::Result;
use crate::storage::Database;

/// How far back the derivation looks for relevant history.
pub const STREAK_WINDOW_DAYS: i64 = 400;

/// Snapshot returned by [`StreakEngine::compute_streak`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStatus {
    pub habit_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activated: Option<NaiveDate>,
    /// No activation or freeze today, but an activation yesterday: the
    /// streak lives or dies on today's action. Computed from activations
    /// and freezes only, so a shield burned today leaves this set alongside
    /// `shield_active`.
    pub is_at_risk: bool,
    /// A shield protects today.
    pub shield_active: bool,
}

/// A date explicitly excused from breaking a streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakFreeze {
    pub id: i64,
    pub habit_id: String,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

/// Engine over streak derivation, freezes, shields, and milestones.
pub struct StreakEngine<'a, L> {
    db: &'a Database,
    activations: L,
}

impl<'a, L: ActivationLog> StreakEngine<'a, L> {
    pub fn new(db: &'a Database, activations: L) -> Self {
        Self { db, activations }
    }

    /// Derive the current streak for a habit as of `today`.
    ///
    /// Side effect: ratchets the stored `longest_streak` upward when the
    /// derived length exceeds it. The stored value never decreases.
    pub fn compute_streak(&self, habit_id: &str, today: NaiveDate) -> Result<StreakStatus> {
        let since = today - Duration::days(STREAK_WINDOW_DAYS);
        let activation_days: BTreeSet<NaiveDate> = self
            .activations
            .activation_dates(habit_id, since, today)?
            .into_iter()
            .collect();
        let freeze_days = self.freeze_dates(habit_id, since, today)?;
        let shield_days = self.shield_use_dates(habit_id, since, today)?;

        let mut active_days = activation_days.clone();
        active_days.extend(&freeze_days);
        active_days.extend(&shield_days);

        let yesterday = today - Duration::days(1);
        let last_activated = activation_days.iter().next_back().copied();

        let mut current = 0u32;
        if active_days.contains(&today) {
            let mut day = today;
            while active_days.contains(&day) {
                current += 1;
                day -= Duration::days(1);
            }
        }

        let is_at_risk = !activation_days.contains(&today)
            && !freeze_days.contains(&today)
            && activation_days.contains(&yesterday);
        let shield_active = shield_days.contains(&today);

        let longest_streak = self.ratchet_longest(habit_id, current)?;

        Ok(StreakStatus {
            habit_id: habit_id.to_string(),
            current_streak: current,
            longest_streak,
            last_activated,
            is_at_risk,
            shield_active,
        })
    }

    /// Excuse a date from breaking the streak.
    ///
    /// Freezes are declarative: a duplicate for the same day is a benign
    /// no-op and returns `false`.
    pub fn add_freeze(
        &self,
        habit_id: &str,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<bool> {
        let changed = self.db.conn().execute(
            "INSERT OR IGNORE INTO streak_freezes (habit_id, date, reason) VALUES (?1, ?2, ?3)",
            params![habit_id, format_date(date), reason],
        )?;
        Ok(changed > 0)
    }

    /// Remove a freeze by id. Returns `false` if it did not exist.
    pub fn remove_freeze(&self, freeze_id: i64) -> Result<bool> {
        let changed = self
            .db
            .conn()
            .execute("DELETE FROM streak_freezes WHERE id = ?1", params![freeze_id])?;
        Ok(changed > 0)
    }

    /// All freezes for a habit, ascending by date.
    pub fn list_freezes(&self, habit_id: &str) -> Result<Vec<StreakFreeze>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, habit_id, date, reason FROM streak_freezes
             WHERE habit_id = ?1 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok(StreakFreeze {
                id: row.get(0)?,
                habit_id: row.get(1)?,
                date: parse_date_fallback(&row.get::<_, String>(2)?),
                reason: row.get(3)?,
            })
        })?;
        let mut freezes = Vec::new();
        for row in rows {
            freezes.push(row?);
        }
        Ok(freezes)
    }

    /// `(longest_streak, last_milestone_claimed_days)` for a habit.
    pub(crate) fn record(&self, habit_id: &str) -> Result<(u32, u32)> {
        let record = self
            .db
            .conn()
            .query_row(
                "SELECT longest_streak, last_milestone_claimed_days
                 FROM streak_records WHERE habit_id = ?1",
                params![habit_id],
                |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
            )
            .optional()?;
        Ok(record.unwrap_or((0, 0)))
    }

    fn ratchet_longest(&self, habit_id: &str, current: u32) -> Result<u32> {
        let (longest, _) = self.record(habit_id)?;
        if current <= longest {
            return Ok(longest);
        }
        self.db.conn().execute(
            "INSERT INTO streak_records (habit_id, longest_streak, last_milestone_claimed_days)
             VALUES (?1, ?2, 0)
             ON CONFLICT(habit_id) DO UPDATE SET longest_streak = excluded.longest_streak",
            params![habit_id, current],
        )?;
        Ok(current)
    }

    fn freeze_dates(
        &self,
        habit_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        self.date_set(
            "SELECT date FROM streak_freezes WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3",
            habit_id,
            since,
            until,
        )
    }

    fn shield_use_dates(
        &self,
        habit_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        self.date_set(
            "SELECT date FROM shield_uses WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3",
            habit_id,
            since,
            until,
        )
    }

    fn date_set(
        &self,
        sql: &str,
        habit_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = stmt.query_map(
            params![habit_id, format_date(since), format_date(until)],
            |row| row.get::<_, String>(0),
        )?;
        let mut dates = BTreeSet::new();
        for row in rows {
            dates.insert(parse_date_fallback(&row?));
        }
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::SqliteActivationLog;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine(db: &Database) -> StreakEngine<'_, SqliteActivationLog<'_>> {
        StreakEngine::new(db, SqliteActivationLog::new(db))
    }

    fn activate(db: &Database, habit: &str, dates: &[NaiveDate]) {
        let log = SqliteActivationLog::new(db);
        for date in dates {
            log.record(habit, *date).unwrap();
        }
    }

    #[test]
    fn no_history_means_no_streak() {
        let db = Database::open_memory().unwrap();
        let status = engine(&db).compute_streak("reading", day(2026, 3, 10)).unwrap();
        assert_eq!(status.current_streak, 0);
        assert_eq!(status.longest_streak, 0);
        assert_eq!(status.last_activated, None);
        assert!(!status.is_at_risk);
        assert!(!status.shield_active);
    }

    #[test]
    fn consecutive_days_including_today_count() {
        let db = Database::open_memory().unwrap();
        let today = day(2026, 3, 10);
        activate(&db, "reading", &[day(2026, 3, 8), day(2026, 3, 9), today]);

        let status = engine(&db).compute_streak("reading", today).unwrap();
        assert_eq!(status.current_streak, 3);
        assert_eq!(status.longest_streak, 3);
        assert_eq!(status.last_activated, Some(today));
        assert!(!status.is_at_risk);
    }

    #[test]
    fn activity_that_stopped_yesterday_is_zero_but_at_risk() {
        let db = Database::open_memory().unwrap();
        let today = day(2026, 3, 10);
        activate(&db, "reading", &[day(2026, 3, 8), day(2026, 3, 9)]);

        let status = engine(&db).compute_streak("reading", today).unwrap();
        assert_eq!(status.current_streak, 0);
        assert!(status.is_at_risk);
        assert_eq!(status.last_activated, Some(day(2026, 3, 9)));
    }

    #[test]
    fn gap_before_yesterday_is_broken_and_not_at_risk() {
        let db = Database::open_memory().unwrap();
        let today = day(2026, 3, 10);
        activate(&db, "reading", &[day(2026, 3, 6), day(2026, 3, 7)]);

        let status = engine(&db).compute_streak("reading", today).unwrap();
        assert_eq!(status.current_streak, 0);
        assert!(!status.is_at_risk);
        assert_eq!(status.last_activated, Some(day(2026, 3, 7)));
    }

    #[test]
    fn freeze_today_bridges_the_walk() {
        let db = Database::open_memory().unwrap();
        let today = day(2026, 3, 10);
        activate(&db, "reading", &[day(2026, 3, 8), day(2026, 3, 9)]);
        let eng = engine(&db);
        eng.add_freeze("reading", today, Some("travel day")).unwrap();

        let status = eng.compute_streak("reading", today).unwrap();
        assert_eq!(status.current_streak, 3);
        assert!(!status.is_at_risk);
    }

    #[test]
    fn freeze_in_the_middle_bridges_a_gap() {
        let db = Database::open_memory().unwrap();
        let today = day(2026, 3, 10);
        activate(&db, "reading", &[day(2026, 3, 7), day(2026, 3, 9), today]);
        let eng = engine(&db);
        eng.add_freeze("reading", day(2026, 3, 8), None).unwrap();

        let status = eng.compute_streak("reading", today).unwrap();
        assert_eq!(status.current_streak, 4);
    }

    #[test]
    fn freeze_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let eng = engine(&db);
        assert!(eng.add_freeze("reading", day(2026, 3, 8), None).unwrap());
        assert!(!eng.add_freeze("reading", day(2026, 3, 8), Some("again")).unwrap());
        assert_eq!(eng.list_freezes("reading").unwrap().len(), 1);
    }

    #[test]
    fn remove_freeze_deletes_by_identity() {
        let db = Database::open_memory().unwrap();
        let eng = engine(&db);
        eng.add_freeze("reading", day(2026, 3, 8), None).unwrap();
        let id = eng.list_freezes("reading").unwrap()[0].id;
        assert!(eng.remove_freeze(id).unwrap());
        assert!(!eng.remove_freeze(id).unwrap());
        assert!(eng.list_freezes("reading").unwrap().is_empty());
    }

    #[test]
    fn longest_streak_only_ratchets_upward() {
        let db = Database::open_memory().unwrap();
        let eng = engine(&db);
        activate(
            &db,
            "reading",
            &[day(2026, 3, 1), day(2026, 3, 2), day(2026, 3, 3)],
        );
        let status = eng.compute_streak("reading", day(2026, 3, 3)).unwrap();
        assert_eq!(status.longest_streak, 3);

        // Streak broken later; longest must survive.
        let status = eng.compute_streak("reading", day(2026, 3, 10)).unwrap();
        assert_eq!(status.current_streak, 0);
        assert_eq!(status.longest_streak, 3);
    }

    #[test]
    fn history_outside_the_window_is_ignored() {
        let db = Database::open_memory().unwrap();
        let today = day(2026, 3, 10);
        activate(&db, "reading", &[today - Duration::days(STREAK_WINDOW_DAYS + 5)]);

        let status = engine(&db).compute_streak("reading", today).unwrap();
        assert_eq!(status.current_streak, 0);
        assert_eq!(status.last_activated, None);
    }
}
