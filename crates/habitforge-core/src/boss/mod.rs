//! Weekly boss engine.
//!
//! One encounter per ISO week, keyed by the week's Monday and created lazily
//! on first query. Qualifying activities deplete its hit points, negative
//! ones heal it; defeat is terminal. HP lives redundantly on the boss row
//! and is updated in the same transaction as the damage-log append, so the
//! log stays audit-only.
//!
//! The engine never issues rewards. It reports the defeat transition via
//! [`DamageOutcome::newly_defeated`], which is true for exactly one call per
//! boss; the caller credits `xp_reward` and `bonus_shields` on that signal.

mod roster;

pub use roster::{BossTemplate, ROSTER};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::dates::{format_date, parse_date_fallback, parse_datetime_fallback};
use crate::error::{CoreError, Result};
use crate::storage::Database;

/// Monday of the week containing `date`; Sunday counts as day 7 of the
/// prior week.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// One weekly encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBoss {
    pub id: i64,
    pub week_start: NaiveDate,
    pub boss_type: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub max_hp: i64,
    pub current_hp: i64,
    pub is_defeated: bool,
    pub defeated_at: Option<DateTime<Utc>>,
    pub xp_reward: i64,
    pub bonus_shields: i64,
}

/// One audit row; `amount` is negative for healing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageLogEntry {
    pub id: i64,
    pub boss_id: i64,
    pub kind: String,
    pub amount: i64,
    pub description: Option<String>,
    pub dealt_at: DateTime<Utc>,
}

/// Result of a damage or heal call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    pub new_hp: i64,
    pub is_defeated: bool,
    /// True for exactly the call that drove HP to zero.
    pub newly_defeated: bool,
}

/// Engine over weekly encounters and their damage log.
pub struct BossEngine<'a> {
    db: &'a Database,
    seed: Option<u64>,
}

impl<'a> BossEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, seed: None }
    }

    /// Deterministic template selection and HP rolls (for tests).
    pub fn with_seed(db: &'a Database, seed: u64) -> Self {
        Self {
            db,
            seed: Some(seed),
        }
    }

    /// The encounter for the week containing `now`, created on first query.
    ///
    /// At most one row exists per week; repeated calls within a week return
    /// the same identity and HP values.
    pub fn get_or_create(&self, now: DateTime<Utc>) -> Result<WeeklyBoss> {
        let start = week_start(now.date_naive());
        if let Some(boss) = self.boss_for_week(start)? {
            return Ok(boss);
        }

        let mut rng = match self.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        let template = &ROSTER[rng.gen_range(0..ROSTER.len())];
        let max_hp = rng.gen_range(template.min_hp..=template.max_hp);

        self.db.conn().execute(
            "INSERT INTO weekly_bosses
                 (week_start, boss_type, name, description, icon,
                  max_hp, current_hp, is_defeated, xp_reward, bonus_shields)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 0, ?7, ?8)",
            params![
                format_date(start),
                template.boss_type,
                template.name,
                template.description,
                template.icon,
                max_hp,
                template.xp_reward,
                template.bonus_shields,
            ],
        )?;
        let id = self.db.conn().last_insert_rowid();

        Ok(WeeklyBoss {
            id,
            week_start: start,
            boss_type: template.boss_type.to_string(),
            name: template.name.to_string(),
            description: template.description.to_string(),
            icon: template.icon.to_string(),
            max_hp,
            current_hp: max_hp,
            is_defeated: false,
            defeated_at: None,
            xp_reward: template.xp_reward,
            bonus_shields: template.bonus_shields,
        })
    }

    /// Look up a boss by id.
    pub fn get(&self, boss_id: i64) -> Result<Option<WeeklyBoss>> {
        let boss = self
            .db
            .conn()
            .query_row(
                &format!("{BOSS_SELECT} WHERE id = ?1"),
                params![boss_id],
                row_to_boss,
            )
            .optional()?;
        Ok(boss)
    }

    /// Look up the boss row for a given week start, if any.
    pub fn boss_for_week(&self, start: NaiveDate) -> Result<Option<WeeklyBoss>> {
        let boss = self
            .db
            .conn()
            .query_row(
                &format!("{BOSS_SELECT} WHERE week_start = ?1"),
                params![format_date(start)],
                row_to_boss,
            )
            .optional()?;
        Ok(boss)
    }

    /// Apply damage from a qualifying activity.
    ///
    /// Defeat is terminal: damage to a defeated boss is dropped and the
    /// current state is returned unchanged.
    ///
    /// # Errors
    /// Returns [`CoreError::BossNotFound`] for an unknown id.
    pub fn deal_damage(
        &self,
        boss_id: i64,
        kind: &str,
        amount: i64,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DamageOutcome> {
        let boss = self
            .get(boss_id)?
            .ok_or(CoreError::BossNotFound(boss_id))?;
        if boss.is_defeated {
            return Ok(DamageOutcome {
                new_hp: boss.current_hp,
                is_defeated: true,
                newly_defeated: false,
            });
        }

        let amount = amount.max(0);
        let new_hp = (boss.current_hp - amount).max(0);
        let newly_defeated = new_hp == 0;

        self.db.transaction(|conn| {
            if newly_defeated {
                conn.execute(
                    "UPDATE weekly_bosses
                     SET current_hp = ?1, is_defeated = 1, defeated_at = ?2
                     WHERE id = ?3",
                    params![new_hp, now.to_rfc3339(), boss_id],
                )?;
            } else {
                conn.execute(
                    "UPDATE weekly_bosses SET current_hp = ?1 WHERE id = ?2",
                    params![new_hp, boss_id],
                )?;
            }
            append_damage_log(conn, boss_id, kind, amount, description, now)
        })?;

        Ok(DamageOutcome {
            new_hp,
            is_defeated: newly_defeated,
            newly_defeated,
        })
    }

    /// Heal the boss from a negative activity, clamped to `max_hp`.
    ///
    /// Logged as a negative-amount damage entry for audit uniformity.
    /// No-op once the boss is defeated.
    pub fn heal(
        &self,
        boss_id: i64,
        kind: &str,
        amount: i64,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DamageOutcome> {
        let boss = self
            .get(boss_id)?
            .ok_or(CoreError::BossNotFound(boss_id))?;
        if boss.is_defeated {
            return Ok(DamageOutcome {
                new_hp: boss.current_hp,
                is_defeated: true,
                newly_defeated: false,
            });
        }

        let amount = amount.max(0);
        let new_hp = (boss.current_hp + amount).min(boss.max_hp);

        self.db.transaction(|conn| {
            conn.execute(
                "UPDATE weekly_bosses SET current_hp = ?1 WHERE id = ?2",
                params![new_hp, boss_id],
            )?;
            append_damage_log(conn, boss_id, kind, -amount, description, now)
        })?;

        Ok(DamageOutcome {
            new_hp,
            is_defeated: false,
            newly_defeated: false,
        })
    }

    /// Past encounters, newest week first.
    pub fn history(&self, limit: usize) -> Result<Vec<WeeklyBoss>> {
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!("{BOSS_SELECT} ORDER BY week_start DESC LIMIT ?1"))?;
        let rows = stmt.query_map(params![limit as i64], row_to_boss)?;
        let mut bosses = Vec::new();
        for row in rows {
            bosses.push(row?);
        }
        Ok(bosses)
    }

    /// Audit log for one boss, oldest first.
    pub fn damage_log(&self, boss_id: i64) -> Result<Vec<DamageLogEntry>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, boss_id, kind, amount, description, dealt_at
             FROM boss_damage_log WHERE boss_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![boss_id], |row| {
            Ok(DamageLogEntry {
                id: row.get(0)?,
                boss_id: row.get(1)?,
                kind: row.get(2)?,
                amount: row.get(3)?,
                description: row.get(4)?,
                dealt_at: parse_datetime_fallback(&row.get::<_, String>(5)?),
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

const BOSS_SELECT: &str = "SELECT id, week_start, boss_type, name, description, icon, \
     max_hp, current_hp, is_defeated, defeated_at, xp_reward, bonus_shields FROM weekly_bosses";

fn row_to_boss(row: &Row) -> Result<WeeklyBoss, rusqlite::Error> {
    Ok(WeeklyBoss {
        id: row.get(0)?,
        week_start: parse_date_fallback(&row.get::<_, String>(1)?),
        boss_type: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        icon: row.get(5)?,
        max_hp: row.get(6)?,
        current_hp: row.get(7)?,
        is_defeated: row.get::<_, i64>(8)? != 0,
        defeated_at: row
            .get::<_, Option<String>>(9)?
            .map(|s| parse_datetime_fallback(&s)),
        xp_reward: row.get(10)?,
        bonus_shields: row.get(11)?,
    })
}

fn append_damage_log(
    conn: &rusqlite::Connection,
    boss_id: i64,
    kind: &str,
    amount: i64,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO boss_damage_log (boss_id, kind, amount, description, dealt_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![boss_id, kind, amount, description, now.to_rfc3339()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    /// Insert a boss with a fixed HP pool, bypassing the random roll.
    fn fixed_boss(db: &Database, start: NaiveDate, max_hp: i64) -> i64 {
        db.conn()
            .execute(
                "INSERT INTO weekly_bosses
                     (week_start, boss_type, name, description, icon,
                      max_hp, current_hp, is_defeated, xp_reward, bonus_shields)
                 VALUES (?1, 'clutter_golem', 'Clutter Golem', '', 'golem', ?2, ?2, 0, 180, 1)",
                params![format_date(start), max_hp],
            )
            .unwrap();
        db.conn().last_insert_rowid()
    }

    #[test]
    fn week_start_is_monday_and_sunday_folds_back() {
        // 2026-03-09 is a Monday.
        assert_eq!(week_start(day(2026, 3, 9)), day(2026, 3, 9));
        assert_eq!(week_start(day(2026, 3, 11)), day(2026, 3, 9));
        assert_eq!(week_start(day(2026, 3, 14)), day(2026, 3, 9));
        // Sunday belongs to the week that started six days earlier.
        assert_eq!(week_start(day(2026, 3, 15)), day(2026, 3, 9));
        assert_eq!(week_start(day(2026, 3, 16)), day(2026, 3, 16));
    }

    #[test]
    fn get_or_create_is_stable_within_a_week() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::with_seed(&db, 42);

        let first = engine.get_or_create(at(2026, 3, 10)).unwrap();
        let second = engine.get_or_create(at(2026, 3, 13)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.current_hp, second.current_hp);
        assert_eq!(first.week_start, day(2026, 3, 9));
        assert_eq!(first.current_hp, first.max_hp);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM weekly_bosses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn new_week_spawns_a_new_boss_and_keeps_history() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::with_seed(&db, 7);

        let first = engine.get_or_create(at(2026, 3, 10)).unwrap();
        let next = engine.get_or_create(at(2026, 3, 17)).unwrap();
        assert_ne!(first.id, next.id);
        assert_eq!(next.week_start, day(2026, 3, 16));

        let history = engine.history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].week_start, day(2026, 3, 16));
    }

    #[test]
    fn rolled_hp_stays_inside_the_template_range() {
        for seed in 0..20 {
            let db = Database::open_memory().unwrap();
            let engine = BossEngine::with_seed(&db, seed);
            let boss = engine.get_or_create(at(2026, 3, 10)).unwrap();
            let template = ROSTER
                .iter()
                .find(|t| t.boss_type == boss.boss_type)
                .unwrap();
            assert!(boss.max_hp >= template.min_hp && boss.max_hp <= template.max_hp);
        }
    }

    #[test]
    fn damage_sequence_defeats_exactly_once() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::new(&db);
        let id = fixed_boss(&db, day(2026, 3, 9), 450);
        let now = at(2026, 3, 10);

        for (amount, expect_hp, expect_defeated) in
            [(100, 350, false), (100, 250, false), (100, 150, false)]
        {
            let outcome = engine.deal_damage(id, "task", amount, None, now).unwrap();
            assert_eq!(outcome.new_hp, expect_hp);
            assert_eq!(outcome.is_defeated, expect_defeated);
            assert!(!outcome.newly_defeated);
        }

        let fourth = engine.deal_damage(id, "task", 150, None, now).unwrap();
        assert_eq!(fourth.new_hp, 0);
        assert!(fourth.is_defeated);
        assert!(fourth.newly_defeated);

        let boss = engine.get(id).unwrap().unwrap();
        assert!(boss.is_defeated);
        assert_eq!(boss.defeated_at, Some(now));

        // Fifth hit is dropped, and the defeat signal never repeats.
        let fifth = engine.deal_damage(id, "task", 999, None, now).unwrap();
        assert_eq!(fifth.new_hp, 0);
        assert!(fifth.is_defeated);
        assert!(!fifth.newly_defeated);
        assert_eq!(engine.damage_log(id).unwrap().len(), 4);
    }

    #[test]
    fn overkill_clamps_to_zero() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::new(&db);
        let id = fixed_boss(&db, day(2026, 3, 9), 100);

        let outcome = engine
            .deal_damage(id, "task", 500, None, at(2026, 3, 10))
            .unwrap();
        assert_eq!(outcome.new_hp, 0);
        assert!(outcome.newly_defeated);
    }

    #[test]
    fn heal_clamps_at_max_and_logs_negative_amount() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::new(&db);
        let id = fixed_boss(&db, day(2026, 3, 9), 400);
        let now = at(2026, 3, 10);

        engine.deal_damage(id, "task", 50, None, now).unwrap();
        let outcome = engine.heal(id, "skipped_day", 200, None, now).unwrap();
        assert_eq!(outcome.new_hp, 400);
        assert!(!outcome.is_defeated);

        let log = engine.damage_log(id).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].amount, -200);
    }

    #[test]
    fn heal_after_defeat_is_a_no_op() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::new(&db);
        let id = fixed_boss(&db, day(2026, 3, 9), 100);
        let now = at(2026, 3, 10);

        engine.deal_damage(id, "task", 100, None, now).unwrap();
        let outcome = engine.heal(id, "skipped_day", 50, None, now).unwrap();
        assert_eq!(outcome.new_hp, 0);
        assert!(outcome.is_defeated);
        assert_eq!(engine.damage_log(id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_boss_id_is_an_error() {
        let db = Database::open_memory().unwrap();
        let engine = BossEngine::new(&db);
        let err = engine
            .deal_damage(99, "task", 10, None, at(2026, 3, 10))
            .unwrap_err();
        assert!(matches!(err, CoreError::BossNotFound(99)));
    }
}
