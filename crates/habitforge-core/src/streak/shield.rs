//! Streak shield inventory.
//!
//! Shields are consumables that retroactively protect one day per habit from
//! breaking a streak. Inventory is held as acquisition batches and consumed
//! oldest-first; [`ShieldQueue`] carries that ordering contract so it can be
//! tested without storage.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationLog;
use crate::dates::{format_date, parse_date_fallback, parse_datetime_fallback};
use crate::error::Result;

use super::StreakEngine;

/// One acquisition batch of shields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldBatch {
    pub id: i64,
    pub quantity: i64,
    pub acquired_at: DateTime<Utc>,
}

/// FIFO view over shield batches: units leave the oldest non-empty batch
/// first.
#[derive(Debug, Clone, Default)]
pub struct ShieldQueue {
    batches: Vec<ShieldBatch>,
}

impl ShieldQueue {
    pub fn new(mut batches: Vec<ShieldBatch>) -> Self {
        batches.sort_by(|a, b| a.acquired_at.cmp(&b.acquired_at).then(a.id.cmp(&b.id)));
        Self { batches }
    }

    /// Units remaining across all batches.
    pub fn total(&self) -> i64 {
        self.batches.iter().map(|b| b.quantity.max(0)).sum()
    }

    /// Take one unit from the oldest non-empty batch, returning its id.
    pub fn consume_one(&mut self) -> Option<i64> {
        let batch = self.batches.iter_mut().find(|b| b.quantity > 0)?;
        batch.quantity -= 1;
        Some(batch.id)
    }
}

/// A shield burned to protect a specific day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldUse {
    pub id: i64,
    pub habit_id: String,
    pub date: NaiveDate,
    pub streak_length_at_use: u32,
}

impl<'a, L: ActivationLog> StreakEngine<'a, L> {
    /// Add a batch of shields to the inventory.
    pub fn add_shields(&self, quantity: i64, now: DateTime<Utc>) -> Result<()> {
        if quantity <= 0 {
            return Ok(());
        }
        self.db.conn().execute(
            "INSERT INTO shield_inventory (quantity, acquired_at) VALUES (?1, ?2)",
            params![quantity, now.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Units available across all batches.
    pub fn shield_count(&self) -> Result<i64> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM shield_inventory",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Burn one shield to protect `(habit_id, today)`.
    ///
    /// Returns `false` without mutating anything when the inventory is empty
    /// or a shield already protects that day. On success the batch
    /// decrement, the prune of exhausted batches, and the use record commit
    /// as one transaction.
    pub fn use_shield(&self, habit_id: &str, today: NaiveDate) -> Result<bool> {
        if self.shield_used_on(habit_id, today)? {
            return Ok(false);
        }
        let mut queue = self.load_shield_queue()?;
        let Some(batch_id) = queue.consume_one() else {
            return Ok(false);
        };

        // Snapshot the streak being protected before the use record exists.
        let status = self.compute_streak(habit_id, today)?;

        self.db.transaction(|conn| {
            conn.execute(
                "UPDATE shield_inventory SET quantity = quantity - 1 WHERE id = ?1",
                params![batch_id],
            )?;
            conn.execute("DELETE FROM shield_inventory WHERE quantity <= 0", [])?;
            conn.execute(
                "INSERT INTO shield_uses (habit_id, date, streak_length_at_use)
                 VALUES (?1, ?2, ?3)",
                params![habit_id, format_date(today), status.current_streak],
            )?;
            Ok(())
        })?;
        Ok(true)
    }

    /// Whether a shield already protects `(habit_id, date)`.
    pub fn shield_used_on(&self, habit_id: &str, date: NaiveDate) -> Result<bool> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM shield_uses WHERE habit_id = ?1 AND date = ?2",
            params![habit_id, format_date(date)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All shield uses for a habit, ascending by date.
    pub fn shield_uses(&self, habit_id: &str) -> Result<Vec<ShieldUse>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, habit_id, date, streak_length_at_use FROM shield_uses
             WHERE habit_id = ?1 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok(ShieldUse {
                id: row.get(0)?,
                habit_id: row.get(1)?,
                date: parse_date_fallback(&row.get::<_, String>(2)?),
                streak_length_at_use: row.get(3)?,
            })
        })?;
        let mut uses = Vec::new();
        for row in rows {
            uses.push(row?);
        }
        Ok(uses)
    }

    fn load_shield_queue(&self) -> Result<ShieldQueue> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, quantity, acquired_at FROM shield_inventory ORDER BY acquired_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ShieldBatch {
                id: row.get(0)?,
                quantity: row.get(1)?,
                acquired_at: parse_datetime_fallback(&row.get::<_, String>(2)?),
            })
        })?;
        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?);
        }
        Ok(ShieldQueue::new(batches))
    }
}
