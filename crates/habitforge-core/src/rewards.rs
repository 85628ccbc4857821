//! Experience/currency reward ledger seam.
//!
//! Streak milestones and boss defeats credit a ledger owned outside the
//! engines. Credits are fire-and-forget from the engines' perspective, but a
//! failed credit fails the whole operation; nothing here retries.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::dates::parse_datetime_fallback;
use crate::error::Result;
use crate::storage::Database;

/// Sink for reward credits.
pub trait RewardLedger {
    fn credit(
        &self,
        amount: i64,
        reason: &str,
        source_kind: &str,
        source_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()>;
}

/// One credited reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEntry {
    pub id: i64,
    pub amount: i64,
    pub reason: String,
    pub source_kind: String,
    pub source_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Reward ledger backed by the local `reward_ledger` table.
pub struct SqliteRewardLedger<'a> {
    db: &'a Database,
}

impl<'a> SqliteRewardLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Sum of all credits.
    pub fn total(&self) -> Result<i64> {
        let total: i64 = self.db.conn().query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM reward_ledger",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Most recent credits, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<RewardEntry>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, amount, reason, source_kind, source_id, created_at
             FROM reward_ledger ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RewardEntry {
                id: row.get(0)?,
                amount: row.get(1)?,
                reason: row.get(2)?,
                source_kind: row.get(3)?,
                source_id: row.get(4)?,
                created_at: parse_datetime_fallback(&row.get::<_, String>(5)?),
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

impl RewardLedger for SqliteRewardLedger<'_> {
    fn credit(
        &self,
        amount: i64,
        reason: &str,
        source_kind: &str,
        source_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.db.conn().execute(
            "INSERT INTO reward_ledger (amount, reason, source_kind, source_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![amount, reason, source_kind, source_id, now.to_rfc3339()],
        )?;
        Ok(())
    }
}
