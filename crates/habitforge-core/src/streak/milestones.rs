//! One-time streak milestone rewards.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationLog;
use crate::error::Result;
use crate::rewards::RewardLedger;

use super::StreakEngine;

/// A streak-length threshold and its one-time XP grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub days: u32,
    pub bonus_xp: i64,
}

/// Fixed milestone table, ascending by days.
pub const MILESTONES: [Milestone; 9] = [
    Milestone { days: 3, bonus_xp: 15 },
    Milestone { days: 7, bonus_xp: 50 },
    Milestone { days: 14, bonus_xp: 75 },
    Milestone { days: 21, bonus_xp: 100 },
    Milestone { days: 30, bonus_xp: 150 },
    Milestone { days: 60, bonus_xp: 250 },
    Milestone { days: 90, bonus_xp: 400 },
    Milestone { days: 180, bonus_xp: 750 },
    Milestone { days: 365, bonus_xp: 1500 },
];

impl<'a, L: ActivationLog> StreakEngine<'a, L> {
    /// Grant every milestone newly reached by the current streak.
    ///
    /// Milestones are processed ascending; each credit advances the stored
    /// high-water mark, so re-invoking with no new progress returns an empty
    /// list and issues nothing.
    ///
    /// The credits and the high-water mark commit or roll back as one
    /// transaction: a failed credit leaves no grant behind and nothing that
    /// a retry could double-issue.
    pub fn claim_milestones(
        &self,
        habit_id: &str,
        today: NaiveDate,
        rewards: &dyn RewardLedger,
        now: DateTime<Utc>,
    ) -> Result<Vec<Milestone>> {
        let status = self.compute_streak(habit_id, today)?;
        let (_, last_claimed) = self.record(habit_id)?;

        let unclaimed: Vec<Milestone> = MILESTONES
            .iter()
            .copied()
            .filter(|m| m.days <= status.current_streak && m.days > last_claimed)
            .collect();
        if unclaimed.is_empty() {
            return Ok(Vec::new());
        }

        self.db.conn().execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<()> = (|| {
            for milestone in &unclaimed {
                rewards.credit(
                    milestone.bonus_xp,
                    &format!("{}-day streak milestone", milestone.days),
                    "streak_milestone",
                    Some(habit_id),
                    now,
                )?;
                self.set_last_claimed(habit_id, milestone.days)?;
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.db.conn().execute_batch("COMMIT;")?;
                Ok(unclaimed)
            }
            Err(err) => {
                let _ = self.db.conn().execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    fn set_last_claimed(&self, habit_id: &str, days: u32) -> Result<()> {
        self.db.conn().execute(
            "INSERT INTO streak_records (habit_id, longest_streak, last_milestone_claimed_days)
             VALUES (?1, 0, ?2)
             ON CONFLICT(habit_id) DO UPDATE
                 SET last_milestone_claimed_days = excluded.last_milestone_claimed_days",
            params![habit_id, days],
        )?;
        Ok(())
    }
}
