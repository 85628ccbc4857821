//! Energy pool engine.
//!
//! A singleton pool regenerates over wall-clock time and is drained by
//! actions priced in the `energy_costs` table. Every state change appends an
//! immutable ledger entry carrying the before/after values, so the cached
//! row can always be audited against its history.
//!
//! `last_regen_at` advances only on regeneration and spend writes, never
//! periodically, so elapsed time is always measured from the last
//! state-changing event.

mod debuff;

pub use debuff::{derive_debuffs, Debuff, DebuffKind, EXHAUSTED_THRESHOLD, FATIGUED_THRESHOLD};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::dates::parse_datetime_fallback;
use crate::error::{CoreError, Result};
use crate::storage::Database;

/// Energy regained per elapsed hour.
pub const REGEN_PER_HOUR: f64 = 5.0;

/// Pool capacity for a fresh profile.
pub const DEFAULT_MAX_ENERGY: i64 = 100;

/// The singleton energy pool row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyState {
    pub current: i64,
    pub max: i64,
    /// Temporary extra capacity on top of `max`.
    pub bonus: i64,
    pub last_regen_at: DateTime<Utc>,
}

impl EnergyState {
    /// Effective ceiling: base capacity plus temporary bonus.
    pub fn capacity(&self) -> i64 {
        self.max + self.bonus
    }

    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            current: DEFAULT_MAX_ENERGY,
            max: DEFAULT_MAX_ENERGY,
            bonus: 0,
            last_regen_at: now,
        }
    }
}

/// One immutable ledger row: `after = before + amount`, clamped to bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyLedgerEntry {
    pub id: i64,
    pub amount: i64,
    pub reason: String,
    pub source_kind: String,
    pub source_id: Option<String>,
    pub before: i64,
    pub after: i64,
    pub created_at: DateTime<Utc>,
}

/// One row of the action price list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyCost {
    pub action_kind: String,
    pub cost: i64,
}

/// Result of a successful spend: the new state plus what was charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendOutcome {
    pub state: EnergyState,
    pub charged: i64,
}

/// Engine over the singleton pool, its ledger, and the price list.
pub struct EnergyEngine<'a> {
    db: &'a Database,
}

impl<'a> EnergyEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Current pool state.
    ///
    /// An uninitialized pool reads as a fresh full pool; the default is
    /// computed, not written.
    pub fn state(&self, now: DateTime<Utc>) -> Result<EnergyState> {
        self.load(now)
    }

    /// Apply natural regeneration for the time elapsed since the last
    /// state-changing write.
    ///
    /// Returns the new state and the amount actually gained after clamping.
    /// Safe to call at arbitrary cadence: with no elapsed time the gain is
    /// zero and nothing is written.
    pub fn regenerate(&self, now: DateTime<Utc>) -> Result<(EnergyState, i64)> {
        let mut state = self.load(now)?;

        if state.current >= state.capacity() {
            // Already full: refresh the regen anchor, no ledger entry.
            state.last_regen_at = now;
            self.db.transaction(|conn| write_state(conn, &state))?;
            return Ok((state, 0));
        }

        let elapsed = now.signed_duration_since(state.last_regen_at);
        let hours = elapsed.num_seconds() as f64 / 3600.0;
        let gained = (hours * REGEN_PER_HOUR).floor() as i64;
        if gained <= 0 {
            return Ok((state, 0));
        }

        let before = state.current;
        state.current = (before + gained).min(state.capacity());
        state.last_regen_at = now;
        let actual = state.current - before;
        self.db.transaction(|conn| {
            write_state(conn, &state)?;
            append_ledger(
                conn,
                actual,
                "natural regeneration",
                "regen",
                None,
                before,
                state.current,
                now,
            )
        })?;
        Ok((state, actual))
    }

    /// Spend energy on an action, priced by the cost table (0 if unpriced).
    ///
    /// # Errors
    /// Returns [`CoreError::InsufficientEnergy`] without touching any state
    /// when the cost exceeds the current pool.
    pub fn spend(
        &self,
        action_kind: &str,
        source_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SpendOutcome> {
        let mut state = self.load(now)?;
        let cost = self.cost_of(action_kind)?;
        if cost > state.current {
            return Err(CoreError::InsufficientEnergy {
                required: cost,
                available: state.current,
            });
        }
        if cost == 0 {
            // A free action is not a state transition; nothing to record.
            return Ok(SpendOutcome { state, charged: 0 });
        }

        let before = state.current;
        state.current = before - cost;
        state.last_regen_at = now;
        self.db.transaction(|conn| {
            write_state(conn, &state)?;
            append_ledger(
                conn,
                -cost,
                &format!("spent on {action_kind}"),
                "spend",
                source_id,
                before,
                state.current,
                now,
            )
        })?;
        Ok(SpendOutcome {
            state,
            charged: cost,
        })
    }

    /// Grant (or with a negative amount, revoke) temporary bonus capacity.
    ///
    /// Bonus never drops below zero; `current` is re-clamped to the new
    /// ceiling and the clamp, if any, is recorded in the ledger.
    pub fn add_bonus(&self, amount: i64, now: DateTime<Utc>) -> Result<EnergyState> {
        let mut state = self.load(now)?;
        state.bonus = (state.bonus + amount).max(0);
        let before = state.current;
        state.current = before.clamp(0, state.capacity());
        let delta = state.current - before;
        self.db.transaction(|conn| {
            write_state(conn, &state)?;
            if delta != 0 {
                append_ledger(
                    conn,
                    delta,
                    "bonus capacity adjustment",
                    "admin",
                    None,
                    before,
                    state.current,
                    now,
                )?;
            }
            Ok(())
        })?;
        Ok(state)
    }

    /// Set the base pool capacity, re-clamping `current` if needed.
    pub fn set_max(&self, value: i64, now: DateTime<Utc>) -> Result<EnergyState> {
        let mut state = self.load(now)?;
        state.max = value.max(0);
        let before = state.current;
        state.current = before.clamp(0, state.capacity());
        let delta = state.current - before;
        self.db.transaction(|conn| {
            write_state(conn, &state)?;
            if delta != 0 {
                append_ledger(
                    conn,
                    delta,
                    "max capacity adjustment",
                    "admin",
                    None,
                    before,
                    state.current,
                    now,
                )?;
            }
            Ok(())
        })?;
        Ok(state)
    }

    /// Fill the pool to its ceiling, recording exactly the delta applied.
    ///
    /// No-op when already full.
    pub fn restore_full(&self, now: DateTime<Utc>) -> Result<EnergyState> {
        let mut state = self.load(now)?;
        let before = state.current;
        let delta = state.capacity() - before;
        if delta == 0 {
            return Ok(state);
        }
        state.current = state.capacity();
        self.db.transaction(|conn| {
            write_state(conn, &state)?;
            append_ledger(
                conn,
                delta,
                "full restore",
                "admin",
                None,
                before,
                state.current,
                now,
            )
        })?;
        Ok(state)
    }

    /// Cost of an action kind; an unpriced action costs zero.
    pub fn cost_of(&self, action_kind: &str) -> Result<i64> {
        let cost = self
            .db
            .conn()
            .query_row(
                "SELECT cost FROM energy_costs WHERE action_kind = ?1",
                params![action_kind],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(cost.unwrap_or(0))
    }

    /// Set or replace the cost of an action kind.
    pub fn set_cost(&self, action_kind: &str, cost: i64) -> Result<()> {
        self.db.conn().execute(
            "INSERT OR REPLACE INTO energy_costs (action_kind, cost) VALUES (?1, ?2)",
            params![action_kind, cost.max(0)],
        )?;
        Ok(())
    }

    /// The full price list, ordered by action kind.
    pub fn list_costs(&self) -> Result<Vec<EnergyCost>> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT action_kind, cost FROM energy_costs ORDER BY action_kind")?;
        let rows = stmt.query_map([], |row| {
            Ok(EnergyCost {
                action_kind: row.get(0)?,
                cost: row.get(1)?,
            })
        })?;
        let mut costs = Vec::new();
        for row in rows {
            costs.push(row?);
        }
        Ok(costs)
    }

    /// Most recent ledger entries, newest first.
    pub fn ledger(&self, limit: usize) -> Result<Vec<EnergyLedgerEntry>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, amount, reason, source_kind, source_id, before_value, after_value, created_at
             FROM energy_ledger ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(EnergyLedgerEntry {
                id: row.get(0)?,
                amount: row.get(1)?,
                reason: row.get(2)?,
                source_kind: row.get(3)?,
                source_id: row.get(4)?,
                before: row.get(5)?,
                after: row.get(6)?,
                created_at: parse_datetime_fallback(&row.get::<_, String>(7)?),
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn load(&self, now: DateTime<Utc>) -> Result<EnergyState> {
        let state = self
            .db
            .conn()
            .query_row(
                "SELECT current, max, bonus, last_regen_at FROM energy_state WHERE id = 1",
                [],
                |row| {
                    Ok(EnergyState {
                        current: row.get(0)?,
                        max: row.get(1)?,
                        bonus: row.get(2)?,
                        last_regen_at: parse_datetime_fallback(&row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?;
        Ok(state.unwrap_or_else(|| EnergyState::fresh(now)))
    }
}

fn write_state(conn: &Connection, state: &EnergyState) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO energy_state (id, current, max, bonus, last_regen_at)
         VALUES (1, ?1, ?2, ?3, ?4)",
        params![
            state.current,
            state.max,
            state.bonus,
            state.last_regen_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn append_ledger(
    conn: &Connection,
    amount: i64,
    reason: &str,
    source_kind: &str,
    source_id: Option<&str>,
    before: i64,
    after: i64,
    created_at: DateTime<Utc>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO energy_ledger (amount, reason, source_kind, source_id, before_value, after_value, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            amount,
            reason,
            source_kind,
            source_id,
            before,
            after,
            created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}
