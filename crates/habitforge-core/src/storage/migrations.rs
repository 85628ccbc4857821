//! Database schema migrations for habitforge.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema
/// version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// v1: energy pool, streak, and reward ledger tables.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS energy_state (
            id            INTEGER PRIMARY KEY CHECK (id = 1),
            current       INTEGER NOT NULL,
            max           INTEGER NOT NULL,
            bonus         INTEGER NOT NULL DEFAULT 0,
            last_regen_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS energy_ledger (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            amount       INTEGER NOT NULL,
            reason       TEXT NOT NULL,
            source_kind  TEXT NOT NULL,
            source_id    TEXT,
            before_value INTEGER NOT NULL,
            after_value  INTEGER NOT NULL,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_energy_ledger_created_at
            ON energy_ledger(created_at);

        CREATE TABLE IF NOT EXISTS energy_costs (
            action_kind TEXT PRIMARY KEY,
            cost        INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_activations (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id TEXT NOT NULL,
            date     TEXT NOT NULL,
            UNIQUE(habit_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_habit_activations_habit_date
            ON habit_activations(habit_id, date);

        CREATE TABLE IF NOT EXISTS streak_freezes (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id TEXT NOT NULL,
            date     TEXT NOT NULL,
            reason   TEXT,
            UNIQUE(habit_id, date)
        );

        CREATE TABLE IF NOT EXISTS shield_inventory (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            quantity    INTEGER NOT NULL,
            acquired_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shield_uses (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id             TEXT NOT NULL,
            date                 TEXT NOT NULL,
            streak_length_at_use INTEGER NOT NULL,
            UNIQUE(habit_id, date)
        );

        CREATE TABLE IF NOT EXISTS streak_records (
            habit_id                    TEXT PRIMARY KEY,
            longest_streak              INTEGER NOT NULL DEFAULT 0,
            last_milestone_claimed_days INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS reward_ledger (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            amount      INTEGER NOT NULL,
            reason      TEXT NOT NULL,
            source_kind TEXT NOT NULL,
            source_id   TEXT,
            created_at  TEXT NOT NULL
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: weekly boss encounter and damage log tables.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS weekly_bosses (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            week_start    TEXT NOT NULL UNIQUE,
            boss_type     TEXT NOT NULL,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL,
            icon          TEXT NOT NULL,
            max_hp        INTEGER NOT NULL,
            current_hp    INTEGER NOT NULL,
            is_defeated   INTEGER NOT NULL DEFAULT 0,
            defeated_at   TEXT,
            xp_reward     INTEGER NOT NULL,
            bonus_shields INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS boss_damage_log (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            boss_id     INTEGER NOT NULL,
            kind        TEXT NOT NULL,
            amount      INTEGER NOT NULL,
            description TEXT,
            dealt_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_boss_damage_log_boss_id
            ON boss_damage_log(boss_id);",
    )?;
    set_schema_version(conn, 2)
}
