//! SQLite-backed storage for the gamification engines.
//!
//! One connection, one file. The engines borrow the database and run their
//! read-modify-write sequences through [`Database::transaction`] so each
//! operation commits or rolls back as a unit.

use rusqlite::Connection;

use crate::error::{DatabaseError, Result};

use super::{data_dir, migrations};

/// SQLite database holding energy, streak, and weekly boss state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/habitforge/habitforge.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("habitforge.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        migrations::migrate(db.conn())
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|source| DatabaseError::OpenFailed {
                path: ":memory:".into(),
                source,
            })?;
        let db = Self { conn };
        migrations::migrate(db.conn())
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise, so a failing
    /// operation leaves no partial writes behind.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn open_memory_runs_migrations() {
        let db = Database::open_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM energy_costs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Database::open_memory().unwrap();
        let result: Result<(), rusqlite::Error> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO energy_costs (action_kind, cost) VALUES (?1, ?2)",
                params!["quest", 10],
            )?;
            Err(rusqlite::Error::QueryReturnedNoRows)
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM energy_costs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn transaction_commits_on_success() {
        let db = Database::open_memory().unwrap();
        db.transaction(|conn| {
            conn.execute(
                "INSERT INTO energy_costs (action_kind, cost) VALUES (?1, ?2)",
                params!["quest", 10],
            )
            .map(|_| ())
        })
        .unwrap();

        let cost: i64 = db
            .conn()
            .query_row(
                "SELECT cost FROM energy_costs WHERE action_kind = 'quest'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(cost, 10);
    }
}
