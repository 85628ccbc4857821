//! # Habitforge Core Library
//!
//! Core business logic for Habitforge, a personal gamification layer that
//! turns real-world task completions into RPG-style resource mechanics. All
//! operations are available through the standalone CLI binary, which is a
//! thin layer over this library.
//!
//! ## Architecture
//!
//! Three independent engines share one pattern: a small cached state row
//! plus an append-only history, recomputed or incrementally updated against
//! a wall-clock time the caller reads once and threads through the call.
//!
//! - **Energy Engine**: a regenerating pool that gates actions through a
//!   price list, with an immutable spend/regen ledger
//! - **Streak Engine**: consecutive-day streaks per habit derived from the
//!   activation history, with freeze and shield grace mechanisms and
//!   one-time milestone rewards
//! - **Weekly Boss Engine**: a per-ISO-week hit-point pool depleted by
//!   qualifying activities, healed by negative ones, with a terminal defeat
//!   state the caller turns into rewards
//!
//! Storage is a single SQLite database; every mutating operation runs as one
//! transaction and either commits fully or leaves no trace.

pub mod activation;
pub mod boss;
pub mod energy;
pub mod error;
pub mod rewards;
pub mod storage;
pub mod streak;

mod dates;

pub use activation::{ActivationLog, SqliteActivationLog};
pub use boss::{BossEngine, DamageLogEntry, DamageOutcome, WeeklyBoss};
pub use energy::{derive_debuffs, Debuff, DebuffKind, EnergyEngine, EnergyState, SpendOutcome};
pub use error::{CoreError, DatabaseError, Result};
pub use rewards::{RewardLedger, SqliteRewardLedger};
pub use storage::Database;
pub use streak::{Milestone, StreakEngine, StreakStatus, MILESTONES};
