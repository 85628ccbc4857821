//! Habit streak commands.

use chrono::Utc;
use clap::Subcommand;

use habitforge_core::{Database, SqliteActivationLog, SqliteRewardLedger, StreakEngine};

use super::parse_date_or_today;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show streak status for a habit
    Show {
        habit_id: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Record an activation for a habit
    Log {
        habit_id: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Excuse a date from breaking the streak
    Freeze {
        habit_id: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List freezes for a habit
    Freezes { habit_id: String },
    /// Remove a freeze by id
    Unfreeze { freeze_id: i64 },
    /// Shield inventory and use
    Shield {
        #[command(subcommand)]
        action: ShieldAction,
    },
    /// Claim newly reached milestone rewards
    Claim { habit_id: String },
}

#[derive(Subcommand)]
pub enum ShieldAction {
    /// Burn a shield to protect today's streak
    Use { habit_id: String },
    /// Add shields to the inventory
    Add { quantity: i64 },
    /// Show how many shields are available
    Count,
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let engine = StreakEngine::new(&db, SqliteActivationLog::new(&db));
    let now = Utc::now();

    match action {
        StreakAction::Show { habit_id, json } => {
            let today = parse_date_or_today(None)?;
            let status = engine.compute_streak(&habit_id, today)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }
            println!(
                "{habit_id}: {} day(s) (longest {})",
                status.current_streak, status.longest_streak
            );
            if let Some(last) = status.last_activated {
                println!("  last activated: {last}");
            }
            if status.shield_active {
                println!("  shielded today");
            }
            if status.is_at_risk {
                println!("  at risk: act today or the streak breaks");
            }
        }
        StreakAction::Log { habit_id, date } => {
            let date = parse_date_or_today(date.as_deref())?;
            let log = SqliteActivationLog::new(&db);
            if log.record(&habit_id, date)? {
                let status = engine.compute_streak(&habit_id, date)?;
                println!("Logged {habit_id} on {date}; streak is {}", status.current_streak);
            } else {
                println!("{habit_id} already logged on {date}");
            }
        }
        StreakAction::Freeze {
            habit_id,
            date,
            reason,
        } => {
            let date = parse_date_or_today(date.as_deref())?;
            if engine.add_freeze(&habit_id, date, reason.as_deref())? {
                println!("Froze {habit_id} on {date}");
            } else {
                println!("{habit_id} is already frozen on {date}");
            }
        }
        StreakAction::Freezes { habit_id } => {
            for freeze in engine.list_freezes(&habit_id)? {
                println!(
                    "{:>4}  {}  {}",
                    freeze.id,
                    freeze.date,
                    freeze.reason.as_deref().unwrap_or("-")
                );
            }
        }
        StreakAction::Unfreeze { freeze_id } => {
            if engine.remove_freeze(freeze_id)? {
                println!("Removed freeze {freeze_id}");
            } else {
                println!("No freeze with id {freeze_id}");
            }
        }
        StreakAction::Shield { action } => match action {
            ShieldAction::Use { habit_id } => {
                let today = parse_date_or_today(None)?;
                if engine.use_shield(&habit_id, today)? {
                    println!("Shield raised for {habit_id} on {today}");
                } else {
                    println!(
                        "No shield used: inventory empty or {habit_id} already shielded today"
                    );
                }
            }
            ShieldAction::Add { quantity } => {
                engine.add_shields(quantity, now)?;
                println!("Inventory now holds {} shield(s)", engine.shield_count()?);
            }
            ShieldAction::Count => {
                println!("{} shield(s) available", engine.shield_count()?);
            }
        },
        StreakAction::Claim { habit_id } => {
            let today = parse_date_or_today(None)?;
            let ledger = SqliteRewardLedger::new(&db);
            let granted = engine.claim_milestones(&habit_id, today, &ledger, now)?;
            if granted.is_empty() {
                println!("No new milestones for {habit_id}");
            }
            for milestone in granted {
                println!(
                    "Milestone reached: {} days! +{} XP",
                    milestone.days, milestone.bonus_xp
                );
            }
        }
    }
    Ok(())
}
