//! Weekly boss commands.
//!
//! The reward issuance policy lives here, not in the engine: exactly one
//! call observes `newly_defeated`, and that call credits the XP and any
//! bonus shields.

use chrono::{DateTime, Utc};
use clap::Subcommand;

use habitforge_core::rewards::RewardLedger;
use habitforge_core::{
    BossEngine, Database, SqliteActivationLog, SqliteRewardLedger, StreakEngine, WeeklyBoss,
};

#[derive(Subcommand)]
pub enum BossAction {
    /// Show this week's boss (created on first query)
    Show {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Deal damage from a qualifying activity
    Hit {
        /// Activity kind, recorded in the damage log
        kind: String,
        amount: i64,
        #[arg(long)]
        description: Option<String>,
    },
    /// Heal the boss from a negative activity
    Heal {
        kind: String,
        amount: i64,
        #[arg(long)]
        description: Option<String>,
    },
    /// List past weekly bosses
    History {
        #[arg(long, default_value_t = 12)]
        limit: usize,
    },
    /// Show this week's damage log
    Log,
}

pub fn run(action: BossAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let engine = BossEngine::new(&db);
    let now = Utc::now();

    match action {
        BossAction::Show { json } => {
            let boss = engine.get_or_create(now)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&boss)?);
                return Ok(());
            }
            print_boss(&boss);
        }
        BossAction::Hit {
            kind,
            amount,
            description,
        } => {
            let boss = engine.get_or_create(now)?;
            let outcome = engine.deal_damage(boss.id, &kind, amount, description.as_deref(), now)?;
            if outcome.newly_defeated {
                issue_defeat_rewards(&db, &boss, now)?;
                println!("{} defeated! +{} XP", boss.name, boss.xp_reward);
                if boss.bonus_shields > 0 {
                    println!("  +{} streak shield(s)", boss.bonus_shields);
                }
            } else if outcome.is_defeated {
                println!("{} is already defeated this week", boss.name);
            } else {
                println!("{}: {}/{} HP", boss.name, outcome.new_hp, boss.max_hp);
            }
        }
        BossAction::Heal {
            kind,
            amount,
            description,
        } => {
            let boss = engine.get_or_create(now)?;
            let outcome = engine.heal(boss.id, &kind, amount, description.as_deref(), now)?;
            if outcome.is_defeated {
                println!("{} is already defeated this week", boss.name);
            } else {
                println!("{} recovered: {}/{} HP", boss.name, outcome.new_hp, boss.max_hp);
            }
        }
        BossAction::History { limit } => {
            for boss in engine.history(limit)? {
                let status = if boss.is_defeated {
                    "defeated".to_string()
                } else {
                    format!("{}/{} HP", boss.current_hp, boss.max_hp)
                };
                println!("{}  {:<24} {}", boss.week_start, boss.name, status);
            }
        }
        BossAction::Log => {
            let boss = engine.get_or_create(now)?;
            for entry in engine.damage_log(boss.id)? {
                println!(
                    "{}  {:>5}  {}  {}",
                    entry.dealt_at.format("%Y-%m-%d %H:%M"),
                    entry.amount,
                    entry.kind,
                    entry.description.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

fn issue_defeat_rewards(
    db: &Database,
    boss: &WeeklyBoss,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = SqliteRewardLedger::new(db);
    ledger.credit(
        boss.xp_reward,
        &format!("{} defeated", boss.name),
        "boss",
        Some(&boss.id.to_string()),
        now,
    )?;
    if boss.bonus_shields > 0 {
        let streaks = StreakEngine::new(db, SqliteActivationLog::new(db));
        streaks.add_shields(boss.bonus_shields, now)?;
    }
    Ok(())
}

fn print_boss(boss: &WeeklyBoss) {
    println!("{} (week of {})", boss.name, boss.week_start);
    println!("  {}", boss.description);
    if boss.is_defeated {
        println!("  defeated");
    } else {
        println!("  {}/{} HP", boss.current_hp, boss.max_hp);
    }
    println!(
        "  reward: {} XP{}",
        boss.xp_reward,
        if boss.bonus_shields > 0 {
            format!(" + {} shield(s)", boss.bonus_shields)
        } else {
            String::new()
        }
    );
}
