//! Reward ledger commands.

use clap::Subcommand;

use habitforge_core::{Database, SqliteRewardLedger};

#[derive(Subcommand)]
pub enum RewardsAction {
    /// Show total XP and recent credits
    Show {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub fn run(action: RewardsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let ledger = SqliteRewardLedger::new(&db);

    match action {
        RewardsAction::Show { limit } => {
            println!("Total XP: {}", ledger.total()?);
            for entry in ledger.recent(limit)? {
                println!(
                    "{}  {:>5}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.amount,
                    entry.reason
                );
            }
        }
    }
    Ok(())
}
