//! Energy pool commands.

use chrono::Utc;
use clap::Subcommand;

use habitforge_core::{derive_debuffs, Database, EnergyEngine};

#[derive(Subcommand)]
pub enum EnergyAction {
    /// Show pool state and active debuffs
    Show {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Apply pending natural regeneration
    Regen,
    /// Spend energy on an action
    Spend {
        /// Action kind from the price list
        action_kind: String,
        /// Optional source identifier recorded in the ledger
        #[arg(long)]
        source: Option<String>,
    },
    /// Grant (or with a negative amount, revoke) bonus capacity
    Bonus { amount: i64 },
    /// Set the base pool capacity
    SetMax { value: i64 },
    /// Restore the pool to full
    Restore,
    /// List action costs
    Costs,
    /// Set the cost of an action kind
    SetCost { action_kind: String, cost: i64 },
    /// Show recent ledger entries
    Ledger {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub fn run(action: EnergyAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let engine = EnergyEngine::new(&db);
    let now = Utc::now();

    match action {
        EnergyAction::Show { json } => {
            engine.regenerate(now)?;
            let state = engine.state(now)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
                return Ok(());
            }
            println!(
                "Energy: {}/{} (max {} + bonus {})",
                state.current,
                state.capacity(),
                state.max,
                state.bonus
            );
            for debuff in derive_debuffs(&state) {
                let penalties: Vec<String> = debuff
                    .stat_penalties
                    .iter()
                    .map(|(stat, delta)| format!("{stat} {delta}"))
                    .collect();
                println!("  {:?}: {} [{}]", debuff.kind, debuff.description, penalties.join(", "));
            }
        }
        EnergyAction::Regen => {
            let (state, gained) = engine.regenerate(now)?;
            println!("Regenerated {gained} energy ({}/{})", state.current, state.capacity());
        }
        EnergyAction::Spend {
            action_kind,
            source,
        } => {
            engine.regenerate(now)?;
            let outcome = engine.spend(&action_kind, source.as_deref(), now)?;
            println!(
                "Spent {} on {action_kind} ({}/{})",
                outcome.charged,
                outcome.state.current,
                outcome.state.capacity()
            );
        }
        EnergyAction::Bonus { amount } => {
            let state = engine.add_bonus(amount, now)?;
            println!("Bonus capacity now {} (ceiling {})", state.bonus, state.capacity());
        }
        EnergyAction::SetMax { value } => {
            let state = engine.set_max(value, now)?;
            println!("Max capacity now {} ({}/{})", state.max, state.current, state.capacity());
        }
        EnergyAction::Restore => {
            let state = engine.restore_full(now)?;
            println!("Restored to {}/{}", state.current, state.capacity());
        }
        EnergyAction::Costs => {
            let costs = engine.list_costs()?;
            if costs.is_empty() {
                println!("No action costs configured (unpriced actions are free).");
            }
            for cost in costs {
                println!("{:<24} {}", cost.action_kind, cost.cost);
            }
        }
        EnergyAction::SetCost { action_kind, cost } => {
            engine.set_cost(&action_kind, cost)?;
            println!("{action_kind} now costs {cost}");
        }
        EnergyAction::Ledger { limit } => {
            for entry in engine.ledger(limit)? {
                println!(
                    "{}  {:>5}  {:>3} -> {:<3}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.amount,
                    entry.before,
                    entry.after,
                    entry.reason
                );
            }
        }
    }
    Ok(())
}
