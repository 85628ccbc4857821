use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "habitforge", version, about = "Habitforge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Energy pool
    Energy {
        #[command(subcommand)]
        action: commands::energy::EnergyAction,
    },
    /// Habit streaks, freezes, and shields
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Weekly boss encounter
    Boss {
        #[command(subcommand)]
        action: commands::boss::BossAction,
    },
    /// Reward ledger
    Rewards {
        #[command(subcommand)]
        action: commands::rewards::RewardsAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Energy { action } => commands::energy::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Boss { action } => commands::boss::run(action),
        Commands::Rewards { action } => commands::rewards::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
